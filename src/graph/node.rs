/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Audio-clock time of the first frame in the block, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Duration of `frames` samples in seconds.
    pub fn frames_to_seconds(&self, frames: usize) -> f64 {
        frames as f64 / self.sample_rate as f64
    }
}

/// Trait for nodes whose parameters are set from the control side.
///
/// `set_param` may start a short ramp rather than jumping; `get_param`
/// reports the value the node is heading to.
pub trait Parameterized: Send {
    type Param: Copy + Send;

    fn get_param(&self, param: Self::Param) -> f32;

    fn set_param(&mut self, param: Self::Param, value: f32);
}

/// Core trait for audio processing graph nodes
///
/// Effect nodes process `out` in place; sources overwrite it.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Clear internal state (delay buffers, filter memory).
    ///
    /// Default implementation does nothing (stateless nodes).
    fn reset(&mut self) {}
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
