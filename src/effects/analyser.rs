//! Waveform analyser: the tap at the end of the effect chain that the
//! visualizer reads once per animation frame.
//!
//! The audio side keeps a rolling window of the most recent samples and
//! publishes it after every rendered block. Publishing uses `try_lock`, so a
//! reader holding the snapshot never stalls the audio thread; at worst one
//! block's update is skipped and the next one lands.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Default number of samples in a waveform snapshot.
pub const DEFAULT_ANALYSER_SIZE: usize = 256;

struct Shared {
    snapshot: Mutex<Vec<f32>>,
    generation: AtomicU64,
    size: usize,
}

/// Audio-thread side. Owned by the effect chain.
pub struct Analyser {
    shared: Arc<Shared>,
    history: Vec<f32>,
    write_pos: usize,
}

impl Analyser {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            shared: Arc::new(Shared {
                snapshot: Mutex::new(vec![0.0; size]),
                generation: AtomicU64::new(0),
                size,
            }),
            history: vec![0.0; size],
            write_pos: 0,
        }
    }

    /// Read-only handle for visualizers. Cheap to clone.
    pub fn handle(&self) -> AnalyserHandle {
        AnalyserHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Record `block` (unchanged) and publish the latest window.
    pub fn process(&mut self, block: &[f32]) {
        let size = self.history.len();
        for &sample in block {
            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % size;
        }

        if let Ok(mut snapshot) = self.shared.snapshot.try_lock() {
            // oldest sample first
            let (newer, older) = self.history.split_at(self.write_pos);
            snapshot[..older.len()].copy_from_slice(older);
            snapshot[older.len()..].copy_from_slice(newer);
            self.shared.generation.fetch_add(1, Ordering::Release);
        }
    }
}

/// Read-only view of the analyser's latest waveform.
///
/// Reading never changes engine state. A poisoned lock (a panicking reader)
/// reads as silence.
#[derive(Clone)]
pub struct AnalyserHandle {
    shared: Arc<Shared>,
}

impl AnalyserHandle {
    /// Samples per snapshot.
    pub fn size(&self) -> usize {
        self.shared.size
    }

    /// Number of snapshots published so far. Lets a reader skip redraws when
    /// nothing new has arrived.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Copy the latest snapshot into `out` (up to `out.len()` samples).
    pub fn read_into(&self, out: &mut [f32]) {
        match self.shared.snapshot.lock() {
            Ok(snapshot) => {
                let n = out.len().min(snapshot.len());
                out[..n].copy_from_slice(&snapshot[..n]);
                out[n..].fill(0.0);
            }
            Err(_) => out.fill(0.0),
        }
    }

    /// The latest snapshot as a new vector.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.size()];
        self.read_into(&mut out);
        out
    }

    /// An endless sequence of snapshots. Each `next()` returns whatever is
    /// current at that moment; call it once per animation frame. Dropping the
    /// iterator and calling `frames()` again starts a fresh sequence.
    pub fn frames(&self) -> Frames {
        Frames {
            handle: self.clone(),
        }
    }
}

/// Iterator returned by [`AnalyserHandle::frames`]. Never ends.
pub struct Frames {
    handle: AnalyserHandle,
}

impl Iterator for Frames {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.handle.snapshot())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
