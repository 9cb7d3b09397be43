/*
Delay Line
==========

A circular buffer. Every sample is written at `write_pos`, and reads look
backwards from there by a number of samples.

    buffer:  [ . . . . x . . . . . w . . . ]
                       ↑           ↑
               write_pos - delay   write_pos

Fractional reads interpolate linearly between the two nearest samples, which
lets the chorus sweep its delay time smoothly instead of stepping between
whole samples (stepping is audible as crackle).

The buffer is sized once, up front, from the longest delay the owner needs at
its sample rate. Nothing on the render path allocates.
*/

pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// A delay line able to hold `max_delay_samples` of history.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(2) + 1],
            write_pos: 0,
        }
    }

    /// A delay line able to hold `max_seconds` of history at `sample_rate`.
    pub fn with_max_seconds(max_seconds: f32, sample_rate: f32) -> Self {
        let samples = (max_seconds.max(0.0) * sample_rate).ceil() as usize;
        Self::new(samples)
    }

    /// Longest usable delay in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Push one sample into the line.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read the sample written `delay_samples` writes ago, interpolating
    /// between neighbours for fractional delays. A delay of 1.0 is the most
    /// recently written sample.
    #[inline]
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, self.capacity() as f32);

        let whole = delay.floor() as usize;
        let frac = delay - whole as f32;

        let newer = self.buffer[(self.write_pos + len - whole) % len];
        let older = self.buffer[(self.write_pos + len - (whole + 1).min(len - 1)) % len];

        newer + (older - newer) * frac
    }

    /// Write `sample` and return the sample from `delay_samples` ago.
    pub fn next_sample(&mut self, sample: f32, delay_samples: f32) -> f32 {
        let delayed = self.read_interpolated(delay_samples);
        self.write(sample);
        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
