//! Spectrum view of the analyser snapshot
//!
//! The snapshot is short (256 samples by default), so bins are wide. Columns
//! are log-spaced and each one takes the loudest FFT bin it covers; a slow
//! fall-off keeps the display from flickering between frames.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Columns drawn across the chart
const COLUMNS: usize = 40;
/// Display floor
const FLOOR_DB: f64 = -90.0;
/// How far a column may drop per frame
const FALL_DB: f64 = 3.0;

pub struct Spectrum {
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    /// Inclusive FFT bin range per column
    ranges: Vec<(usize, usize)>,
    /// (log10 Hz, dB) per column
    levels: Vec<(f64, f64)>,
}

impl Spectrum {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        // Hann window
        let denom = (size - 1) as f32;
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let nyquist = f64::from(sample_rate) / 2.0;
        let bin_hz = f64::from(sample_rate) / size as f64;
        let last_bin = size / 2 - 1;
        let low = bin_hz.max(20.0);
        let high = nyquist.min(20_000.0).max(low * 2.0);

        let mut ranges = Vec::with_capacity(COLUMNS);
        let mut levels = Vec::with_capacity(COLUMNS);
        for col in 0..COLUMNS {
            let lo = low * (high / low).powf(col as f64 / COLUMNS as f64);
            let hi = low * (high / low).powf((col + 1) as f64 / COLUMNS as f64);
            let first = ((lo / bin_hz).round() as usize).clamp(1, last_bin);
            let last = ((hi / bin_hz).round() as usize).clamp(first, last_bin);
            ranges.push((first, last));
            levels.push(((lo * hi).sqrt().log10(), FLOOR_DB));
        }

        Self {
            window,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            ranges,
            levels,
        }
    }

    /// Fold a new snapshot in. Snapshots of the wrong length are ignored.
    pub fn update(&mut self, snapshot: &[f32]) {
        if snapshot.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(snapshot).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let norm = 2.0 / self.window.len() as f32;
        for (&(first, last), (_, level)) in self.ranges.iter().zip(self.levels.iter_mut()) {
            let peak = self.buffer[first..=last]
                .iter()
                .map(|c| c.norm() * norm)
                .fold(0.0f32, f32::max);
            let db = (20.0 * f64::from(peak.max(1e-9)).log10()).max(FLOOR_DB);
            *level = db.max(*level - FALL_DB);
        }
    }

    /// Let the display fall toward the floor with no new input.
    pub fn decay(&mut self) {
        for (_, level) in &mut self.levels {
            *level = (*level - FALL_DB).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.levels
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &Spectrum) {
    let data = spectrum.data();
    let (min_x, max_x) = match (data.first(), data.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => (1.0, 4.3),
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["100", "1k", "10k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-90", "-45", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
