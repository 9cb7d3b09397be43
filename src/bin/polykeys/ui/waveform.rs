//! Oscilloscope fed by the engine's analyser snapshots

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Draw the latest snapshot. `live` dims the trace when nothing is sounding.
pub fn render_waveform(frame: &mut Frame, area: Rect, snapshot: &[f32], live: bool) {
    let block = Block::default()
        .title(" Scope ")
        .borders(Borders::ALL);

    let len = snapshot.len().max(1) as f64;
    let data: Vec<(f64, f64)> = snapshot
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / len, f64::from(sample)))
        .collect();

    let color = if live { Color::Cyan } else { Color::DarkGray };
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data);

    // master output rarely exceeds ±0.5; zoom so single notes are visible
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-0.5, 0.5])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
