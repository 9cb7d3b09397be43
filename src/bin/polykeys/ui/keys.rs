//! Keyboard strip: every mapped key with its note, held keys highlighted

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use polykeys::io::KeyboardMap;

pub fn render_keys(frame: &mut Frame, area: Rect, map: &KeyboardMap, held: &[char]) {
    let block = Block::default()
        .title(format!(" Keys  octave {} ", map.base_octave()))
        .borders(Borders::ALL);

    let layout = map.layout();
    let mut keys = Vec::with_capacity(layout.len());
    let mut notes = Vec::with_capacity(layout.len());

    for (key, note) in layout {
        let name = note.to_string();
        let sharp = name.contains('#');
        let width = name.len().max(2) + 1;

        let mut style = if sharp {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::White)
        };
        if held.contains(&key) {
            style = Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
        }

        keys.push(Span::styled(format!("{key:^width$}"), style));
        notes.push(Span::styled(
            format!("{name:^width$}"),
            style.add_modifier(Modifier::DIM),
        ));
    }

    let paragraph = Paragraph::new(vec![Line::from(keys), Line::from(notes)]).block(block);
    frame.render_widget(paragraph, area);
}
