//! Terminal UI for polykeys
//!
//! Reads the computer keyboard, sends note and control messages to the audio
//! thread, and draws the analyser output.

mod keys;
mod spectrum;
pub mod state;
mod waveform;

use std::{
    collections::HashMap,
    io::stdout,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use tracing::{debug, warn};

use polykeys::{
    config::EngineConfig,
    effects::AnalyserHandle,
    io::KeyboardMap,
    synth::{KeyId, SynthMessage},
};

use keys::render_keys;
use spectrum::{render_spectrum, Spectrum};
use state::PanelState;
use waveform::render_waveform;

/// Frame interval (~60 fps)
const FRAME: Duration = Duration::from_millis(16);
/// Without key-release events, a key counts as released this long after its
/// last press or auto-repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(600);

/// Channels between the UI and the audio thread
pub struct UiLinks {
    pub control_tx: Producer<SynthMessage>,
    pub analyser_rx: Consumer<AnalyserHandle>,
    pub voice_count: Arc<AtomicUsize>,
}

pub struct UiApp {
    links: UiLinks,
    keyboard: KeyboardMap,
    panel: PanelState,
    /// Held key → last press or repeat
    held: HashMap<char, Instant>,
    release_events: bool,
    analyser: Option<AnalyserHandle>,
    last_generation: u64,
    snapshot: Vec<f32>,
    spectrum: Spectrum,
    status: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(links: UiLinks, keyboard: KeyboardMap, config: &EngineConfig) -> Self {
        Self {
            links,
            keyboard,
            panel: PanelState::from_config(config),
            held: HashMap::new(),
            release_events: false,
            analyser: None,
            last_generation: 0,
            snapshot: vec![0.0; config.analyser_size],
            spectrum: Spectrum::new(config.analyser_size, config.sample_rate),
            status: String::from("play with z-m and q-i"),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.release_events = matches!(supports_keyboard_enhancement(), Ok(true));
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        } else {
            debug!("terminal has no key-release events, using hold timeout");
        }

        let result = self.event_loop(terminal);

        self.send(SynthMessage::AllNotesOff);
        if self.release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_analyser();
            if !self.release_events {
                self.expire_held_keys();
            }

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn voices(&self) -> usize {
        self.links.voice_count.load(Ordering::Relaxed)
    }

    fn poll_analyser(&mut self) {
        if self.analyser.is_none() {
            self.analyser = self.links.analyser_rx.pop().ok();
        }
        let Some(handle) = &self.analyser else {
            return;
        };

        let generation = handle.generation();
        if generation != self.last_generation {
            self.last_generation = generation;
            handle.read_into(&mut self.snapshot);
            self.spectrum.update(&self.snapshot);
        } else if self.voices() == 0 {
            self.spectrum.decay();
        }
    }

    fn expire_held_keys(&mut self) {
        let now = Instant::now();
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, &last)| now.duration_since(last) > HOLD_TIMEOUT)
            .map(|(&key, _)| key)
            .collect();
        for key in expired {
            self.release(key);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let KeyCode::Char(c) = key.code {
            let c = c.to_ascii_lowercase();
            if KeyboardMap::is_mapped(c) {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => self.press(c),
                    KeyEventKind::Release => self.release(c),
                }
                return;
            }
        }

        if key.kind != KeyEventKind::Press {
            return;
        }

        let msg = match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Char(' ') => {
                self.held.clear();
                self.status = String::from("all notes off");
                Some(SynthMessage::AllNotesOff)
            }
            KeyCode::Left => {
                self.keyboard.octave_down();
                None
            }
            KeyCode::Right => {
                self.keyboard.octave_up();
                None
            }
            KeyCode::Tab => Some(self.panel.cycle_waveform()),
            KeyCode::Up => Some(self.panel.nudge_volume(true)),
            KeyCode::Down => Some(self.panel.nudge_volume(false)),
            KeyCode::Char('f') => Some(self.panel.cycle_filter()),
            KeyCode::Char('[') => Some(self.panel.nudge_cutoff(false)),
            KeyCode::Char(']') => Some(self.panel.nudge_cutoff(true)),
            KeyCode::Char('o') => Some(self.panel.nudge_reverb(false)),
            KeyCode::Char('p') => Some(self.panel.nudge_reverb(true)),
            KeyCode::Char('k') => Some(self.panel.nudge_delay(false)),
            KeyCode::Char('l') => Some(self.panel.nudge_delay(true)),
            KeyCode::Char('9') => Some(self.panel.nudge_chorus(false)),
            KeyCode::Char('0') => Some(self.panel.nudge_chorus(true)),
            _ => None,
        };

        if let Some(msg) = msg {
            self.send(msg);
        }
    }

    fn press(&mut self, key: char) {
        if let Some(last) = self.held.get_mut(&key) {
            // auto-repeat
            *last = Instant::now();
            return;
        }
        let Some(note) = self.keyboard.note_for(key) else {
            return;
        };
        self.held.insert(key, Instant::now());
        self.status = format!("{key} → {note}");
        self.send(SynthMessage::NoteOn {
            key: KeyId::from(key),
            note,
        });
    }

    fn release(&mut self, key: char) {
        if self.held.remove(&key).is_some() {
            self.send(SynthMessage::NoteOff {
                key: KeyId::from(key),
            });
        }
    }

    fn send(&mut self, msg: SynthMessage) {
        if self.links.control_tx.push(msg).is_err() {
            warn!("control queue full, message dropped");
            self.status = String::from("audio thread busy, input dropped");
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // status
                Constraint::Length(4), // keys
                Constraint::Min(8),    // scope + spectrum
                Constraint::Length(1), // help
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);

        let mut held: Vec<char> = self.held.keys().copied().collect();
        held.sort_unstable();
        render_keys(frame, chunks[1], &self.keyboard, &held);

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        let live = self.voices() > 0;
        render_waveform(frame, scopes[0], &self.snapshot, live);
        render_spectrum(frame, scopes[1], &self.spectrum);

        let help = Paragraph::new(
            " [Esc] Quit  [Space] Panic  [←/→] Octave  [Tab] Wave  [↑/↓] Vol  \
             [f] Filter  [ [ ] ] Cutoff  [o/p] Reverb  [k/l] Delay  [9/0] Chorus",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let panel = &self.panel;
        let voices = self.voices();
        let peak = self.snapshot.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));

        let line = Line::from(vec![
            Span::styled(
                format!(" Voices {voices}/{}  ", panel.max_voices),
                Style::default().fg(if voices > 0 { Color::Green } else { Color::DarkGray }),
            ),
            Span::styled(
                format!("{}  ", panel.waveform),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("{} {:.0} Hz  ", panel.filter_type.name(), panel.cutoff_hz),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!(
                    "vol {:.0}%  rev {:.1}  dly {:.1}  cho {:.1}  ",
                    panel.volume_percent, panel.reverb_mix, panel.delay_mix, panel.chorus_mix
                ),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("{:.1}kHz  peak {peak:.2}  ", panel.sample_rate / 1000.0),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(self.status.as_str(), Style::default().fg(Color::Magenta)),
        ]);

        let paragraph =
            Paragraph::new(line).block(Block::default().title(" polykeys ").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }
}
