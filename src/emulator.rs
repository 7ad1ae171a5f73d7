use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use chip8vm::{Interpreter, DISPLAY_HEIGHT, DISPLAY_WIDTH};

use crate::settings::Settings;
use crate::sound::Beep;

/// Frames a key stays down after its last press or repeat event. Most
/// terminals never report releases, so held keys are kept alive by repeats.
const KEY_HOLD_FRAMES: u8 = 6;

/// Maps the left-hand 4x4 block of a QWERTY keyboard onto the hex keypad.
pub fn map_key(code: KeyCode) -> Option<u8> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Raw-mode terminal that is restored however the run ends.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(TerminalSession { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.clear();
        let _ = disable_raw_mode();
    }
}

pub struct Emulator {
    settings: Settings,
    interpreter: Interpreter,
    beeper: Beep,
    held_keys: [u8; 16],
}

impl Emulator {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let rom_data = std::fs::read(&settings.rom)
            .with_context(|| format!("Failed to read ROM {}", settings.rom.display()))?;
        let interpreter = match settings.seed {
            Some(seed) => Interpreter::load_with_seed(&rom_data, seed),
            None => Interpreter::load(&rom_data),
        }
        .with_context(|| format!("Failed to load ROM {}", settings.rom.display()))?;
        log::info!(
            "Loaded {} ({} bytes), {} instructions per frame",
            settings.rom.display(),
            rom_data.len(),
            settings.instructions_per_frame()
        );

        Ok(Emulator {
            settings,
            interpreter,
            beeper: Beep::new()?,
            held_keys: [0; 16],
        })
    }

    fn draw(&self, frame: &mut Frame, area: Rect, rom_name: &str) {
        // Calculate the exact size needed for 64x32 display plus borders
        let game_width = (DISPLAY_WIDTH as u16) + 2;
        let game_height = (DISPLAY_HEIGHT as u16) + 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(game_height),
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(area);

        // Center the game horizontally if the terminal is wider than needed
        let game_area = if chunks[0].width > game_width {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Min(0),
                    Constraint::Length(game_width),
                    Constraint::Min(0),
                ])
                .split(chunks[0])[1]
        } else {
            chunks[0]
        };

        let mut screen = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT * 3);
        for row in self.interpreter.display().rows() {
            screen.extend(row.map(|lit| if lit { '█' } else { ' ' }));
            screen.push('\n');
        }
        let game_paragraph = Paragraph::new(screen)
            .block(Block::default().borders(Borders::ALL).title(rom_name))
            .style(Style::default().fg(Color::White));
        frame.render_widget(game_paragraph, game_area);

        let next = self
            .interpreter
            .peek_instruction()
            .map(|instruction| instruction.to_string())
            .unwrap_or_else(|err| err.to_string());
        let status = format!(
            "PC {:#05X}  I {:#05X}  DT {:3}  ST {:3}  next: {next}",
            self.interpreter.pc(),
            self.interpreter.index(),
            self.interpreter.delay_timer(),
            self.interpreter.sound_timer(),
        );
        let status_paragraph = Paragraph::new(status)
            .block(Block::default().borders(Borders::ALL).title("CPU"))
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(status_paragraph, chunks[1]);

        let key_mapping = "Key Mapping:\n\
    1 2 3 4    →    1 2 3 C\n\
    Q W E R    →    4 5 6 D\n\
    A S D F    →    7 8 9 E\n\
    Z X C V    →    A 0 B F";
        let key_paragraph = Paragraph::new(key_mapping)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Keypad (Esc quits)"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(key_paragraph, chunks[2]);
    }

    /// Drains pending terminal events into the held-key table. Returns false
    /// once Escape is pressed.
    fn poll_input(&mut self) -> anyhow::Result<bool> {
        for frames in self.held_keys.iter_mut() {
            *frames = frames.saturating_sub(1);
        }

        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.code == KeyCode::Esc {
                return Ok(false);
            }
            if let Some(chip8_key) = map_key(key.code) {
                self.held_keys[usize::from(chip8_key)] = match key.kind {
                    KeyEventKind::Release => 0,
                    _ => KEY_HOLD_FRAMES,
                };
            }
        }
        Ok(true)
    }

    fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        (0..16u8).filter(move |&key| self.held_keys[usize::from(key)] > 0)
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.settings.frame_rate as f64);
        let instructions_per_frame = self.settings.instructions_per_frame();
        let rom_name = self.settings.rom_name();

        let mut session = TerminalSession::enter()?;

        'mainloop: loop {
            let frame_start = Instant::now();

            if !self.poll_input()? {
                break 'mainloop;
            }
            let pressed: Vec<u8> = self.pressed_keys().collect();
            self.interpreter.set_pressed_keys(pressed);

            for _ in 0..instructions_per_frame {
                let pc = self.interpreter.pc();
                self.interpreter
                    .advance()
                    .with_context(|| format!("Emulation halted at {pc:#05X}"))?;
            }
            self.beeper.set_active(self.interpreter.is_sound_active());

            session.terminal.draw(|frame| {
                let area = frame.area();
                self.draw(frame, area, &rom_name);
            })?;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
        log::info!("Quit at {:#05X}", self.interpreter.pc());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(map_key(KeyCode::Char('1')), Some(0x1));
        assert_eq!(map_key(KeyCode::Char('4')), Some(0xC));
        assert_eq!(map_key(KeyCode::Char('x')), Some(0x0));
        assert_eq!(map_key(KeyCode::Char('V')), Some(0xF));
        assert_eq!(map_key(KeyCode::Char('p')), None);
        assert_eq!(map_key(KeyCode::Enter), None);
    }

    #[test]
    fn test_layout_covers_every_key() {
        let mut keys: Vec<u8> = "1234qwerasdfzxcv"
            .chars()
            .filter_map(|c| map_key(KeyCode::Char(c)))
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..16).collect::<Vec<u8>>());
    }
}
