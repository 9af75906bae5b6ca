use std::io::{stdout, Stdout, Write};
use std::mem;
use std::sync::Arc;
use std::thread::{self, sleep, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, terminal};
use tracing::{debug, error, warn};

use crate::board::scan_order;
use crate::display::{LedDisplay, FULL_BRIGHTNESS};
use crate::font::{scroll_frames, Glyph};
use crate::input::Controls;
use crate::{Coords, BOARD_SIZE};

const LED_ON: &str = "██";
const LED_OFF: &str = "··";
const ORIGIN: (u16, u16) = (2, 1);
const INPUT_POLL_MS: u64 = 50;

/// Distinct things a key press can mean.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Press {
    ButtonA,
    ButtonB,
    Reset,
    Quit,
}

/// Emulates the 5×5 LED matrix in the terminal.
pub struct LedTerminal<W: Write = Stdout> {
    out: W,
    leds: [[u8; BOARD_SIZE as usize]; BOARD_SIZE as usize],
    scroll_ms: u64,
    // Each setup step that took effect, so restore undoes exactly those
    alt_screen: bool,
    raw_mode: bool,
    cursor_hidden: bool,
}

impl LedTerminal<Stdout> {
    pub fn new(scroll_ms: u64) -> Self {
        LedTerminal::with_writer(stdout(), scroll_ms)
    }
}

impl<W: Write> LedTerminal<W> {
    pub fn with_writer(out: W, scroll_ms: u64) -> Self {
        LedTerminal {
            out,
            leds: [[0; BOARD_SIZE as usize]; BOARD_SIZE as usize],
            scroll_ms,
            alt_screen: false,
            raw_mode: false,
            cursor_hidden: false,
        }
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.out, EnterAlternateScreen).context("Error entering alt screen")?;
        self.alt_screen = true;

        terminal::enable_raw_mode().context("Error enabling raw mode")?;
        self.raw_mode = true;

        self.cursor_hidden = true;
        execute!(self.out, cursor::Hide).context("Error hiding cursor")?;
        execute!(self.out, terminal::Clear(ClearType::All)).context("Error clearing screen")?;

        self.draw_borders()?;
        self.show_message(&[
            "A: a / Left    turn left",
            "B: b / Right   turn right",
            "r reset, q quit",
        ])?;
        self.draw_matrix()
    }

    /// Undoes whatever part of `setup` went through. Safe to call more than once.
    pub fn restore(&mut self) -> Result<()> {
        let mut outcome: Result<()> = Ok(());

        if mem::take(&mut self.raw_mode) {
            outcome = outcome.and(terminal::disable_raw_mode().context("Error disabling raw mode"));
        }
        if mem::take(&mut self.cursor_hidden) {
            outcome = outcome.and(execute!(self.out, cursor::Show).context("Error showing cursor"));
        }
        if mem::take(&mut self.alt_screen) {
            let left = execute!(self.out, LeaveAlternateScreen).context("Error leaving alt screen");
            outcome = outcome.and(left);
        }

        outcome
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw_borders(&mut self) -> Result<()> {
        let width = BOARD_SIZE as u16 * 2 + 2;
        let height = BOARD_SIZE as u16 + 2;
        let (left, top) = ORIGIN;

        for x in 0..width {
            let ch = if x == 0 || x == width - 1 { '+' } else { '-' };
            self.print_at((left + x, top), ch)?;
            self.print_at((left + x, top + height - 1), ch)?;
        }

        for y in 1..height - 1 {
            self.print_at((left, top + y), '|')?;
            self.print_at((left + width - 1, top + y), '|')?;
        }

        self.flush()
    }

    fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        let top = ORIGIN.1 + BOARD_SIZE as u16 + 4;

        for (i, line) in lines.iter().enumerate() {
            queue!(
                self.out,
                cursor::MoveTo(ORIGIN.0, top + i as u16),
                terminal::Clear(ClearType::CurrentLine),
                Print(line)
            )?;
        }

        self.flush()
    }

    fn show_caption(&mut self, caption: &str) -> Result<()> {
        let row = ORIGIN.1 + BOARD_SIZE as u16 + 2;
        queue!(
            self.out,
            cursor::MoveTo(ORIGIN.0, row),
            terminal::Clear(ClearType::CurrentLine),
            Print(caption)
        )?;
        self.flush()
    }

    fn print_at(&mut self, pos: (u16, u16), ch: char) -> Result<()> {
        queue!(self.out, cursor::MoveTo(pos.0, pos.1), Print(ch))?;
        Ok(())
    }

    fn draw_led(&mut self, pos: Coords) -> Result<()> {
        let brightness = self.leds[pos.1 as usize][pos.0 as usize];
        let column = ORIGIN.0 + 1 + pos.0 as u16 * 2;
        let row = ORIGIN.1 + 1 + pos.1 as u16;

        queue!(self.out, cursor::MoveTo(column, row))?;
        if brightness == 0 {
            queue!(self.out, SetForegroundColor(Color::DarkGrey), Print(LED_OFF), ResetColor)?;
        } else {
            queue!(self.out, SetForegroundColor(led_color(brightness)), Print(LED_ON), ResetColor)?;
        }
        Ok(())
    }

    fn draw_matrix(&mut self) -> Result<()> {
        for pos in scan_order() {
            self.draw_led(pos)?;
        }
        self.flush()
    }

    fn set_led(&mut self, pos: Coords, brightness: u8) -> Result<()> {
        self.leds[pos.1 as usize][pos.0 as usize] = brightness;
        self.draw_led(pos)?;
        self.flush()
    }

    fn load_columns(&mut self, frame: &[u8; 5]) {
        for (x, column) in frame.iter().enumerate() {
            for y in 0..BOARD_SIZE as usize {
                let lit = column & (1 << y) != 0;
                self.leds[y][x] = if lit { FULL_BRIGHTNESS } else { 0 };
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("Error flushing")
    }
}

impl<W: Write> LedDisplay for LedTerminal<W> {
    fn set_pixel(&mut self, pos: Coords) -> Result<()> {
        self.set_led(pos, FULL_BRIGHTNESS)
    }

    fn set_pixel_dim(&mut self, pos: Coords, brightness: u8) -> Result<()> {
        self.set_led(pos, brightness)
    }

    fn clear_pixel(&mut self, pos: Coords) -> Result<()> {
        self.set_led(pos, 0)
    }

    fn is_pixel_lit(&self, pos: Coords) -> bool {
        self.leds[pos.1 as usize][pos.0 as usize] > 0
    }

    fn show_glyph(&mut self, glyph: Glyph) -> Result<()> {
        self.leds = [[0; BOARD_SIZE as usize]; BOARD_SIZE as usize];
        for (x, y) in glyph.lit_cells() {
            self.leds[y as usize][x as usize] = FULL_BRIGHTNESS;
        }
        self.draw_matrix()
    }

    fn show_text(&mut self, text: &str) -> Result<()> {
        self.show_caption(&format!("Score: {}", text))?;

        for frame in scroll_frames(text) {
            self.load_columns(&frame);
            self.draw_matrix()?;
            self.sleep(self.scroll_ms);
        }

        Ok(())
    }

    fn sleep(&mut self, ms: u64) {
        sleep(Duration::from_millis(ms));
    }
}

impl<W: Write> Drop for LedTerminal<W> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(?err, "Failed to restore terminal");
        }
    }
}

/// Dim LEDs stay visible: brightness 1 still maps to a dark red.
fn led_color(brightness: u8) -> Color {
    let r = 60 + (brightness as u16 * 195 / 255) as u8;
    Color::Rgb { r, g: 0, b: 0 }
}

pub fn key_press(ev: &KeyEvent) -> Option<Press> {
    if is_ctrl_c(ev) {
        return Some(Press::Quit);
    }

    match ev.code {
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Some(Press::ButtonA),
        KeyCode::Char('b')
        | KeyCode::Char('B')
        | KeyCode::Char('d')
        | KeyCode::Char('D')
        | KeyCode::Right => Some(Press::ButtonB),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Press::Reset),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Press::Quit),
        _ => None,
    }
}

/// Plays the role of the button interrupts: reads keys on its own thread and only
/// ever writes to `controls`. Stops once a quit has been requested.
pub fn spawn_button_listener(controls: Arc<Controls>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !controls.quit_requested() {
            match poll(Duration::from_millis(INPUT_POLL_MS)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    error!(?err, "Polling for input failed");
                    controls.request_quit();
                    break;
                }
            }

            let ev = match read() {
                Ok(Event::Key(ev)) => ev,
                Ok(_) => continue,
                Err(err) => {
                    error!(?err, "Reading input failed");
                    controls.request_quit();
                    break;
                }
            };

            let press = key_press(&ev);
            debug!(?press, "Key");
            match press {
                Some(Press::ButtonA) => controls.on_button_a(),
                Some(Press::ButtonB) => controls.on_button_b(),
                Some(Press::Reset) => controls.request_reset(),
                Some(Press::Quit) => controls.request_quit(),
                None => {}
            }
        }
    })
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
