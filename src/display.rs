use anyhow::Result;

use crate::font::Glyph;
use crate::Coords;

pub const FULL_BRIGHTNESS: u8 = 255;

/// The LED board as the game engine sees it.
pub trait LedDisplay {
    /// Light a cell at full brightness.
    fn set_pixel(&mut self, pos: Coords) -> Result<()>;

    fn set_pixel_dim(&mut self, pos: Coords, brightness: u8) -> Result<()>;

    fn clear_pixel(&mut self, pos: Coords) -> Result<()>;

    fn is_pixel_lit(&self, pos: Coords) -> bool;

    /// Replace the whole matrix with a fixed icon.
    fn show_glyph(&mut self, glyph: Glyph) -> Result<()>;

    /// Show `text` once. Returns when the text has finished scrolling.
    fn show_text(&mut self, text: &str) -> Result<()>;

    fn sleep(&mut self, ms: u64);
}
