/// Timing and brightness constants of the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Pause between ticks
    pub tick_ms: u64,
    /// Pause after lighting each cell in the game over sweep
    pub fill_pause_ms: u64,
    /// How long the skull stays up
    pub skull_ms: u64,
    /// Pause after clearing each cell in the game over sweep
    pub clear_pause_ms: u64,
    /// Brightness of the food cell, out of 255
    pub food_brightness: u8,
    /// Random draws allowed per food placement
    pub max_food_attempts: u32,
    /// Time each frame of scrolling text stays up
    pub scroll_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            fill_pause_ms: 50,
            skull_ms: 1000,
            clear_pause_ms: 25,
            food_brightness: 10,
            max_food_attempts: 10_000,
            scroll_ms: 150,
        }
    }
}

impl GameConfig {
    pub fn with_scroll_ms(scroll_ms: u64) -> Self {
        Self {
            scroll_ms,
            ..Default::default()
        }
    }
}
