//! Button input shared between the listener thread and the tick loop.
//!
//! The buttons only ever write here; the engine is the single reader.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::snake::Turn;

const NO_TURN: u8 = 0;
const TURN_LEFT: u8 = 1;
const TURN_RIGHT: u8 = 2;

/// Single-slot store for the latest unconsumed turn. Later presses overwrite earlier ones.
#[derive(Debug, Default)]
pub struct InputLatch {
    slot: AtomicU8,
}

impl InputLatch {
    pub fn record_turn_left(&self) {
        self.slot.store(TURN_LEFT, Ordering::SeqCst);
    }

    pub fn record_turn_right(&self) {
        self.slot.store(TURN_RIGHT, Ordering::SeqCst);
    }

    /// Reads the pending turn and resets the latch in one step.
    pub fn consume_turn(&self) -> Turn {
        match self.slot.swap(NO_TURN, Ordering::SeqCst) {
            NO_TURN => Turn::None,
            TURN_LEFT => Turn::Left,
            TURN_RIGHT => Turn::Right,
            code => unreachable!("input latch holds unknown turn code {}", code),
        }
    }
}

/// What the host asked the game to do instead of continuing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    Reset,
    Quit,
}

/// Everything the outside world can poke at while a game runs: both buttons,
/// the reset line and a quit request.
#[derive(Debug, Default)]
pub struct Controls {
    latch: InputLatch,
    reset: AtomicBool,
    quit: AtomicBool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latch(&self) -> &InputLatch {
        &self.latch
    }

    /// Button A.
    pub fn on_button_a(&self) {
        self.latch.record_turn_left();
    }

    /// Button B.
    pub fn on_button_b(&self) {
        self.latch.record_turn_right();
    }

    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::SeqCst);
    }

    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    /// Quit is sticky; a reset request is consumed by the call that reports it.
    pub fn take_exit(&self) -> Option<Exit> {
        if self.quit_requested() {
            Some(Exit::Quit)
        } else if self.reset.swap(false, Ordering::SeqCst) {
            Some(Exit::Reset)
        } else {
            None
        }
    }

    /// Drops any pending turn and reset request. Quit survives.
    pub fn clear(&self) {
        self.latch.consume_turn();
        self.reset.store(false, Ordering::SeqCst);
    }
}
