use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info};

use crate::board::{scan_order, Board, CellState};
use crate::config::GameConfig;
use crate::display::{LedDisplay, FULL_BRIGHTNESS};
use crate::error::GameError;
use crate::font::Glyph;
use crate::input::{Controls, Exit};
use crate::random::RandomSource;
use crate::snake::{Direction, Snake};
use crate::{Coords, BOARD_SIZE};

const START_CELL: Coords = (2, 4);
const START_DIRECTION: Direction = Direction::Up;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Crash {
    OutOfBounds,
    SelfCollision,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    GameOver { score: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Moved { ate: bool },
    /// This tick ended the game.
    Crashed { crash: Crash, score: u32 },
    /// The game had already ended; nothing changed.
    Over { score: u32 },
}

pub struct SnakeGame<D, R> {
    display: D,
    rng: R,
    config: GameConfig,
    controls: Arc<Controls>,
    board: Board,
    snake: Snake,
    food: Coords,
    phase: Phase,
}

impl<D: LedDisplay, R: RandomSource> SnakeGame<D, R> {
    pub fn new(display: D, rng: R, config: GameConfig, controls: Arc<Controls>) -> Result<Self> {
        let mut game = SnakeGame {
            display,
            rng,
            config,
            controls,
            board: Board::new(),
            snake: Snake::new(&[START_CELL], START_DIRECTION),
            food: START_CELL,
            phase: Phase::Running,
        };

        game.reset()?;
        Ok(game)
    }

    /// Puts everything back to the power-on state.
    pub fn reset(&mut self) -> Result<()> {
        self.controls.clear();
        self.arrange(&[START_CELL], START_DIRECTION)?;
        // Starting from the head cell forces a fresh random draw
        self.food = self.place_food(START_CELL)?;
        self.phase = Phase::Running;

        info!(head = ?START_CELL, food = ?self.food, "New game");
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.snake.len() as u32 - 1
    }

    pub fn body(&self) -> Vec<Coords> {
        self.snake.body().iter().copied().collect()
    }

    pub fn food(&self) -> Coords {
        self.food
    }

    pub fn heading(&self) -> Direction {
        self.snake.get_direction()
    }

    /// Runs one game until it ends and the player resets or quits.
    pub fn play(&mut self) -> Result<Exit> {
        let score = loop {
            if let Some(exit) = self.controls.take_exit() {
                return Ok(exit);
            }

            match self.tick()? {
                TickOutcome::Moved { .. } => self.display.sleep(self.config.tick_ms),
                TickOutcome::Crashed { score, .. } | TickOutcome::Over { score } => break score,
            }
        };

        self.game_over(score)?;
        self.show_score_until_exit(score)
    }

    pub fn tick(&mut self) -> Result<TickOutcome> {
        if let Phase::GameOver { score } = self.phase {
            return Ok(TickOutcome::Over { score });
        }

        let turn = self.controls.latch().consume_turn();
        self.snake.turn(turn);
        let new_head = self.snake.next_head();

        if let Some(crash) = self.check_crash(new_head) {
            let score = self.score();
            info!(?crash, ?new_head, score, "Snake crashed");
            self.phase = Phase::GameOver { score };
            return Ok(TickOutcome::Crashed { crash, score });
        }

        self.board.set(new_head, CellState::Body);
        self.render(new_head)?;
        self.snake.push_head(new_head);

        let ate = new_head == self.food;
        if ate {
            self.food = self.place_food(self.food)?;
        } else if let Some(tail) = self.snake.pop_tail() {
            self.board.set(tail, CellState::Empty);
            self.render(tail)?;
        }

        debug!(head = ?new_head, heading = ?self.heading(), length = self.snake.len(), ate, "Tick");
        Ok(TickOutcome::Moved { ate })
    }

    ///////////////////////////////////////////////////////////////////////////

    fn check_crash(&self, pos: Coords) -> Option<Crash> {
        match self.board.get(pos) {
            None => Some(Crash::OutOfBounds),
            // Includes the tail, which has not moved out of the way yet
            Some(CellState::Body) => Some(Crash::SelfCollision),
            Some(CellState::Empty) | Some(CellState::Food) => None,
        }
    }

    /// Picks a free cell for food, starting with `previous` and redrawing while it is taken.
    fn place_food(&mut self, previous: Coords) -> Result<Coords> {
        if self.board.free_cells() == 0 {
            let err = GameError::BoardFull { length: self.snake.len() };
            error!(%err, "Cannot place food");
            return Err(err.into());
        }

        let mut candidate = previous;
        let mut attempts = 0;

        while !self.board.is_free(candidate) {
            if attempts == self.config.max_food_attempts {
                let err = GameError::FoodPlacementExhausted { attempts };
                error!(%err, "Cannot place food");
                return Err(err.into());
            }

            candidate = (
                self.rng.uniform_int(0, BOARD_SIZE - 1),
                self.rng.uniform_int(0, BOARD_SIZE - 1),
            );
            attempts += 1;
        }

        self.board.set(candidate, CellState::Food);
        self.render(candidate)?;

        info!(food = ?candidate, attempts, "Placed food");
        Ok(candidate)
    }

    /// Clears the matrix and lays out a snake, leaving no food on the board.
    fn arrange(&mut self, body: &[Coords], direction: Direction) -> Result<()> {
        for pos in scan_order() {
            self.display.clear_pixel(pos)?;
        }

        self.board = Board::new();
        self.snake = Snake::new(body, direction);

        for &pos in body {
            self.board.set(pos, CellState::Body);
            self.render(pos)?;
        }

        Ok(())
    }

    /// Shows a cell at the brightness its board state calls for.
    fn render(&mut self, pos: Coords) -> Result<()> {
        let brightness = match self.board.get(pos) {
            Some(CellState::Body) => FULL_BRIGHTNESS,
            Some(CellState::Food) => self.config.food_brightness,
            Some(CellState::Empty) | None => 0,
        };

        match brightness {
            0 => self.display.clear_pixel(pos)?,
            FULL_BRIGHTNESS => self.display.set_pixel(pos)?,
            dim => self.display.set_pixel_dim(pos, dim)?,
        }

        debug_assert_eq!(
            self.display.is_pixel_lit(pos),
            brightness > 0,
            "display out of step with board at {:?}",
            pos
        );
        Ok(())
    }

    /// The scripted end-of-game animation. Cannot be interrupted.
    fn game_over(&mut self, score: u32) -> Result<()> {
        info!(score, "Game over");

        for pos in scan_order() {
            self.display.set_pixel(pos)?;
            self.display.sleep(self.config.fill_pause_ms);
        }

        self.display.show_glyph(Glyph::Skull)?;
        self.display.sleep(self.config.skull_ms);

        for pos in scan_order() {
            self.display.clear_pixel(pos)?;
            self.display.sleep(self.config.clear_pause_ms);
        }

        Ok(())
    }

    /// Terminal state: the score repeats until someone resets or quits.
    fn show_score_until_exit(&mut self, score: u32) -> Result<Exit> {
        let text = (score * 10).to_string();

        loop {
            if let Some(exit) = self.controls.take_exit() {
                info!(?exit, "Leaving score display");
                return Ok(exit);
            }

            self.display.show_text(&text)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Turn;
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Set(Coords),
        Dim(Coords, u8),
        Clear(Coords),
        Glyph(Glyph),
        Text(String),
        Sleep(u64),
    }

    /// Records every call and keeps a brightness map; never actually sleeps.
    struct MockDisplay {
        leds: [[u8; 5]; 5],
        ops: Vec<Op>,
        /// Pressed after the given number of `show_text` calls.
        reset_after_texts: Option<(usize, Arc<Controls>)>,
        /// Simulates a display that loses dim pixels.
        drops_dim: bool,
    }

    impl MockDisplay {
        fn new() -> Self {
            MockDisplay { leds: [[0; 5]; 5], ops: vec![], reset_after_texts: None, drops_dim: false }
        }

        fn lit_cells(&self) -> Vec<Coords> {
            scan_order().filter(|pos| self.is_pixel_lit(*pos)).collect()
        }

        fn brightness(&self, pos: Coords) -> u8 {
            self.leds[pos.1 as usize][pos.0 as usize]
        }
    }

    impl LedDisplay for MockDisplay {
        fn set_pixel(&mut self, pos: Coords) -> Result<()> {
            self.leds[pos.1 as usize][pos.0 as usize] = 255;
            self.ops.push(Op::Set(pos));
            Ok(())
        }

        fn set_pixel_dim(&mut self, pos: Coords, brightness: u8) -> Result<()> {
            if !self.drops_dim {
                self.leds[pos.1 as usize][pos.0 as usize] = brightness;
            }
            self.ops.push(Op::Dim(pos, brightness));
            Ok(())
        }

        fn clear_pixel(&mut self, pos: Coords) -> Result<()> {
            self.leds[pos.1 as usize][pos.0 as usize] = 0;
            self.ops.push(Op::Clear(pos));
            Ok(())
        }

        fn is_pixel_lit(&self, pos: Coords) -> bool {
            self.brightness(pos) > 0
        }

        fn show_glyph(&mut self, glyph: Glyph) -> Result<()> {
            self.leds = [[0; 5]; 5];
            for (x, y) in glyph.lit_cells() {
                self.leds[y as usize][x as usize] = 255;
            }
            self.ops.push(Op::Glyph(glyph));
            Ok(())
        }

        fn show_text(&mut self, text: &str) -> Result<()> {
            self.ops.push(Op::Text(text.to_string()));

            let shown = self.ops.iter().filter(|op| matches!(op, Op::Text(_))).count();
            if let Some((after, controls)) = &self.reset_after_texts {
                if shown >= *after {
                    controls.request_reset();
                }
            }
            Ok(())
        }

        fn sleep(&mut self, ms: u64) {
            self.ops.push(Op::Sleep(ms));
        }
    }

    /// Hands out the given values in order, then starts over.
    struct Scripted {
        values: VecDeque<i8>,
    }

    impl Scripted {
        fn new(values: &[i8]) -> Self {
            Scripted { values: values.iter().copied().collect() }
        }
    }

    impl RandomSource for Scripted {
        fn uniform_int(&mut self, low: i8, high: i8) -> i8 {
            let v = self.values.pop_front().unwrap();
            self.values.push_back(v);
            assert!((low..=high).contains(&v));
            v
        }
    }

    fn new_game(rolls: &[i8]) -> SnakeGame<MockDisplay, Scripted> {
        let controls = Arc::new(Controls::new());
        SnakeGame::new(MockDisplay::new(), Scripted::new(rolls), GameConfig::default(), controls)
            .unwrap()
    }

    /// Replaces the board with the given snake and food.
    fn arrange(game: &mut SnakeGame<MockDisplay, Scripted>, body: &[Coords], dir: Direction, food: Coords) {
        game.arrange(body, dir).unwrap();
        game.board.set(food, CellState::Food);
        game.render(food).unwrap();
        game.food = food;
        game.display.ops.clear();
    }

    #[test]
    fn test_new_game_state() {
        let game = new_game(&[0, 0]);

        assert_eq!(game.body(), vec![(2, 4)]);
        assert_eq!(game.heading(), Direction::Up);
        assert_eq!(game.food(), (0, 0));
        assert_eq!(game.phase(), Phase::Running);
        assert_eq!(game.score(), 0);
        assert_eq!(game.display.lit_cells(), vec![(0, 0), (2, 4)]);
        assert_eq!(game.display.brightness((0, 0)), 10);
        assert_eq!(game.display.brightness((2, 4)), 255);
    }

    #[test]
    fn test_food_is_drawn_dim() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(2, 4)], Direction::Up, (3, 3));

        assert_eq!(game.display.ops, vec![]);
        game.render((3, 3)).unwrap();
        assert_eq!(game.display.ops, vec![Op::Dim((3, 3), 10)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "display out of step with board")]
    fn test_render_catches_display_mismatch() {
        let mut game = new_game(&[0, 0]);
        game.display.drops_dim = true;
        game.board.set((3, 3), CellState::Food);

        game.render((3, 3)).unwrap();
    }

    #[test]
    fn test_initial_food_never_on_head() {
        // First draw lands on the head and must be redrawn
        let game = new_game(&[2, 4, 3, 1]);
        assert_eq!(game.food(), (3, 1));
    }

    #[test]
    fn test_move_without_eating() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(2, 4)], Direction::Right, (0, 0));

        let outcome = game.tick().unwrap();

        assert_eq!(outcome, TickOutcome::Moved { ate: false });
        assert_eq!(game.body(), vec![(3, 4)]);
        assert_eq!(game.display.lit_cells(), vec![(0, 0), (3, 4)]);
        assert!(!game.display.is_pixel_lit((2, 4)));
        assert_eq!(game.board.get((2, 4)), Some(CellState::Empty));
    }

    #[test]
    fn test_out_of_bounds_top_ends_game() {
        let mut game = new_game(&[4, 4]);
        arrange(&mut game, &[(0, 0)], Direction::Up, (4, 4));

        let outcome = game.tick().unwrap();

        assert_eq!(outcome, TickOutcome::Crashed { crash: Crash::OutOfBounds, score: 0 });
        assert_eq!(game.phase(), Phase::GameOver { score: 0 });
        assert_eq!(game.body(), vec![(0, 0)]);
    }

    #[test]
    fn test_out_of_bounds_right_ends_game() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(4, 2), (3, 2)], Direction::Right, (0, 0));

        let outcome = game.tick().unwrap();
        assert_eq!(outcome, TickOutcome::Crashed { crash: Crash::OutOfBounds, score: 1 });
    }

    #[test]
    fn test_running_into_body_ends_game() {
        let mut game = new_game(&[0, 0]);
        // Body curls round to the right of the head
        arrange(
            &mut game,
            &[(2, 2), (2, 3), (3, 3), (3, 2), (3, 1)],
            Direction::Up,
            (0, 0),
        );
        // Right turn points the head at (3,2)
        game.controls.on_button_b();

        let outcome = game.tick().unwrap();

        assert_eq!(outcome, TickOutcome::Crashed { crash: Crash::SelfCollision, score: 4 });
        assert_eq!(game.heading(), Direction::Right);
    }

    #[test]
    fn test_running_into_tail_ends_game() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(2, 2), (2, 3), (3, 3), (3, 2)], Direction::Right, (0, 0));

        let outcome = game.tick().unwrap();
        assert_eq!(outcome, TickOutcome::Crashed { crash: Crash::SelfCollision, score: 3 });
    }

    #[test]
    fn test_eating_grows_and_replaces_food() {
        // First redraw hits the body, second is free
        let mut game = new_game(&[0, 0]);
        game.rng = Scripted::new(&[2, 3, 4, 0]);
        arrange(&mut game, &[(2, 3), (2, 4)], Direction::Up, (2, 2));

        let outcome = game.tick().unwrap();

        assert_eq!(outcome, TickOutcome::Moved { ate: true });
        assert_eq!(game.body(), vec![(2, 2), (2, 3), (2, 4)]);
        assert_eq!(game.food(), (4, 0));
        assert!(!game.body().contains(&game.food()));
        assert_eq!(game.display.brightness((2, 2)), 255);
        assert_eq!(game.display.brightness((4, 0)), 10);
        assert_eq!(game.score(), 2);
    }

    #[test]
    fn test_moving_onto_food_is_not_a_crash() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(1, 1)], Direction::Left, (0, 1));

        assert_eq!(game.tick().unwrap(), TickOutcome::Moved { ate: true });
        assert_eq!(game.phase(), Phase::Running);
    }

    #[test]
    fn test_turns_are_read_once_per_tick() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(2, 2)], Direction::Up, (0, 0));

        game.controls.on_button_a();
        game.tick().unwrap();
        assert_eq!(game.heading(), Direction::Left);
        assert_eq!(game.body(), vec![(1, 2)]);

        game.tick().unwrap();
        assert_eq!(game.heading(), Direction::Left);
        assert_eq!(game.body(), vec![(0, 2)]);
    }

    #[test]
    fn test_tick_after_game_over_changes_nothing() {
        let mut game = new_game(&[4, 4]);
        arrange(&mut game, &[(0, 0)], Direction::Up, (4, 4));
        game.tick().unwrap();
        game.display.ops.clear();

        game.controls.on_button_b();
        assert_eq!(game.tick().unwrap(), TickOutcome::Over { score: 0 });
        assert!(game.display.ops.is_empty());
        assert_eq!(game.heading(), Direction::Up);
    }

    #[test]
    fn test_full_board_fails_fast() {
        let mut game = new_game(&[0, 0]);
        let mut body: Vec<Coords> = scan_order().collect();
        body.retain(|pos| *pos != (4, 4));
        body.insert(0, (4, 4));
        // Every cell is snake, no food anywhere
        game.arrange(&body, Direction::Up).unwrap();

        let err = game.place_food((4, 4)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GameError>(),
            Some(&GameError::BoardFull { length: 25 })
        );
    }

    #[test]
    fn test_food_placement_gives_up_after_limit() {
        let mut game = new_game(&[0, 0]);
        game.config.max_food_attempts = 3;
        // Every draw lands on the snake
        game.rng = Scripted::new(&[2, 4]);
        arrange(&mut game, &[(2, 4)], Direction::Up, (0, 0));

        let err = game.place_food((2, 4)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GameError>(),
            Some(&GameError::FoodPlacementExhausted { attempts: 3 })
        );
    }

    #[test]
    fn test_game_over_sequence() {
        let mut game = new_game(&[0, 0]);
        game.display.ops.clear();

        game.game_over(2).unwrap();

        let ops = &game.display.ops;
        let cells: Vec<Coords> = scan_order().collect();
        assert_eq!(ops.len(), 25 * 2 + 2 + 25 * 2);

        for (i, pos) in cells.iter().enumerate() {
            assert_eq!(ops[i * 2], Op::Set(*pos));
            assert_eq!(ops[i * 2 + 1], Op::Sleep(50));
        }
        assert_eq!(ops[50], Op::Glyph(Glyph::Skull));
        assert_eq!(ops[51], Op::Sleep(1000));
        for (i, pos) in cells.iter().enumerate() {
            assert_eq!(ops[52 + i * 2], Op::Clear(*pos));
            assert_eq!(ops[52 + i * 2 + 1], Op::Sleep(25));
        }
        assert!(game.display.lit_cells().is_empty());
    }

    #[test]
    fn test_score_repeats_until_reset() {
        let mut game = new_game(&[0, 0]);
        game.display.reset_after_texts = Some((3, Arc::clone(&game.controls)));
        game.display.ops.clear();

        let exit = game.show_score_until_exit(2).unwrap();

        assert_eq!(exit, Exit::Reset);
        let texts: Vec<&Op> = game.display.ops.iter().collect();
        assert_eq!(texts, vec![&Op::Text("20".to_string()); 3]);
    }

    #[test]
    fn test_play_runs_to_score_screen() {
        let mut game = new_game(&[0, 0]);
        arrange(&mut game, &[(1, 1)], Direction::Up, (0, 0));
        game.display.reset_after_texts = Some((1, Arc::clone(&game.controls)));

        let exit = game.play().unwrap();

        assert_eq!(exit, Exit::Reset);
        let ops = &game.display.ops;
        // One tick pause before the crash, plus the skull hold
        assert_eq!(ops.iter().filter(|op| **op == Op::Sleep(1000)).count(), 2);
        assert!(ops.contains(&Op::Glyph(Glyph::Skull)));
        assert_eq!(ops.last(), Some(&Op::Text("0".to_string())));
    }

    #[test]
    fn test_play_stops_on_quit() {
        let mut game = new_game(&[0, 0]);
        game.controls.request_quit();
        game.display.ops.clear();

        assert_eq!(game.play().unwrap(), Exit::Quit);
        assert!(game.display.ops.is_empty());
    }

    #[test]
    fn test_reset_restores_start_state() {
        let mut game = new_game(&[0, 0, 1, 1]);
        arrange(&mut game, &[(4, 4), (4, 3), (3, 3)], Direction::Left, (0, 4));
        game.tick().unwrap();
        game.controls.on_button_b();

        game.reset().unwrap();

        assert_eq!(game.body(), vec![(2, 4)]);
        assert_eq!(game.heading(), Direction::Up);
        assert_eq!(game.phase(), Phase::Running);
        assert_eq!(game.controls.latch().consume_turn(), Turn::None);
        assert_eq!(game.display.lit_cells().len(), 2);
    }

    #[test]
    fn test_random_play_keeps_invariants() {
        for seed in 0..20 {
            let controls = Arc::new(Controls::new());
            let dice = crate::random::Dice::new(Some(seed));
            let mut game =
                SnakeGame::new(MockDisplay::new(), dice, GameConfig::default(), Arc::clone(&controls))
                    .unwrap();
            let mut turns = SmallRng::seed_from_u64(seed + 100);

            for _ in 0..200 {
                let before = game.body().len();
                match turns.gen_range(0..4) {
                    0 => controls.on_button_a(),
                    1 => controls.on_button_b(),
                    _ => {}
                }

                match game.tick().unwrap() {
                    TickOutcome::Moved { ate } => {
                        let body = game.body();
                        assert_eq!(body.len(), before + ate as usize);
                        assert!(body.iter().all(|pos| Board::in_bounds(*pos)));
                        assert!(!body.contains(&game.food()));
                        for pos in scan_order() {
                            assert_eq!(game.display.is_pixel_lit(pos), !game.board.is_free(pos));
                        }
                    }
                    TickOutcome::Crashed { score, .. } => {
                        assert_eq!(score as usize, game.body().len() - 1);
                        break;
                    }
                    TickOutcome::Over { .. } => unreachable!(),
                }
            }
        }
    }
}
