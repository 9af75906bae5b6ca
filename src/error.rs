use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no free cell left for food (snake length {length})")]
    BoardFull { length: usize },
    #[error("gave up placing food after {attempts} attempts")]
    FoodPlacementExhausted { attempts: u32 },
}
