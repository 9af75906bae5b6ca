use std::collections::VecDeque;

use crate::Coords;
use Direction::*;

/// Headings in clockwise order; a left turn steps backwards, a right turn forwards.
const CYCLE: [Direction; 4] = [Up, Right, Down, Left];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

/// A relative turn, as delivered by the two buttons.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Turn {
    None,
    Left,
    Right,
}

impl Direction {
    pub fn index(self) -> usize {
        match self {
            Up => 0,
            Right => 1,
            Down => 2,
            Left => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        CYCLE[index % CYCLE.len()]
    }

    pub fn delta(self) -> Coords {
        match self {
            Up => (0, -1),
            Right => (1, 0),
            Down => (0, 1),
            Left => (-1, 0),
        }
    }

    pub fn turned(self, turn: Turn) -> Self {
        Direction::from_index(turned_index(self.index(), turn))
    }
}

/// Heading update on raw cycle indices.
pub fn turned_index(index: usize, turn: Turn) -> usize {
    assert!(index < CYCLE.len(), "heading index {} out of range", index);

    match turn {
        Turn::None => index,
        Turn::Left => {
            if index > 0 {
                index - 1
            } else {
                CYCLE.len() - 1
            }
        }
        Turn::Right => (index + 1) % CYCLE.len(),
    }
}

pub struct Snake {
    body: VecDeque<Coords>,
    direction: Direction,
}

impl Snake {
    pub fn new(body: &[Coords], direction: Direction) -> Self {
        assert!(!body.is_empty(), "a snake needs at least one segment");
        Snake { body: body.iter().copied().collect(), direction }
    }

    /// Segments head first.
    pub fn body(&self) -> &VecDeque<Coords> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn head(&self) -> Coords {
        self.body[0]
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    pub fn turn(&mut self, turn: Turn) {
        self.direction = self.direction.turned(turn);
    }

    /// Where the head lands if the snake moves one cell along its heading.
    pub fn next_head(&self) -> Coords {
        let (x, y) = self.head();
        let (dx, dy) = self.direction.delta();
        (x + dx, y + dy)
    }

    pub fn push_head(&mut self, head: Coords) {
        self.body.push_front(head);
    }

    pub fn pop_tail(&mut self) -> Option<Coords> {
        // Never drop the last remaining segment
        if self.body.len() > 1 {
            self.body.pop_back()
        } else {
            None
        }
    }
}
