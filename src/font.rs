//! Bitmaps for the 5×5 matrix.

use crate::{Coords, BOARD_SIZE};

const SKULL: [&str; 5] = [
    ".###.",
    "#.#.#",
    "#####",
    ".###.",
    ".###.",
];

// 3 columns wide, 5 rows tall
const DIGITS: [[&str; 5]; 10] = [
    ["###", "#.#", "#.#", "#.#", "###"],
    [".#.", "##.", ".#.", ".#.", "###"],
    ["###", "..#", "###", "#..", "###"],
    ["###", "..#", ".##", "..#", "###"],
    ["#.#", "#.#", "###", "..#", "..#"],
    ["###", "#..", "###", "..#", "###"],
    ["###", "#..", "###", "#.#", "###"],
    ["###", "..#", "..#", ".#.", ".#."],
    ["###", "#.#", "###", "#.#", "###"],
    ["###", "#.#", "###", "..#", "###"],
];

const DASH: [&str; 5] = ["...", "...", "###", "...", "..."];
const BLANK: [&str; 5] = ["...", "...", "...", "...", "..."];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Glyph {
    Skull,
}

impl Glyph {
    pub fn rows(self) -> [&'static str; 5] {
        match self {
            Glyph::Skull => SKULL,
        }
    }

    /// Lit cells of the glyph as (x, y).
    pub fn lit_cells(self) -> Vec<Coords> {
        self.rows()
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'#')
                    .map(move |(x, _)| (x as i8, y as i8))
            })
            .collect()
    }
}

fn char_rows(ch: char) -> [&'static str; 5] {
    match ch {
        '0'..='9' => DIGITS[ch as usize - '0' as usize],
        '-' => DASH,
        _ => BLANK,
    }
}

/// Column bitmaps for `text`, one blank column between characters.
/// Bit `y` of a column is set when row `y` is lit.
pub fn text_columns(text: &str) -> Vec<u8> {
    let mut columns = vec![];

    for (i, ch) in text.chars().enumerate() {
        if i > 0 {
            columns.push(0);
        }

        let rows = char_rows(ch);
        for x in 0..rows[0].len() {
            let column = rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.as_bytes()[x] == b'#')
                .fold(0u8, |acc, (y, _)| acc | 1 << y);
            columns.push(column);
        }
    }

    columns
}

/// Successive 5-column windows that slide `text` in from the right edge and out the left.
pub fn scroll_frames(text: &str) -> Vec<[u8; 5]> {
    let width = BOARD_SIZE as usize;
    let mut strip = vec![0u8; width];
    strip.extend(text_columns(text));
    strip.extend(vec![0u8; width]);

    strip
        .windows(width)
        .map(|w| [w[0], w[1], w[2], w[3], w[4]])
        .collect()
}
