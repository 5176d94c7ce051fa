use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::Rng;

use crate::models::Letter;

/// Point value per letter
pub static LETTER_VALUES: Lazy<HashMap<char, u32>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // 1 point letters
    for ch in [
        'A', 'C', 'D', 'E', 'H', 'I', 'L', 'M', 'N', 'O', 'R', 'S', 'T', 'U',
    ] {
        map.insert(ch, 1);
    }

    // 2 points
    for ch in ['B', 'F', 'G', 'P', 'W', 'Y'] {
        map.insert(ch, 2);
    }

    // 3 points
    for ch in ['K', 'V'] {
        map.insert(ch, 3);
    }

    // 4 points
    for ch in ['J', 'X'] {
        map.insert(ch, 4);
    }

    // 5 points
    for ch in ['Q', 'Z'] {
        map.insert(ch, 5);
    }

    map
});

/// Letter frequency distribution for English (approximate)
/// Used for weighted random generation
pub static LETTER_DISTRIBUTION: Lazy<Vec<(char, f32)>> = Lazy::new(|| {
    vec![
        ('E', 12.70),
        ('T', 9.05),
        ('A', 8.16),
        ('O', 7.50),
        ('I', 6.96),
        ('N', 6.74),
        ('S', 6.32),
        ('H', 6.09),
        ('R', 5.98),
        ('D', 4.25),
        ('L', 4.02),
        ('C', 2.78),
        ('U', 2.75),
        ('M', 2.40),
        ('W', 2.36),
        ('F', 2.22),
        ('G', 2.01),
        ('Y', 1.97),
        ('P', 1.92),
        ('B', 1.49),
        ('V', 0.97),
        ('K', 0.77),
        ('J', 0.15),
        ('X', 0.15),
        ('Q', 0.09),
        ('Z', 0.07),
    ]
});

/// Letters seeded into a fresh board when it has too few playable words
pub const COMMON_LETTERS: &[char] = &['E', 'A', 'R', 'I', 'O', 'T', 'N', 'S', 'L'];

/// Get the point value for a letter
pub fn get_letter_value(letter: char) -> u32 {
    let upper = letter.to_ascii_uppercase();
    *LETTER_VALUES.get(&upper).unwrap_or(&1)
}

/// Calculate the cumulative distribution for weighted random selection
pub fn get_cumulative_distribution() -> Vec<(char, f32)> {
    let mut cumulative = 0.0;
    LETTER_DISTRIBUTION
        .iter()
        .map(|(ch, freq)| {
            cumulative += freq;
            (*ch, cumulative)
        })
        .collect()
}

/// Supplies letters for new tiles
pub trait LetterSource {
    fn next_letter(&mut self) -> Letter;

    /// A letter drawn from the common set, used to make a board more playable
    fn common_letter(&mut self) -> Letter;
}

/// Draws letters from the English frequency table
pub struct WeightedLetterSource<R: Rng> {
    rng: R,
    cumulative_dist: Vec<(char, f32)>,
    total: f32,
}

impl<R: Rng> WeightedLetterSource<R> {
    pub fn new(rng: R) -> Self {
        let cumulative_dist = get_cumulative_distribution();
        let total = cumulative_dist.last().map(|(_, c)| *c).unwrap_or(0.0);
        Self {
            rng,
            cumulative_dist,
            total,
        }
    }

    fn random_letter(&mut self) -> char {
        let random_value = self.rng.random::<f32>() * self.total;

        for (letter, cumulative) in &self.cumulative_dist {
            if random_value <= *cumulative {
                return *letter;
            }
        }

        'E' // Fallback
    }
}

impl<R: Rng> LetterSource for WeightedLetterSource<R> {
    fn next_letter(&mut self) -> Letter {
        let ch = self.random_letter();
        Letter::new(ch, get_letter_value(ch))
    }

    fn common_letter(&mut self) -> Letter {
        let ch = COMMON_LETTERS[self.rng.random_range(0..COMMON_LETTERS.len())];
        Letter::new(ch, get_letter_value(ch))
    }
}

/// Replays a fixed sequence of letters, wrapping around at the end.
/// Useful for tutorials and reproducible boards.
#[derive(Debug, Clone)]
pub struct SequenceLetterSource {
    letters: Vec<char>,
    index: usize,
}

impl SequenceLetterSource {
    pub fn new(letters: &str) -> Self {
        let letters: Vec<char> = letters
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self {
            letters: if letters.is_empty() { vec!['E'] } else { letters },
            index: 0,
        }
    }
}

impl LetterSource for SequenceLetterSource {
    fn next_letter(&mut self) -> Letter {
        let ch = self.letters[self.index % self.letters.len()];
        self.index += 1;
        Letter::new(ch, get_letter_value(ch))
    }

    fn common_letter(&mut self) -> Letter {
        self.next_letter()
    }
}
