pub mod letters;

pub use letters::{LetterSource, SequenceLetterSource, WeightedLetterSource};
