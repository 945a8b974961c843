// src/config/mod.rs
pub mod ai;
pub mod keywords;

pub use ai::AiConfig;
pub use keywords::{Lexicon, LexiconHandle};
