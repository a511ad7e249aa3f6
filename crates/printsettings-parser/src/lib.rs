pub mod collector;
pub mod expression;
pub mod extractor;
pub mod file_collect;
pub mod fragment;

pub use collector::*;
pub use expression::{extract_operands, is_hard_disabled, requirement_keys};
pub use extractor::*;
pub use file_collect::*;
pub use fragment::*;
