pub mod applier;
pub mod container;
pub mod edge;

pub use applier::*;
pub use container::*;
pub use edge::*;
