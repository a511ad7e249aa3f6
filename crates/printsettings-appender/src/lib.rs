pub mod extension;
pub mod logging;

pub use extension::*;
pub use logging::init_logging;
