pub mod config_manager;
pub mod error;
pub mod events;
pub mod node;
pub mod preferences;
pub mod traits;
pub mod types;

pub use config_manager::*;
pub use error::*;
pub use events::*;
pub use node::*;
pub use preferences::*;
pub use traits::*;
pub use types::*;
