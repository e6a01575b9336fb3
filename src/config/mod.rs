pub mod watcher;

// Re-export all configuration types and functions
pub use self::load::*;
pub use self::types::*;

mod load;
mod types;
