pub mod gazetteer;
pub mod normalizer;
pub mod types;

pub use gazetteer::Gazetteer;
pub use types::*;

// Module-level constants
pub const TARGET_ENTITY: &str = "entity";
