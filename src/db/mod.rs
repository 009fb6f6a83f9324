pub mod core;
mod prediction;
mod schema;

pub use self::core::DbLockErrorExt;
pub use self::core::PredictionArchive;
