// Module declarations
pub mod assignment;
pub mod dbscan;
pub mod naming;
pub mod registry;
pub mod temporal;
pub mod types;

pub use types::*;

pub use assignment::SIMILARITY_TIE_EPSILON;
pub use dbscan::cluster;
pub use naming::{derive_name, FALLBACK_EVENT_NAME};
pub use registry::{EventRegistry, RegistryPolicy};
pub use temporal::event_lifecycle;
