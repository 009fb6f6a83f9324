// Embedding vector math shared by clustering and assignment
pub mod similarity;

pub use similarity::*;
