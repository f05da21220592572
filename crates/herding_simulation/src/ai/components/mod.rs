//! AI components

pub mod herding;


// Re-export all components
pub use herding::*;
