pub mod ids;
pub mod thresholds;
pub mod years;

// Foundation crate: small, well-tested primitives only.
pub use ids::*;
pub use thresholds::*;
pub use years::*;
