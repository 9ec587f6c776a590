pub mod animator;
pub mod coalesce;

pub use animator::*;
pub use coalesce::*;
