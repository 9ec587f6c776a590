pub mod active;
pub mod range;
pub mod reconcile;
pub mod surface;
pub mod visibility;

pub use active::*;
pub use range::*;
pub use reconcile::*;
pub use surface::*;
pub use visibility::*;
