pub mod resolved;
pub mod resolver;
pub mod selection;

pub use resolved::*;
pub use resolver::*;
pub use selection::*;
