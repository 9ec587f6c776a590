pub mod controller;
pub mod notice;
pub mod service;

pub use controller::*;
pub use notice::*;
pub use service::*;
