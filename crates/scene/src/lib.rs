pub mod context;
pub mod error;
pub mod import;
pub mod widgets;

pub use context::*;
pub use error::*;
pub use import::*;
pub use widgets::*;
