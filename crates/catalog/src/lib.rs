pub mod presets;
pub mod store;

pub use presets::*;
pub use store::*;
