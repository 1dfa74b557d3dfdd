pub mod spatial;
pub mod walls;

pub use spatial::*;
pub use walls::*;
