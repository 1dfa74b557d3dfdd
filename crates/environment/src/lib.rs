//! Scene environment: weather classification and the forecast source feeding it.

pub mod nws;
pub mod weather;

pub use nws::*;
pub use weather::*;
