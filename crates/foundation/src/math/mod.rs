pub mod vec;

pub use vec::*;
