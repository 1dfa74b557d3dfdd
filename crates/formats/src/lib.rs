pub mod asset;
pub mod gltf_mesh;
pub mod mesh;
pub mod obj;

pub use asset::*;
pub use gltf_mesh::*;
pub use mesh::*;
pub use obj::*;
