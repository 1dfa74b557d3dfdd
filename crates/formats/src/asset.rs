use std::path::Path;

use serde::{Deserialize, Serialize};

/// File extensions accepted by the model store, lowercase.
pub const ALLOWED_EXTENSIONS: &[&str] = &["glb", "gltf", "obj", "bin", "png", "jpg", "jpeg"];

/// Kinds of files a scene model may consist of: the model itself plus the
/// buffers and textures a `.gltf` can reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Glb,
    Gltf,
    Obj,
    Bin,
    Png,
    Jpeg,
}

impl AssetKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "glb" => Some(Self::Glb),
            "gltf" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            "bin" => Some(Self::Bin),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// True for files that can be placed in a scene on their own.
    pub fn is_model(self) -> bool {
        matches!(self, Self::Glb | Self::Gltf | Self::Obj)
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Glb => "model/gltf-binary",
            Self::Gltf => "model/gltf+json",
            Self::Obj => "model/obj",
            Self::Bin => "application/octet-stream",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}
