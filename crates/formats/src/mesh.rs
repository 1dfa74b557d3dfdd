use std::path::Path;

use foundation::math::Vec3;

use crate::asset::AssetKind;
use crate::gltf_mesh::load_gltf;
use crate::obj::load_obj;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    Io(String),
    Parse(String),
    Unsupported(String),
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::Io(msg) => write!(f, "mesh read failed: {msg}"),
            MeshError::Parse(msg) => write!(f, "mesh parse failed: {msg}"),
            MeshError::Unsupported(msg) => write!(f, "unsupported mesh source: {msg}"),
        }
    }
}

impl std::error::Error for MeshError {}

/// Which axis points up in the source file.
///
/// Analysis works in a Z-up frame (the scene's), glTF is Y-up by definition
/// and most OBJ exporters follow it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    pub fn to_z_up(self, p: [f64; 3]) -> [f64; 3] {
        match self {
            UpAxis::Y => [p[0], -p[2], p[1]],
            UpAxis::Z => p,
        }
    }
}

/// Triangulated mesh: flat `[x, y, z, ...]` positions plus three indices per face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<f64>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<f64>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.triangle_count() == 0
    }

    pub fn vertex(&self, index: u32) -> Option<Vec3> {
        let i = index as usize * 3;
        let p = self.positions.get(i..i + 3)?;
        Some(Vec3::new(p[0], p[1], p[2]))
    }

    /// Triangles as index triples. A trailing partial triple is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn push_vertex(&mut self, p: [f64; 3]) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend_from_slice(&p);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append a primitive whose indices are relative to its own vertices.
    pub fn append(&mut self, positions: impl IntoIterator<Item = [f64; 3]>, indices: &[u32]) {
        let base = self.vertex_count() as u32;
        for p in positions {
            self.push_vertex(p);
        }
        for tri in indices.chunks_exact(3) {
            self.push_triangle(base + tri[0], base + tri[1], base + tri[2]);
        }
    }
}

/// Load a model file into a single Z-up triangle mesh.
pub fn load_mesh(path: &Path, up: UpAxis) -> Result<TriangleMesh, MeshError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MeshError::Unsupported(format!("{path:?}")))?;

    match AssetKind::from_file_name(name) {
        Some(AssetKind::Glb | AssetKind::Gltf) => load_gltf(path, up),
        Some(AssetKind::Obj) => load_obj(path, up),
        _ => Err(MeshError::Unsupported(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{TriangleMesh, UpAxis, load_mesh};
    use foundation::math::Vec3;
    use std::path::Path;

    #[test]
    fn append_offsets_indices() {
        let mut mesh = TriangleMesh::default();
        mesh.append([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[0, 1, 2]);
        mesh.append([[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]], &[0, 1, 2]);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertex(4), Some(Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(mesh.vertex(6), None);
    }

    #[test]
    fn trailing_partial_triangle_is_ignored() {
        let mesh = TriangleMesh::new(vec![0.0; 9], vec![0, 1, 2, 0]);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn y_up_maps_to_z_up() {
        assert_eq!(UpAxis::Y.to_z_up([1.0, 2.0, 3.0]), [1.0, -3.0, 2.0]);
        assert_eq!(UpAxis::Z.to_z_up([1.0, 2.0, 3.0]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = load_mesh(Path::new("texture.png"), UpAxis::Y).unwrap_err();
        assert!(matches!(err, super::MeshError::Unsupported(_)));
    }
}
