use std::path::Path;

use gltf::buffer::Source;
use gltf::mesh::Mode;

use crate::mesh::{MeshError, TriangleMesh, UpAxis};

/// Load every triangle primitive of a `.gltf` or `.glb` into one mesh.
///
/// Positions stay in each mesh's local space; node transforms are not
/// applied. External buffers must be plain file names in the file's own
/// directory; anything else is rejected before any buffer is read.
pub fn load_gltf(path: &Path, up: UpAxis) -> Result<TriangleMesh, MeshError> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::open(path).map_err(|e| MeshError::Parse(format!("{path:?}: {e}")))?;
    for buffer in document.buffers() {
        if let Source::Uri(uri) = buffer.source() {
            check_buffer_uri(uri)?;
        }
    }
    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .map_err(|e| MeshError::Io(format!("{path:?} buffers: {e}")))?;

    let mut mesh = TriangleMesh::default();
    for gltf_mesh in document.meshes() {
        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                tracing::debug!(
                    "skipping {:?} primitive in mesh {}",
                    primitive.mode(),
                    gltf_mesh.index()
                );
                continue;
            }

            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f64; 3]> = positions
                .map(|p| up.to_z_up([p[0] as f64, p[1] as f64, p[2] as f64]))
                .collect();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|it| it.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            mesh.append(positions, &indices);
        }
    }

    Ok(mesh)
}

/// Embedded `data:` buffers pass. External ones must name a visible file
/// sitting next to the document: no separators, schemes or escapes.
fn check_buffer_uri(uri: &str) -> Result<(), MeshError> {
    if uri.starts_with("data:") {
        return Ok(());
    }
    let plain = !uri.is_empty()
        && !uri.starts_with('.')
        && !uri.contains(['/', '\\', ':', '%', '\0']);
    if plain {
        Ok(())
    } else {
        Err(MeshError::Unsupported(format!("buffer uri {uri:?}")))
    }
}

/// Relative URIs a `.gltf` document expects to find next to it.
///
/// Embedded `data:` URIs and absolute URLs are not files and are skipped.
pub fn gltf_external_uris(json: &[u8]) -> Result<Vec<String>, MeshError> {
    let doc: serde_json::Value =
        serde_json::from_slice(json).map_err(|e| MeshError::Parse(e.to_string()))?;

    let mut uris = Vec::new();
    for section in ["buffers", "images"] {
        let Some(items) = doc.get(section).and_then(|v| v.as_array()) else {
            continue;
        };
        for item in items {
            let Some(uri) = item.get("uri").and_then(|u| u.as_str()) else {
                continue;
            };
            if uri.starts_with("data:") || uri.contains("://") {
                continue;
            }
            if !uris.iter().any(|u| u == uri) {
                uris.push(uri.to_string());
            }
        }
    }
    Ok(uris)
}
