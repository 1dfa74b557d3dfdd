use std::path::Path;

use crate::mesh::{MeshError, TriangleMesh, UpAxis};

pub fn load_obj(path: &Path, up: UpAxis) -> Result<TriangleMesh, MeshError> {
    let text = std::fs::read_to_string(path).map_err(|e| MeshError::Io(format!("{path:?}: {e}")))?;
    parse_obj(&text, up)
}

/// Parse the geometry of a Wavefront OBJ document.
///
/// Only `v` and `f` records matter; everything else (normals, texture
/// coordinates, groups, materials) is skipped. Polygons are fan-triangulated.
pub fn parse_obj(text: &str, up: UpAxis) -> Result<TriangleMesh, MeshError> {
    let mut mesh = TriangleMesh::default();
    let mut polygon: Vec<u32> = Vec::with_capacity(4);

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut p = [0.0f64; 3];
                for c in &mut p {
                    let tok = tokens
                        .next()
                        .ok_or_else(|| parse_err(line_no, "vertex needs three coordinates"))?;
                    *c = tok
                        .parse()
                        .map_err(|_| parse_err(line_no, &format!("bad coordinate {tok:?}")))?;
                }
                mesh.push_vertex(up.to_z_up(p));
            }
            Some("f") => {
                polygon.clear();
                for tok in tokens {
                    polygon.push(resolve_index(tok, mesh.vertex_count(), line_no)?);
                }
                if polygon.len() < 3 {
                    return Err(parse_err(line_no, "face needs at least three vertices"));
                }
                for i in 1..polygon.len() - 1 {
                    mesh.push_triangle(polygon[0], polygon[i], polygon[i + 1]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

/// Resolve `i`, `i/t`, `i//n` or `i/t/n` to a zero-based vertex index.
/// Negative indices count back from the most recent vertex.
fn resolve_index(token: &str, vertex_count: usize, line_no: usize) -> Result<u32, MeshError> {
    let head = token.split('/').next().unwrap_or("");
    let raw: i64 = head
        .parse()
        .map_err(|_| parse_err(line_no, &format!("bad face index {token:?}")))?;

    let resolved = match raw {
        0 => None,
        n if n > 0 => Some(n - 1),
        n => Some(vertex_count as i64 + n),
    };

    match resolved {
        Some(i) if i >= 0 && (i as usize) < vertex_count => Ok(i as u32),
        _ => Err(parse_err(
            line_no,
            &format!("face index {raw} out of range ({vertex_count} vertices)"),
        )),
    }
}

fn parse_err(line_no: usize, msg: &str) -> MeshError {
    MeshError::Parse(format!("line {}: {msg}", line_no + 1))
}

#[cfg(test)]
mod tests {
    use super::parse_obj;
    use crate::mesh::{MeshError, UpAxis};
    use pretty_assertions::assert_eq;

    const QUAD: &str = "\
# a unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn quads_are_fan_triangulated() {
        let mesh = parse_obj(QUAD, UpAxis::Z).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3/1 -2/2 -1/3\n";
        let mesh = parse_obj(text, UpAxis::Z).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn y_up_files_are_rotated() {
        let mesh = parse_obj("v 1 2 3\n", UpAxis::Y).unwrap();
        assert_eq!(mesh.positions, vec![1.0, -3.0, 2.0]);
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n", UpAxis::Z).unwrap_err();
        match err {
            MeshError::Parse(msg) => assert!(msg.starts_with("line 2:"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn short_vertex_is_an_error() {
        assert!(parse_obj("v 1 2\n", UpAxis::Z).is_err());
    }
}
