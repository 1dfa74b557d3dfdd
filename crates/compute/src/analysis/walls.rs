//! Wall detection by face-normal bucketing.
//!
//! Triangles are grouped by their unit normal rounded to a fixed number of
//! decimals. Each large-enough group whose normal has a meaningful
//! horizontal component is reported as a wall with a centroid and an
//! orientation in degrees (`atan2(ny, nx)`, counter-clockwise from +X).
//! Floors and roofs fall out because their normals are nearly vertical.

use std::collections::HashMap;

use formats::TriangleMesh;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::spatial::SpatialAnalysis;

/// Precisions above this are clamped; `10^15` still fits the integer keys.
pub const MAX_BUCKET_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallAnalysisConfig {
    /// Decimal places kept when bucketing normals. Higher values split
    /// curved or noisy surfaces into more groups.
    pub bucket_precision: u32,
    /// Groups with fewer triangles are ignored.
    pub min_faces: usize,
    /// Groups whose normal has a smaller XY magnitude are floors or ceilings.
    pub min_horizontal: f64,
}

impl WallAnalysisConfig {
    fn bucket_scale(&self) -> f64 {
        10f64.powi(self.bucket_precision.min(MAX_BUCKET_PRECISION) as i32)
    }
}

impl Default for WallAnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_precision: 1,
            min_faces: 3,
            min_horizontal: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallAnalysis {
    pub id: u32,
    pub centroid: [f64; 3],
    /// Degrees in `[0, 360)`.
    pub orientation: f64,
    /// The bucketed (rounded) normal shared by the group.
    pub normal: [f64; 3],
}

type NormalKey = [i64; 3];

#[derive(Debug, Default)]
struct FaceGroup {
    centroid_sum: Vec3,
    faces: usize,
}

pub fn analyze_walls(mesh: &TriangleMesh, config: &WallAnalysisConfig) -> Vec<WallAnalysis> {
    if mesh.is_empty() {
        warn!("mesh has no position attributes or faces; skipping wall analysis");
        return Vec::new();
    }

    let scale = config.bucket_scale();

    // First-seen order is kept so wall ids are stable for a given mesh.
    let mut order: Vec<NormalKey> = Vec::new();
    let mut groups: HashMap<NormalKey, FaceGroup> = HashMap::new();
    let mut skipped = 0usize;

    for [a, b, c] in mesh.triangles() {
        let (Some(p1), Some(p2), Some(p3)) = (mesh.vertex(a), mesh.vertex(b), mesh.vertex(c))
        else {
            skipped += 1;
            continue;
        };

        let normal = SpatialAnalysis::face_normal(p1, p2, p3);
        let key = bucket_key(normal, scale);
        let group = groups.entry(key).or_insert_with(|| {
            order.push(key);
            FaceGroup::default()
        });
        group.centroid_sum += SpatialAnalysis::triangle_centroid(p1, p2, p3);
        group.faces += 1;
    }

    if skipped > 0 {
        warn!("skipped {skipped} triangles with out-of-range vertex indices");
    }

    let mut walls = Vec::new();
    for key in order {
        let group = &groups[&key];
        if group.faces < config.min_faces {
            continue;
        }

        let normal = Vec3::new(
            key[0] as f64 / scale,
            key[1] as f64 / scale,
            key[2] as f64 / scale,
        );
        if normal.horizontal_length() <= config.min_horizontal {
            continue;
        }

        let centroid = group.centroid_sum / group.faces as f64;
        walls.push(WallAnalysis {
            id: walls.len() as u32,
            centroid: centroid.to_array(),
            orientation: orientation_degrees(normal),
            normal: normal.to_array(),
        });
    }

    walls
}

/// Compass-style orientation of a normal's horizontal component, in `[0, 360)`.
pub fn orientation_degrees(normal: Vec3) -> f64 {
    (normal.y.atan2(normal.x).to_degrees() + 360.0) % 360.0
}

// Half-up rounding, the same as the browser's Math.round.
fn bucket_key(n: Vec3, scale: f64) -> NormalKey {
    let q = |v: f64| (v * scale + 0.5).floor() as i64;
    [q(n.x), q(n.y), q(n.z)]
}
