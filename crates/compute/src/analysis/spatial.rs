use foundation::math::Vec3;

pub struct SpatialAnalysis;

impl SpatialAnalysis {
    pub fn triangle_centroid(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        (a + b + c) / 3.0
    }

    /// Unit normal of the triangle `a, b, c` (counter-clockwise is front),
    /// or the zero vector when the triangle is degenerate.
    pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        (b - a).cross(c - a).try_normalize().unwrap_or(Vec3::ZERO)
    }

    pub fn centroid(points: &[Vec3]) -> Option<Vec3> {
        if points.is_empty() {
            return None;
        }
        let mut sum = Vec3::ZERO;
        for &p in points {
            sum += p;
        }
        Some(sum / points.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::SpatialAnalysis;
    use foundation::math::Vec3;

    #[test]
    fn face_normal_is_unit_and_oriented() {
        let n = SpatialAnalysis::face_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        );
        assert_eq!(n, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn degenerate_face_has_zero_normal() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let n = SpatialAnalysis::face_normal(p, p * 2.0, p * 3.0);
        assert_eq!(n, Vec3::ZERO);
    }

    #[test]
    fn centroid_of_points() {
        assert_eq!(SpatialAnalysis::centroid(&[]), None);
        let c = SpatialAnalysis::centroid(&[Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0)]);
        assert_eq!(c, Some(Vec3::new(1.0, 2.0, 3.0)));
    }
}
