//! Math utilities and types
//!
//! Locations are placed in a 3-D coordinate space; travel cost is derived
//! from the straight-line distance between two placements.

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Straight-line distance between two points
pub fn distance(a: &Point3, b: &Point3) -> f32 {
    nalgebra::distance(a, b)
}

/// Build a point from the `[x, y, z]` triple used in data files
pub fn point_from(coords: [f32; 3]) -> Point3 {
    Point3::from(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_is_euclidean() {
        let a = point_from([0.0, 0.0, 0.0]);
        let b = point_from([3.0, 4.0, 12.0]);
        assert_relative_eq!(distance(&a, &b), 13.0);
        assert_relative_eq!(distance(&b, &a), 13.0);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let a = point_from([5.0, -2.0, 1.5]);
        assert_relative_eq!(distance(&a, &a), 0.0);
    }
}
