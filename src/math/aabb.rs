// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f, FLOAT_MAX};
use super::ray::Ray3f;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f,
}

impl Default for AABB {
    // Inverted extrema so that the first expand fully overwrites the box
    fn default() -> Self {
        Self {
            p_min: Vector3f::new(FLOAT_MAX, FLOAT_MAX, FLOAT_MAX),
            p_max: Vector3f::new(-FLOAT_MAX, -FLOAT_MAX, -FLOAT_MAX),
        }
    }
}

impl AABB {
    pub fn new(p_min: Vector3f, p_max: Vector3f) -> Self {
        let mut min = Vector3f::new(0.0, 0.0, 0.0);
        let mut max = Vector3f::new(0.0, 0.0, 0.0);
        for idx in 0..3 {
            min[idx] = p_min[idx].min(p_max[idx]);
            max[idx] = p_max[idx].max(p_min[idx]);
        }
        Self { p_min: min, p_max: max }
    }

    pub fn center(&self) -> Vector3f {
        0.5 * self.p_min + 0.5 * self.p_max
    }

    pub fn expand_by_point(&mut self, p: &Vector3f) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(p[idx]);
            self.p_max[idx] = self.p_max[idx].max(p[idx]);
        }
    }

    pub fn expand_by_aabb(&mut self, other: &AABB) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(other.p_min[idx]);
            self.p_max[idx] = self.p_max[idx].max(other.p_max[idx]);
        }
    }

    pub fn encloses(&self, p: &Vector3f) -> bool {
        for idx in 0..3 {
            if p[idx] < self.p_min[idx] || p[idx] > self.p_max[idx] {
                return false;
            }
        }

        true
    }

    pub fn encloses_aabb(&self, other: &AABB) -> bool {
        self.encloses(&other.p_min) && self.encloses(&other.p_max)
    }

    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    pub fn surface_area(&self) -> Float {
        let a = (self.p_max[0] - self.p_min[0]).abs();
        let b = (self.p_max[1] - self.p_min[1]).abs();
        let c = (self.p_max[2] - self.p_min[2]).abs();

        2.0 * (a * b + a * c + b * c)
    }

    // Ties go to the first of x, y, z reaching the maximum extent
    pub fn largest_axis(&self) -> usize {
        let diagonal = self.diagonal();
        let largest = diagonal[0].max(diagonal[1]).max(diagonal[2]);

        for idx in 0..3 {
            if diagonal[idx] == largest {
                return idx;
            }
        }

        0
    }

    /// Slab test with per-axis near/far swaps. Returns the entry distance,
    /// which is negative when the ray starts inside the box; such rays
    /// still report a hit through the exit distance.
    pub fn intersect_branched(&self, ray: &Ray3f) -> Option<Float> {
        let o = ray.origin();
        let inv = ray.inv_dir();

        let mut t_near = (self.p_min[0] - o[0]) * inv[0];
        let mut t_far = (self.p_max[0] - o[0]) * inv[0];
        if t_near > t_far {
            std::mem::swap(&mut t_near, &mut t_far);
        }

        for idx in 1..3 {
            let mut t0 = (self.p_min[idx] - o[idx]) * inv[idx];
            let mut t1 = (self.p_max[idx] - o[idx]) * inv[idx];
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            if t_near > t1 || t0 > t_far {
                return None;
            }

            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
        }

        if t_near > 0.0 || t_far > 0.0 {
            Some(t_near)
        } else {
            None
        }
    }

    /// Branchless form of the slab test used on the traversal hot path.
    /// Must classify hit/no-hit exactly like `intersect_branched` for any
    /// ray without zero direction components.
    pub fn intersect_fast(&self, ray: &Ray3f) -> Option<Float> {
        let o = ray.origin();
        let inv = ray.inv_dir();

        let mut t_near = -FLOAT_MAX;
        let mut t_far = FLOAT_MAX;

        for idx in 0..3 {
            let t0 = (self.p_min[idx] - o[idx]) * inv[idx];
            let t1 = (self.p_max[idx] - o[idx]) * inv[idx];

            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
        }

        if t_near <= t_far && (t_near > 0.0 || t_far > 0.0) {
            Some(t_near)
        } else {
            None
        }
    }
}

/* Test for AABB */
#[cfg(test)]
mod tests {
    use super::AABB;
    use super::Ray3f;
    use super::Vector3f;
    use crate::core::rng::LcgRng;
    use crate::math::constants::Float;

    #[test]
    fn test_aabb_geometry() {
        let mut bbox = AABB::new(Vector3f::new(1.0, 7.0, 3.0), Vector3f::new(4.0, 4.0, 4.0));

        let center = bbox.center();
        assert!((center[0] - 2.5).abs() < 1e-6);
        assert!((center[1] - 5.5).abs() < 1e-6);
        assert!((center[2] - 3.5).abs() < 1e-6);

        assert!((bbox.surface_area() - 30.0).abs() < 1e-5);

        bbox.expand_by_point(&Vector3f::new(-1.0, 5.0, 6.0));
        assert!((bbox.p_min[0] + 1.0).abs() < 1e-6);
        assert!((bbox.p_max[2] - 6.0).abs() < 1e-6);
        assert_eq!(bbox.largest_axis(), 0);
    }

    #[test]
    fn test_extend_then_encloses() {
        let mut rng = LcgRng::new(7);
        let mut bbox = AABB::default();

        for _ in 0..256 {
            let p = Vector3f::new(
                rng.next_f32() * 20.0 - 10.0,
                rng.next_f32() * 20.0 - 10.0,
                rng.next_f32() * 20.0 - 10.0,
            );
            bbox.expand_by_point(&p);
            assert!(bbox.encloses(&p));
        }
    }

    #[test]
    fn test_degenerate_box() {
        let point = Vector3f::new(1.0, 2.0, 3.0);
        let bbox = AABB::new(point, point);

        assert_eq!(bbox.surface_area(), 0.0);
        assert_eq!(bbox.largest_axis(), 0);
        assert!(bbox.encloses(&point));
    }

    #[test]
    fn test_largest_axis_tie_break() {
        let bbox = AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(2.0, 2.0, 1.0));
        assert_eq!(bbox.largest_axis(), 0);

        let bbox = AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 2.0, 2.0));
        assert_eq!(bbox.largest_axis(), 1);
    }

    #[test]
    fn test_ray_starts_inside_reports_far_hit() {
        let bbox = AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0));
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.3, 0.5, 0.8));

        let branched = bbox.intersect_branched(&ray);
        let fast = bbox.intersect_fast(&ray);

        assert!(branched.is_some());
        assert!(fast.is_some());
        // Entry distance is behind the origin; the hit came from the exit distance
        assert!(branched.unwrap() < 0.0);
        assert!(fast.unwrap() < 0.0);
    }

    #[test]
    fn test_box_behind_ray_misses() {
        let bbox = AABB::new(Vector3f::new(-3.0, -1.0, -1.0), Vector3f::new(-2.0, 1.0, 1.0));
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 0.1, 0.1));

        assert!(bbox.intersect_branched(&ray).is_none());
        assert!(bbox.intersect_fast(&ray).is_none());
    }

    fn random_unit_interval(rng: &mut LcgRng, scale: Float) -> Float {
        rng.next_f32() * 2.0 * scale - scale
    }

    #[test]
    fn test_branched_and_fast_agree() {
        let mut rng = LcgRng::new(42);

        for _ in 0..4096 {
            let a = Vector3f::new(
                random_unit_interval(&mut rng, 5.0),
                random_unit_interval(&mut rng, 5.0),
                random_unit_interval(&mut rng, 5.0),
            );
            let b = Vector3f::new(
                random_unit_interval(&mut rng, 5.0),
                random_unit_interval(&mut rng, 5.0),
                random_unit_interval(&mut rng, 5.0),
            );
            let bbox = AABB::new(a, b);

            let origin = Vector3f::new(
                random_unit_interval(&mut rng, 8.0),
                random_unit_interval(&mut rng, 8.0),
                random_unit_interval(&mut rng, 8.0),
            );
            // Keep all direction components away from zero
            let mut dir = Vector3f::new(0.0, 0.0, 0.0);
            for idx in 0..3 {
                let v = random_unit_interval(&mut rng, 1.0);
                dir[idx] = if v >= 0.0 { v + 0.05 } else { v - 0.05 };
            }
            let ray = Ray3f::new(origin, dir);

            let branched = bbox.intersect_branched(&ray);
            let fast = bbox.intersect_fast(&ray);

            assert_eq!(branched.is_some(), fast.is_some());
            if let (Some(t0), Some(t1)) = (branched, fast) {
                assert!((t0 - t1).abs() < 1e-4);
            }
        }
    }
}
