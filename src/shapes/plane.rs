// Copyright @yucwang 2026

use crate::core::interaction::SurfaceData;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

// Self-intersection guard for the plane equation solve
const PLANE_EPSILON: Float = 1e-5;

/// A plane clipped to a finite disk around its origin. Unbounded planes
/// would defeat the bounding hierarchy, the disk keeps them indexable.
pub struct Plane {
    origin: Vector3f,
    normal: Vector3f,
    disk_radius: Float,
    double_sided: bool,
}

impl Plane {
    pub fn new(origin: Vector3f, normal: Vector3f, disk_radius: Float) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
            disk_radius,
            double_sided: false,
        }
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn disk_radius(&self) -> Float {
        self.disk_radius
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }

    pub fn bounding_box(&self) -> AABB {
        let extent = Vector3f::new(self.disk_radius, self.disk_radius, self.disk_radius);
        AABB::new(self.origin - extent, self.origin + extent)
    }

    pub fn center(&self) -> Vector3f {
        self.origin
    }

    /// For a plane with normal N through P₀, a point P lies on it when
    /// (P - P₀)·N = 0. With P = O + t·d this solves to
    /// t = ((P₀ - O)·N) / (d·N).
    pub fn intersect(&self, ray: &Ray3f) -> Option<Float> {
        let denominator = -self.normal.dot(&ray.dir());

        // Back-facing rays miss unless the plane is double sided
        if !self.double_sided && denominator <= 0.0 {
            return None;
        }

        let t = -self.normal.dot(&(self.origin - ray.origin())) / denominator;

        if !(t > PLANE_EPSILON) {
            return None;
        }

        let dist_to_plane_origin = (ray.at(t) - self.origin).norm_squared();
        if dist_to_plane_origin <= self.disk_radius * self.disk_radius {
            Some(t)
        } else {
            None
        }
    }

    pub fn surface_data(&self, _p: Vector3f, ray_dir: Vector3f) -> SurfaceData {
        // Face the incoming ray when both sides are live
        let normal = if self.double_sided && self.normal.dot(&-ray_dir) < 0.0 {
            -self.normal
        } else {
            self.normal
        };

        SurfaceData { normal, ..SurfaceData::default() }
    }
}
