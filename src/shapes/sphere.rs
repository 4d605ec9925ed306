// Copyright @yucwang 2026

use crate::core::interaction::SurfaceData;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, PI};
use crate::math::ray::Ray3f;

pub struct Sphere {
    origin: Vector3f,
    radius: Float,
}

impl Sphere {
    pub fn new(origin: Vector3f, radius: Float) -> Self {
        Self { origin, radius }
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    pub fn bounding_box(&self) -> AABB {
        let extent = Vector3f::new(self.radius, self.radius, self.radius);
        AABB::new(self.origin - extent, self.origin + extent)
    }

    pub fn center(&self) -> Vector3f {
        self.origin
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<Float> {
        let origin_to_center = self.origin - ray.origin();

        let proj = origin_to_center.dot(&ray.dir());
        if proj < 0.0 {
            return None;
        }

        let dxd = origin_to_center.dot(&origin_to_center) - proj * proj;
        if dxd > self.radius * self.radius {
            return None;
        }

        let half_inner_dist = (self.radius * self.radius - dxd).sqrt();

        let t0 = proj - half_inner_dist;
        let t1 = proj + half_inner_dist;

        if t0 < 0.0 && t1 < 0.0 {
            return None;
        }

        Some(if t0 > 0.0 { t0 } else { t1 })
    }

    pub fn surface_data(&self, p: Vector3f, _ray_dir: Vector3f) -> SurfaceData {
        let normal = (p - self.origin).normalize();

        SurfaceData {
            normal,
            uv: spherical_uv(&normal),
            ..SurfaceData::default()
        }
    }
}

/// Map a unit direction to [0,1]²: azimuth drives u, polar angle drives v.
fn spherical_uv(normal: &Vector3f) -> Vector2f {
    let polar = normal.y.max(-1.0).min(1.0).acos();
    let azimuth = normal.x.atan2(normal.z);

    Vector2f::new((azimuth + PI) / (2.0 * PI), polar / PI)
}
