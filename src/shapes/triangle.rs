// Copyright @yucwang 2023

use crate::core::interaction::SurfaceData;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

use std::sync::Arc;

const TRIANGLE_EPSILON: Float = 1e-6;

/// Shared vertex storage for a batch of indexed triangles. Attribute arrays
/// other than positions may be empty; triangles fall back to their
/// geometric normal and zero UVs.
pub struct TriMesh {
    pub positions: Vec<Vector3f>,
    pub normals: Vec<Vector3f>,
    pub uvs: Vec<Vector2f>,
    pub tangents: Vec<Vector3f>,
    pub bitangents: Vec<Vector3f>,
}

impl TriMesh {
    pub fn new(positions: Vec<Vector3f>, normals: Vec<Vector3f>, uvs: Vec<Vector2f>) -> Self {
        Self {
            positions,
            normals,
            uvs,
            tangents: Vec::new(),
            bitangents: Vec::new(),
        }
    }

    pub fn with_tangents(mut self, tangents: Vec<Vector3f>, bitangents: Vec<Vector3f>) -> Self {
        self.tangents = tangents;
        self.bitangents = bitangents;
        self
    }
}

pub struct Triangle {
    a: usize,
    b: usize,
    c: usize,
    mesh: Arc<TriMesh>,
}

impl Triangle {
    pub fn new(a: usize, b: usize, c: usize, mesh: Arc<TriMesh>) -> Self {
        Self { a, b, c, mesh }
    }

    pub fn vertices(&self) -> (Vector3f, Vector3f, Vector3f) {
        (
            self.mesh.positions[self.a],
            self.mesh.positions[self.b],
            self.mesh.positions[self.c],
        )
    }

    pub fn bounding_box(&self) -> AABB {
        let (a, b, c) = self.vertices();

        let mut bbox = AABB::default();
        bbox.expand_by_point(&a);
        bbox.expand_by_point(&b);
        bbox.expand_by_point(&c);
        bbox
    }

    pub fn center(&self) -> Vector3f {
        let (a, b, c) = self.vertices();
        a + ((b - a) + (c - a)) / 3.0
    }

    pub fn geometric_normal(&self) -> Vector3f {
        let (a, b, c) = self.vertices();
        (b - a).cross(&(c - a)).normalize()
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<Float> {
        let (a, b, c) = self.vertices();

        let normal = (b - a).cross(&(c - a)).normalize();

        let denominator = -normal.dot(&ray.dir());
        let t = -normal.dot(&(a - ray.origin())) / denominator;

        // Also rejects the NaN a parallel ray produces
        if !(t > TRIANGLE_EPSILON) {
            return None;
        }

        let hit_pos = ray.at(t);

        let is_left_of_ab = (b - a).cross(&(hit_pos - a)).dot(&normal) > 0.0;
        let is_left_of_bc = (c - b).cross(&(hit_pos - b)).dot(&normal) > 0.0;
        let is_left_of_ca = (a - c).cross(&(hit_pos - c)).dot(&normal) > 0.0;

        if is_left_of_ab && is_left_of_bc && is_left_of_ca {
            Some(t)
        } else {
            None
        }
    }

    /// Shading attributes from area-ratio barycentrics, computed here
    /// rather than cached at intersection time:
    ///   U = area(CAP)/area(ABC) weights B
    ///   V = area(ABP)/area(ABC) weights C
    ///   W = area(BCP)/area(ABC) weights A
    pub fn surface_data(&self, p: Vector3f, _ray_dir: Vector3f) -> SurfaceData {
        let (a, b, c) = self.vertices();

        let ab = b - a;
        let bc = c - b;
        let ca = a - c;

        let abc_area = ab.cross(&-ca).norm() / 2.0;
        let abp_area = ab.cross(&(p - a)).norm() / 2.0;
        let bcp_area = bc.cross(&(p - b)).norm() / 2.0;
        let cap_area = ca.cross(&(p - c)).norm() / 2.0;

        let u = cap_area / abc_area;
        let v = abp_area / abc_area;
        let w = bcp_area / abc_area;

        let mesh = &self.mesh;
        let mut surface = SurfaceData::default();

        surface.uv = if mesh.uvs.is_empty() {
            Vector2f::new(0.0, 0.0)
        } else {
            u * mesh.uvs[self.b] + v * mesh.uvs[self.c] + w * mesh.uvs[self.a]
        };

        surface.normal = if mesh.normals.is_empty() {
            self.geometric_normal()
        } else {
            (u * mesh.normals[self.b] + v * mesh.normals[self.c] + w * mesh.normals[self.a])
                .normalize()
        };

        if !mesh.tangents.is_empty() {
            surface.tangent = (u * mesh.tangents[self.b]
                + v * mesh.tangents[self.c]
                + w * mesh.tangents[self.a])
                .normalize();
        }
        if !mesh.bitangents.is_empty() {
            surface.bitangent = (u * mesh.bitangents[self.b]
                + v * mesh.bitangents[self.c]
                + w * mesh.bitangents[self.a])
                .normalize();
        }

        surface
    }
}
