// Copyright @yucwang 2023

use crate::math::constants::{Vector2f, Vector3f};

/// Local geometry at a hit point. Built on demand by the primitive that was
/// hit and consumed by the material when it assembles a BRDF stack.
pub struct SurfaceData {
    pub normal: Vector3f,
    pub uv: Vector2f,
    pub tangent: Vector3f,
    pub bitangent: Vector3f,
}

impl Default for SurfaceData {
    fn default() -> Self {
        Self {
            normal: Vector3f::new(0.0, 0.0, 0.0),
            uv: Vector2f::new(0.0, 0.0),
            tangent: Vector3f::new(0.0, 0.0, 0.0),
            bitangent: Vector3f::new(0.0, 0.0, 0.0),
        }
    }
}
