// Copyright @yucwang 2026

use crate::core::interaction::SurfaceData;
use crate::core::texture::Texture;
use crate::materials::{BrdfStack, Lobe, Mirror};
use crate::materials::lambertian::Lambertian;
use crate::math::constants::{Float, Vector3f};
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::textures::constant::ConstantTexture;

use std::sync::Arc;

/// A material turns the local surface data into a fresh BRDF stack plus the
/// shading normal to evaluate it with (perturbed when a normal map is
/// present, the interpolated surface normal otherwise).
pub trait Material: Send + Sync {
    fn create_brdf(&self, surface: &SurfaceData) -> (BrdfStack, Vector3f);
}

/// Diffuse + microfacet material with texture-driven parameters.
pub struct StandardMaterial {
    albedo: Arc<dyn Texture>,
    roughness: Arc<dyn Texture>,
    reflectance: Arc<dyn Texture>,
    normal_map: Option<Arc<dyn Texture>>,
}

impl StandardMaterial {
    pub fn new(
        albedo: Arc<dyn Texture>,
        roughness: Arc<dyn Texture>,
        reflectance: Arc<dyn Texture>,
    ) -> Self {
        Self {
            albedo,
            roughness,
            reflectance,
            normal_map: None,
        }
    }

    pub fn from_values(albedo: RGBSpectrum, roughness: Float, reflectance: RGBSpectrum) -> Self {
        Self {
            albedo: Arc::new(ConstantTexture::new(albedo)),
            roughness: Arc::new(ConstantTexture::splat(roughness)),
            reflectance: Arc::new(ConstantTexture::new(reflectance)),
            normal_map: None,
        }
    }

    pub fn with_normal_map(mut self, normal_map: Arc<dyn Texture>) -> Self {
        self.normal_map = Some(normal_map);
        self
    }
}

impl Material for StandardMaterial {
    fn create_brdf(&self, surface: &SurfaceData) -> (BrdfStack, Vector3f) {
        let albedo = self.albedo.eval(surface.uv);
        let roughness = self.roughness.eval(surface.uv)[0];
        let reflectance = self.reflectance.eval(surface.uv);

        let stack = BrdfStack::standard(albedo, reflectance, roughness);

        let mut shading_normal = surface.normal;
        if let Some(normal_map) = &self.normal_map {
            // Texel is stored in [0, 1], remap to [-1, 1] tangent space and
            // rotate into the surface frame
            let texel = normal_map.eval(surface.uv);
            let local =
                (Vector3f::new(texel[0], texel[1], texel[2]) * 2.0 - Vector3f::new(1.0, 1.0, 1.0))
                    .normalize();
            shading_normal = Frame::from_tangents(surface.tangent, surface.bitangent, surface.normal)
                .from_local(local)
                .normalize();
        }

        (stack, shading_normal)
    }
}

pub struct LambertianMaterial {
    albedo: Arc<dyn Texture>,
}

impl LambertianMaterial {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }

    pub fn from_value(albedo: RGBSpectrum) -> Self {
        Self { albedo: Arc::new(ConstantTexture::new(albedo)) }
    }
}

impl Material for LambertianMaterial {
    fn create_brdf(&self, surface: &SurfaceData) -> (BrdfStack, Vector3f) {
        let albedo = self.albedo.eval(surface.uv);
        (
            BrdfStack::single(Lobe::Lambertian(Lambertian::new(albedo))),
            surface.normal,
        )
    }
}

pub struct MirrorMaterial {
    reflectance: Float,
}

impl Default for MirrorMaterial {
    fn default() -> Self {
        Self { reflectance: 0.8 }
    }
}

impl MirrorMaterial {
    pub fn new(reflectance: Float) -> Self {
        Self { reflectance }
    }
}

impl Material for MirrorMaterial {
    fn create_brdf(&self, surface: &SurfaceData) -> (BrdfStack, Vector3f) {
        (
            BrdfStack::single(Lobe::Mirror(Mirror::new(self.reflectance))),
            surface.normal,
        )
    }
}
