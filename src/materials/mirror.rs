// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::materials::cook_torrance::reflect;
use crate::materials::stack::BrdfSample;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

pub struct Mirror {
    reflectance: Float,
}

impl Default for Mirror {
    fn default() -> Self {
        Self { reflectance: 0.8 }
    }
}

impl Mirror {
    pub fn new(reflectance: Float) -> Self {
        Self { reflectance }
    }

    pub fn reflectance(&self) -> Float {
        self.reflectance
    }

    pub fn sample(
        &self,
        outgoing: &Vector3f,
        normal: &Vector3f,
        _rng: &mut LcgRng,
    ) -> Option<BrdfSample> {
        Some(BrdfSample {
            incoming: reflect(outgoing, normal),
            value: RGBSpectrum::splat(self.reflectance),
            pdf: 1.0,
        })
    }
}
