// Copyright @yucwang 2023

use crate::core::rng::LcgRng;
use crate::materials::stack::BrdfSample;
use crate::math::constants::{Vector3f, INV_PI};
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::sample_cosine_hemisphere;

pub struct Lambertian {
    albedo: RGBSpectrum,
}

impl Lambertian {
    pub fn new(albedo: RGBSpectrum) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> RGBSpectrum {
        self.albedo
    }

    pub fn sample(
        &self,
        _outgoing: &Vector3f,
        normal: &Vector3f,
        rng: &mut LcgRng,
    ) -> Option<BrdfSample> {
        let frame = Frame::from_normal(*normal);
        let incoming = frame.from_local(sample_cosine_hemisphere(&rng.next_2d()));

        let cos_theta = incoming.dot(normal);

        Some(BrdfSample {
            incoming,
            value: self.albedo * INV_PI,
            pdf: cos_theta * INV_PI,
        })
    }
}
