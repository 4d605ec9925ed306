// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::materials::cook_torrance::{fresnel_schlick, reflect, CookTorrance};
use crate::materials::lambertian::Lambertian;
use crate::materials::mirror::Mirror;
use crate::math::constants::{Float, Vector3f};
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::sample_beckmann;

pub const LAMBERTIAN: u8 = 0b0001;
pub const MICROFACET: u8 = 0b0010;
pub const MIRROR: u8 = 0b0100;
pub const ALL_LOBES: u8 = LAMBERTIAN | MICROFACET | MIRROR;

const LOBE_CAPACITY: usize = 2;

pub struct BrdfSample {
    pub incoming: Vector3f,
    pub value: RGBSpectrum,
    pub pdf: Float,
}

pub enum Lobe {
    Lambertian(Lambertian),
    CookTorrance(CookTorrance),
    Mirror(Mirror),
}

impl Lobe {
    pub fn flag(&self) -> u8 {
        match self {
            Lobe::Lambertian(_) => LAMBERTIAN,
            Lobe::CookTorrance(_) => MICROFACET,
            Lobe::Mirror(_) => MIRROR,
        }
    }

    pub fn sample(
        &self,
        outgoing: &Vector3f,
        normal: &Vector3f,
        rng: &mut LcgRng,
    ) -> Option<BrdfSample> {
        match self {
            Lobe::Lambertian(lambertian) => lambertian.sample(outgoing, normal, rng),
            Lobe::CookTorrance(cook_torrance) => cook_torrance.sample(outgoing, normal, rng),
            Lobe::Mirror(mirror) => mirror.sample(outgoing, normal, rng),
        }
    }
}

/// A material's reflectance lobes at one shading point. Built fresh per hit
/// and dropped right after sampling, so it lives entirely on the stack.
pub struct BrdfStack {
    lobes: [Option<Lobe>; LOBE_CAPACITY],
}

impl BrdfStack {
    pub fn single(lobe: Lobe) -> Self {
        Self { lobes: [Some(lobe), None] }
    }

    /// The usual diffuse + specular pairing driven by texture values.
    pub fn standard(albedo: RGBSpectrum, reflectance: RGBSpectrum, roughness: Float) -> Self {
        Self {
            lobes: [
                Some(Lobe::Lambertian(Lambertian::new(albedo))),
                Some(Lobe::CookTorrance(CookTorrance::from_raw(reflectance, roughness))),
            ],
        }
    }

    fn active_lobes(&self) -> impl Iterator<Item = &Lobe> {
        self.lobes.iter().filter_map(|lobe| lobe.as_ref())
    }

    pub fn lobe_count(&self) -> usize {
        self.active_lobes().count()
    }

    pub fn matching_count(&self, mask: u8) -> usize {
        self.active_lobes().filter(|lobe| lobe.flag() & mask != 0).count()
    }

    fn cook_torrance(&self) -> Option<&CookTorrance> {
        self.active_lobes().find_map(|lobe| match lobe {
            Lobe::CookTorrance(cook_torrance) => Some(cook_torrance),
            _ => None,
        })
    }

    /// Sample one lobe enabled by `mask` and weight the result by the
    /// reciprocal of its selection probability: discrete-choice Monte
    /// Carlo, never a weighted sum of both lobes.
    pub fn sample(
        &self,
        outgoing: &Vector3f,
        normal: &Vector3f,
        mask: u8,
        rng: &mut LcgRng,
    ) -> Option<BrdfSample> {
        let matching = self.matching_count(mask);
        if matching == 0 {
            return None;
        }

        let (lobe, selection_weight) = if matching == 1 {
            let lobe = self.active_lobes().find(|lobe| lobe.flag() & mask != 0)?;
            (lobe, 1.0)
        } else {
            let mut index = (rng.next_f32() * matching as Float) as usize;
            if index >= matching {
                index = matching - 1;
            }
            let lobe = self
                .active_lobes()
                .filter(|lobe| lobe.flag() & mask != 0)
                .nth(index)?;
            (lobe, matching as Float)
        };

        let mut weight = RGBSpectrum::splat(selection_weight);

        // Light the specular lobe already reflects never enters the
        // material, so a diffuse pick alongside an active microfacet lobe
        // is scaled by (1 - Fresnel); the microfacet lobe carries its own
        // Fresnel term, the Lambertian does not.
        if lobe.flag() == LAMBERTIAN && mask & (LAMBERTIAN | MICROFACET) == (LAMBERTIAN | MICROFACET)
        {
            if let Some(cook_torrance) = self.cook_torrance() {
                let fresnel = sample_fresnel_beckmann(
                    cook_torrance.reflectance(),
                    cook_torrance.roughness(),
                    outgoing,
                    normal,
                    rng,
                );
                weight *= RGBSpectrum::splat(1.0) - fresnel;
            }
        }

        let sample = lobe.sample(outgoing, normal, rng)?;

        Some(BrdfSample {
            incoming: sample.incoming,
            value: weight * sample.value,
            pdf: sample.pdf,
        })
    }
}

/// Fresnel along a freshly sampled specular direction, used to weight the
/// diffuse lobe of a diffuse/specular stack.
fn sample_fresnel_beckmann(
    reflectance: RGBSpectrum,
    roughness: Float,
    outgoing: &Vector3f,
    normal: &Vector3f,
    rng: &mut LcgRng,
) -> RGBSpectrum {
    let frame = Frame::from_normal(*normal);
    let micro_normal = frame.from_local(sample_beckmann(&rng.next_2d(), roughness));
    let specular_ray = reflect(outgoing, &micro_normal);

    let half_vector = (specular_ray + outgoing).normalize();
    fresnel_schlick(reflectance, &specular_ray, &half_vector)
}
