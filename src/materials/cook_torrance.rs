// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::materials::stack::BrdfSample;
use crate::math::constants::{Float, Vector3f, PI};
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::sample_beckmann;

/// Reflect `v` about `axis`. Both must be normalized.
pub fn reflect(v: &Vector3f, axis: &Vector3f) -> Vector3f {
    axis * (2.0 * axis.dot(v)) - v
}

/// Schlick approximation. The normal here is the sampled micro-normal, not
/// the geometric one; the dot can dip slightly negative from rounding which
/// would push the result past one, so it is clamped.
pub fn fresnel_schlick(f0: RGBSpectrum, incoming: &Vector3f, normal: &Vector3f) -> RGBSpectrum {
    let n_dot_i = normal.dot(incoming).max(0.0);
    f0 + (RGBSpectrum::splat(1.0) - f0) * (1.0 - n_dot_i).powi(5)
}

/// Beckmann distribution: exp(-tan²α / m²) / (π·m²·cos⁴α) with α the angle
/// between the normal and the half vector.
pub fn beckmann_d(normal: &Vector3f, half_vector: &Vector3f, roughness: Float) -> Float {
    // FP precision can push the dot slightly past one
    let n_dot_h = normal.dot(half_vector).min(1.0);

    let alpha = n_dot_h.acos();
    let tan_a = alpha.tan();
    let tan_a_2 = tan_a * tan_a;
    let cos_a = alpha.cos();
    let cos_a_4 = cos_a * cos_a * cos_a * cos_a;

    let roughness_2 = roughness * roughness;

    (-tan_a_2 / roughness_2).exp() / (PI * roughness_2 * cos_a_4)
}

/// V-cavity masking-shadowing term.
pub fn v_cavity_geometry(normal: &Vector3f, outgoing: &Vector3f, incoming: &Vector3f) -> Float {
    let half_vector = (incoming + outgoing).normalize();

    let n_dot_h = normal.dot(&half_vector);
    let o_dot_h = outgoing.dot(&half_vector);
    let n_dot_o = normal.dot(outgoing);
    let n_dot_i = normal.dot(incoming);

    let ratio = (2.0 * n_dot_h) / o_dot_h;
    (ratio * n_dot_o).min(ratio * n_dot_i).min(1.0)
}

pub struct CookTorrance {
    reflectance: RGBSpectrum,
    roughness: Float,
}

impl CookTorrance {
    /// Perceptual parameters: reflectance and roughness are squared.
    pub fn new(reflectance: RGBSpectrum, roughness: Float) -> Self {
        Self {
            reflectance: reflectance * reflectance,
            roughness: (roughness * roughness).max(1e-3),
        }
    }

    /// Texture-driven parameters, taken as-is.
    pub fn from_raw(reflectance: RGBSpectrum, roughness: Float) -> Self {
        Self {
            reflectance,
            roughness: roughness.max(1e-3),
        }
    }

    pub fn reflectance(&self) -> RGBSpectrum {
        self.reflectance
    }

    pub fn roughness(&self) -> Float {
        self.roughness
    }

    pub fn sample(
        &self,
        outgoing: &Vector3f,
        normal: &Vector3f,
        rng: &mut LcgRng,
    ) -> Option<BrdfSample> {
        let frame = Frame::from_normal(*normal);
        let micro_normal = frame.from_local(sample_beckmann(&rng.next_2d(), self.roughness));

        let incoming = reflect(outgoing, &micro_normal);

        // The stochastic micro-normal can reflect below the hemisphere, and
        // normal mapping can put the outgoing direction below it as well
        let n_dot_i = normal.dot(&incoming);
        let n_dot_o = normal.dot(outgoing);
        if n_dot_i <= 0.0 || n_dot_o <= 0.0 {
            return None;
        }

        // Microfacets are perfect mirrors, so H is the sampled micro-normal
        let half_vector = micro_normal;

        let fresnel = fresnel_schlick(self.reflectance, &incoming, &half_vector);
        let ndf = beckmann_d(normal, &half_vector, self.roughness);
        let geometry = v_cavity_geometry(normal, outgoing, &incoming);
        let denominator = 4.0 * n_dot_o * n_dot_i;

        let mut pdf =
            (ndf * normal.dot(&half_vector)) / (4.0 * half_vector.dot(outgoing).max(1e-3));
        if pdf == 0.0 {
            pdf = 1.0;
        }

        Some(BrdfSample {
            incoming,
            value: fresnel * (geometry * ndf / denominator),
            pdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_directions_stay_above_surface() {
        let brdf = CookTorrance::from_raw(RGBSpectrum::splat(0.8), 0.3);
        let normal = Vector3f::new(0.0, 0.0, 1.0);
        let outgoing = Vector3f::new(0.3, 0.0, 1.0).normalize();

        let mut rng = LcgRng::new(17);
        let mut accepted = 0;
        for _ in 0..2048 {
            if let Some(sample) = brdf.sample(&outgoing, &normal, &mut rng) {
                accepted += 1;
                assert!(sample.incoming.dot(&normal) > 0.0);
                assert!(sample.pdf > 0.0);
                assert!(sample.value[0].is_finite());
            }
        }
        assert!(accepted > 0);
    }

    #[test]
    fn test_smooth_surface_reflects_near_mirror_direction() {
        let brdf = CookTorrance::from_raw(RGBSpectrum::splat(1.0), 1e-3);
        let normal = Vector3f::new(0.0, 0.0, 1.0);
        let outgoing = Vector3f::new(0.5, 0.0, 1.0).normalize();
        let mirror = reflect(&outgoing, &normal);

        let mut rng = LcgRng::new(4);
        for _ in 0..256 {
            if let Some(sample) = brdf.sample(&outgoing, &normal, &mut rng) {
                assert!(sample.incoming.dot(&mirror) > 0.99);
            }
        }
    }

    #[test]
    fn test_below_hemisphere_outgoing_rejected() {
        let brdf = CookTorrance::from_raw(RGBSpectrum::splat(0.5), 0.2);
        let normal = Vector3f::new(0.0, 0.0, 1.0);
        let outgoing = Vector3f::new(0.0, 0.0, -1.0);

        let mut rng = LcgRng::new(8);
        for _ in 0..64 {
            assert!(brdf.sample(&outgoing, &normal, &mut rng).is_none());
        }
    }

    #[test]
    fn test_fresnel_rises_at_grazing_angles() {
        let f0 = RGBSpectrum::splat(0.04);
        let normal = Vector3f::new(0.0, 0.0, 1.0);

        let head_on = fresnel_schlick(f0, &Vector3f::new(0.0, 0.0, 1.0), &normal);
        let grazing =
            fresnel_schlick(f0, &Vector3f::new(0.999, 0.0, 0.04).normalize(), &normal);

        assert!((head_on[0] - 0.04).abs() < 1e-5);
        assert!(grazing[0] > head_on[0]);
        assert!(grazing[0] <= 1.0);
    }
}
