// Copyright @yucwang 2023

use super::constants::{Float, Vector2f, Vector3f, INV_PI, PI};

pub fn sample_uniform_hemisphere(u: &Vector2f) -> Vector3f {
    let z: Float = u.x;
    let r: Float = (1.0 - z * z).max(0.0).sqrt();
    let phi: Float = 2.0 * PI * u.y;

    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn uniform_hemisphere_pdf() -> Float {
    INV_PI / 2.0
}

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r: Float;

    if r1 == 0.0 && r2 == 0.0 {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(u);
    let z = (1.0 - p.x * p.x - p.y * p.y).max(0.0).sqrt();

    Vector3f::new(p.x, p.y, z)
}

pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

/// Beckmann micro-normal sample: tan²θ = -α²·ln(u₁), φ = 2π·u₂.
pub fn sample_beckmann(u: &Vector2f, roughness: Float) -> Vector3f {
    let phi = u.y * 2.0 * PI;

    // ln(0) is -inf, nudge the sample off the bound
    let log_sample = (u.x + 1e-7).ln();
    let tan2_theta = -roughness * roughness * log_sample;

    let cos_theta = 1.0 / (1.0 + tan2_theta).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/* Tests for sampling warps */
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::LcgRng;

    #[test]
    fn test_cosine_hemisphere_stays_above_surface() {
        let mut rng = LcgRng::new(11);
        for _ in 0..1024 {
            let u = Vector2f::new(rng.next_f32(), rng.next_f32());
            let d = sample_cosine_hemisphere(&u);
            assert!(d.z >= 0.0);
            assert!((d.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_beckmann_concentrates_with_low_roughness(){
        let mut rng = LcgRng::new(13);
        let mut mean_cos_smooth = 0.0;
        let mut mean_cos_rough = 0.0;
        let n = 4096;
        for _ in 0..n {
            let u = Vector2f::new(rng.next_f32(), rng.next_f32());
            mean_cos_smooth += sample_beckmann(&u, 0.05).z;
            mean_cos_rough += sample_beckmann(&u, 0.8).z;
        }
        mean_cos_smooth /= n as Float;
        mean_cos_rough /= n as Float;

        // Smoother surfaces keep micro-normals closer to the z axis
        assert!(mean_cos_smooth > mean_cos_rough);
        assert!(mean_cos_smooth > 0.99);
    }
}
