// Copyright @yucwang 2026

use crate::core::integrator::Integrator;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::materials::ALL_LOBES;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

// Empirical survival threshold, kept as the configurable default
const RR_THRESHOLD: Float = 0.2;

// Bounce origins move off the surface along the geometric normal
const ORIGIN_OFFSET: Float = 1e-4;

/// Forward unidirectional path tracer with Russian-roulette termination.
pub struct PathIntegrator {
    pub max_bounces: u32,
    pub samples_per_pixel: u32,
    pub lobe_mask: u8,
    pub rr_threshold: Float,
    pub use_environment: bool,
}

impl PathIntegrator {
    pub fn new(max_bounces: u32, samples_per_pixel: u32) -> Self {
        Self {
            max_bounces,
            samples_per_pixel,
            lobe_mask: ALL_LOBES,
            rr_threshold: RR_THRESHOLD,
            use_environment: true,
        }
    }

    pub fn with_lobe_mask(mut self, lobe_mask: u8) -> Self {
        self.lobe_mask = lobe_mask;
        self
    }

    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }
}

impl Integrator for PathIntegrator {
    fn trace(&self, scene: &Scene, mut ray: Ray3f, rng: &mut LcgRng) -> RGBSpectrum {
        let mut throughput = RGBSpectrum::splat(1.0);

        for _bounce in 0..self.max_bounces {
            let hit = match scene.find_nearest(&ray) {
                Some(hit) => hit,
                None => {
                    // Escaped into the distant lighting, if there is any
                    return match (self.use_environment, scene.environment()) {
                        (true, Some(environment)) => {
                            throughput * environment.radiance(&ray.dir())
                        }
                        _ => RGBSpectrum::black(),
                    };
                }
            };

            let object = &scene.objects()[hit.index];

            // Emissive surfaces terminate the walk and pay out the carried
            // throughput
            if let Some(emission) = &object.emission {
                return throughput * emission.radiance();
            }

            if self.lobe_mask == 0 {
                return RGBSpectrum::black();
            }

            let position = ray.at(hit.t);
            let surface = object.primitive.surface_data(position, ray.dir());

            let (stack, shading_normal) = object.material.create_brdf(&surface);
            let outgoing = -ray.dir();

            let sample = match stack.sample(&outgoing, &shading_normal, self.lobe_mask, rng) {
                Some(sample) => sample,
                None => return RGBSpectrum::black(),
            };
            if sample.value.is_black() || sample.pdf <= 0.0 {
                return RGBSpectrum::black();
            }

            // Cosine from the shading normal, but the geometric normal
            // decides which hemisphere counts: normal mapping may disagree
            let cos_factor = if surface.normal.dot(&sample.incoming) > 0.0 {
                shading_normal.dot(&sample.incoming)
            } else {
                0.0
            };
            if cos_factor <= 0.0 {
                return RGBSpectrum::black();
            }

            throughput *= sample.value * (cos_factor / sample.pdf);
            if throughput.is_black() {
                return RGBSpectrum::black();
            }

            ray = Ray3f::new(position + surface.normal * ORIGIN_OFFSET, sample.incoming);

            // Russian roulette: dim paths survive with probability equal to
            // their brightest channel and are reweighted to stay unbiased
            let survival = throughput.max_channel();
            if survival < self.rr_threshold {
                if rng.next_f32() > survival {
                    return RGBSpectrum::black();
                }
                throughput /= survival;
            }
        }

        RGBSpectrum::black()
    }

    fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::LambertianMaterial;
    use crate::core::scene::{ConstantEnvironment, Emission, SceneObject};
    use crate::math::constants::Vector3f;
    use crate::shapes::Sphere;
    use std::sync::Arc;

    fn black_material() -> Arc<LambertianMaterial> {
        Arc::new(LambertianMaterial::from_value(RGBSpectrum::splat(0.0)))
    }

    #[test]
    fn test_miss_returns_environment_radiance() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(0.0, 100.0, 0.0), 1.0).into(),
            black_material(),
        ));
        scene.set_environment(Arc::new(ConstantEnvironment::new(RGBSpectrum::splat(0.25))));
        scene.build_bvh().unwrap();

        let integrator = PathIntegrator::new(4, 1);
        let mut rng = LcgRng::new(1);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));

        let radiance = integrator.trace(&scene, ray, &mut rng);
        assert!((radiance[0] - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_miss_without_environment_is_black() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(0.0, 100.0, 0.0), 1.0).into(),
            black_material(),
        ));
        scene.set_environment(Arc::new(ConstantEnvironment::new(RGBSpectrum::splat(0.25))));
        scene.build_bvh().unwrap();

        let integrator = PathIntegrator::new(4, 1).without_environment();
        let mut rng = LcgRng::new(1);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));

        assert!(integrator.trace(&scene, ray, &mut rng).is_black());
    }

    #[test]
    fn test_direct_emissive_hit_pays_out_emission() {
        let mut scene = Scene::new();
        scene.add_object(
            SceneObject::new(
                Sphere::new(Vector3f::new(0.0, 0.0, -5.0), 1.0).into(),
                black_material(),
            )
            .with_emission(Emission::uniform(7.0)),
        );
        scene.build_bvh().unwrap();

        let integrator = PathIntegrator::new(4, 1);
        let mut rng = LcgRng::new(1);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));

        let radiance = integrator.trace(&scene, ray, &mut rng);
        assert!((radiance[0] - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_lobe_mask_terminates_black() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(0.0, 0.0, -5.0), 1.0).into(),
            Arc::new(LambertianMaterial::from_value(RGBSpectrum::splat(0.8))),
        ));
        scene.set_environment(Arc::new(ConstantEnvironment::new(RGBSpectrum::splat(1.0))));
        scene.build_bvh().unwrap();

        let integrator = PathIntegrator::new(4, 1).with_lobe_mask(0);
        let mut rng = LcgRng::new(1);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));

        assert!(integrator.trace(&scene, ray, &mut rng).is_black());
    }

    // A diffuse surface lit by a uniform environment reflects albedo times
    // the environment radiance; with one bounce the estimate converges there
    #[test]
    fn test_single_bounce_converges_to_albedo_times_environment() {
        let albedo = 0.6;
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(0.0, 0.0, -5.0), 1.0).into(),
            Arc::new(LambertianMaterial::from_value(RGBSpectrum::splat(albedo))),
        ));
        scene.set_environment(Arc::new(ConstantEnvironment::new(RGBSpectrum::splat(1.0))));
        scene.build_bvh().unwrap();

        // High roulette floor disabled by setting the threshold to zero so
        // every sample runs its full two bounces
        let mut integrator = PathIntegrator::new(2, 1);
        integrator.rr_threshold = 0.0;

        let mut rng = LcgRng::new(42);
        let n = 20_000;
        let mut mean = 0.0;
        for _ in 0..n {
            let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));
            mean += integrator.trace(&scene, ray, &mut rng)[0];
        }
        mean /= n as Float;

        assert!((mean - albedo).abs() < 0.02, "estimated reflectance {}", mean);
    }

    #[test]
    fn test_bounce_exhaustion_is_black() {
        // Two facing diffuse spheres and no lights: every path dies by
        // exhaustion or roulette with zero contribution
        let mut scene = Scene::new();
        let material = Arc::new(LambertianMaterial::from_value(RGBSpectrum::splat(0.9)));
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(0.0, 0.0, -5.0), 1.0).into(),
            material.clone(),
        ));
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0).into(),
            material,
        ));
        scene.build_bvh().unwrap();

        let integrator = PathIntegrator::new(3, 1);
        let mut rng = LcgRng::new(9);
        for _ in 0..128 {
            let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));
            assert!(integrator.trace(&scene, ray, &mut rng).is_black());
        }
    }
}
