// Copyright @yucwang 2026

use crate::core::bvh::{BuildRecord, Bvh, BvhBuildError, FlatNode};
use crate::core::material::{LambertianMaterial, Material, StandardMaterial};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::shapes::{Plane, Primitive, Sphere};

use std::sync::Arc;

/// Emitted radiance of a light-carrying primitive. Colors with a channel
/// above one are renormalized and the overflow folded into the intensity.
#[derive(Debug, Clone, Copy)]
pub struct Emission {
    color: RGBSpectrum,
    intensity: Float,
}

impl Emission {
    pub fn new(color: RGBSpectrum, intensity: Float) -> Self {
        let max = color.max_channel();
        if max > 1.0 {
            Self { color: color / max, intensity: max }
        } else {
            Self { color, intensity }
        }
    }

    pub fn uniform(intensity: Float) -> Self {
        Self::new(RGBSpectrum::splat(intensity), 1.0)
    }

    pub fn radiance(&self) -> RGBSpectrum {
        self.color * self.intensity
    }
}

/// Distant radiance keyed by a normalized direction. The equirectangular
/// HDR sampler lives with the image-decoding collaborator; this core only
/// consumes the interface.
pub trait Environment: Send + Sync {
    fn radiance(&self, direction: &Vector3f) -> RGBSpectrum;
}

pub struct ConstantEnvironment {
    radiance: RGBSpectrum,
}

impl ConstantEnvironment {
    pub fn new(radiance: RGBSpectrum) -> Self {
        Self { radiance }
    }
}

impl Environment for ConstantEnvironment {
    fn radiance(&self, _direction: &Vector3f) -> RGBSpectrum {
        self.radiance
    }
}

pub struct SceneObject {
    pub primitive: Primitive,
    pub material: Arc<dyn Material>,
    pub emission: Option<Emission>,
}

impl SceneObject {
    pub fn new(primitive: Primitive, material: Arc<dyn Material>) -> Self {
        Self { primitive, material, emission: None }
    }

    pub fn with_emission(mut self, emission: Emission) -> Self {
        self.emission = Some(emission);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SceneHit {
    pub t: Float,
    pub index: usize,
}

/// Owns every primitive and material. The BVH holds indices into this
/// storage and is rebuilt from scratch whenever the object list changes.
pub struct Scene {
    objects: Vec<SceneObject>,
    environment: Option<Arc<dyn Environment>>,
    scene_bounds: AABB,
    bvh: Option<Bvh>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            environment: None,
            scene_bounds: AABB::default(),
            bvh: None,
        }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
        self.bvh = None;
    }

    pub fn set_environment(&mut self, environment: Arc<dyn Environment>) {
        self.environment = Some(environment);
    }

    pub fn environment(&self) -> Option<&dyn Environment> {
        self.environment.as_deref()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn scene_bounds(&self) -> &AABB {
        &self.scene_bounds
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// One-shot blocking build over the current object list. Editing the
    /// scene afterwards discards the tree wholesale; there is no
    /// incremental update.
    pub fn build_bvh(&mut self) -> Result<(), BvhBuildError> {
        let mut scene_bounds = AABB::default();
        let records: Vec<BuildRecord> = self
            .objects
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let bounds = object.primitive.bounding_box();
                scene_bounds.expand_by_aabb(&bounds);
                BuildRecord {
                    bounds,
                    centroid: object.primitive.center(),
                    prim: index,
                }
            })
            .collect();

        self.bvh = Some(Bvh::build(records)?);
        self.scene_bounds = scene_bounds;

        Ok(())
    }

    fn bvh(&self) -> &Bvh {
        self.bvh
            .as_ref()
            .expect("BVH must be built before tracing rays")
    }

    pub fn find_nearest(&self, ray: &Ray3f) -> Option<SceneHit> {
        self.bvh()
            .find_nearest(ray, |index, ray| self.objects[index].primitive.intersect(ray))
            .map(|(index, t)| SceneHit { t, index })
    }

    pub fn occluded(&self, ray: &Ray3f, max_distance: Float) -> bool {
        self.bvh().occluded(ray, max_distance, |index, ray| {
            self.objects[index].primitive.intersect(ray)
        })
    }

    /// The flat node array handed to the GPU collaborator.
    pub fn flatten_bvh(&self) -> Vec<FlatNode> {
        self.bvh().flatten()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

// Built-in demo scenes; asset import lives outside this core.
impl Scene {
    pub fn cornell_box() -> Self {
        let mut scene = Scene::new();

        let yellow = RGBSpectrum::new(0.9, 0.6, 0.3);
        let red = RGBSpectrum::new(0.8, 0.1, 0.0);
        let green = RGBSpectrum::new(0.15, 0.4, 0.1);
        let white = RGBSpectrum::splat(0.7);

        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(-1.0, -2.0, 0.0), 1.0).into(),
            Arc::new(StandardMaterial::from_values(
                yellow,
                0.7,
                RGBSpectrum::splat(0.2),
            )),
        ));
        scene.add_object(SceneObject::new(
            Sphere::new(Vector3f::new(1.0, -2.0, 2.5), 1.0).into(),
            Arc::new(StandardMaterial::from_values(
                yellow,
                0.5,
                RGBSpectrum::splat(0.02),
            )),
        ));

        scene.add_object(
            SceneObject::new(
                Sphere::new(Vector3f::new(0.0, 12.9, 2.0), 10.0).into(),
                Arc::new(LambertianMaterial::from_value(RGBSpectrum::splat(0.0))),
            )
            .with_emission(Emission::uniform(10.0)),
        );

        let walls: [(Vector3f, Vector3f, RGBSpectrum); 5] = [
            (Vector3f::new(-3.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), red),
            (Vector3f::new(3.0, 0.0, 0.0), Vector3f::new(-1.0, 0.0, 0.0), green),
            (Vector3f::new(0.0, 3.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), white),
            (Vector3f::new(0.0, -3.0, 0.0), Vector3f::new(0.0, 1.0, 0.0), white),
            (Vector3f::new(0.0, 0.0, -1.0), Vector3f::new(0.0, 0.0, 1.0), white),
        ];
        for (origin, normal, color) in walls.iter() {
            scene.add_object(SceneObject::new(
                Plane::new(*origin, *normal, 4.0).into(),
                Arc::new(LambertianMaterial::from_value(*color)),
            ));
        }

        scene
    }

    pub fn sphere_grid(n: usize) -> Self {
        let mut scene = Scene::new();
        let mut rng = crate::core::rng::LcgRng::new(1234);

        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let half = (n / 2) as Float;
                    let pos = Vector3f::new(
                        (-half + 1.3 * x as Float) * 2.0,
                        (-half + 1.3 * z as Float) * 2.0,
                        (-half + 1.3 * y as Float) * 2.0,
                    );
                    let color = RGBSpectrum::new(
                        rng.next_f32(),
                        rng.next_f32(),
                        rng.next_f32(),
                    );
                    // Roughness and reflectance sweep over the grid
                    scene.add_object(SceneObject::new(
                        Sphere::new(pos, 1.0).into(),
                        Arc::new(StandardMaterial::from_values(
                            color,
                            y as Float / n as Float,
                            RGBSpectrum::splat(x as Float / n as Float),
                        )),
                    ));
                }
            }
        }

        scene.set_environment(Arc::new(ConstantEnvironment::new(RGBSpectrum::splat(0.6))));
        scene
    }

    pub fn floor() -> Self {
        let mut scene = Scene::new();

        scene.add_object(SceneObject::new(
            Plane::new(Vector3f::new(0.0, -1.0, 0.0), Vector3f::new(0.0, 1.0, 0.0), 8.0).into(),
            Arc::new(StandardMaterial::from_values(
                RGBSpectrum::splat(0.6),
                0.4,
                RGBSpectrum::splat(0.1),
            )),
        ));
        scene.add_object(
            SceneObject::new(
                Sphere::new(Vector3f::new(0.0, 4.0, 0.0), 1.5).into(),
                Arc::new(LambertianMaterial::from_value(RGBSpectrum::splat(0.0))),
            )
            .with_emission(Emission::new(RGBSpectrum::new(1.0, 0.9, 0.7), 12.0)),
        );

        scene.set_environment(Arc::new(ConstantEnvironment::new(RGBSpectrum::splat(0.05))));
        scene
    }
}
