// Copyright @yucwang 2026

pub mod cook_torrance;
pub mod lambertian;
pub mod mirror;
pub mod stack;

pub use cook_torrance::CookTorrance;
pub use lambertian::Lambertian;
pub use mirror::Mirror;
pub use stack::{BrdfSample, BrdfStack, Lobe, ALL_LOBES, LAMBERTIAN, MICROFACET, MIRROR};
