// Copyright @yucwang 2026

pub mod constant;

pub use constant::ConstantTexture;
