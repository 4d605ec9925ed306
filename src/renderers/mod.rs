// Copyright @yucwang 2021

pub mod renderer;
pub mod simple;

pub use renderer::Renderer;
pub use simple::BlockRenderer;
