//! Software triangle rasterizer with a small programmable shading pipeline.
//!
//! A [`Mesh`] is pushed through a [`Shader`]'s vertex stage, scanned into a
//! [`FrameBuffer`] with an integer depth test, and colored by the fragment
//! stage of the selected [`ShadingModel`]. [`Renderer`] ties it together.

pub mod error;
pub mod image;
pub mod math;
pub mod mesh;
pub mod scene;
pub mod texture;
pub mod transform;

pub use crate::error::{Error, MathError, Result};
pub use crate::image::{Color, FrameBuffer};
pub use crate::mesh::{Face, Mesh};
pub use crate::scene::{
    draw_triangle, FrameStats, MatrixSlot, PrimitiveMode, Rasterized, RenderSettings, Renderer,
    Shader, ShadingModel, Stage, TextureSlot, Transforms, Triangle, VectorSlot,
};
pub use crate::texture::Texture;
