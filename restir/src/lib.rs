//! Frame-graph core of a ReSTIR (reservoir-based spatiotemporal importance
//! resampling) direct-lighting renderer.
//!
//! Every frame goes through four passes:
//!
//! - [`GBufferPass`] fills the current [`GBuffer`] (by rasterization or by a
//!   compute shader),
//! - [`EmissiveSamplePass`] draws candidate points on emissive triangles,
//! - [`RestirPass`] resamples them into per-pixel reservoirs, reusing the
//!   previous frame's reservoirs and G-buffer,
//! - [`UnbiasedReusePass`] corrects the bias spatial reuse introduces.
//!
//! The graphics API itself stays outside of this crate; see [`gpu`].

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::new_without_default)]

mod aabb_tree;
mod buffers;
mod config;
mod error;
mod formats;
mod gbuffer;
pub mod gpu;
mod pass;
mod passes;
mod renderer;
mod shader;

pub use restir_gpu as shared;

pub use self::aabb_tree::*;
pub use self::buffers::*;
pub use self::config::*;
pub use self::error::*;
pub use self::formats::*;
pub use self::gbuffer::*;
pub use self::pass::*;
pub use self::passes::*;
pub use self::renderer::*;
pub use self::shader::*;
