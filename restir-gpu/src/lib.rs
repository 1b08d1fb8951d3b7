//! Structs and algorithms shared between the renderer and its compute shaders.
//!
//! Everything that crosses the CPU/GPU boundary lives here as `#[repr(C)]`
//! plain-old-data, together with the reference implementation of the
//! resampling math the shaders perform.

#![allow(clippy::len_without_is_empty)]

mod aabb;
mod emissive_sample;
mod noise;
mod passes;
mod reservoir;

use glam::UVec2;

pub use self::aabb::*;
pub use self::emissive_sample::*;
pub use self::noise::*;
pub use self::passes::*;
pub use self::reservoir::*;

/// Workgroup size of the emissive-sampling shader (one-dimensional).
pub const EMISSIVE_SAMPLE_GROUP_SIZE: u32 = 64;

/// Workgroup size of the compute G-buffer shader.
pub const GBUFFER_GROUP_SIZE: UVec2 = UVec2::new(8, 8);

/// Workgroup size of the spatiotemporal resampling shader.
pub const RESTIR_GROUP_SIZE: UVec2 = UVec2::new(8, 8);

/// Workgroup size of the unbiased-reuse shader.
pub const UNBIASED_REUSE_GROUP_SIZE: UVec2 = UVec2::new(8, 8);

/// Maximum confidence a temporally reused reservoir is allowed to carry,
/// expressed as a multiple of the current frame's candidate count.
pub const MAX_TEMPORAL_CONFIDENCE: f32 = 20.0;

/// Returns the number of workgroups needed to cover `len` items.
pub const fn div_ceil(len: u32, group_size: u32) -> u32 {
    len.div_ceil(group_size)
}

/// Returns the number of workgroups needed to cover a 2D extent.
pub fn div_ceil2(size: UVec2, group_size: UVec2) -> UVec2 {
    UVec2::new(div_ceil(size.x, group_size.x), div_ceil(size.y, group_size.y))
}
