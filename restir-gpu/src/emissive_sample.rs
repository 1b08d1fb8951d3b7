use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Candidate point on an emissive surface, produced by the emissive-sampling
/// shader and consumed by the resampling shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct EmissiveSample {
    pub position: Vec3,
    pub triangle_id: u32,
    pub normal: Vec3,

    /// Probability density (w.r.t. area) of having picked this point
    pub pdf: f32,
    pub radiance: Vec3,
    pub area: f32,
}

impl EmissiveSample {
    /// Size of a single sample, in bytes.
    pub const STRIDE: usize = core::mem::size_of::<Self>();
}
