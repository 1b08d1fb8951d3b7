use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2, Vec4};

/// Push constants of the emissive-sampling pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct EmissiveSampleParams {
    pub sample_count: u32,
    pub seed: u32,
}

/// Per-frame uniforms shared by the G-buffer, resampling and unbiased-reuse
/// shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RestirUniforms {
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,
    pub prev_view_proj: Mat4,
    pub camera_position: Vec4,
    pub screen_size: UVec2,
    pub frame: u32,
    pub emissive_sample_count: u32,

    /// Number of fresh candidates streamed into each reservoir per frame
    pub initial_candidates: u32,

    /// Radius (in pixels) of the spatial reuse
    pub spatial_radius: u32,

    /// Non-zero when the previous frame's reservoirs may be reused
    pub temporal_reuse: u32,

    /// Cap on the confidence carried over from history
    pub max_temporal_m: f32,
}

impl Default for RestirUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            inv_view_proj: Mat4::IDENTITY,
            prev_view_proj: Mat4::IDENTITY,
            camera_position: Vec4::W,
            screen_size: UVec2::ZERO,
            frame: 0,
            emissive_sample_count: 0,
            initial_candidates: 32,
            spatial_radius: 30,
            temporal_reuse: 1,
            max_temporal_m: crate::MAX_TEMPORAL_CONFIDENCE,
        }
    }
}

/// Parameters of the signed-distance-field scene ray-marched by the compute
/// G-buffer shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SdfSceneParams {
    /// Sphere: `xyz` = center, `w` = radius
    pub sdf_scene: Vec4,

    /// `x` = max distance, `y` = hit epsilon, `z` = max steps
    pub sdf_params: Vec4,
}

impl Default for SdfSceneParams {
    fn default() -> Self {
        Self {
            sdf_scene: Vec4::new(0.0, 0.0, 0.0, 1.0),
            sdf_params: Vec4::new(2000.0, 0.001, 128.0, 0.0),
        }
    }
}
