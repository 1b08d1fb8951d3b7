use std::path::{Path, PathBuf};

use restir_gpu::SdfSceneParams;

/// How the G-buffer gets filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GBufferMode {
    /// Render pass drawing into colour and depth attachments.
    #[default]
    Raster,

    /// Compute shader ray-marching an SDF scene into storage images.
    Compute,
}

impl GBufferMode {
    pub fn is_compute(self) -> bool {
        matches!(self, Self::Compute)
    }
}

/// How the resampling passes test visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TracingMode {
    /// Shadow rays against an AABB tree uploaded to storage buffers.
    #[default]
    Software,

    /// No visibility tests; every candidate is assumed visible.
    Disabled,
}

impl TracingMode {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Software)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RendererConfig {
    pub gbuffer: GBufferMode,
    pub tracing: TracingMode,

    /// Number of emissive samples drawn each frame
    pub emissive_sample_count: u32,

    /// Directory containing `shaders/*.spv`
    pub shader_dir: PathBuf,

    /// Seeds the per-frame emissive-sampling seeds
    pub seed: u64,

    pub sdf_scene: SdfSceneParams,
}

impl RendererConfig {
    pub fn with_gbuffer(mut self, gbuffer: GBufferMode) -> Self {
        self.gbuffer = gbuffer;
        self
    }

    pub fn with_tracing(mut self, tracing: TracingMode) -> Self {
        self.tracing = tracing;
        self
    }

    pub fn with_emissive_sample_count(mut self, count: u32) -> Self {
        self.emissive_sample_count = count;
        self
    }

    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sdf_scene(mut self, sdf_scene: SdfSceneParams) -> Self {
        self.sdf_scene = sdf_scene;
        self
    }

    /// Resolves a shader binary name, e.g. `gBuffer.vert.spv`.
    pub fn shader_path(&self, name: &str) -> PathBuf {
        shader_path(&self.shader_dir, name)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gbuffer: Default::default(),
            tracing: Default::default(),
            emissive_sample_count: 1024,
            shader_dir: PathBuf::from("."),
            seed: 0,
            sdf_scene: Default::default(),
        }
    }
}

fn shader_path(dir: &Path, name: &str) -> PathBuf {
    dir.join("shaders").join(name)
}
