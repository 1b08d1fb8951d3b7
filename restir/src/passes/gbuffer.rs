use glam::UVec2;

use crate::gpu::{CommandBuffer, Pipeline, RenderPass, SharedDevice};
use crate::{
    ComputeGBufferPass, FormatSet, FrameContext, FrameResources, Pass,
    RasterGBufferPass, RendererConfig, Result,
};

/// Fills the current G-buffer, either by rasterization or by a compute
/// shader; which one is picked by [`crate::GBufferMode`].
#[derive(Debug)]
pub enum GBufferPass {
    Raster(RasterGBufferPass),
    Compute(ComputeGBufferPass),
}

impl GBufferPass {
    pub fn new(
        device: &SharedDevice,
        config: &RendererConfig,
        formats: &FormatSet,
        size: UVec2,
    ) -> Result<Self> {
        Ok(if config.gbuffer.is_compute() {
            Self::Compute(ComputeGBufferPass::new(device, config, formats)?)
        } else {
            Self::Raster(RasterGBufferPass::new(device, config, formats, size)?)
        })
    }

    /// Render pass the G-buffers' framebuffers have to be compatible with;
    /// `None` for the compute variant, which doesn't need framebuffers.
    pub fn render_pass(&self) -> Option<RenderPass> {
        match self {
            Self::Raster(pass) => Some(pass.render_pass()),
            Self::Compute(_) => None,
        }
    }

    pub fn bind(&mut self, device: &SharedDevice, resources: &FrameResources) {
        match self {
            Self::Raster(pass) => pass.bind(device, resources),
            Self::Compute(pass) => pass.bind(device, resources),
        }
    }

    pub fn resize(&mut self, device: &SharedDevice, size: UVec2) -> Result<()> {
        match self {
            Self::Raster(pass) => pass.resize(device, size),
            Self::Compute(_) => Ok(()),
        }
    }
}

impl Pass for GBufferPass {
    fn label(&self) -> &str {
        match self {
            Self::Raster(pass) => pass.label(),
            Self::Compute(pass) => pass.label(),
        }
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        match self {
            Self::Raster(pass) => pass.issue_commands(cmd, frame),
            Self::Compute(pass) => pass.issue_commands(cmd, frame),
        }
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        match self {
            Self::Raster(pass) => pass.pipelines(),
            Self::Compute(pass) => pass.pipelines(),
        }
    }
}
