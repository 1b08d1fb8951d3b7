//! Abstract GPU interface the renderer is written against.
//!
//! The concrete graphics API (device, queue and memory-allocator creation)
//! lives outside of this crate; it plugs in by implementing
//! [`PhysicalDevice`], [`Device`], [`Allocator`] and [`CommandBuffer`].

mod command_list;
mod handles;
#[cfg(test)]
pub(crate) mod testing;
mod types;

use std::fmt;
use std::sync::Arc;

use ash::vk;
use glam::UVec2;
use thiserror::Error;

pub use self::command_list::*;
pub use self::handles::*;
pub use self::types::*;

pub type SharedDevice = Arc<dyn Device>;
pub type SharedAllocator = Arc<dyn Allocator>;

/// Failure reported by the graphics backend while creating an object.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error(transparent)]
    Vulkan(#[from] vk::Result),

    #[error("{0}")]
    Backend(String),
}

/// Capabilities of the GPU the renderer runs on.
pub trait PhysicalDevice {
    /// Features supported by `format` with optimal tiling.
    fn format_features(
        &self,
        format: vk::Format,
    ) -> vk::FormatFeatureFlags;
}

/// Creates and destroys the non-memory objects: shader modules, views,
/// samplers, descriptors, pipelines, render passes and framebuffers.
pub trait Device: fmt::Debug {
    fn create_shader_module(
        &self,
        code: &[u32],
    ) -> Result<ShaderModule, GpuError>;

    fn create_image_view(
        &self,
        desc: &ImageViewDesc,
    ) -> Result<ImageView, GpuError>;

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Sampler, GpuError>;

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayout, GpuError>;

    fn allocate_descriptor_set(
        &self,
        layout: DescriptorSetLayout,
    ) -> Result<DescriptorSet, GpuError>;

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]);

    fn create_pipeline_layout(
        &self,
        desc: &PipelineLayoutDesc,
    ) -> Result<PipelineLayout, GpuError>;

    fn create_compute_pipeline(
        &self,
        desc: &ComputePipelineDesc,
    ) -> Result<Pipeline, GpuError>;

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
    ) -> Result<Pipeline, GpuError>;

    fn create_render_pass(
        &self,
        desc: &RenderPassDesc,
    ) -> Result<RenderPass, GpuError>;

    fn create_framebuffer(
        &self,
        desc: &FramebufferDesc,
    ) -> Result<Framebuffer, GpuError>;

    fn destroy(&self, object: Object);
}

/// Allocates GPU memory for images and buffers.
pub trait Allocator: fmt::Debug {
    fn create_image_2d(
        &self,
        size: UVec2,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
    ) -> Result<Image, GpuError>;

    fn create_buffer(
        &self,
        size: u64,
        usage: vk::BufferUsageFlags,
    ) -> Result<Buffer, GpuError>;

    /// Copies `data` into a host-visible buffer.
    fn write_buffer(&self, buffer: Buffer, offset: u64, data: &[u8]);

    fn destroy(&self, object: Object);
}
