use ash::vk;
use glam::UVec2;

use super::{
    Buffer, DescriptorSet, DescriptorSetLayout, Framebuffer, Image, ImageView,
    PipelineLayout, RenderPass, Sampler, ShaderModule,
};

pub fn is_depth_format(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT
            | vk::Format::D32_SFLOAT_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
    )
}

pub fn has_stencil(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
    )
}

/// Clear value of a single attachment.
///
/// [`vk::ClearValue`] is a union, so it can be neither compared nor printed;
/// this is what gets recorded and converted right before submission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

impl From<ClearValue> for vk::ClearValue {
    fn from(value: ClearValue) -> Self {
        match value {
            ClearValue::Color(float32) => vk::ClearValue {
                color: vk::ClearColorValue { float32 },
            },

            ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageViewDesc {
    pub image: Image,
    pub format: vk::Format,
    pub aspect: vk::ImageAspectFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerDesc {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
}

impl SamplerDesc {
    pub fn nearest() -> Self {
        Self {
            mag_filter: vk::Filter::NEAREST,
            min_filter: vk::Filter::NEAREST,
            mipmap_mode: vk::SamplerMipmapMode::NEAREST,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub ty: vk::DescriptorType,
    pub count: u32,
    pub stages: vk::ShaderStageFlags,
}

impl DescriptorSetLayoutBinding {
    pub fn new(
        binding: u32,
        ty: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    ) -> Self {
        Self {
            binding,
            ty,
            count: 1,
            stages,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferRange {
    pub buffer: Buffer,
    pub offset: u64,
    pub size: u64,
}

impl BufferRange {
    pub fn whole(buffer: Buffer, size: u64) -> Self {
        Self {
            buffer,
            offset: 0,
            size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorResource {
    CombinedImageSampler {
        sampler: Sampler,
        view: ImageView,
        layout: vk::ImageLayout,
    },
    StorageImage {
        view: ImageView,
        layout: vk::ImageLayout,
    },
    StorageBuffer(BufferRange),
    UniformBuffer(BufferRange),
}

impl DescriptorResource {
    pub fn ty(&self) -> vk::DescriptorType {
        match self {
            Self::CombinedImageSampler { .. } => {
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER
            }
            Self::StorageImage { .. } => vk::DescriptorType::STORAGE_IMAGE,
            Self::StorageBuffer(_) => vk::DescriptorType::STORAGE_BUFFER,
            Self::UniformBuffer(_) => vk::DescriptorType::UNIFORM_BUFFER,
        }
    }

    pub fn buffer(&self) -> Option<Buffer> {
        match self {
            Self::StorageBuffer(range) | Self::UniformBuffer(range) => {
                Some(range.buffer)
            }
            _ => None,
        }
    }

    pub fn view(&self) -> Option<ImageView> {
        match self {
            Self::CombinedImageSampler { view, .. }
            | Self::StorageImage { view, .. } => Some(*view),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorWrite {
    pub set: DescriptorSet,
    pub binding: u32,
    pub resource: DescriptorResource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: vk::ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineLayoutDesc {
    pub label: String,
    pub set_layouts: Vec<DescriptorSetLayout>,
    pub push_constant_ranges: Vec<PushConstantRange>,
}

/// Shader module bound to an entry point and a pipeline stage, ready to be
/// plugged into a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderStage {
    pub module: ShaderModule,
    pub entry_point: String,
    pub stage: vk::ShaderStageFlags,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputePipelineDesc {
    pub label: String,
    pub layout: PipelineLayout,
    pub stage: ShaderStage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthState {
    pub test: bool,
    pub write: bool,
    pub compare: vk::CompareOp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorBlendAttachment {
    pub blend: bool,
    pub write_mask: vk::ColorComponentFlags,
}

impl ColorBlendAttachment {
    pub fn disabled() -> Self {
        Self {
            blend: false,
            write_mask: vk::ColorComponentFlags::RGBA,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphicsPipelineDesc {
    pub label: String,
    pub layout: PipelineLayout,
    pub render_pass: RenderPass,
    pub subpass: u32,
    pub stages: Vec<ShaderStage>,
    pub topology: vk::PrimitiveTopology,

    /// Viewport and scissor, both anchored at `(0, 0)`
    pub viewport: UVec2,
    pub cull_mode: vk::CullModeFlags,
    pub depth: DepthState,
    pub color_blend: Vec<ColorBlendAttachment>,
    pub samples: vk::SampleCountFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub stencil_load_op: vk::AttachmentLoadOp,
    pub stencil_store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentRef {
    pub attachment: u32,
    pub layout: vk::ImageLayout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubpassDesc {
    pub bind_point: vk::PipelineBindPoint,
    pub color_attachments: Vec<AttachmentRef>,
    pub depth_stencil_attachment: Option<AttachmentRef>,
}

/// Dependency between two subpasses; [`vk::SUBPASS_EXTERNAL`] stands for
/// whatever comes before or after the render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stages: vk::PipelineStageFlags,
    pub dst_stages: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub label: String,
    pub attachments: Vec<AttachmentDesc>,
    pub subpasses: Vec<SubpassDesc>,
    pub dependencies: Vec<SubpassDependency>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramebufferDesc {
    pub render_pass: RenderPass,
    pub attachments: Vec<ImageView>,
    pub size: UVec2,
    pub layers: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBarrier {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: Image,
    pub aspect: vk::ImageAspectFlags,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineBarrier {
    pub src_stages: vk::PipelineStageFlags,
    pub dst_stages: vk::PipelineStageFlags,
    pub memory_barriers: Vec<MemoryBarrier>,
    pub image_barriers: Vec<ImageBarrier>,
}

impl PipelineBarrier {
    /// Execution-only dependency between two sets of stages.
    pub fn execution(
        src_stages: vk::PipelineStageFlags,
        dst_stages: vk::PipelineStageFlags,
    ) -> Self {
        Self {
            src_stages,
            dst_stages,
            memory_barriers: Vec::new(),
            image_barriers: Vec::new(),
        }
    }

    pub fn with_memory(
        mut self,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
    ) -> Self {
        self.memory_barriers.push(MemoryBarrier {
            src_access,
            dst_access,
        });

        self
    }

    pub fn with_images(
        mut self,
        images: impl IntoIterator<Item = ImageBarrier>,
    ) -> Self {
        self.image_barriers.extend(images);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderPassBegin {
    pub render_pass: RenderPass,
    pub framebuffer: Framebuffer,
    pub area: UVec2,
    pub clear_values: Vec<ClearValue>,
}
