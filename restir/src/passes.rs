mod compute_gbuffer;
mod emissive_sample;
mod gbuffer;
mod raster_gbuffer;
mod restir;
mod unbiased_reuse;

use ash::vk;
use restir_gpu::{RestirUniforms, SdfSceneParams};

pub use self::compute_gbuffer::*;
pub use self::emissive_sample::*;
pub use self::gbuffer::*;
pub use self::raster_gbuffer::*;
pub use self::restir::*;
pub use self::unbiased_reuse::*;
use crate::buffers::{
    DoubleBuffered, ReservoirBuffers, StorageBuffer, UniformBuffer,
};
use crate::gpu::{
    CommandBuffer, DescriptorResource, ImageView, Pipeline, Sampler,
};
use crate::{AabbTreeBuffers, FrameContext, GBuffer, Pass};

/// Everything the passes bind to their descriptor sets.
#[derive(Clone, Copy, Debug)]
pub struct FrameResources<'a> {
    pub gbuffers: &'a DoubleBuffered<GBuffer>,
    pub reservoirs: &'a ReservoirBuffers,
    pub emissive_samples: &'a StorageBuffer,
    pub uniforms: &'a UniformBuffer<RestirUniforms>,
    pub sdf_scene: &'a UniformBuffer<SdfSceneParams>,
    pub aabb_tree: Option<&'a AabbTreeBuffers>,
}

/// Node of the frame graph, in the order the renderer records them.
#[derive(Clone, Copy, Debug)]
pub enum FramePass<'a> {
    GBuffer(&'a GBufferPass),
    EmissiveSample(&'a EmissiveSamplePass),
    Restir(&'a RestirPass),
    UnbiasedReuse(&'a UnbiasedReusePass),
}

impl Pass for FramePass<'_> {
    fn label(&self) -> &str {
        match self {
            Self::GBuffer(pass) => pass.label(),
            Self::EmissiveSample(pass) => pass.label(),
            Self::Restir(pass) => pass.label(),
            Self::UnbiasedReuse(pass) => pass.label(),
        }
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        match self {
            Self::GBuffer(pass) => pass.issue_commands(cmd, frame),
            Self::EmissiveSample(pass) => pass.issue_commands(cmd, frame),
            Self::Restir(pass) => pass.issue_commands(cmd, frame),
            Self::UnbiasedReuse(pass) => pass.issue_commands(cmd, frame),
        }
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        match self {
            Self::GBuffer(pass) => pass.pipelines(),
            Self::EmissiveSample(pass) => pass.pipelines(),
            Self::Restir(pass) => pass.pipelines(),
            Self::UnbiasedReuse(pass) => pass.pipelines(),
        }
    }
}

/// Gathers the resources of both frame parities into the shape expected by
/// [`crate::buffers::BindGroup::write()`].
fn per_parity<const N: usize>(
    resources: impl Fn(bool) -> [DescriptorResource; N],
) -> Vec<[DescriptorResource; 2]> {
    let a = resources(false);
    let b = resources(true);

    a.into_iter().zip(b).map(|(a, b)| [a, b]).collect()
}

fn sampled(sampler: Sampler, view: ImageView) -> DescriptorResource {
    DescriptorResource::CombinedImageSampler {
        sampler,
        view,
        layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    }
}
