use ash::vk;
use glam::uvec3;
use restir_gpu::{div_ceil, EmissiveSampleParams, EMISSIVE_SAMPLE_GROUP_SIZE};

use crate::gpu::{CommandBuffer, Pipeline, PipelineBarrier, SharedDevice};
use crate::{
    ComputePass, FrameContext, FrameResources, Pass, RendererConfig, Result,
    Shader, ShaderSet,
};

/// Fills the emissive-sample buffer with `sample_count` candidate points on
/// emissive triangles.
#[derive(Debug)]
pub struct EmissiveSamplePass {
    pass: ComputePass<EmissiveSampleParams>,
    _shader: Shader,

    /// Number of samples generated per dispatch
    pub sample_count: u32,

    /// Seed of the sample generator; should change every frame, otherwise
    /// consecutive frames draw correlated candidates
    pub seed: u32,
}

impl EmissiveSamplePass {
    pub fn new(device: &SharedDevice, config: &RendererConfig) -> Result<Self> {
        let shader = Shader::load(
            device,
            config.shader_path(ShaderSet::EMISSIVE_SAMPLE),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )?;

        let pass = ComputePass::<EmissiveSampleParams>::builder(
            "emissive_sample",
        )
        .bind([
            vk::DescriptorType::STORAGE_BUFFER,
            vk::DescriptorType::UNIFORM_BUFFER,
        ])
        .build(device, &shader)?;

        Ok(Self {
            pass,
            _shader: shader,
            sample_count: config.emissive_sample_count,
            seed: 0,
        })
    }

    pub fn bind(&self, device: &SharedDevice, resources: &FrameResources) {
        self.pass.bind_group(0).write_static(
            device,
            &[resources.emissive_samples.bind(), resources.uniforms.bind()],
        );
    }
}

impl Pass for EmissiveSamplePass {
    fn label(&self) -> &str {
        self.pass.label()
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        cmd.pipeline_barrier(PipelineBarrier::execution(
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::PipelineStageFlags::COMPUTE_SHADER,
        ));

        self.pass.run(
            cmd,
            frame.alternate,
            uvec3(
                div_ceil(self.sample_count, EMISSIVE_SAMPLE_GROUP_SIZE),
                1,
                1,
            ),
            EmissiveSampleParams {
                sample_count: self.sample_count,
                seed: self.seed,
            },
        );

        cmd.pipeline_barrier(
            PipelineBarrier::execution(
                vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::PipelineStageFlags::COMPUTE_SHADER,
            )
            .with_memory(
                vk::AccessFlags::SHADER_WRITE,
                vk::AccessFlags::SHADER_READ,
            ),
        );
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        vec![self.pass.pipeline()]
    }
}
