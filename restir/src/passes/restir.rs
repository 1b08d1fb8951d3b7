use ash::vk;
use restir_gpu::{div_ceil2, RESTIR_GROUP_SIZE};

use super::{per_parity, sampled};
use crate::gpu::{
    CommandBuffer, Pipeline, PipelineBarrier, Sampler, SamplerDesc,
    SharedDevice, Unique,
};
use crate::{
    ComputePass, Error, FrameContext, FrameResources, Pass, RendererConfig,
    Result, Shader, ShaderSet,
};

/// Spatiotemporal resampling of light reservoirs.
///
/// Reads both G-buffers and the previous frame's reservoirs; writes the
/// current frame's reservoirs.
///
/// Descriptor sets:
///
/// - set 0 (static): emissive samples, uniforms,
/// - set 1 (frame): current world position, albedo, normal and material
///   properties; previous world position, albedo, normal and depth; current
///   and previous reservoirs,
/// - set 2 (raytrace): AABB-tree nodes and triangles; present only when
///   software tracing is enabled.
#[derive(Debug)]
pub struct RestirPass {
    pub(crate) pass: ComputePass,
    sampler: Unique<Sampler>,
    _shader: Shader,
    tracing: bool,
}

impl RestirPass {
    pub fn new(device: &SharedDevice, config: &RendererConfig) -> Result<Self> {
        let tracing = config.tracing.is_enabled();

        let shader = Shader::load(
            device,
            config.shader_path(if tracing {
                ShaderSet::RESTIR_SOFTWARE
            } else {
                ShaderSet::RESTIR
            }),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )?;

        let builder = ComputePass::<()>::builder("restir")
            .bind([
                vk::DescriptorType::STORAGE_BUFFER,
                vk::DescriptorType::UNIFORM_BUFFER,
            ])
            .bind([
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::DescriptorType::STORAGE_BUFFER,
                vk::DescriptorType::STORAGE_BUFFER,
            ]);

        let builder = if tracing {
            builder.bind([
                vk::DescriptorType::STORAGE_BUFFER,
                vk::DescriptorType::STORAGE_BUFFER,
            ])
        } else {
            builder
        };

        let pass = builder.build(device, &shader)?;

        let sampler = Unique::new(
            device,
            device.create_sampler(&SamplerDesc::nearest())?,
        );

        Ok(Self {
            pass,
            sampler,
            _shader: shader,
            tracing,
        })
    }

    pub fn bind(
        &self,
        device: &SharedDevice,
        resources: &FrameResources,
    ) -> Result<()> {
        let sampler = self.sampler.get();

        self.pass.bind_group(0).write_static(
            device,
            &[resources.emissive_samples.bind(), resources.uniforms.bind()],
        );

        self.pass.bind_group(1).write(
            device,
            &per_parity(|alternate| {
                let current = resources.gbuffers.get(alternate);
                let previous = resources.gbuffers.past(alternate);

                [
                    sampled(sampler, current.world_position_view()),
                    sampled(sampler, current.albedo_view()),
                    sampled(sampler, current.normal_view()),
                    sampled(sampler, current.material_properties_view()),
                    sampled(sampler, previous.world_position_view()),
                    sampled(sampler, previous.albedo_view()),
                    sampled(sampler, previous.normal_view()),
                    sampled(sampler, previous.depth_view()),
                    resources.reservoirs.current(alternate).bind(),
                    resources.reservoirs.previous(alternate).bind(),
                ]
            }),
        );

        if self.tracing {
            let tree = resources
                .aabb_tree
                .ok_or(Error::MissingAccelerationStructure)?;

            self.pass.bind_group(2).write_static(
                device,
                &[tree.nodes().bind(), tree.triangles().bind()],
            );
        }

        Ok(())
    }
}

impl Pass for RestirPass {
    fn label(&self) -> &str {
        self.pass.label()
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        // Orders the dispatch after everything recorded so far; visibility of
        // the samples and reservoirs it reads comes from the memory barrier
        // that closes the emissive sample pass
        cmd.pipeline_barrier(PipelineBarrier::execution(
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
        ));

        self.pass.run(
            cmd,
            frame.alternate,
            div_ceil2(frame.size, RESTIR_GROUP_SIZE).extend(1),
            (),
        );
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        vec![self.pass.pipeline()]
    }
}
