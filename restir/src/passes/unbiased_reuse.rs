use ash::vk;
use restir_gpu::{div_ceil2, UNBIASED_REUSE_GROUP_SIZE};

use super::{per_parity, sampled};
use crate::gpu::{
    CommandBuffer, Pipeline, PipelineBarrier, Sampler, SamplerDesc,
    SharedDevice, Unique,
};
use crate::{
    ComputePass, Error, FrameContext, FrameResources, Pass, RendererConfig,
    Result, Shader, ShaderSet,
};

/// Re-weights the reservoirs produced by [`crate::RestirPass`] so that the
/// spatial reuse stays unbiased, writing the outcome into the result buffer.
#[derive(Debug)]
pub struct UnbiasedReusePass {
    pass: ComputePass,
    sampler: Unique<Sampler>,
    _shader: Shader,
    tracing: bool,
}

impl UnbiasedReusePass {
    pub fn new(device: &SharedDevice, config: &RendererConfig) -> Result<Self> {
        let tracing = config.tracing.is_enabled();

        let shader = Shader::load(
            device,
            config.shader_path(if tracing {
                ShaderSet::UNBIASED_REUSE_SOFTWARE
            } else {
                ShaderSet::UNBIASED_REUSE
            }),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )?;

        let builder = ComputePass::<()>::builder("unbiased_reuse").bind([
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::DescriptorType::STORAGE_BUFFER,
            vk::DescriptorType::STORAGE_BUFFER,
            vk::DescriptorType::UNIFORM_BUFFER,
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

        self.pass.bind_group(0).write(
            device,
            &per_parity(|alternate| {
                let gbuffer = resources.gbuffers.get(alternate);

                [
                    sampled(sampler, gbuffer.world_position_view()),
                    sampled(sampler, gbuffer.albedo_view()),
                    sampled(sampler, gbuffer.normal_view()),
                    sampled(sampler, gbuffer.material_properties_view()),
                    sampled(sampler, gbuffer.depth_view()),
                    resources.reservoirs.current(alternate).bind(),
                    resources.reservoirs.result().bind(),
                    resources.uniforms.bind(),
                ]
            }),
        );

        if self.tracing {
            let tree = resources
                .aabb_tree
                .ok_or(Error::MissingAccelerationStructure)?;

            self.pass.bind_group(1).write_static(
                device,
                &[tree.nodes().bind(), tree.triangles().bind()],
            );
        }

        Ok(())
    }
}

impl Pass for UnbiasedReusePass {
    fn label(&self) -> &str {
        self.pass.label()
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        // Reads the reservoirs the restir pass has just written
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

        self.pass.run(
            cmd,
            frame.alternate,
            div_ceil2(frame.size, UNBIASED_REUSE_GROUP_SIZE).extend(1),
            (),
        );
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        vec![self.pass.pipeline()]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::UVec2;

    use super::*;
    use crate::gpu::testing::FakeGpu;
    use crate::gpu::{Command, CommandList};
    use crate::passes::tests::Fixture;
    use crate::shader::tests::{shader_dir, ShaderDir};
    use crate::{GBufferMode, RestirPass, TracingMode};

    fn config(shaders: &ShaderDir, tracing: TracingMode) -> RendererConfig {
        RendererConfig::default()
            .with_tracing(tracing)
            .with_shader_dir(shaders)
    }

    #[test]
    fn frame_set() {
        let gpu = FakeGpu::new();
        let shaders = shader_dir(4);
        let config = config(&shaders, TracingMode::Software);
        let pass = UnbiasedReusePass::new(&gpu.device(), &config).unwrap();
        let fixture =
            Fixture::new(&gpu, GBufferMode::Compute, UVec2::new(8, 8));

        pass.bind(&gpu.device(), &fixture.resources(true)).unwrap();

        for alternate in [false, true] {
            let set = pass.pass.bind_group(0).get(alternate);
            let gbuffer = fixture.gbuffers.get(alternate);
            let view = |binding| gpu.write(set, binding).view();

            assert_eq!(Some(gbuffer.world_position_view()), view(0));
            assert_eq!(Some(gbuffer.albedo_view()), view(1));
            assert_eq!(Some(gbuffer.normal_view()), view(2));
            assert_eq!(Some(gbuffer.material_properties_view()), view(3));
            assert_eq!(Some(gbuffer.depth_view()), view(4));
            assert_eq!(fixture.reservoirs.result().bind(), gpu.write(set, 6));
            assert_eq!(fixture.uniforms.bind(), gpu.write(set, 7));
        }
    }

    #[test]
    fn reads_what_restir_writes() {
        let gpu = FakeGpu::new();
        let device = gpu.device();
        let shaders = shader_dir(4);
        let config = config(&shaders, TracingMode::Software);
        let restir = RestirPass::new(&device, &config).unwrap();
        let unbiased = UnbiasedReusePass::new(&device, &config).unwrap();
        let fixture = Fixture::new(&gpu, GBufferMode::Raster, UVec2::new(8, 8));
        let resources = fixture.resources(true);

        restir.bind(&device, &resources).unwrap();
        unbiased.bind(&device, &resources).unwrap();

        for alternate in [false, true] {
            let restir_set = restir.pass.bind_group(1).get(alternate);
            let unbiased_set = unbiased.pass.bind_group(0).get(alternate);

            let written = gpu.write(restir_set, 8);
            let input = gpu.write(unbiased_set, 5);
            let output = gpu.write(unbiased_set, 6);

            assert_eq!(written, input);
            assert_ne!(input.buffer(), output.buffer());

            // The other reservoir holds history and must stay untouched
            let history = gpu.write(restir_set, 9);

            assert_ne!(history.buffer(), input.buffer());
            assert_ne!(history.buffer(), output.buffer());
        }

        // Nothing gets dispatched between the two passes
        let mut cmd = CommandList::new();
        let frame = FrameContext::default();

        restir.issue_commands(&mut cmd, &frame);
        unbiased.issue_commands(&mut cmd, &frame);

        let dispatches = cmd
            .commands()
            .iter()
            .filter(|command| matches!(command, Command::Dispatch { .. }))
            .count();

        assert_eq!(2, dispatches);
    }

    #[test]
    fn issue_commands_without_tracing() {
        let gpu = FakeGpu::new();
        let shaders = shader_dir(4);
        let config = config(&shaders, TracingMode::Disabled);
        let pass = UnbiasedReusePass::new(&gpu.device(), &config).unwrap();
        let mut cmd = CommandList::new();

        pass.issue_commands(
            &mut cmd,
            &FrameContext {
                size: UVec2::new(9, 8),
                alternate: false,
            },
        );

        assert_eq!(
            &[
                Command::PipelineBarrier(
                    PipelineBarrier::execution(
                        vk::PipelineStageFlags::COMPUTE_SHADER,
                        vk::PipelineStageFlags::COMPUTE_SHADER,
                    )
                    .with_memory(
                        vk::AccessFlags::SHADER_WRITE,
                        vk::AccessFlags::SHADER_READ,
                    )
                ),
                Command::BindPipeline {
                    bind_point: vk::PipelineBindPoint::COMPUTE,
                    pipeline: pass.pass.pipeline(),
                },
                Command::BindDescriptorSets {
                    bind_point: vk::PipelineBindPoint::COMPUTE,
                    layout: pass.pass.layout(),
                    first_set: 0,
                    sets: vec![pass.pass.bind_group(0).get(false)],
                },
                Command::Dispatch { x: 2, y: 1, z: 1 },
            ],
            cmd.commands()
        );
    }
}
