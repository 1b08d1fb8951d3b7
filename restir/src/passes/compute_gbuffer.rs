use ash::vk;
use restir_gpu::{div_ceil2, GBUFFER_GROUP_SIZE};

use super::per_parity;
use crate::buffers::DoubleBuffered;
use crate::gpu::{
    CommandBuffer, DescriptorResource, Image, ImageBarrier, Pipeline,
    PipelineBarrier, SharedDevice,
};
use crate::{
    ComputePass, FormatSet, FrameContext, FrameResources, GBufferTarget, Pass,
    RendererConfig, Result, Shader, ShaderSet,
};

/// Fills the G-buffer by ray-marching an analytic scene in a compute shader,
/// writing straight into the five images through storage bindings.
#[derive(Debug)]
pub struct ComputeGBufferPass {
    pass: ComputePass,
    _shader: Shader,
    aspects: [vk::ImageAspectFlags; 5],
    images: DoubleBuffered<Vec<Image>>,
}

impl ComputeGBufferPass {
    pub const LABEL: &'static str = "gbuffer_compute";

    pub fn new(
        device: &SharedDevice,
        config: &RendererConfig,
        formats: &FormatSet,
    ) -> Result<Self> {
        let shader = Shader::load(
            device,
            config.shader_path(ShaderSet::GBUFFER_SDF),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )?;

        let pass = ComputePass::<()>::builder(Self::LABEL)
            .bind([
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::DescriptorType::UNIFORM_BUFFER,
            ])
            .bind([vk::DescriptorType::STORAGE_IMAGE; 5])
            .build(device, &shader)?;

        Ok(Self {
            pass,
            _shader: shader,
            aspects: GBufferTarget::ALL.map(|target| formats.aspect(target)),
            images: DoubleBuffered::new(Vec::new(), Vec::new()),
        })
    }

    pub fn bind(&mut self, device: &SharedDevice, resources: &FrameResources) {
        self.pass.bind_group(0).write_static(
            device,
            &[resources.uniforms.bind(), resources.sdf_scene.bind()],
        );

        let targets = per_parity(|alternate| {
            let gbuffer = resources.gbuffers.get(alternate);

            GBufferTarget::ALL.map(|target| DescriptorResource::StorageImage {
                view: gbuffer.view(target),
                layout: vk::ImageLayout::GENERAL,
            })
        });

        self.pass.bind_group(1).write(device, &targets);

        self.images = resources
            .gbuffers
            .map(|gbuffer| gbuffer.images().map(|(_, image)| image).collect());
    }

    fn transition(
        &self,
        images: &[Image],
        (old_layout, src_access): (vk::ImageLayout, vk::AccessFlags),
        (new_layout, dst_access): (vk::ImageLayout, vk::AccessFlags),
    ) -> PipelineBarrier {
        PipelineBarrier::execution(
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::PipelineStageFlags::COMPUTE_SHADER,
        )
        .with_images(images.iter().zip(self.aspects).map(|(&image, aspect)| {
            ImageBarrier {
                image,
                aspect,
                old_layout,
                new_layout,
                src_access,
                dst_access,
            }
        }))
    }
}

impl Pass for ComputeGBufferPass {
    fn label(&self) -> &str {
        self.pass.label()
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        let images = self.images.get(frame.alternate);

        assert_eq!(
            GBufferTarget::ALL.len(),
            images.len(),
            "{} recorded before its gbuffers were bound",
            Self::LABEL,
        );

        let readable = (
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::SHADER_READ,
        );

        let writable =
            (vk::ImageLayout::GENERAL, vk::AccessFlags::SHADER_WRITE);

        cmd.pipeline_barrier(self.transition(images, readable, writable));

        self.pass.run(
            cmd,
            frame.alternate,
            div_ceil2(frame.size, GBUFFER_GROUP_SIZE).extend(1),
            (),
        );

        cmd.pipeline_barrier(self.transition(images, writable, readable));
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        vec![self.pass.pipeline()]
    }
}
