use ash::vk;
use glam::UVec2;
use log::debug;

use crate::buffers::{BindGroup, DoubleBuffered};
use crate::gpu::{
    AttachmentDesc, AttachmentRef, ClearValue, ColorBlendAttachment,
    CommandBuffer, DepthState, Framebuffer, GraphicsPipelineDesc, Pipeline,
    PipelineLayout, PipelineLayoutDesc, RenderPass, RenderPassBegin,
    RenderPassDesc, SharedDevice, SubpassDependency, SubpassDesc, Unique,
};
use crate::{
    FormatSet, FrameContext, FrameResources, GBufferTarget, Pass,
    RendererConfig, Result, Shader, ShaderSet,
};

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Fills the G-buffer by drawing a full-screen triangle strip into its five
/// attachments.
#[derive(Debug)]
pub struct RasterGBufferPass {
    // Viewport is baked into the pipeline, so it gets rebuilt on resize
    pipeline: Unique<Pipeline>,
    layout: Unique<PipelineLayout>,
    bind_group: BindGroup,
    render_pass: Unique<RenderPass>,
    vert: Shader,
    frag: Shader,
    size: UVec2,
    framebuffers: DoubleBuffered<Option<Framebuffer>>,
}

impl RasterGBufferPass {
    pub const LABEL: &'static str = "gbuffer_raster";

    pub fn new(
        device: &SharedDevice,
        config: &RendererConfig,
        formats: &FormatSet,
        size: UVec2,
    ) -> Result<Self> {
        debug!("Initializing pass: {}", Self::LABEL);

        let bind_group = BindGroup::builder(Self::LABEL)
            .add(
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            )
            .build(device)?;

        let layout = device.create_pipeline_layout(&PipelineLayoutDesc {
            label: format!("restir_{}_pipeline_layout", Self::LABEL),
            set_layouts: vec![bind_group.layout()],
            push_constant_ranges: vec![],
        })?;

        let layout = Unique::new(device, layout);

        let render_pass = Unique::new(
            device,
            device.create_render_pass(&Self::render_pass_desc(formats))?,
        );

        let vert = Shader::load(
            device,
            config.shader_path(ShaderSet::GBUFFER_VERT),
            "main",
            vk::ShaderStageFlags::VERTEX,
        )?;

        let frag = Shader::load(
            device,
            config.shader_path(ShaderSet::GBUFFER_FRAG),
            "main",
            vk::ShaderStageFlags::FRAGMENT,
        )?;

        let pipeline = Self::create_pipeline(
            device,
            layout.get(),
            render_pass.get(),
            &vert,
            &frag,
            size,
        )?;

        Ok(Self {
            pipeline,
            layout,
            bind_group,
            render_pass,
            vert,
            frag,
            size,
            framebuffers: DoubleBuffered::new(None, None),
        })
    }

    fn render_pass_desc(formats: &FormatSet) -> RenderPassDesc {
        let attachments = GBufferTarget::ALL
            .into_iter()
            .map(|target| AttachmentDesc {
                format: formats.get(target),
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::STORE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            })
            .collect();

        let color_attachments = GBufferTarget::ALL
            .into_iter()
            .filter(|&target| target != GBufferTarget::Depth)
            .map(|target| AttachmentRef {
                attachment: target.index() as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            })
            .collect();

        let depth_stencil_attachment = AttachmentRef {
            attachment: GBufferTarget::Depth.index() as u32,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        RenderPassDesc {
            label: format!("restir_{}_render_pass", Self::LABEL),
            attachments,
            subpasses: vec![SubpassDesc {
                bind_point: vk::PipelineBindPoint::GRAPHICS,
                color_attachments,
                depth_stencil_attachment: Some(depth_stencil_attachment),
            }],
            dependencies: vec![SubpassDependency {
                src_subpass: vk::SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            }],
        }
    }

    fn create_pipeline(
        device: &SharedDevice,
        layout: PipelineLayout,
        render_pass: RenderPass,
        vert: &Shader,
        frag: &Shader,
        size: UVec2,
    ) -> Result<Unique<Pipeline>> {
        let pipeline = device.create_graphics_pipeline(&GraphicsPipelineDesc {
            label: format!("restir_{}_pipeline", Self::LABEL),
            layout,
            render_pass,
            subpass: 0,
            stages: vec![vert.stage(), frag.stage()],
            topology: vk::PrimitiveTopology::TRIANGLE_STRIP,
            viewport: size,
            cull_mode: vk::CullModeFlags::NONE,
            depth: DepthState {
                test: true,
                write: true,
                compare: vk::CompareOp::LESS,
            },
            color_blend: vec![ColorBlendAttachment::disabled(); 4],
            samples: vk::SampleCountFlags::TYPE_1,
        })?;

        Ok(Unique::new(device, pipeline))
    }

    pub fn render_pass(&self) -> RenderPass {
        self.render_pass.get()
    }

    pub fn layout(&self) -> PipelineLayout {
        self.layout.get()
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }

    pub fn bind(&mut self, device: &SharedDevice, resources: &FrameResources) {
        self.bind_group
            .write_static(device, &[resources.uniforms.bind()]);

        self.framebuffers =
            resources.gbuffers.map(|gbuffer| gbuffer.framebuffer());
    }

    pub fn resize(&mut self, device: &SharedDevice, size: UVec2) -> Result<()> {
        if size == self.size {
            return Ok(());
        }

        debug!(
            "Rebuilding pipeline: {}; size={}x{}",
            Self::LABEL,
            size.x,
            size.y
        );

        self.pipeline = Self::create_pipeline(
            device,
            self.layout.get(),
            self.render_pass.get(),
            &self.vert,
            &self.frag,
            size,
        )?;

        self.size = size;

        Ok(())
    }
}

impl Pass for RasterGBufferPass {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    ) {
        let Some(framebuffer) = *self.framebuffers.get(frame.alternate) else {
            panic!("{} recorded before its gbuffers were bound", Self::LABEL);
        };

        let mut clear_values = vec![ClearValue::Color(CLEAR_COLOR); 4];

        clear_values.push(ClearValue::DepthStencil {
            depth: 1.0,
            stencil: 0,
        });

        cmd.begin_render_pass(&RenderPassBegin {
            render_pass: self.render_pass.get(),
            framebuffer,
            area: frame.size,
            clear_values,
        });

        cmd.bind_pipeline(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline.get(),
        );

        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.layout.get(),
            0,
            &[self.bind_group.get(frame.alternate)],
        );

        cmd.draw(4, 1, 0, 0);
        cmd.end_render_pass();
    }

    fn pipelines(&self) -> Vec<Pipeline> {
        vec![self.pipeline.get()]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gpu::testing::FakeGpu;
    use crate::gpu::{Command, CommandList, DescriptorSetLayoutBinding};
    use crate::passes::tests::Fixture;
    use crate::shader::tests::shader_dir;
    use crate::{GBuffer, GBufferMode};

    fn pass(
        gpu: &Arc<FakeGpu>,
        size: UVec2,
    ) -> (RasterGBufferPass, FormatSet) {
        let shaders = shader_dir(4);
        let config = RendererConfig::default().with_shader_dir(&shaders);

        let formats =
            FormatSet::resolve(gpu.as_ref(), GBufferMode::Raster).unwrap();

        let pass =
            RasterGBufferPass::new(&gpu.device(), &config, &formats, size)
                .unwrap();

        (pass, formats)
    }

    #[test]
    fn render_pass() {
        let gpu = FakeGpu::new();
        let (pass, formats) = pass(&gpu, UVec2::new(64, 64));
        let desc = gpu.render_pass(pass.render_pass());

        assert_eq!(5, desc.attachments.len());

        let attachments = GBufferTarget::ALL.into_iter().zip(&desc.attachments);

        for (target, attachment) in attachments {
            assert_eq!(formats.get(target), attachment.format);
            assert_eq!(vk::AttachmentLoadOp::CLEAR, attachment.load_op);
            assert_eq!(vk::AttachmentStoreOp::STORE, attachment.store_op);
            assert_eq!(vk::ImageLayout::UNDEFINED, attachment.initial_layout);

            assert_eq!(
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                attachment.final_layout
            );
        }

        assert_eq!(vk::Format::D32_SFLOAT, desc.attachments[4].format);

        let subpass = &desc.subpasses[0];

        assert_eq!(4, subpass.color_attachments.len());

        assert!(subpass.color_attachments.iter().all(|attachment| {
            attachment.layout == vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
        }));

        assert_eq!(
            Some(AttachmentRef {
                attachment: 4,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            }),
            subpass.depth_stencil_attachment
        );

        assert_eq!(1, desc.dependencies.len());
        assert_eq!(vk::SUBPASS_EXTERNAL, desc.dependencies[0].src_subpass);
        assert_eq!(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            desc.dependencies[0].dst_access
        );
    }

    #[test]
    fn pipeline() {
        let gpu = FakeGpu::new();
        let (pass, _) = pass(&gpu, UVec2::new(64, 32));
        let desc = gpu.graphics_pipeline(pass.pipelines()[0]);

        assert_eq!(vk::PrimitiveTopology::TRIANGLE_STRIP, desc.topology);
        assert_eq!(vk::CullModeFlags::NONE, desc.cull_mode);
        assert!(desc.depth.test);
        assert_eq!(4, desc.color_blend.len());
        assert!(desc.color_blend.iter().all(|blend| !blend.blend));
        assert_eq!(vk::SampleCountFlags::TYPE_1, desc.samples);
        assert_eq!(UVec2::new(64, 32), desc.viewport);
        assert_eq!(pass.render_pass(), desc.render_pass);

        assert_eq!(
            vec![vk::ShaderStageFlags::VERTEX, vk::ShaderStageFlags::FRAGMENT],
            desc.stages.iter().map(|stage| stage.stage).collect::<Vec<_>>()
        );

        assert_eq!(
            vec![DescriptorSetLayoutBinding::new(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
            )],
            pass.bind_group().bindings()
        );
    }

    #[test]
    fn resize_rebuilds_pipeline() {
        let gpu = FakeGpu::new();
        let device = gpu.device();
        let (mut pass, _) = pass(&gpu, UVec2::new(64, 32));
        let old = pass.pipelines()[0];

        pass.resize(&device, UVec2::new(64, 32)).unwrap();

        assert_eq!(old, pass.pipelines()[0]);

        pass.resize(&device, UVec2::new(128, 64)).unwrap();

        let new = pass.pipelines()[0];

        assert_ne!(old, new);
        assert!(!gpu.is_alive(old));
        assert_eq!(UVec2::new(128, 64), gpu.graphics_pipeline(new).viewport);
    }

    #[test]
    fn issue_commands() {
        let gpu = FakeGpu::new();
        let allocator = gpu.allocator();
        let device = gpu.device();
        let size = UVec2::new(16, 8);
        let (mut pass, formats) = pass(&gpu, size);

        let gbuffers = DoubleBuffered::from_fn(|label| {
            GBuffer::new(
                &allocator,
                &device,
                label,
                &formats,
                size,
                Some(pass.render_pass()),
            )
            .unwrap()
        });

        let fixture = Fixture::new(&gpu, GBufferMode::Raster, size);

        let resources = FrameResources {
            gbuffers: &gbuffers,
            ..fixture.resources(false)
        };

        pass.bind(&device, &resources);

        let mut cmd = CommandList::new();

        pass.issue_commands(
            &mut cmd,
            &FrameContext {
                size,
                alternate: true,
            },
        );

        let commands = cmd.commands();

        assert_eq!(5, commands.len());

        match &commands[0] {
            Command::BeginRenderPass(begin) => {
                assert_eq!(
                    gbuffers.get(true).framebuffer(),
                    Some(begin.framebuffer)
                );
                assert_eq!(size, begin.area);

                assert_eq!(
                    vec![
                        ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                        ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                        ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                        ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                        ClearValue::DepthStencil {
                            depth: 1.0,
                            stencil: 0
                        },
                    ],
                    begin.clear_values
                );
            }
            command => panic!("unexpected command: {command:?}"),
        }

        assert_eq!(
            Command::Draw {
                vertex_count: 4,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            },
            commands[3]
        );

        assert_eq!(Command::EndRenderPass, commands[4]);
    }
}
