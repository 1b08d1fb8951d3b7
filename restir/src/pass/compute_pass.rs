use std::marker::PhantomData;
use std::mem;

use ash::vk;
use bytemuck::Pod;
use glam::UVec3;
use log::debug;

use crate::buffers::{BindGroup, BindGroupBuilder};
use crate::gpu::{
    CommandBuffer, ComputePipelineDesc, Pipeline, PipelineLayout,
    PipelineLayoutDesc, PushConstantRange, SharedDevice, Unique,
};
use crate::{Result, Shader};

/// Compute pipeline together with its layout and bind groups; `P` is the
/// push-constant block (`()` for none).
#[derive(Debug)]
pub struct ComputePass<P = ()> {
    label: String,
    pipeline: Unique<Pipeline>,
    layout: Unique<PipelineLayout>,
    bind_groups: Vec<BindGroup>,
    _params: PhantomData<P>,
}

impl<P> ComputePass<P>
where
    P: Pod,
{
    pub fn builder(label: impl ToString) -> ComputePassBuilder<P> {
        ComputePassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline.get()
    }

    pub fn layout(&self) -> PipelineLayout {
        self.layout.get()
    }

    pub fn bind_group(&self, idx: usize) -> &BindGroup {
        &self.bind_groups[idx]
    }

    pub fn bind_groups(&self) -> &[BindGroup] {
        &self.bind_groups
    }

    /// Binds the pipeline and every bind group (the halves matching
    /// `alternate`), pushes `params` and dispatches `groups` workgroups.
    pub fn run(
        &self,
        cmd: &mut dyn CommandBuffer,
        alternate: bool,
        groups: UVec3,
        params: P,
    ) {
        cmd.bind_pipeline(vk::PipelineBindPoint::COMPUTE, self.pipeline.get());

        let sets: Vec<_> = self
            .bind_groups
            .iter()
            .map(|bind_group| bind_group.get(alternate))
            .collect();

        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::COMPUTE,
            self.layout.get(),
            0,
            &sets,
        );

        if mem::size_of::<P>() > 0 {
            cmd.push_constants(
                self.layout.get(),
                vk::ShaderStageFlags::COMPUTE,
                0,
                bytemuck::bytes_of(&params),
            );
        }

        cmd.dispatch(groups.x, groups.y, groups.z);
    }
}

pub struct ComputePassBuilder<P> {
    label: String,
    bind_groups: Vec<BindGroupBuilder>,
    _params: PhantomData<P>,
}

impl<P> ComputePassBuilder<P>
where
    P: Pod,
{
    /// Adds a descriptor set whose bindings are numbered in `items`' order.
    pub fn bind<const N: usize>(
        mut self,
        items: [vk::DescriptorType; N],
    ) -> Self {
        let bind_group = BindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ))
        .add_many(items, vk::ShaderStageFlags::COMPUTE);

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &SharedDevice,
        shader: &Shader,
    ) -> Result<ComputePass<P>> {
        debug!("Initializing pass: {}:{}", self.label, shader.entry_point());

        let bind_groups = self
            .bind_groups
            .into_iter()
            .map(|bind_group| bind_group.build(device))
            .collect::<Result<Vec<_>>>()?;

        let push_constant_ranges = if mem::size_of::<P>() > 0 {
            vec![PushConstantRange {
                stages: vk::ShaderStageFlags::COMPUTE,
                offset: 0,
                size: mem::size_of::<P>() as u32,
            }]
        } else {
            vec![]
        };

        let layout = device.create_pipeline_layout(&PipelineLayoutDesc {
            label: format!("restir_{}_pipeline_layout", self.label),
            set_layouts: bind_groups.iter().map(|bg| bg.layout()).collect(),
            push_constant_ranges,
        })?;

        let layout = Unique::new(device, layout);

        let pipeline = device.create_compute_pipeline(&ComputePipelineDesc {
            label: format!("restir_{}_pipeline", self.label),
            layout: layout.get(),
            stage: shader.stage(),
        })?;

        Ok(ComputePass {
            label: self.label,
            pipeline: Unique::new(device, pipeline),
            layout,
            bind_groups,
            _params: PhantomData,
        })
    }
}
