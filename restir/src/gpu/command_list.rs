use ash::vk;

use super::{
    Buffer, DescriptorSet, Pipeline, PipelineBarrier, PipelineLayout,
    RenderPassBegin,
};

/// Recording interface of a GPU command buffer.
pub trait CommandBuffer {
    fn pipeline_barrier(&mut self, barrier: PipelineBarrier);

    fn bind_pipeline(
        &mut self,
        bind_point: vk::PipelineBindPoint,
        pipeline: Pipeline,
    );

    fn bind_descriptor_sets(
        &mut self,
        bind_point: vk::PipelineBindPoint,
        layout: PipelineLayout,
        first_set: u32,
        sets: &[DescriptorSet],
    );

    fn push_constants(
        &mut self,
        layout: PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    );

    fn dispatch(&mut self, x: u32, y: u32, z: u32);

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    fn begin_render_pass(&mut self, begin: &RenderPassBegin);

    fn end_render_pass(&mut self);

    /// Fills `size` bytes of `buffer`, starting at `offset`, with `data`
    /// repeated.
    fn fill_buffer(
        &mut self,
        buffer: Buffer,
        offset: u64,
        size: u64,
        data: u32,
    );
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    PipelineBarrier(PipelineBarrier),

    BindPipeline {
        bind_point: vk::PipelineBindPoint,
        pipeline: Pipeline,
    },

    BindDescriptorSets {
        bind_point: vk::PipelineBindPoint,
        layout: PipelineLayout,
        first_set: u32,
        sets: Vec<DescriptorSet>,
    },

    PushConstants {
        layout: PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: Vec<u8>,
    },

    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },

    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },

    BeginRenderPass(RenderPassBegin),

    EndRenderPass,

    FillBuffer {
        buffer: Buffer,
        offset: u64,
        size: u64,
        data: u32,
    },
}

/// Command buffer that records commands as values, so that they can be
/// inspected or replayed into another command buffer later.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn replay(&self, target: &mut dyn CommandBuffer) {
        for command in &self.commands {
            match command {
                Command::PipelineBarrier(barrier) => {
                    target.pipeline_barrier(barrier.clone());
                }

                Command::BindPipeline {
                    bind_point,
                    pipeline,
                } => {
                    target.bind_pipeline(*bind_point, *pipeline);
                }

                Command::BindDescriptorSets {
                    bind_point,
                    layout,
                    first_set,
                    sets,
                } => {
                    target.bind_descriptor_sets(
                        *bind_point,
                        *layout,
                        *first_set,
                        sets,
                    );
                }

                Command::PushConstants {
                    layout,
                    stages,
                    offset,
                    data,
                } => {
                    target.push_constants(*layout, *stages, *offset, data);
                }

                Command::Dispatch { x, y, z } => {
                    target.dispatch(*x, *y, *z);
                }

                Command::Draw {
                    vertex_count,
                    instance_count,
                    first_vertex,
                    first_instance,
                } => {
                    target.draw(
                        *vertex_count,
                        *instance_count,
                        *first_vertex,
                        *first_instance,
                    );
                }

                Command::BeginRenderPass(begin) => {
                    target.begin_render_pass(begin);
                }

                Command::EndRenderPass => {
                    target.end_render_pass();
                }

                Command::FillBuffer {
                    buffer,
                    offset,
                    size,
                    data,
                } => {
                    target.fill_buffer(*buffer, *offset, *size, *data);
                }
            }
        }
    }
}

impl CommandBuffer for CommandList {
    fn pipeline_barrier(&mut self, barrier: PipelineBarrier) {
        self.commands.push(Command::PipelineBarrier(barrier));
    }

    fn bind_pipeline(
        &mut self,
        bind_point: vk::PipelineBindPoint,
        pipeline: Pipeline,
    ) {
        self.commands.push(Command::BindPipeline {
            bind_point,
            pipeline,
        });
    }

    fn bind_descriptor_sets(
        &mut self,
        bind_point: vk::PipelineBindPoint,
        layout: PipelineLayout,
        first_set: u32,
        sets: &[DescriptorSet],
    ) {
        self.commands.push(Command::BindDescriptorSets {
            bind_point,
            layout,
            first_set,
            sets: sets.to_vec(),
        });
    }

    fn push_constants(
        &mut self,
        layout: PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        self.commands.push(Command::PushConstants {
            layout,
            stages,
            offset,
            data: data.to_vec(),
        });
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(Command::Dispatch { x, y, z });
    }

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.commands.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn begin_render_pass(&mut self, begin: &RenderPassBegin) {
        self.commands.push(Command::BeginRenderPass(begin.clone()));
    }

    fn end_render_pass(&mut self) {
        self.commands.push(Command::EndRenderPass);
    }

    fn fill_buffer(
        &mut self,
        buffer: Buffer,
        offset: u64,
        size: u64,
        data: u32,
    ) {
        self.commands.push(Command::FillBuffer {
            buffer,
            offset,
            size,
            data,
        });
    }
}
