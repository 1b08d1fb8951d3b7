//! In-memory GPU used by the tests: hands out sequential handles and records
//! everything that gets created, written or destroyed.

use std::cell::RefCell;
use std::sync::Arc;

use ash::vk::{self, Handle};
use fxhash::{FxHashMap, FxHashSet};
use glam::UVec2;

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Created(Object),
    Destroyed(Object),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub size: UVec2,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}

#[derive(Debug, Default)]
pub struct State {
    next_id: u64,

    /// Number of creations left to succeed before the next one fails
    fail_in: Option<usize>,

    pub events: Vec<Event>,
    pub alive: FxHashSet<Object>,
    pub images: FxHashMap<Image, ImageInfo>,
    pub views: FxHashMap<ImageView, ImageViewDesc>,
    pub buffers: FxHashMap<Buffer, (u64, vk::BufferUsageFlags)>,
    pub buffer_contents: FxHashMap<Buffer, Vec<u8>>,
    pub set_layouts:
        FxHashMap<DescriptorSetLayout, Vec<DescriptorSetLayoutBinding>>,
    pub sets: FxHashMap<DescriptorSet, DescriptorSetLayout>,
    pub writes: FxHashMap<(DescriptorSet, u32), DescriptorResource>,
    pub pipeline_layouts: FxHashMap<PipelineLayout, PipelineLayoutDesc>,
    pub compute_pipelines: FxHashMap<Pipeline, ComputePipelineDesc>,
    pub graphics_pipelines: FxHashMap<Pipeline, GraphicsPipelineDesc>,
    pub render_passes: FxHashMap<RenderPass, RenderPassDesc>,
    pub framebuffers: FxHashMap<Framebuffer, FramebufferDesc>,
    pub shader_modules: FxHashMap<ShaderModule, usize>,
}

impl State {
    fn next(&mut self) -> Result<u64, GpuError> {
        match self.fail_in {
            Some(0) => {
                self.fail_in = None;

                return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY.into());
            }
            Some(n) => {
                self.fail_in = Some(n - 1);
            }
            None => (),
        }

        self.next_id += 1;

        Ok(self.next_id)
    }

    fn created(&mut self, object: Object) {
        self.events.push(Event::Created(object));
        self.alive.insert(object);
    }
}

#[derive(Debug, Default)]
pub struct FakeGpu {
    /// Formats the device claims to support; when `None`, every format
    /// supports every feature.
    formats: Option<FxHashMap<vk::Format, vk::FormatFeatureFlags>>,
    pub state: RefCell<State>,
}

impl FakeGpu {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_formats(
        formats: impl IntoIterator<Item = (vk::Format, vk::FormatFeatureFlags)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            formats: Some(formats.into_iter().collect()),
            state: Default::default(),
        })
    }

    pub fn device(self: &Arc<Self>) -> SharedDevice {
        self.clone()
    }

    pub fn allocator(self: &Arc<Self>) -> SharedAllocator {
        self.clone()
    }

    /// Lets the next `n` object creations succeed and makes the one after
    /// them fail; later creations succeed again.
    pub fn fail_after(&self, n: usize) {
        self.state.borrow_mut().fail_in = Some(n);
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn is_alive(&self, object: impl Into<Object>) -> bool {
        self.state.borrow().alive.contains(&object.into())
    }

    pub fn alive_count(&self) -> usize {
        self.state.borrow().alive.len()
    }

    pub fn image(&self, image: Image) -> ImageInfo {
        self.state.borrow().images[&image]
    }

    pub fn write(
        &self,
        set: DescriptorSet,
        binding: u32,
    ) -> DescriptorResource {
        self.state.borrow().writes[&(set, binding)]
    }

    pub fn set_bindings(
        &self,
        set: DescriptorSet,
    ) -> Vec<DescriptorSetLayoutBinding> {
        let state = self.state.borrow();

        state.set_layouts[&state.sets[&set]].clone()
    }

    pub fn pipeline_layout(
        &self,
        layout: PipelineLayout,
    ) -> PipelineLayoutDesc {
        self.state.borrow().pipeline_layouts[&layout].clone()
    }

    pub fn compute_pipeline(
        &self,
        pipeline: Pipeline,
    ) -> ComputePipelineDesc {
        self.state.borrow().compute_pipelines[&pipeline].clone()
    }

    pub fn graphics_pipeline(
        &self,
        pipeline: Pipeline,
    ) -> GraphicsPipelineDesc {
        self.state.borrow().graphics_pipelines[&pipeline].clone()
    }

    pub fn render_pass(&self, render_pass: RenderPass) -> RenderPassDesc {
        self.state.borrow().render_passes[&render_pass].clone()
    }

    pub fn framebuffer(&self, framebuffer: Framebuffer) -> FramebufferDesc {
        self.state.borrow().framebuffers[&framebuffer].clone()
    }

    pub fn buffer_size(&self, buffer: Buffer) -> u64 {
        self.state.borrow().buffers[&buffer].0
    }

    pub fn buffer_contents(&self, buffer: Buffer) -> Vec<u8> {
        self.state
            .borrow()
            .buffer_contents
            .get(&buffer)
            .cloned()
            .unwrap_or_default()
    }
}

impl PhysicalDevice for FakeGpu {
    fn format_features(&self, format: vk::Format) -> vk::FormatFeatureFlags {
        match &self.formats {
            Some(formats) => formats.get(&format).copied().unwrap_or_default(),
            None => {
                vk::FormatFeatureFlags::SAMPLED_IMAGE
                    | vk::FormatFeatureFlags::STORAGE_IMAGE
                    | vk::FormatFeatureFlags::COLOR_ATTACHMENT
                    | vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
            }
        }
    }
}

impl Device for FakeGpu {
    fn create_shader_module(
        &self,
        code: &[u32],
    ) -> Result<ShaderModule, GpuError> {
        let mut state = self.state.borrow_mut();
        let module = ShaderModule::from_raw(state.next()?);

        state.shader_modules.insert(module, code.len());
        state.created(module.into());

        Ok(module)
    }

    fn create_image_view(
        &self,
        desc: &ImageViewDesc,
    ) -> Result<ImageView, GpuError> {
        let mut state = self.state.borrow_mut();

        assert!(
            state.alive.contains(&desc.image.into()),
            "view of a dead image"
        );

        let view = ImageView::from_raw(state.next()?);

        state.views.insert(view, *desc);
        state.created(view.into());

        Ok(view)
    }

    fn create_sampler(&self, _: &SamplerDesc) -> Result<Sampler, GpuError> {
        let mut state = self.state.borrow_mut();
        let sampler = Sampler::from_raw(state.next()?);

        state.created(sampler.into());

        Ok(sampler)
    }

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayout, GpuError> {
        let mut state = self.state.borrow_mut();
        let layout = DescriptorSetLayout::from_raw(state.next()?);

        state.set_layouts.insert(layout, bindings.to_vec());
        state.created(layout.into());

        Ok(layout)
    }

    fn allocate_descriptor_set(
        &self,
        layout: DescriptorSetLayout,
    ) -> Result<DescriptorSet, GpuError> {
        let mut state = self.state.borrow_mut();
        let set = DescriptorSet::from_raw(state.next()?);

        state.sets.insert(set, layout);
        state.created(set.into());

        Ok(set)
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        let mut state = self.state.borrow_mut();

        for write in writes {
            let layout = state.sets[&write.set];

            let binding = state.set_layouts[&layout]
                .iter()
                .find(|binding| binding.binding == write.binding)
                .copied()
                .unwrap_or_else(|| {
                    panic!("binding {} missing from layout", write.binding)
                });

            assert_eq!(binding.ty, write.resource.ty());

            state.writes.insert((write.set, write.binding), write.resource);
        }
    }

    fn create_pipeline_layout(
        &self,
        desc: &PipelineLayoutDesc,
    ) -> Result<PipelineLayout, GpuError> {
        let mut state = self.state.borrow_mut();
        let layout = PipelineLayout::from_raw(state.next()?);

        state.pipeline_layouts.insert(layout, desc.clone());
        state.created(layout.into());

        Ok(layout)
    }

    fn create_compute_pipeline(
        &self,
        desc: &ComputePipelineDesc,
    ) -> Result<Pipeline, GpuError> {
        let mut state = self.state.borrow_mut();
        let pipeline = Pipeline::from_raw(state.next()?);

        state.compute_pipelines.insert(pipeline, desc.clone());
        state.created(pipeline.into());

        Ok(pipeline)
    }

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
    ) -> Result<Pipeline, GpuError> {
        let mut state = self.state.borrow_mut();
        let pipeline = Pipeline::from_raw(state.next()?);

        state.graphics_pipelines.insert(pipeline, desc.clone());
        state.created(pipeline.into());

        Ok(pipeline)
    }

    fn create_render_pass(
        &self,
        desc: &RenderPassDesc,
    ) -> Result<RenderPass, GpuError> {
        let mut state = self.state.borrow_mut();
        let render_pass = RenderPass::from_raw(state.next()?);

        state.render_passes.insert(render_pass, desc.clone());
        state.created(render_pass.into());

        Ok(render_pass)
    }

    fn create_framebuffer(
        &self,
        desc: &FramebufferDesc,
    ) -> Result<Framebuffer, GpuError> {
        let mut state = self.state.borrow_mut();
        let framebuffer = Framebuffer::from_raw(state.next()?);

        state.framebuffers.insert(framebuffer, desc.clone());
        state.created(framebuffer.into());

        Ok(framebuffer)
    }

    fn destroy(&self, object: Object) {
        let mut state = self.state.borrow_mut();

        assert!(state.alive.remove(&object), "double destroy: {object:?}");

        state.events.push(Event::Destroyed(object));
    }
}

impl Allocator for FakeGpu {
    fn create_image_2d(
        &self,
        size: UVec2,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
    ) -> Result<Image, GpuError> {
        let mut state = self.state.borrow_mut();
        let image = Image::from_raw(state.next()?);

        state.images.insert(
            image,
            ImageInfo {
                size,
                format,
                usage,
            },
        );

        state.created(image.into());

        Ok(image)
    }

    fn create_buffer(
        &self,
        size: u64,
        usage: vk::BufferUsageFlags,
    ) -> Result<Buffer, GpuError> {
        let mut state = self.state.borrow_mut();
        let buffer = Buffer::from_raw(state.next()?);

        state.buffers.insert(buffer, (size, usage));
        state.created(buffer.into());

        Ok(buffer)
    }

    fn write_buffer(&self, buffer: Buffer, offset: u64, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let size = state.buffers[&buffer].0 as usize;
        let offset = offset as usize;

        assert!(offset + data.len() <= size, "write out of bounds");

        let contents = state
            .buffer_contents
            .entry(buffer)
            .or_insert_with(|| vec![0; size]);

        contents[offset..offset + data.len()].copy_from_slice(data);
    }

    fn destroy(&self, object: Object) {
        Device::destroy(self, object);
    }
}
