use ash::vk;
use glam::UVec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use restir_gpu::{EmissiveSample, RestirUniforms, SdfSceneParams};

use crate::buffers::{
    DoubleBuffered, ReservoirBuffers, StorageBuffer, UniformBuffer,
};
use crate::gpu::{
    CommandBuffer, ImageBarrier, PhysicalDevice, PipelineBarrier,
    SharedAllocator, SharedDevice,
};
use crate::{
    AabbTree, AabbTreeBuffers, EmissiveSamplePass, Error, FormatSet,
    FrameContext, FramePass, FrameResources, GBuffer, GBufferPass, Pass,
    RendererConfig, RestirPass, Result, ShaderSet, UnbiasedReusePass,
};

/// Owns the frame graph (G-buffer, emissive sampling, resampling, unbiased
/// reuse) together with every resource it reads and writes, and records it
/// frame after frame.
#[derive(Debug)]
pub struct Renderer {
    device: SharedDevice,
    allocator: SharedAllocator,
    config: RendererConfig,
    formats: FormatSet,
    size: UVec2,
    frame: u32,
    rng: StdRng,

    /// Set whenever the G-buffers and reservoirs got (re)allocated; their
    /// contents are undefined until the next `render()` clears them
    needs_clearing: bool,

    // Resources go before passes, so that the framebuffers are released
    // before the render pass they were created for
    gbuffers: DoubleBuffered<GBuffer>,
    reservoirs: ReservoirBuffers,
    emissive_samples: StorageBuffer,
    uniforms: UniformBuffer<RestirUniforms>,
    sdf_scene: UniformBuffer<SdfSceneParams>,
    aabb_tree: Option<AabbTreeBuffers>,

    gbuffer_pass: GBufferPass,
    emissive_sample_pass: EmissiveSamplePass,
    restir_pass: RestirPass,
    unbiased_reuse_pass: UnbiasedReusePass,
}

impl Renderer {
    pub fn new(
        device: SharedDevice,
        allocator: SharedAllocator,
        physical_device: &dyn PhysicalDevice,
        config: RendererConfig,
        size: UVec2,
        aabb_tree: Option<&AabbTree>,
    ) -> Result<Self> {
        info!(
            "Initializing renderer; size={}x{}, gbuffer={:?}, tracing={:?}",
            size.x, size.y, config.gbuffer, config.tracing
        );

        if size.x == 0 || size.y == 0 {
            return Err(Error::ZeroExtent);
        }

        if config.tracing.is_enabled() && aabb_tree.is_none() {
            return Err(Error::MissingAccelerationStructure);
        }

        ShaderSet::validate(&config)?;

        let formats = FormatSet::resolve(physical_device, config.gbuffer)?;
        let gbuffer_pass = GBufferPass::new(&device, &config, &formats, size)?;
        let render_pass = gbuffer_pass.render_pass();

        let gbuffers = DoubleBuffered::new(
            GBuffer::new(
                &allocator,
                &device,
                "gbuffer_a",
                &formats,
                size,
                render_pass,
            )?,
            GBuffer::new(
                &allocator,
                &device,
                "gbuffer_b",
                &formats,
                size,
                render_pass,
            )?,
        );

        let reservoirs = ReservoirBuffers::new(&allocator, size)?;

        let emissive_samples = StorageBuffer::new(
            &allocator,
            "emissive_samples",
            Self::emissive_samples_len(config.emissive_sample_count),
        )?;

        let uniforms = UniformBuffer::new(
            &allocator,
            "uniforms",
            &RestirUniforms::default(),
        )?;

        let sdf_scene =
            UniformBuffer::new(&allocator, "sdf_scene", &config.sdf_scene)?;

        let aabb_tree = aabb_tree
            .filter(|_| config.tracing.is_enabled())
            .map(|tree| AabbTreeBuffers::new(&allocator, tree))
            .transpose()?;

        let emissive_sample_pass = EmissiveSamplePass::new(&device, &config)?;
        let restir_pass = RestirPass::new(&device, &config)?;
        let unbiased_reuse_pass = UnbiasedReusePass::new(&device, &config)?;

        let mut this = Self {
            rng: StdRng::seed_from_u64(config.seed),
            device,
            allocator,
            config,
            formats,
            size,
            frame: 0,
            needs_clearing: true,
            gbuffers,
            reservoirs,
            emissive_samples,
            uniforms,
            sdf_scene,
            aabb_tree,
            gbuffer_pass,
            emissive_sample_pass,
            restir_pass,
            unbiased_reuse_pass,
        };

        this.bind()?;

        debug!("Renderer ready");

        Ok(this)
    }

    fn emissive_samples_len(count: u32) -> u64 {
        (count.max(1) as u64) * (EmissiveSample::STRIDE as u64)
    }

    /// Points every descriptor set at the current resources.
    fn bind(&mut self) -> Result<()> {
        let resources = FrameResources {
            gbuffers: &self.gbuffers,
            reservoirs: &self.reservoirs,
            emissive_samples: &self.emissive_samples,
            uniforms: &self.uniforms,
            sdf_scene: &self.sdf_scene,
            aabb_tree: self.aabb_tree.as_ref(),
        };

        self.gbuffer_pass.bind(&self.device, &resources);
        self.emissive_sample_pass.bind(&self.device, &resources);
        self.restir_pass.bind(&self.device, &resources)?;
        self.unbiased_reuse_pass.bind(&self.device, &resources)?;

        Ok(())
    }

    /// Reallocates everything that depends on the extent; does nothing when
    /// `size` is the current one.
    ///
    /// When the G-buffers fail to reallocate, the renderer is left without
    /// frame resources: `render()` returns [`Error::NotAllocated`] until a
    /// later `resize()` goes through.
    pub fn resize(&mut self, size: UVec2) -> Result<()> {
        if size == self.size {
            return Ok(());
        }

        if size.x == 0 || size.y == 0 {
            return Err(Error::ZeroExtent);
        }

        info!(
            "Resizing renderer; {}x{} -> {}x{}",
            self.size.x, self.size.y, size.x, size.y
        );

        let reservoirs = ReservoirBuffers::new(&self.allocator, size)?;

        self.gbuffer_pass.resize(&self.device, size)?;

        let render_pass = self.gbuffer_pass.render_pass();

        // Resizing a G-buffer releases its images first
        self.size = UVec2::ZERO;

        for gbuffer in self.gbuffers.iter_mut() {
            gbuffer.resize(
                &self.allocator,
                &self.device,
                &self.formats,
                size,
                render_pass,
            )?;
        }

        self.reservoirs = reservoirs;
        self.size = size;
        self.needs_clearing = true;

        self.bind()
    }

    /// Changes how many emissive samples get generated each frame, growing
    /// the sample buffer when it's too small to hold them.
    pub fn set_emissive_sample_count(&mut self, count: u32) -> Result<()> {
        let len = Self::emissive_samples_len(count);

        self.emissive_sample_pass.sample_count = count;

        if len > self.emissive_samples.size() {
            debug!("Growing emissive samples; count={count}");

            self.emissive_samples =
                StorageBuffer::new(&self.allocator, "emissive_samples", len)?;

            self.bind()?;
        }

        Ok(())
    }

    /// Uploads the per-frame uniforms; the fields the renderer itself keeps
    /// track of (extent, frame index and sample count) are overwritten.
    pub fn write_uniforms(&self, uniforms: &RestirUniforms) {
        self.uniforms.write(&RestirUniforms {
            screen_size: self.size,
            frame: self.frame,
            emissive_sample_count: self.emissive_sample_pass.sample_count,
            ..*uniforms
        });
    }

    /// Records one frame into `cmd`.
    pub fn render(&mut self, cmd: &mut dyn CommandBuffer) -> Result<()> {
        if !self.gbuffers.iter().all(|gbuffer| gbuffer.is_allocated()) {
            return Err(Error::NotAllocated);
        }

        if self.needs_clearing {
            self.clear(cmd);
            self.needs_clearing = false;
        }

        self.emissive_sample_pass.seed = self.rng.gen();

        let frame = FrameContext {
            size: self.size,
            alternate: self.alternate(),
        };

        for pass in self.frame_graph() {
            pass.issue_commands(cmd, &frame);
        }

        self.frame = self.frame.wrapping_add(1);

        Ok(())
    }

    /// Brings freshly allocated images into the layout every pass expects
    /// on entry and zeroes the reservoirs.
    fn clear(&self, cmd: &mut dyn CommandBuffer) {
        debug!("Clearing frame resources");

        let barriers = self.gbuffers.iter().flat_map(|gbuffer| {
            gbuffer.images().map(|(target, image)| ImageBarrier {
                image,
                aspect: self.formats.aspect(target),
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::SHADER_READ,
            })
        });

        cmd.pipeline_barrier(
            PipelineBarrier::execution(
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::FRAGMENT_SHADER
                    | vk::PipelineStageFlags::COMPUTE_SHADER,
            )
            .with_images(barriers),
        );

        self.reservoirs.clear(cmd);
    }

    /// Passes in the order they get recorded.
    pub fn frame_graph(&self) -> [FramePass<'_>; 4] {
        [
            FramePass::GBuffer(&self.gbuffer_pass),
            FramePass::EmissiveSample(&self.emissive_sample_pass),
            FramePass::Restir(&self.restir_pass),
            FramePass::UnbiasedReuse(&self.unbiased_reuse_pass),
        ]
    }

    /// Parity of the frame `render()` records next.
    fn alternate(&self) -> bool {
        self.frame % 2 == 1
    }

    /// Reservoirs of the most recently rendered frame, after the
    /// unbiased-reuse correction.
    pub fn result_reservoirs(&self) -> &StorageBuffer {
        self.reservoirs.result()
    }

    /// G-buffer filled by the most recently rendered frame.
    pub fn current_gbuffer(&self) -> &GBuffer {
        self.gbuffers.past(self.alternate())
    }

    /// G-buffer of the frame before the most recently rendered one; it gets
    /// overwritten by the next `render()`.
    pub fn previous_gbuffer(&self) -> &GBuffer {
        self.gbuffers.get(self.alternate())
    }

    pub fn reservoirs(&self) -> &ReservoirBuffers {
        &self.reservoirs
    }

    pub fn formats(&self) -> &FormatSet {
        &self.formats
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        info!("Releasing renderer; frames={}", self.frame);
    }
}
