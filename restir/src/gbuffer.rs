use ash::vk::{self, Handle};
use glam::UVec2;
use log::debug;

use crate::gpu::{
    Framebuffer, FramebufferDesc, Image, ImageView, ImageViewDesc, RenderPass,
    SharedAllocator, SharedDevice, Unique,
};
use crate::{Error, FormatSet, GBufferTarget, Result};

/// Per-pixel surface attributes of a single frame: five images (see
/// [`GBufferTarget`]), their views and, when filled by rasterization, the
/// framebuffer over them.
#[derive(Debug)]
pub struct GBuffer {
    label: String,
    size: UVec2,

    // Field order matters: the framebuffer must go before the views, and the
    // views before the images
    framebuffer: Option<Unique<Framebuffer>>,
    views: Vec<Unique<ImageView>>,
    images: Vec<Unique<Image>>,
}

impl GBuffer {
    pub fn new(
        allocator: &SharedAllocator,
        device: &SharedDevice,
        label: impl ToString,
        formats: &FormatSet,
        size: UVec2,
        render_pass: Option<RenderPass>,
    ) -> Result<Self> {
        let mut this = Self {
            label: label.to_string(),
            size: UVec2::ZERO,
            framebuffer: None,
            views: Vec::new(),
            images: Vec::new(),
        };

        this.resize(allocator, device, formats, size, render_pass)?;

        Ok(this)
    }

    /// Releases the framebuffer, views and images (in that order) and
    /// allocates fresh ones sized `size`.
    ///
    /// The framebuffer gets created only when `render_pass` is given; it binds
    /// the images as attachments in [`GBufferTarget::ALL`] order.
    ///
    /// When allocation fails, whatever got created so far is released and the
    /// gbuffer is left empty (see [`Self::is_allocated()`]); calling `resize()`
    /// again starts over.
    pub fn resize(
        &mut self,
        allocator: &SharedAllocator,
        device: &SharedDevice,
        formats: &FormatSet,
        size: UVec2,
        render_pass: Option<RenderPass>,
    ) -> Result<()> {
        if size.x == 0 || size.y == 0 {
            return Err(Error::ZeroExtent);
        }

        debug!(
            "Allocating gbuffer `{}`; size={}x{}",
            self.label, size.x, size.y
        );

        self.size = UVec2::ZERO;
        self.framebuffer = None;
        self.views.clear();
        self.images.clear();

        let images = GBufferTarget::ALL
            .into_iter()
            .map(|target| {
                let image = allocator.create_image_2d(
                    size,
                    formats.get(target),
                    formats.usage(target),
                )?;

                Ok(Unique::new(allocator, image))
            })
            .collect::<Result<Vec<_>>>()?;

        let views = GBufferTarget::ALL
            .into_iter()
            .zip(&images)
            .map(|(target, image)| {
                let view = device.create_image_view(&ImageViewDesc {
                    image: image.get(),
                    format: formats.get(target),
                    aspect: formats.aspect(target),
                })?;

                Ok(Unique::new(device, view))
            })
            .collect::<Result<Vec<_>>>()?;

        let framebuffer = if let Some(render_pass) = render_pass {
            let framebuffer = device.create_framebuffer(&FramebufferDesc {
                render_pass,
                attachments: views.iter().map(|view| view.get()).collect(),
                size,
                layers: 1,
            })?;

            Some(Unique::new(device, framebuffer))
        } else {
            None
        };

        self.framebuffer = framebuffer;
        self.views = views;
        self.images = images;
        self.size = size;

        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Whether the last [`Self::resize()`] went through; an unallocated
    /// gbuffer hands out null handles.
    pub fn is_allocated(&self) -> bool {
        self.images.len() == GBufferTarget::ALL.len()
    }

    pub fn image(&self, target: GBufferTarget) -> Image {
        self.images
            .get(target.index())
            .map_or_else(vk::Image::null, |image| image.get())
    }

    pub fn images(&self) -> impl Iterator<Item = (GBufferTarget, Image)> + '_ {
        GBufferTarget::ALL
            .into_iter()
            .zip(&self.images)
            .map(|(target, image)| (target, image.get()))
    }

    pub fn view(&self, target: GBufferTarget) -> ImageView {
        self.views
            .get(target.index())
            .map_or_else(vk::ImageView::null, |view| view.get())
    }

    pub fn framebuffer(&self) -> Option<Framebuffer> {
        self.framebuffer.as_ref().map(|framebuffer| framebuffer.get())
    }

    pub fn albedo_view(&self) -> ImageView {
        self.view(GBufferTarget::Albedo)
    }

    pub fn normal_view(&self) -> ImageView {
        self.view(GBufferTarget::Normal)
    }

    pub fn material_properties_view(&self) -> ImageView {
        self.view(GBufferTarget::MaterialProperties)
    }

    pub fn world_position_view(&self) -> ImageView {
        self.view(GBufferTarget::WorldPosition)
    }

    pub fn depth_view(&self) -> ImageView {
        self.view(GBufferTarget::Depth)
    }
}
