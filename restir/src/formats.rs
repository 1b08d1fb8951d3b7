use ash::vk;
use log::debug;

use crate::gpu::{is_depth_format, PhysicalDevice};
use crate::{Error, GBufferMode, Result};

/// One of the five images making up a G-buffer, listed in attachment order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GBufferTarget {
    Albedo,
    Normal,
    MaterialProperties,
    WorldPosition,
    Depth,
}

impl GBufferTarget {
    pub const ALL: [Self; 5] = [
        Self::Albedo,
        Self::Normal,
        Self::MaterialProperties,
        Self::WorldPosition,
        Self::Depth,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Albedo => "albedo",
            Self::Normal => "normal",
            Self::MaterialProperties => "material_properties",
            Self::WorldPosition => "world_position",
            Self::Depth => "depth",
        }
    }

    fn candidates(self, mode: GBufferMode) -> &'static [vk::Format] {
        use vk::Format as F;

        match (mode, self) {
            (GBufferMode::Raster, Self::Albedo) => &[F::R8G8B8A8_SRGB],
            (GBufferMode::Raster, Self::Normal) => &[
                F::R16G16B16_SNORM,
                F::R16G16B16_SFLOAT,
                F::R16G16B16A16_SNORM,
                F::R16G16B16A16_SFLOAT,
                F::R32G32B32_SFLOAT,
            ],
            (GBufferMode::Raster, Self::MaterialProperties) => {
                &[F::R16G16_UNORM]
            }
            (GBufferMode::Raster, Self::WorldPosition) => {
                &[F::R32G32B32_SFLOAT, F::R32G32B32A32_SFLOAT]
            }
            (GBufferMode::Raster, Self::Depth) => &[
                F::D32_SFLOAT,
                F::D32_SFLOAT_S8_UINT,
                F::D24_UNORM_S8_UINT,
            ],

            (GBufferMode::Compute, Self::Albedo) => {
                &[F::R8G8B8A8_UNORM, F::R16G16B16A16_SFLOAT]
            }
            (GBufferMode::Compute, Self::Normal) => &[
                F::R16G16B16A16_SNORM,
                F::R16G16B16A16_SFLOAT,
                F::R32G32B32A32_SFLOAT,
            ],
            (GBufferMode::Compute, Self::MaterialProperties) => {
                &[F::R16G16_UNORM, F::R16G16_SFLOAT]
            }
            (GBufferMode::Compute, Self::WorldPosition) => {
                &[F::R32G32B32A32_SFLOAT]
            }
            (GBufferMode::Compute, Self::Depth) => &[F::R32_SFLOAT],
        }
    }

    fn required_features(self, mode: GBufferMode) -> vk::FormatFeatureFlags {
        let attachment = match (mode, self) {
            (GBufferMode::Raster, Self::Depth) => {
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
            }
            (GBufferMode::Raster, _) => {
                vk::FormatFeatureFlags::COLOR_ATTACHMENT
            }
            (GBufferMode::Compute, _) => vk::FormatFeatureFlags::STORAGE_IMAGE,
        };

        attachment | vk::FormatFeatureFlags::SAMPLED_IMAGE
    }
}

/// Formats chosen for each G-buffer target on the current device.
///
/// Resolved once, when the renderer gets created; everything that allocates
/// G-buffer images or builds a render pass receives it by reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatSet {
    mode: GBufferMode,
    formats: [vk::Format; 5],
}

impl FormatSet {
    /// Picks, for each target, the first candidate format whose optimal-tiling
    /// features cover everything the target is used for.
    pub fn resolve(
        physical_device: &dyn PhysicalDevice,
        mode: GBufferMode,
    ) -> Result<Self> {
        let mut formats = [vk::Format::UNDEFINED; 5];

        for target in GBufferTarget::ALL {
            let candidates = target.candidates(mode);
            let required = target.required_features(mode);

            let format = candidates
                .iter()
                .copied()
                .find(|&format| {
                    physical_device.format_features(format).contains(required)
                })
                .ok_or_else(|| Error::UnsupportedFormat {
                    target,
                    candidates: candidates.to_vec(),
                })?;

            debug!("Resolved format: {}={:?}", target.label(), format);

            formats[target.index()] = format;
        }

        Ok(Self { mode, formats })
    }

    pub fn mode(&self) -> GBufferMode {
        self.mode
    }

    pub fn get(&self, target: GBufferTarget) -> vk::Format {
        self.formats[target.index()]
    }

    pub fn usage(&self, target: GBufferTarget) -> vk::ImageUsageFlags {
        let attachment = match (self.mode, target) {
            (GBufferMode::Raster, GBufferTarget::Depth) => {
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
            }
            (GBufferMode::Raster, _) => vk::ImageUsageFlags::COLOR_ATTACHMENT,
            (GBufferMode::Compute, _) => vk::ImageUsageFlags::STORAGE,
        };

        attachment | vk::ImageUsageFlags::SAMPLED
    }

    pub fn aspect(&self, target: GBufferTarget) -> vk::ImageAspectFlags {
        let format = self.get(target);

        if !is_depth_format(format) {
            vk::ImageAspectFlags::COLOR
        } else if format == vk::Format::D32_SFLOAT {
            vk::ImageAspectFlags::DEPTH
        } else {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
    }
}
