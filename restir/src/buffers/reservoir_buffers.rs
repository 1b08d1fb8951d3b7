use ash::vk;
use glam::UVec2;
use log::debug;
use restir_gpu::ReservoirData;

use crate::buffers::{DoubleBuffered, StorageBuffer};
use crate::gpu::{CommandBuffer, PipelineBarrier, SharedAllocator};
use crate::Result;

/// Per-pixel reservoirs: the current / previous pair used for temporal reuse
/// and the result buffer written by the unbiased-reuse correction.
#[derive(Debug)]
pub struct ReservoirBuffers {
    size: UVec2,
    reservoirs: DoubleBuffered<StorageBuffer>,
    result: StorageBuffer,
}

impl ReservoirBuffers {
    pub fn new(allocator: &SharedAllocator, size: UVec2) -> Result<Self> {
        let len = Self::len_for(size);

        debug!("Allocating reservoirs; size={}x{}", size.x, size.y);

        let alloc = |label: &str| {
            StorageBuffer::with_usage(
                allocator,
                label,
                len,
                vk::BufferUsageFlags::STORAGE_BUFFER
                    | vk::BufferUsageFlags::TRANSFER_DST,
            )
        };

        Ok(Self {
            size,
            reservoirs: DoubleBuffered::new(
                alloc("reservoirs_a")?,
                alloc("reservoirs_b")?,
            ),
            result: alloc("reservoirs_result")?,
        })
    }

    /// Size of each buffer, in bytes.
    pub fn len_for(size: UVec2) -> u64 {
        (size.x as u64) * (size.y as u64) * (ReservoirData::STRIDE as u64)
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Reservoir written on parity `alternate`.
    pub fn current(&self, alternate: bool) -> &StorageBuffer {
        self.reservoirs.get(alternate)
    }

    /// Reservoir written a frame ago, read as temporal history.
    pub fn previous(&self, alternate: bool) -> &StorageBuffer {
        self.reservoirs.past(alternate)
    }

    pub fn reservoirs(&self) -> &DoubleBuffered<StorageBuffer> {
        &self.reservoirs
    }

    pub fn result(&self) -> &StorageBuffer {
        &self.result
    }

    /// Zeroes all three buffers, so that the first frame doesn't pick up
    /// garbage as its history.
    pub fn clear(&self, cmd: &mut dyn CommandBuffer) {
        for buffer in self.reservoirs.iter().chain([&self.result]) {
            cmd.fill_buffer(buffer.get(), 0, buffer.size(), 0);
        }

        cmd.pipeline_barrier(
            PipelineBarrier::execution(
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::COMPUTE_SHADER,
            )
            .with_memory(
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            ),
        );
    }
}
