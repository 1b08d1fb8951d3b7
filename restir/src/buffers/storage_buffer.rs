use ash::vk;
use log::debug;

use crate::gpu::{
    Buffer, BufferRange, DescriptorResource, SharedAllocator, Unique,
};
use crate::Result;

/// Device-local buffer read and written by shaders.
#[derive(Debug)]
pub struct StorageBuffer {
    buffer: Unique<Buffer>,
    size: u64,
}

impl StorageBuffer {
    pub fn new(
        allocator: &SharedAllocator,
        label: impl AsRef<str>,
        size: u64,
    ) -> Result<Self> {
        Self::with_usage(
            allocator,
            label,
            size,
            vk::BufferUsageFlags::STORAGE_BUFFER,
        )
    }

    pub(crate) fn with_usage(
        allocator: &SharedAllocator,
        label: impl AsRef<str>,
        size: u64,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        let label = label.as_ref();

        assert!(size > 0, "buffer `{label}` must not be empty");

        debug!("Allocating storage buffer `{label}`; size={size}");

        let buffer = allocator.create_buffer(size, usage)?;

        Ok(Self {
            buffer: Unique::new(allocator, buffer),
            size,
        })
    }

    pub fn get(&self) -> Buffer {
        self.buffer.get()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn bind(&self) -> DescriptorResource {
        DescriptorResource::StorageBuffer(BufferRange::whole(
            self.buffer.get(),
            self.size,
        ))
    }
}
