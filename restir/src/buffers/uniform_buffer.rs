use std::marker::PhantomData;
use std::mem;

use ash::vk;
use bytemuck::Pod;
use log::debug;

use crate::gpu::{
    Buffer, BufferRange, DescriptorResource, SharedAllocator, Unique,
};
use crate::Result;

/// Host-visible buffer holding a single `T`.
#[derive(Debug)]
pub struct UniformBuffer<T> {
    allocator: SharedAllocator,
    buffer: Unique<Buffer>,
    _data: PhantomData<T>,
}

impl<T> UniformBuffer<T>
where
    T: Pod,
{
    pub fn new(
        allocator: &SharedAllocator,
        label: impl AsRef<str>,
        data: &T,
    ) -> Result<Self> {
        let label = label.as_ref();
        let size = Self::size();

        debug!("Allocating uniform buffer `{label}`; size={size}");

        let buffer = allocator
            .create_buffer(size, vk::BufferUsageFlags::UNIFORM_BUFFER)?;

        let this = Self {
            allocator: allocator.clone(),
            buffer: Unique::new(allocator, buffer),
            _data: PhantomData,
        };

        this.write(data);

        Ok(this)
    }

    pub fn size() -> u64 {
        mem::size_of::<T>() as u64
    }

    pub fn get(&self) -> Buffer {
        self.buffer.get()
    }

    pub fn write(&self, data: &T) {
        self.allocator
            .write_buffer(self.buffer.get(), 0, bytemuck::bytes_of(data));
    }

    pub fn bind(&self) -> DescriptorResource {
        DescriptorResource::UniformBuffer(BufferRange::whole(
            self.buffer.get(),
            Self::size(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use restir_gpu::SdfSceneParams;

    use super::*;
    use crate::gpu::testing::FakeGpu;

    #[test]
    fn uploads_on_creation_and_write() {
        let gpu = FakeGpu::new();
        let params = SdfSceneParams::default();

        let buffer =
            UniformBuffer::new(&gpu.allocator(), "sdf_scene", &params).unwrap();

        assert_eq!(32, gpu.buffer_size(buffer.get()));

        assert_eq!(
            bytemuck::bytes_of(&params),
            gpu.buffer_contents(buffer.get()).as_slice()
        );

        let mut params = params;

        params.sdf_scene.w = 2.5;
        buffer.write(&params);

        assert_eq!(
            bytemuck::bytes_of(&params),
            gpu.buffer_contents(buffer.get()).as_slice()
        );
    }
}
