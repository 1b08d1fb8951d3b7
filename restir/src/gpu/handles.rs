use std::fmt::Debug;

use ash::vk;
use derivative::Derivative;

use super::{SharedAllocator, SharedDevice};

pub use ash::vk::{
    Buffer, DescriptorSet, DescriptorSetLayout, Framebuffer, Image, ImageView,
    Pipeline, PipelineLayout, RenderPass, Sampler, ShaderModule,
};

macro_rules! objects {
    ([ $( $name:ident, )* ]) => {
        $(
            impl From<vk::$name> for Object {
                fn from(handle: vk::$name) -> Self {
                    Object::$name(handle)
                }
            }
        )*

        /// Any object created through a [`super::Device`] or an
        /// [`super::Allocator`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Object {
            $( $name(vk::$name), )*
        }
    };
}

objects!([
    Buffer,
    DescriptorSet,
    DescriptorSetLayout,
    Framebuffer,
    Image,
    ImageView,
    Pipeline,
    PipelineLayout,
    RenderPass,
    Sampler,
    ShaderModule,
]);

pub trait ObjectHandle: Copy + Debug + Into<Object> {}

impl<T> ObjectHandle for T where T: Copy + Debug + Into<Object> {}

/// Whoever created an object and so has to destroy it.
#[derive(Clone)]
pub enum Owner {
    Device(SharedDevice),
    Allocator(SharedAllocator),
}

impl From<&SharedDevice> for Owner {
    fn from(device: &SharedDevice) -> Self {
        Self::Device(device.clone())
    }
}

impl From<&SharedAllocator> for Owner {
    fn from(allocator: &SharedAllocator) -> Self {
        Self::Allocator(allocator.clone())
    }
}

/// Sole owner of a GPU object; the object gets destroyed when this value is
/// dropped.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Unique<H>
where
    H: ObjectHandle,
{
    handle: H,
    #[derivative(Debug = "ignore")]
    owner: Owner,
}

impl<H> Unique<H>
where
    H: ObjectHandle,
{
    pub fn new(owner: impl Into<Owner>, handle: H) -> Self {
        Self {
            handle,
            owner: owner.into(),
        }
    }

    pub fn get(&self) -> H {
        self.handle
    }
}

impl<H> Drop for Unique<H>
where
    H: ObjectHandle,
{
    fn drop(&mut self) {
        let object = self.handle.into();

        match &self.owner {
            Owner::Device(device) => device.destroy(object),
            Owner::Allocator(allocator) => allocator.destroy(object),
        }
    }
}
