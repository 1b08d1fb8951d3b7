use ash::vk;
use log::debug;

use crate::buffers::DoubleBuffered;
use crate::gpu::{
    DescriptorResource, DescriptorSet, DescriptorSetLayout,
    DescriptorSetLayoutBinding, DescriptorWrite, SharedDevice, Unique,
};
use crate::Result;

/// Descriptor-set layout together with one descriptor set per frame parity.
///
/// Both sets are written up-front (on creation of the resources they point
/// at), so that swapping the current and previous frame never touches
/// descriptors; binding `get(alternate)` is enough.
#[derive(Debug)]
pub struct BindGroup {
    label: String,
    bindings: Vec<DescriptorSetLayoutBinding>,
    sets: DoubleBuffered<Unique<DescriptorSet>>,
    layout: Unique<DescriptorSetLayout>,
}

impl BindGroup {
    pub fn builder(label: impl ToString) -> BindGroupBuilder {
        BindGroupBuilder {
            label: label.to_string(),
            bindings: Default::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> DescriptorSetLayout {
        self.layout.get()
    }

    pub fn bindings(&self) -> &[DescriptorSetLayoutBinding] {
        &self.bindings
    }

    pub fn get(&self, alternate: bool) -> DescriptorSet {
        self.sets.get(alternate).get()
    }

    /// Points binding `n` of the set used on parity `a` at `resources[n][0]`
    /// and of the set used on parity `b` at `resources[n][1]`.
    pub fn write(
        &self,
        device: &SharedDevice,
        resources: &[[DescriptorResource; 2]],
    ) {
        assert_eq!(
            self.bindings.len(),
            resources.len(),
            "bind group `{}` expects {} resources",
            self.label,
            self.bindings.len(),
        );

        debug!("Writing bind group: {}", self.label);

        let writes: Vec<_> = self
            .bindings
            .iter()
            .zip(resources)
            .flat_map(|(binding, resources)| {
                self.sets.to_array().into_iter().zip(resources).map(
                    move |(set, resource)| {
                        assert_eq!(binding.ty, resource.ty());

                        DescriptorWrite {
                            set: set.get(),
                            binding: binding.binding,
                            resource: *resource,
                        }
                    },
                )
            })
            .collect();

        device.update_descriptor_sets(&writes);
    }

    /// Like [`Self::write()`], for resources that don't depend on parity.
    pub fn write_static(
        &self,
        device: &SharedDevice,
        resources: &[DescriptorResource],
    ) {
        let resources: Vec<_> = resources
            .iter()
            .map(|resource| [*resource, *resource])
            .collect();

        self.write(device, &resources);
    }
}

pub struct BindGroupBuilder {
    label: String,
    bindings: Vec<DescriptorSetLayoutBinding>,
}

impl BindGroupBuilder {
    pub fn add(
        mut self,
        ty: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(DescriptorSetLayoutBinding::new(
            self.bindings.len() as u32,
            ty,
            stages,
        ));

        self
    }

    pub fn add_many<const N: usize>(
        mut self,
        items: [vk::DescriptorType; N],
        stages: vk::ShaderStageFlags,
    ) -> Self {
        for ty in items {
            self = self.add(ty, stages);
        }

        self
    }

    pub fn build(self, device: &SharedDevice) -> Result<BindGroup> {
        debug!("Initializing bind group: {}", self.label);

        let layout = Unique::new(
            device,
            device.create_descriptor_set_layout(&self.bindings)?,
        );

        let a = device.allocate_descriptor_set(layout.get())?;
        let a = Unique::new(device, a);
        let b = device.allocate_descriptor_set(layout.get())?;
        let b = Unique::new(device, b);

        Ok(BindGroup {
            label: self.label,
            bindings: self.bindings,
            sets: DoubleBuffered::new(a, b),
            layout,
        })
    }
}
