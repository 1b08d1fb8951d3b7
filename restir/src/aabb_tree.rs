mod bounding_box;
mod builder;
mod serializer;

use std::mem;

use glam::Vec3;
use log::{debug, info};
use restir_gpu::{AabbNode, AabbTriangle};

pub use self::bounding_box::*;
use crate::buffers::StorageBuffer;
use crate::gpu::SharedAllocator;
use crate::Result;

/// Bounding-volume hierarchy over the scene's triangles, flattened into the
/// layout the software ray tracer walks.
#[derive(Clone, Debug, Default)]
pub struct AabbTree {
    nodes: Vec<AabbNode>,
    triangles: Vec<AabbTriangle>,
}

impl AabbTree {
    pub fn build(triangles: impl IntoIterator<Item = [Vec3; 3]>) -> Self {
        let triangles: Vec<_> = triangles
            .into_iter()
            .enumerate()
            .map(|(triangle_id, positions)| {
                AabbTriangle::new(triangle_id as u32, positions)
            })
            .collect();

        info!("Building AABB tree; triangles={}", triangles.len());

        if triangles.is_empty() {
            return Self {
                nodes: vec![AabbNode::leaf(Vec3::ZERO, Vec3::ZERO, 0..0)],
                triangles,
            };
        }

        let mut primitives: Vec<_> = triangles
            .iter()
            .map(|triangle| builder::Primitive {
                bounds: BoundingBox::from_triangle(triangle.positions()),
                center: triangle.center(),
                triangle_id: triangle.triangle_id,
            })
            .collect();

        let root = builder::run(&mut primitives);
        let nodes = serializer::run(&root);

        let triangles = primitives
            .iter()
            .map(|primitive| triangles[primitive.triangle_id as usize])
            .collect();

        debug!("AABB tree ready; nodes={}", nodes.len());

        Self { nodes, triangles }
    }

    pub fn nodes(&self) -> &[AabbNode] {
        &self.nodes
    }

    /// Triangles, ordered so that each leaf covers a contiguous range.
    pub fn triangles(&self) -> &[AabbTriangle] {
        &self.triangles
    }

    pub fn is_occluded(&self, from: Vec3, to: Vec3) -> bool {
        restir_gpu::is_occluded(&self.nodes, &self.triangles, from, to)
    }
}

/// GPU copy of an [`AabbTree`]; immutable for the scene's lifetime.
#[derive(Debug)]
pub struct AabbTreeBuffers {
    nodes: StorageBuffer,
    triangles: StorageBuffer,
}

impl AabbTreeBuffers {
    pub fn new(allocator: &SharedAllocator, tree: &AabbTree) -> Result<Self> {
        let nodes = Self::upload(allocator, "aabb_nodes", tree.nodes())?;
        let triangles =
            Self::upload(allocator, "aabb_triangles", tree.triangles())?;

        Ok(Self { nodes, triangles })
    }

    fn upload<T>(
        allocator: &SharedAllocator,
        label: &str,
        items: &[T],
    ) -> Result<StorageBuffer>
    where
        T: bytemuck::Pod,
    {
        // Empty storage buffers can't be bound, so keep room for at least
        // one item
        let size = (items.len().max(1) * mem::size_of::<T>()) as u64;
        let buffer = StorageBuffer::new(allocator, label, size)?;

        if !items.is_empty() {
            allocator.write_buffer(
                buffer.get(),
                0,
                bytemuck::cast_slice(items),
            );
        }

        Ok(buffer)
    }

    pub fn nodes(&self) -> &StorageBuffer {
        &self.nodes
    }

    pub fn triangles(&self) -> &StorageBuffer {
        &self.triangles
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;
    use crate::gpu::testing::FakeGpu;

    fn quad(z: f32, x: f32) -> [[Vec3; 3]; 2] {
        [
            [
                vec3(x - 1.0, -1.0, z),
                vec3(x + 1.0, -1.0, z),
                vec3(x + 1.0, 1.0, z),
            ],
            [
                vec3(x - 1.0, -1.0, z),
                vec3(x + 1.0, 1.0, z),
                vec3(x - 1.0, 1.0, z),
            ],
        ]
    }

    fn scene() -> AabbTree {
        AabbTree::build(
            [quad(0.0, 0.0), quad(5.0, 10.0), quad(-5.0, -10.0)]
                .into_iter()
                .flatten(),
        )
    }

    #[test]
    fn every_triangle_is_reachable_once() {
        let tree = scene();
        let mut seen = vec![0; 6];

        for node in tree.nodes() {
            if node.is_leaf() {
                for id in node.triangles() {
                    seen[tree.triangles()[id as usize].triangle_id as usize] +=
                        1;
                }
            }
        }

        assert_eq!(vec![1; 6], seen);
    }

    #[test]
    fn occlusion() {
        let tree = scene();

        assert!(tree.is_occluded(vec3(0.3, -0.2, -2.0), vec3(0.3, -0.2, 2.0)));
        assert!(tree.is_occluded(vec3(10.0, 0.5, 3.0), vec3(10.0, 0.5, 7.0)));
        assert!(!tree.is_occluded(vec3(5.0, 0.0, -2.0), vec3(5.0, 0.0, 2.0)));
        assert!(!tree.is_occluded(vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, 2.0)));
    }

    #[test]
    fn empty_scene() {
        let tree = AabbTree::build([]);

        assert_eq!(1, tree.nodes().len());
        assert!(!tree.is_occluded(Vec3::ZERO, Vec3::ONE));
    }

    #[test]
    fn upload() {
        let gpu = FakeGpu::new();
        let tree = scene();
        let buffers = AabbTreeBuffers::new(&gpu.allocator(), &tree).unwrap();

        assert_eq!(
            bytemuck::cast_slice::<_, u8>(tree.nodes()),
            gpu.buffer_contents(buffers.nodes().get()).as_slice()
        );

        assert_eq!(
            (6 * mem::size_of::<AabbTriangle>()) as u64,
            gpu.buffer_size(buffers.triangles().get())
        );
    }
}
