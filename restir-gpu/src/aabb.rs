use core::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Node of the AABB tree, laid out depth-first: an internal node's left child
/// always follows it directly, its right child is pointed at explicitly.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct AabbNode {
    pub min: Vec3,
    pub payload0: u32,
    pub max: Vec3,
    pub payload1: u32,
}

impl AabbNode {
    const OP_INTERNAL: u32 = 0;
    const OP_LEAF: u32 = 1;

    pub fn internal(min: Vec3, max: Vec3, right: u32) -> Self {
        Self {
            min,
            payload0: Self::OP_INTERNAL | (right << 1),
            max,
            payload1: 0,
        }
    }

    pub fn leaf(min: Vec3, max: Vec3, triangles: Range<u32>) -> Self {
        Self {
            min,
            payload0: Self::OP_LEAF | (triangles.start << 1),
            max,
            payload1: triangles.end - triangles.start,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.payload0 & 1 == Self::OP_LEAF
    }

    /// Index of the right child; meaningful for internal nodes only.
    pub fn right(&self) -> u32 {
        self.payload0 >> 1
    }

    /// Triangles held by this leaf; meaningful for leaves only.
    pub fn triangles(&self) -> Range<u32> {
        let start = self.payload0 >> 1;

        start..start.saturating_add(self.payload1)
    }

    /// Slab test; returns whether the ray segment `[0, max_t]` touches this
    /// node's box.
    pub fn hits(&self, origin: Vec3, inv_dir: Vec3, max_t: f32) -> bool {
        let t0 = (self.min - origin) * inv_dir;
        let t1 = (self.max - origin) * inv_dir;

        let near = t0.min(t1).max_element().max(0.0);
        let far = t0.max(t1).min_element().min(max_t);

        near <= far
    }
}

/// Scene triangle as seen by the software ray tracer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct AabbTriangle {
    pub v0: Vec3,

    /// Index of this triangle in the scene, before the tree reordered it
    pub triangle_id: u32,
    pub v1: Vec3,
    pub _padding0: u32,
    pub v2: Vec3,
    pub _padding1: u32,
}

impl AabbTriangle {
    pub fn new(triangle_id: u32, [v0, v1, v2]: [Vec3; 3]) -> Self {
        Self {
            v0,
            triangle_id,
            v1,
            _padding0: 0,
            v2,
            _padding1: 0,
        }
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn center(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Möller-Trumbore; returns the hit distance along `dir`.
    pub fn hit(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let p = dir.cross(e2);
        let det = e1.dot(p);

        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = origin - self.v0;
        let u = s.dot(p) * inv_det;

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = dir.dot(q) * inv_det;

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(q) * inv_det;

        (t > EPSILON).then_some(t)
    }
}

/// Returns whether anything blocks the segment between `from` and `to`,
/// excluding a small margin at both ends (so that the surfaces the segment
/// connects don't occlude themselves).
pub fn is_occluded(
    nodes: &[AabbNode],
    triangles: &[AabbTriangle],
    from: Vec3,
    to: Vec3,
) -> bool {
    const MARGIN: f32 = 1e-3;

    let delta = to - from;
    let len = delta.length();

    if nodes.is_empty() || len <= 2.0 * MARGIN {
        return false;
    }

    let dir = delta / len;
    let inv_dir = dir.recip();
    let max_t = len - MARGIN;

    let mut stack = Vec::with_capacity(32);
    let mut ptr = 0u32;

    loop {
        // Dangling pointers and out-of-range triangles count as misses; child
        // pointers must point forward, which keeps the walk finite
        let node = nodes
            .get(ptr as usize)
            .filter(|node| node.hits(from, inv_dir, max_t));

        if let Some(node) = node {
            if node.is_leaf() {
                for id in node.triangles() {
                    let Some(triangle) = triangles.get(id as usize) else {
                        break;
                    };

                    let hit = triangle.hit(from, dir);

                    if hit.map_or(false, |t| t > MARGIN && t < max_t) {
                        return true;
                    }
                }
            } else if node.right() > ptr {
                stack.push(node.right());
                ptr += 1;
                continue;
            }
        }

        match stack.pop() {
            Some(next) => ptr = next,
            None => return false,
        }
    }
}
