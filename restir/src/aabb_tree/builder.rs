use std::ops::Range;

use glam::{UVec3, Vec3};

use super::BoundingBox;

const BINS: usize = 12;

#[derive(Clone, Copy, Debug)]
pub struct Primitive {
    pub bounds: BoundingBox,
    pub center: Vec3,
    pub triangle_id: u32,
}

#[derive(Debug)]
pub enum Node {
    Internal {
        bounds: BoundingBox,
        left: Box<Node>,
        right: Box<Node>,
    },

    Leaf {
        bounds: BoundingBox,
        primitives: Range<usize>,
    },
}

/// Builds the tree using binned SAH, reordering `primitives` so that every
/// leaf refers to a contiguous range of them.
///
/// Special thanks to:
/// - https://jacco.ompf2.com/2022/04/13/how-to-build-a-bvh-part-1-basics/,
/// - https://github.com/svenstaro/bvh.
pub fn run(primitives: &mut [Primitive]) -> Node {
    balance(primitives, 0)
}

fn balance(primitives: &mut [Primitive], offset: usize) -> Node {
    let bounds: BoundingBox =
        primitives.iter().map(|primitive| primitive.bounds).collect();

    let len = primitives.len();

    let leaf = || Node::Leaf {
        bounds,
        primitives: offset..(offset + len),
    };

    let Some(plane) = find_splitting_plane(primitives) else {
        return leaf();
    };

    if plane.split_cost >= (len as f32) * bounds.half_area() {
        return leaf();
    }

    let mid = partition(primitives, plane);

    if mid == 0 || mid == len {
        return leaf();
    }

    let (left, right) = primitives.split_at_mut(mid);

    Node::Internal {
        bounds,
        left: Box::new(balance(left, offset)),
        right: Box::new(balance(right, offset + mid)),
    }
}

fn find_splitting_plane(primitives: &[Primitive]) -> Option<SplittingPlane> {
    if primitives.len() <= 1 {
        return None;
    }

    let centroid_bb: BoundingBox =
        primitives.iter().map(|primitive| primitive.center).collect();

    let mut bins = [[Bin::default(); BINS]; 3];
    let scale = (BINS as f32) / centroid_bb.extent();

    for primitive in primitives {
        let bin_id = scale * (primitive.center - centroid_bb.min());
        let bin_id = bin_id.as_uvec3().min(UVec3::splat((BINS as u32) - 1));

        for axis in 0..3 {
            let bin = &mut bins[axis][bin_id[axis] as usize];

            bin.count += 1;
            bin.bounds += primitive.bounds;
        }
    }

    // ---

    let mut left_areas = [[0.0; BINS - 1]; 3];
    let mut right_areas = [[0.0; BINS - 1]; 3];
    let mut left_counts = [[0; BINS - 1]; 3];
    let mut right_counts = [[0; BINS - 1]; 3];

    for axis in 0..3 {
        let mut left_bb = BoundingBox::default();
        let mut right_bb = BoundingBox::default();
        let mut left_count = 0;
        let mut right_count = 0;

        for i in 0..(BINS - 1) {
            let left_bin = bins[axis][i];

            left_count += left_bin.count;
            left_bb += left_bin.bounds;
            left_counts[axis][i] = left_count;
            left_areas[axis][i] = left_bb.half_area();

            let right_bin = bins[axis][BINS - 1 - i];

            right_count += right_bin.count;
            right_bb += right_bin.bounds;
            right_counts[axis][BINS - 2 - i] = right_count;
            right_areas[axis][BINS - 2 - i] = right_bb.half_area();
        }
    }

    // ---

    let mut best: Option<SplittingPlane> = None;
    let scale = centroid_bb.extent() / (BINS as f32);

    for axis in 0..3 {
        for i in 0..(BINS - 1) {
            let left_cost = if left_counts[axis][i] > 0 {
                (left_counts[axis][i] as f32) * left_areas[axis][i]
            } else {
                0.0
            };

            let right_cost = if right_counts[axis][i] > 0 {
                (right_counts[axis][i] as f32) * right_areas[axis][i]
            } else {
                0.0
            };

            let split_cost = left_cost + right_cost;

            let is_current_bin_better =
                best.map_or(true, |best| split_cost < best.split_cost);

            if is_current_bin_better {
                best = Some(SplittingPlane {
                    split_by: axis,
                    split_at: centroid_bb.min()[axis]
                        + scale[axis] * ((i + 1) as f32),
                    split_cost,
                });
            }
        }
    }

    best
}

/// Moves primitives lying before the plane to the front; returns how many
/// there are.
fn partition(primitives: &mut [Primitive], plane: SplittingPlane) -> usize {
    let mut mid = 0;

    for i in 0..primitives.len() {
        if primitives[i].center[plane.split_by] < plane.split_at {
            primitives.swap(i, mid);
            mid += 1;
        }
    }

    mid
}

#[derive(Clone, Copy, Debug, Default)]
struct Bin {
    bounds: BoundingBox,
    count: u32,
}

#[derive(Clone, Copy, Debug)]
struct SplittingPlane {
    split_by: usize,
    split_at: f32,
    split_cost: f32,
}
