use restir_gpu::AabbNode;

use super::builder::Node;

/// Flattens the tree depth-first: left children directly follow their
/// parents, right children are referenced by index.
pub fn run(root: &Node) -> Vec<AabbNode> {
    let mut buffer = Vec::new();

    walk(root, &mut buffer);
    buffer
}

fn walk(node: &Node, buffer: &mut Vec<AabbNode>) -> u32 {
    let ptr = buffer.len();

    match node {
        Node::Internal {
            bounds,
            left,
            right,
        } => {
            buffer.push(Default::default());

            let _left_ptr = walk(left, buffer);
            let right_ptr = walk(right, buffer);

            buffer[ptr] =
                AabbNode::internal(bounds.min(), bounds.max(), right_ptr);
        }

        Node::Leaf { bounds, primitives } => {
            buffer.push(AabbNode::leaf(
                bounds.min(),
                bounds.max(),
                (primitives.start as u32)..(primitives.end as u32),
            ));
        }
    }

    ptr as u32
}
