//! Build a small forest and print the generated LLVM IR to stdout.
//!
//! Demonstrates the core output contract: one `tree_<i>`
//! function per tree plus `forest_root`, with the intrinsic declarations.

use boreal::ast::{DecisionNode, Feature, Forest, MissingType, Node, Objective, Tree};
use inkwell::context::Context;

fn sample_forest() -> Forest {
    let tree_a = Tree::new(
        0,
        Node::Decision(DecisionNode::numerical(
            0,
            0,
            0.5,
            true,
            MissingType::MNaN,
            Node::leaf(1, 1.0),
            Node::leaf(2, -1.0),
        )),
        0,
    );
    let tree_b = Tree::new(
        1,
        Node::Decision(DecisionNode::categorical(
            0,
            1,
            0,
            true,
            MissingType::MNaN,
            vec![0b1010],
            Node::leaf(1, 2.0),
            Node::leaf(2, -2.0),
        )),
        0,
    );

    Forest::new(
        vec![tree_a, tree_b],
        vec![Feature::numerical(), Feature::categorical()],
        1,
        Objective::Binary { alpha: 1.0 },
    )
}

fn main() -> anyhow::Result<()> {
    let forest = sample_forest();
    let context = Context::create();
    let module = boreal::build_module(&context, "sample_forest", &forest)?;
    println!("{}", module.print_to_string().to_string());
    Ok(())
}
