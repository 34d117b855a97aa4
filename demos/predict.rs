//! JIT-compile a small sample forest and score rows read from a CSV file.
//!
//! Usage: predict <X.csv>
//!
//! Mirrors a typical prediction workflow (load a model,
//! load features, print predictions) with the model replaced by a forest
//! built in-process, since reading LightGBM's `model.txt` format is out of
//! scope for this crate.

use std::{fs::read_to_string, path::Path};

use boreal::ast::{DecisionNode, Feature, Forest, MissingType, Node, Objective, Tree};
use boreal::jit::CompileConfig;
use inkwell::context::Context;

fn read_features(path: impl AsRef<Path>) -> anyhow::Result<Vec<Vec<f64>>> {
    let content = read_to_string(path)?;
    content
        .lines()
        .map(|line| {
            line.split(',')
                .map(|s| s.parse::<f64>().map_err(anyhow::Error::from))
                .collect()
        })
        .collect()
}

fn sample_forest() -> Forest {
    let root = Node::Decision(DecisionNode::numerical(
        0,
        0,
        0.5,
        true,
        MissingType::MNaN,
        Node::leaf(1, 1.0),
        Node::leaf(2, -1.0),
    ));
    Forest::new(
        vec![Tree::new(0, root, 0)],
        vec![Feature::numerical()],
        1,
        Objective::Identity,
    )
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        anyhow::bail!("Usage: {} <X.csv>", args[0]);
    }

    let rows = read_features(&args[1])?;
    let forest = sample_forest();

    let context = Context::create();
    let module = boreal::build_module(&context, "predict", &forest)?;
    let compiled = boreal::jit::compile_module(module, &CompileConfig::default())?;

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let mut out = vec![0.0_f64; rows.len()];
    unsafe {
        compiled.call(&flat, &mut out, 0, rows.len() as i32);
    }

    for v in out {
        println!("{v}");
    }
    Ok(())
}
