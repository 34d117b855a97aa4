//! A pure-Rust reference scorer, structurally the same recursive
//! walk-to-leaf, but
//! generalized to LightGBM's missing-value regimes, categorical bitsets,
//! and objective transforms. Serves as the oracle the JIT-compiled code is
//! checked against.

use crate::ast::{DecisionNode, Forest, MissingType, Node, Objective, Threshold, Tree};

/// Cast a feature value the way the forest emitter's `fptosi` does: NaN
/// becomes `i32::MIN` rather than Rust's default saturating-to-zero, so
/// out-of-range and NaN categoricals both always compare as "too large"
/// under the unsigned range check.
pub fn cast_categorical(v: f64) -> i32 {
    if v.is_nan() {
        i32::MIN
    } else {
        v as i32
    }
}

/// Does a category index route left under this bitset?
fn categorical_routes_left(cat: i32, bitset: &[u32]) -> bool {
    let num_categories = 32 * bitset.len();
    if (cat as u32 as usize) >= num_categories {
        return false;
    }
    let cat = cat as u32;
    let word = bitset[(cat / 32) as usize];
    ((word >> (cat % 32)) & 1) != 0
}

/// The numerical comparison semantics, literally.
fn numerical_routes_left(v: f64, node: &DecisionNode) -> bool {
    let Threshold::Numerical(threshold) = node.threshold else {
        unreachable!("numerical_routes_left called on a categorical node")
    };

    let default_left = match node.missing_type {
        MissingType::MNone => 0.0 <= threshold,
        _ => node.default_left,
    };

    if default_left {
        if node.missing_type != MissingType::MZero || (node.missing_type == MissingType::MZero && 0.0 <= threshold) {
            v.is_nan() || v <= threshold
        } else {
            let is_missing = v.is_nan() || v == 0.0;
            let less_eq = v.is_nan() || v <= threshold;
            is_missing || less_eq
        }
    } else if node.missing_type != MissingType::MZero || (node.missing_type == MissingType::MZero && threshold < 0.0) {
        !v.is_nan() && v <= threshold
    } else {
        let is_missing = v.is_nan() || v == 0.0;
        let greater = !v.is_nan() && v > threshold;
        !(is_missing || greater)
    }
}

/// Score a single row against one tree.
pub fn predict_tree(tree: &Tree, row: &[f64]) -> f64 {
    let mut node = &tree.root;
    loop {
        match node {
            Node::Leaf(leaf) => return leaf.value,
            Node::Decision(decision) => {
                let goes_left = if decision.is_categorical() {
                    let cat = cast_categorical(row[decision.split_feature]);
                    categorical_routes_left(
                        cat,
                        decision
                            .cat_threshold
                            .as_ref()
                            .expect("categorical node has a bitset"),
                    )
                } else {
                    numerical_routes_left(row[decision.split_feature], decision)
                };
                node = if goes_left { &decision.left } else { &decision.right };
            }
        }
    }
}

fn apply_objective(objective: Objective, x: f64) -> f64 {
    match objective {
        Objective::Binary { alpha } => 1.0 / (1.0 + (-alpha * x).exp()),
        Objective::XEntropy => 1.0 / (1.0 + (-x).exp()),
        Objective::XEntLambda => (1.0 + x.exp()).ln(),
        Objective::ExpOnly => x.exp(),
        Objective::Regression { sqrt } => {
            if sqrt {
                (x * x).copysign(x)
            } else {
                x
            }
        }
        Objective::Identity => x,
    }
}

/// Score a single row against the whole forest: sum tree contributions in
/// `Forest.trees` order, then apply the objective transform.
pub fn predict_forest(forest: &Forest, row: &[f64]) -> f64 {
    let sum: f64 = forest.trees.iter().map(|t| predict_tree(t, row)).sum();
    apply_objective(forest.objective, sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Feature, MissingType};

    fn stub(threshold: f64, default_left: bool, missing_type: MissingType) -> Tree {
        let root = Node::Decision(DecisionNode::numerical(
            0,
            0,
            threshold,
            default_left,
            missing_type,
            Node::leaf(1, 1.0),
            Node::leaf(2, -1.0),
        ));
        Tree::new(0, root, 0)
    }

    #[test]
    fn scenario_1_mnan_default_left() {
        let tree = stub(0.5, true, MissingType::MNaN);
        assert_eq!(predict_tree(&tree, &[0.4]), 1.0);
        assert_eq!(predict_tree(&tree, &[0.6]), -1.0);
        assert_eq!(predict_tree(&tree, &[f64::NAN]), 1.0);
    }

    #[test]
    fn scenario_2_mnone_overrides_default_left() {
        let tree = stub(-0.5, true, MissingType::MNone);
        assert_eq!(predict_tree(&tree, &[f64::NAN]), -1.0);
        assert_eq!(predict_tree(&tree, &[0.0]), -1.0);
        assert_eq!(predict_tree(&tree, &[-0.6]), 1.0);
    }

    #[test]
    fn scenario_3_mzero_treats_zero_and_nan_as_missing() {
        let tree = stub(0.5, true, MissingType::MZero);
        assert_eq!(predict_tree(&tree, &[0.0]), 1.0);
        assert_eq!(predict_tree(&tree, &[-0.0]), 1.0);
        assert_eq!(predict_tree(&tree, &[f64::NAN]), 1.0);
        assert_eq!(predict_tree(&tree, &[0.4]), 1.0);
        assert_eq!(predict_tree(&tree, &[0.6]), -1.0);
    }

    #[test]
    fn scenario_4_categorical_bitset() {
        let root = Node::Decision(DecisionNode::categorical(
            0,
            0,
            0,
            true,
            MissingType::MNaN,
            vec![0b1010],
            Node::leaf(1, 5.0),
            Node::leaf(2, -5.0),
        ));
        let tree = Tree::new(0, root, 0);
        assert_eq!(predict_tree(&tree, &[1.0]), 5.0);
        assert_eq!(predict_tree(&tree, &[3.0]), 5.0);
        assert_eq!(predict_tree(&tree, &[0.0]), -5.0);
        assert_eq!(predict_tree(&tree, &[2.0]), -5.0);
        assert_eq!(predict_tree(&tree, &[32.0]), -5.0);
        assert_eq!(predict_tree(&tree, &[f64::NAN]), -5.0);
    }

    #[test]
    fn scenario_5_additive_binary_sigmoid() {
        let make_stub = || {
            Tree::new(
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
            )
        };
        let forest = Forest::new(
            vec![make_stub(), make_stub()],
            vec![Feature::numerical()],
            1,
            Objective::Binary { alpha: 1.0 },
        );
        let got = predict_forest(&forest, &[0.0]);
        assert!((got - 0.8807970779778823).abs() < 1e-12);
    }

    #[test]
    fn scenario_6_regression_sqrt_objective() {
        let forest = Forest::new(vec![], vec![], 1, Objective::Regression { sqrt: true });
        assert_eq!(apply_objective(forest.objective, -4.0), -16.0);
    }

    #[test]
    fn fusion_equivalence_matches_unfused_branch_output() {
        // Both children leaves, so codegen fuses this node into a `select`
        // (tree.rs's finish_node). Compile it and check the fused output
        // against this walking oracle for every input, not just "doesn't
        // panic".
        use crate::ast::{Feature, Forest, Objective};
        use crate::jit::CompileConfig;
        use inkwell::context::Context;

        let tree = stub(0.5, true, MissingType::MNaN);
        let forest = Forest::new(
            vec![tree.clone()],
            vec![Feature::numerical()],
            1,
            Objective::Identity,
        );

        let context = Context::create();
        let module = crate::build_module(&context, "fusion_equivalence_test", &forest).unwrap();
        let compiled = crate::jit::compile_module(module, &CompileConfig::default()).unwrap();

        for v in [0.1, 0.5, 0.9, f64::NAN, -0.0, 0.0, f64::INFINITY, f64::NEG_INFINITY] {
            let expected = predict_tree(&tree, &[v]);
            let mut out = [0.0f64];
            unsafe {
                compiled.call(&[v], &mut out, 0, 1);
            }
            assert_eq!(out[0], expected, "mismatch for input {v}");
        }
    }
}
