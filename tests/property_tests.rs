//! Property tests fuzzing random forests and rows against the reference
//! interpreter. Placed in a
//! top-level `tests/` directory (not colocated `#[cfg(test)]`) because
//! these exercise the crate's public surface end-to-end, including the
//! JIT path, the way an integration suite does in the rest of the
//! retrieval pack.

use boreal::ast::{DecisionNode, Feature, Forest, MissingType, Node, Objective, Tree};
use boreal::interp::predict_tree;
use boreal::jit::CompileConfig;
use inkwell::context::Context;
use proptest::prelude::*;

fn missing_type_strategy() -> impl Strategy<Value = MissingType> {
    prop_oneof![
        Just(MissingType::MNone),
        Just(MissingType::MZero),
        Just(MissingType::MNaN),
    ]
}

fn numerical_stub(threshold: f64, default_left: bool, missing_type: MissingType) -> Tree {
    Tree::new(
        0,
        Node::Decision(DecisionNode::numerical(
            0,
            0,
            threshold,
            default_left,
            missing_type,
            Node::leaf(1, 1.0),
            Node::leaf(2, -1.0),
        )),
        0,
    )
}

fn categorical_stub(cat_threshold: Vec<u32>) -> Tree {
    Tree::new(
        0,
        Node::Decision(DecisionNode::categorical(
            0,
            0,
            0,
            true,
            MissingType::MNaN,
            cat_threshold,
            Node::leaf(1, 5.0),
            Node::leaf(2, -5.0),
        )),
        0,
    )
}

fn compile_single_tree_forest(tree: Tree, module_name: &str) -> boreal::jit::CompiledForest<'static> {
    // Leaked context: the compiled module and its execution engine must
    // outlive this helper's return, and these tests never need to free it.
    let context: &'static Context = Box::leak(Box::new(Context::create()));
    let forest = Forest::new(
        vec![tree],
        vec![Feature::categorical()],
        1,
        Objective::Identity,
    );
    let module = boreal::build_module(context, module_name, &forest).unwrap();
    boreal::jit::compile_module(module, &CompileConfig::default()).unwrap()
}

proptest! {
    /// NaN routing, numerical: for every combination of
    /// missing_type, default_left, and threshold sign, a NaN input must
    /// route to a leaf value consistent with the literal branch table;
    /// it must always land on exactly one of the two leaves, never panic,
    /// and must agree with repeated evaluation (determinism).
    #[test]
    fn nan_routing_numerical_is_deterministic(
        threshold in -10.0f64..10.0,
        default_left in any::<bool>(),
        missing_type in missing_type_strategy(),
    ) {
        let tree = numerical_stub(threshold, default_left, missing_type);
        let first = predict_tree(&tree, &[f64::NAN]);
        let second = predict_tree(&tree, &[f64::NAN]);
        prop_assert_eq!(first, second);
        prop_assert!(first == 1.0 || first == -1.0);
    }

    /// Zero routing under MZero: +0.0 and -0.0 must route
    /// identically (both "missing", following default_left).
    #[test]
    fn zero_routing_under_mzero_is_sign_independent(
        threshold in -10.0f64..10.0,
        default_left in any::<bool>(),
    ) {
        let tree = numerical_stub(threshold, default_left, MissingType::MZero);
        let pos = predict_tree(&tree, &[0.0]);
        let neg = predict_tree(&tree, &[-0.0]);
        prop_assert_eq!(pos, neg);
    }

    /// Categorical NaN fast-path: a NaN input always routes
    /// right, regardless of bitset contents.
    #[test]
    fn categorical_nan_routes_right(bitset in prop::collection::vec(any::<u32>(), 1..4)) {
        let tree = Tree::new(
            0,
            Node::Decision(DecisionNode::categorical(
                0, 0, 0, true, MissingType::MNaN, bitset,
                Node::leaf(1, 5.0), Node::leaf(2, -5.0),
            )),
            0,
        );
        prop_assert_eq!(predict_tree(&tree, &[f64::NAN]), -5.0);
    }

    /// Categorical out-of-range: any category index >= 32*L
    /// routes right, for bitset length L.
    #[test]
    fn categorical_out_of_range_routes_right(
        bitset in prop::collection::vec(any::<u32>(), 1..4),
        extra in 0u32..1000,
    ) {
        let num_categories = 32 * bitset.len() as u32;
        let cat = num_categories + extra;
        let tree = Tree::new(
            0,
            Node::Decision(DecisionNode::categorical(
                0, 0, 0, true, MissingType::MNaN, bitset,
                Node::leaf(1, 5.0), Node::leaf(2, -5.0),
            )),
            0,
        );
        prop_assert_eq!(predict_tree(&tree, &[cat as f64]), -5.0);
    }

    /// Scoring equivalence, categorical: the JIT-compiled forest_root
    /// agrees with the reference interpreter across random bitsets and
    /// category indices spanning in-range, out-of-range, and NaN. This is
    /// the end-to-end counterpart of `categorical_nan_routes_right` and
    /// `categorical_out_of_range_routes_right` above, which only exercise
    /// the interpreter, not the compiled `icmp`/`select` bitset-compare
    /// chain or the unsigned range-check fast-path.
    #[test]
    fn jit_matches_interpreter_for_categorical_rows(
        bitset in prop::collection::vec(any::<u32>(), 1..4),
        extra in 0u32..64,
        use_nan in any::<bool>(),
    ) {
        let num_categories = 32 * bitset.len() as u32;
        let cat = if use_nan { f64::NAN } else { (num_categories + extra) as f64 };

        let tree = categorical_stub(bitset);
        let expected = predict_tree(&tree, &[cat]);

        let compiled = compile_single_tree_forest(tree, "proptest_categorical_oor_forest");
        let mut out = [0.0f64];
        unsafe {
            compiled.call(&[cat], &mut out, 0, 1);
        }
        prop_assert_eq!(out[0], expected);
    }

    /// Same equivalence check, but for in-range category indices (so the
    /// bitset-compare block's word-select and bit-extract paths run, not
    /// just the range-check fast-path).
    #[test]
    fn jit_matches_interpreter_for_in_range_categories(
        bitset in prop::collection::vec(any::<u32>(), 1..4),
    ) {
        let num_categories = 32 * bitset.len();
        let cat_idx = num_categories - 1;
        let cat = cat_idx as f64;

        let tree = categorical_stub(bitset);
        let expected = predict_tree(&tree, &[cat]);

        let compiled = compile_single_tree_forest(tree, "proptest_categorical_in_range_forest");
        let mut out = [0.0f64];
        unsafe {
            compiled.call(&[cat], &mut out, 0, 1);
        }
        prop_assert_eq!(out[0], expected);
    }

    /// Scoring equivalence: the JIT-compiled forest_root
    /// agrees with the reference interpreter for finite rows, across
    /// randomized thresholds/default_left/missing_type combinations.
    #[test]
    fn jit_matches_interpreter_for_finite_rows(
        threshold in -5.0f64..5.0,
        default_left in any::<bool>(),
        missing_type in missing_type_strategy(),
        x in -20.0f64..20.0,
    ) {
        let tree = numerical_stub(threshold, default_left, missing_type);
        let forest = Forest::new(
            vec![tree.clone()],
            vec![Feature::numerical()],
            1,
            Objective::Identity,
        );

        let expected = predict_tree(&tree, &[x]);

        let context = Context::create();
        let module = boreal::build_module(&context, "proptest_forest", &forest).unwrap();
        let compiled = boreal::jit::compile_module(module, &CompileConfig::default()).unwrap();

        let mut out = [0.0f64];
        unsafe {
            compiled.call(&[x], &mut out, 0, 1);
        }

        prop_assert_eq!(out[0], expected);
    }

    /// Same equivalence check, but the input is drawn from a mix of
    /// ordinary floats and the special values call out explicitly:
    /// signed zeros, subnormals, signed infinities, and NaN.
    #[test]
    fn jit_matches_interpreter_including_special_values(
        threshold in -5.0f64..5.0,
        default_left in any::<bool>(),
        missing_type in missing_type_strategy(),
        x in prop_oneof![
            -20.0f64..20.0,
            Just(0.0),
            Just(-0.0),
            Just(f64::MIN_POSITIVE / 2.0),
            Just(-f64::MIN_POSITIVE / 2.0),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            Just(f64::NAN),
        ],
    ) {
        let tree = numerical_stub(threshold, default_left, missing_type);
        let expected = predict_tree(&tree, &[x]);

        let forest = Forest::new(
            vec![tree],
            vec![Feature::numerical()],
            1,
            Objective::Identity,
        );
        let context = Context::create();
        let module = boreal::build_module(&context, "proptest_special_forest", &forest).unwrap();
        let compiled = boreal::jit::compile_module(module, &CompileConfig::default()).unwrap();

        let mut out = [0.0f64];
        unsafe {
            compiled.call(&[x], &mut out, 0, 1);
        }

        prop_assert_eq!(out[0], expected);
    }
}

/// Seed scenario 4: the categorical stub (`cat_threshold=[0b1010]`) JIT-compiled
/// and scored against every named input, checked against the interpreter.
#[test]
fn seed_scenario_4_categorical_jit_matches_interpreter() {
    let tree = categorical_stub(vec![0b1010]);
    let compiled = compile_single_tree_forest(tree.clone(), "seed_scenario_4_forest");

    for cat in [1.0, 3.0, 0.0, 2.0, 32.0, f64::NAN] {
        let expected = predict_tree(&tree, &[cat]);
        let mut out = [0.0f64];
        unsafe {
            compiled.call(&[cat], &mut out, 0, 1);
        }
        assert_eq!(out[0], expected, "mismatch for category {cat}");
    }
}

/// Batching idempotence: scoring [start, mid) and [mid, end)
/// separately and concatenating matches scoring [start, end) in one call.
#[test]
fn batching_idempotence() {
    let root = Node::Decision(DecisionNode::numerical(
        0,
        0,
        0.5,
        true,
        MissingType::MNaN,
        Node::leaf(1, 1.0),
        Node::leaf(2, -1.0),
    ));
    let forest = Forest::new(
        vec![Tree::new(0, root, 0)],
        vec![Feature::numerical()],
        1,
        Objective::Identity,
    );

    let context = Context::create();
    let module = boreal::build_module(&context, "batching_forest", &forest).unwrap();
    let compiled = boreal::jit::compile_module(module, &CompileConfig::default()).unwrap();

    let data = [0.1, 0.6, 0.2, 0.9, 0.4];
    let mut whole = vec![0.0; data.len()];
    unsafe {
        compiled.call(&data, &mut whole, 0, data.len() as i32);
    }

    let mut split = vec![0.0; data.len()];
    unsafe {
        compiled.call(&data, &mut split, 0, 2);
        compiled.call(&data, &mut split, 2, data.len() as i32);
    }

    assert_eq!(whole, split);
}
