//! Per-tree IR emission.
//!
//! Each [`Tree`] becomes a function `tree_<idx>` returning `f64`, built by a
//! post-order walk that allocates at most one basic block per node plus the
//! categorical bitset-compare block, fusing decision nodes whose children
//! are both leaves into an inline `select`.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::{FloatValue, FunctionValue, IntValue};
use inkwell::{FloatPredicate, IntPredicate};

use crate::ast::{DecisionNode, Feature, MissingType, Node, Threshold, Tree};
use crate::codegen::primitives::{dconst, iconst, uconst, Types};
use crate::error::CodegenError;

/// Build the `tree_<idx>` function and populate it with IR for `tree`.
pub fn emit_tree<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    types: &Types<'ctx>,
    tree: &Tree,
    features: &[Feature],
) -> Result<FunctionValue<'ctx>, CodegenError> {
    let param_types: Vec<_> = features
        .iter()
        .map(|f| {
            if f.is_categorical {
                types.i32.into()
            } else {
                types.f64.into()
            }
        })
        .collect();
    let fn_type = types.f64.fn_type(&param_types, false);
    let function = module.add_function(&tree.name(), fn_type, None);

    let emitter = TreeEmitter {
        context,
        types,
        function,
    };
    let entry = context.append_basic_block(function, "node_0");
    emitter.emit_node(entry, &tree.root)?;
    Ok(function)
}

struct TreeEmitter<'a, 'ctx> {
    context: &'ctx Context,
    types: &'a Types<'ctx>,
    function: FunctionValue<'ctx>,
}

impl<'a, 'ctx> TreeEmitter<'a, 'ctx> {
    fn builder_at(&self, block: inkwell::basic_block::BasicBlock<'ctx>) -> inkwell::builder::Builder<'ctx> {
        let builder = self.context.create_builder();
        builder.position_at_end(block);
        builder
    }

    fn emit_node(
        &self,
        block: inkwell::basic_block::BasicBlock<'ctx>,
        node: &Node,
    ) -> Result<(), CodegenError> {
        match node {
            Node::Leaf(leaf) => {
                let builder = self.builder_at(block);
                builder
                    .build_return(Some(&dconst(self.types, leaf.value)))
                    .map_err(|e| CodegenError::Builder(e.to_string()))?;
                Ok(())
            }
            Node::Decision(decision) => self.emit_decision(block, decision),
        }
    }

    fn emit_decision(
        &self,
        block: inkwell::basic_block::BasicBlock<'ctx>,
        node: &DecisionNode,
    ) -> Result<(), CodegenError> {
        node.validate()?;
        let builder = self.builder_at(block);

        let is_fused = node.left.is_leaf() && node.right.is_leaf();

        // Categorical fused nodes still need a right block for the
        // range-check fast path.
        let right_block = if node.is_categorical() {
            Some(self.context.append_basic_block(self.function, &format!("node_{}_right", node.idx)))
        } else if !is_fused {
            Some(self.context.append_basic_block(self.function, &format!("node_{}_right", node.idx)))
        } else {
            None
        };
        let left_block = if !is_fused {
            Some(self.context.append_basic_block(self.function, &format!("node_{}_left", node.idx)))
        } else {
            None
        };

        if node.is_categorical() {
            let bitset_block = self
                .context
                .append_basic_block(self.function, &format!("node_{}_cat_bitset_comp", node.idx));
            let right = right_block.expect("categorical node always allocates a right block");
            self.emit_categorical_range_check(&builder, node, bitset_block, right)?;

            let bitset_builder = self.builder_at(bitset_block);
            let comp = self.emit_categorical_bitset_check(&bitset_builder, node)?;
            self.finish_node(&bitset_builder, comp, node, is_fused, left_block, right_block)?;
        } else {
            let comp = self.emit_numerical_comparison(&builder, node)?;
            self.finish_node(&builder, comp, node, is_fused, left_block, right_block)?;
        }

        if let Some(lb) = left_block {
            self.emit_node(lb, &node.left)?;
        }
        if let Some(rb) = right_block {
            self.emit_node(rb, &node.right)?;
        }
        Ok(())
    }

    /// Terminate the node's (or bitset-compare's) block: either an inline
    /// `select` + `ret` for a fused double-leaf, or a conditional branch.
    fn finish_node(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        comp: IntValue<'ctx>,
        node: &DecisionNode,
        is_fused: bool,
        left_block: Option<inkwell::basic_block::BasicBlock<'ctx>>,
        right_block: Option<inkwell::basic_block::BasicBlock<'ctx>>,
    ) -> Result<(), CodegenError> {
        if is_fused {
            let left_val = dconst(self.types, node.left.as_leaf().expect("fused left is a leaf").value);
            let right_val = dconst(self.types, node.right.as_leaf().expect("fused right is a leaf").value);
            let selected = builder
                .build_select(comp, left_val, right_val, "fused_leaf")
                .map_err(|e| CodegenError::Builder(e.to_string()))?;
            builder
                .build_return(Some(&selected))
                .map_err(|e| CodegenError::Builder(e.to_string()))?;
        } else {
            let left = left_block.expect("non-fused node has a left block");
            let right = right_block.expect("non-fused node has a right block");
            builder
                .build_conditional_branch(comp, left, right)
                .map_err(|e| CodegenError::Builder(e.to_string()))?;
        }
        Ok(())
    }

    /// Categorical range check: unsigned `<` so that a
    /// negative value from `fptosi`-of-NaN (`INT_MIN`) always fails the
    /// check and routes right.
    fn emit_categorical_range_check(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        node: &DecisionNode,
        bitset_block: inkwell::basic_block::BasicBlock<'ctx>,
        right_block: inkwell::basic_block::BasicBlock<'ctx>,
    ) -> Result<(), CodegenError> {
        let val = self
            .function
            .get_nth_param(node.split_feature as u32)
            .expect("split_feature indexes a valid parameter")
            .into_int_value();
        let num_categories = 32 * node.cat_threshold.as_ref().map(|b| b.len()).unwrap_or(0);
        let comp = builder
            .build_int_compare(IntPredicate::ULT, val, uconst(self.types, num_categories as u64), "cat_range")
            .map_err(|e| CodegenError::Builder(e.to_string()))?;
        builder
            .build_conditional_branch(comp, bitset_block, right_block)
            .map_err(|e| CodegenError::Builder(e.to_string()))?;
        Ok(())
    }

    /// Bitset compare: `word = B[v/32]`, `bit = (word >>
    /// (v%32)) & 1`, truncated to `i1`.
    fn emit_categorical_bitset_check(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        node: &DecisionNode,
    ) -> Result<IntValue<'ctx>, CodegenError> {
        let val = self
            .function
            .get_nth_param(node.split_feature as u32)
            .expect("split_feature indexes a valid parameter")
            .into_int_value();
        let bitset = node
            .cat_threshold
            .as_ref()
            .ok_or(CodegenError::MissingCategoricalBitset { idx: node.idx })?;

        let word_idx = builder
            .build_int_unsigned_div(val, uconst(self.types, 32), "cat_word_idx")
            .map_err(|e| CodegenError::Builder(e.to_string()))?;
        let shift = builder
            .build_int_unsigned_rem(val, uconst(self.types, 32), "cat_shift")
            .map_err(|e| CodegenError::Builder(e.to_string()))?;

        // Select the right word via a chain of equality checks against a
        // constant vector of the bitset's words (mirrors the reference
        // scorer's vector-extract; here expressed as a select chain since
        // bitset lengths are small and known at compile time).
        let mut word = uconst(self.types, bitset[0] as u64);
        for (i, &w) in bitset.iter().enumerate().skip(1) {
            let idx_eq = builder
                .build_int_compare(IntPredicate::EQ, word_idx, uconst(self.types, i as u64), "cat_word_sel")
                .map_err(|e| CodegenError::Builder(e.to_string()))?;
            word = builder
                .build_select(idx_eq, uconst(self.types, w as u64), word, "cat_word")
                .map_err(|e| CodegenError::Builder(e.to_string()))?
                .into_int_value();
        }

        let shifted = builder
            .build_right_shift(word, shift, false, "cat_bit_shift")
            .map_err(|e| CodegenError::Builder(e.to_string()))?;
        builder
            .build_int_truncate(shifted, self.types.i1, "cat_bit")
            .map_err(|e| CodegenError::Builder(e.to_string()))
    }

    /// Numerical comparison semantics. Each branch is the
    /// literal translation of the reference scorer's table; this is the
    /// correctness contract, not a place for compression.
    fn emit_numerical_comparison(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        node: &DecisionNode,
    ) -> Result<IntValue<'ctx>, CodegenError> {
        let val: FloatValue<'ctx> = self
            .function
            .get_nth_param(node.split_feature as u32)
            .expect("split_feature indexes a valid parameter")
            .into_float_value();
        let Threshold::Numerical(threshold) = node.threshold else {
            unreachable!("emit_numerical_comparison only called for numerical nodes")
        };
        let thresh = dconst(self.types, threshold);
        let zero = dconst(self.types, 0.0);

        let default_left = match node.missing_type {
            MissingType::MNone => 0.0 <= threshold,
            _ => node.default_left,
        };

        let b = |e: inkwell::builder::BuilderError| CodegenError::Builder(e.to_string());

        if default_left {
            if node.missing_type != MissingType::MZero || (node.missing_type == MissingType::MZero && 0.0 <= threshold) {
                builder
                    .build_float_compare(FloatPredicate::ULE, val, thresh, "num_cmp")
                    .map_err(b)
            } else {
                let is_missing = builder
                    .build_float_compare(FloatPredicate::UEQ, val, zero, "is_missing")
                    .map_err(b)?;
                let less_eq = builder
                    .build_float_compare(FloatPredicate::ULE, val, thresh, "less_eq")
                    .map_err(b)?;
                builder.build_or(is_missing, less_eq, "num_cmp").map_err(b)
            }
        } else if node.missing_type != MissingType::MZero || (node.missing_type == MissingType::MZero && threshold < 0.0) {
            builder
                .build_float_compare(FloatPredicate::OLE, val, thresh, "num_cmp")
                .map_err(b)
        } else {
            let is_missing = builder
                .build_float_compare(FloatPredicate::UEQ, val, zero, "is_missing")
                .map_err(b)?;
            let greater = builder
                .build_float_compare(FloatPredicate::OGT, val, thresh, "greater")
                .map_err(b)?;
            let either = builder.build_or(is_missing, greater, "either").map_err(b)?;
            builder.build_not(either, "num_cmp").map_err(b)
        }
    }
}

