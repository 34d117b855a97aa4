//! `forest_root` emission: a row-indexed loop that gathers
//! feature values, casts categoricals, calls each tree function, accumulates
//! a scalar, applies the objective post-transform, and stores the result.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::FunctionValue;
use inkwell::{AddressSpace, IntPredicate};

use crate::ast::Forest;
use crate::codegen::objective::emit_objective;
use crate::codegen::primitives::{iconst, uconst, Intrinsics, Types};
use crate::error::CodegenError;

/// Build and populate `forest_root(double* data, double* out, i32 start, i32 end)`.
pub fn emit_forest_root<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    types: &Types<'ctx>,
    intrinsics: &Intrinsics<'ctx>,
    forest: &Forest,
    tree_funcs: &[FunctionValue<'ctx>],
) -> Result<FunctionValue<'ctx>, CodegenError> {
    let b = |e: inkwell::builder::BuilderError| CodegenError::Builder(e.to_string());
    let ptr_type = context.ptr_type(AddressSpace::default());
    let fn_type = context
        .void_type()
        .fn_type(&[ptr_type.into(), ptr_type.into(), types.i32.into(), types.i32.into()], false);
    let function = module.add_function("forest_root", fn_type, None);

    let data_ptr = function.get_nth_param(0).unwrap().into_pointer_value();
    let out_ptr = function.get_nth_param(1).unwrap().into_pointer_value();
    let start = function.get_nth_param(2).unwrap().into_int_value();
    let end = function.get_nth_param(3).unwrap().into_int_value();

    let setup = context.append_basic_block(function, "setup");
    let loop_cond = context.append_basic_block(function, "loop-condition");
    let loop_core = context.append_basic_block(function, "loop-core");
    let term = context.append_basic_block(function, "term");

    // -- setup --
    let builder = context.create_builder();
    builder.position_at_end(setup);
    let loop_iter = builder.build_alloca(types.i32, "loop-idx").map_err(b)?;
    builder.build_store(loop_iter, start).map_err(b)?;
    builder.build_unconditional_branch(loop_cond).map_err(b)?;

    // -- loop-condition --
    builder.position_at_end(loop_cond);
    let iter_val = builder.build_load(types.i32, loop_iter, "iter").map_err(b)?.into_int_value();
    let cmp = builder
        .build_int_compare(IntPredicate::SLT, iter_val, end, "loop_cmp")
        .map_err(b)?;
    builder.build_conditional_branch(cmp, loop_core, term).map_err(b)?;

    // -- loop-core --
    builder.position_at_end(loop_core);
    let iter_val = builder.build_load(types.i32, loop_iter, "iter").map_err(b)?.into_int_value();
    let n_args = uconst(types, forest.n_args() as u64);
    let row_base = builder.build_int_mul(iter_val, n_args, "row_base").map_err(b)?;

    let mut args = Vec::with_capacity(forest.n_args());
    for (k, feature) in forest.features.iter().enumerate() {
        let offset = builder.build_int_add(row_base, iconst(types, k as i64), "feature_offset").map_err(b)?;
        let ptr = unsafe {
            builder
                .build_gep(types.f64, data_ptr, &[offset], "feature_ptr")
                .map_err(b)?
        };
        let loaded = builder.build_load(types.f64, ptr, "feature_val").map_err(b)?.into_float_value();
        if feature.is_categorical {
            // f64 -> i32 cast; on the hardware this compiles to, NaN and
            // out-of-range inputs saturate to INT_MIN, which is exactly
            // the "always routes right" behavior the categorical node's
            // unsigned range check depends on.
            let cast = builder
                .build_float_to_signed_int(loaded, types.i32, "cat_cast")
                .map_err(b)?;
            args.push(cast.into());
        } else {
            args.push(loaded.into());
        }
    }

    let mut acc = builder
        .build_call(tree_funcs[0], &args, "tree_call")
        .map_err(b)?
        .try_as_basic_value()
        .left()
        .expect("tree function returns f64")
        .into_float_value();
    for &tree_fn in &tree_funcs[1..] {
        let tree_res = builder
            .build_call(tree_fn, &args, "tree_call")
            .map_err(b)?
            .try_as_basic_value()
            .left()
            .expect("tree function returns f64")
            .into_float_value();
        acc = builder.build_float_add(tree_res, acc, "forest_sum").map_err(b)?;
    }

    let result = emit_objective(&builder, types, intrinsics, forest.objective, acc)?;

    let out_row_ptr = unsafe {
        builder
            .build_gep(types.f64, out_ptr, &[iter_val], "out_ptr")
            .map_err(b)?
    };
    builder.build_store(out_row_ptr, result).map_err(b)?;

    let next_iter = builder.build_int_add(iter_val, iconst(types, 1), "next_iter").map_err(b)?;
    builder.build_store(loop_iter, next_iter).map_err(b)?;
    builder.build_unconditional_branch(loop_cond).map_err(b)?;

    // -- term --
    builder.position_at_end(term);
    builder.build_return(None).map_err(b)?;

    Ok(function)
}
