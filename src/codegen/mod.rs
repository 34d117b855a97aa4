//! IR-generation engine: lowers a [`crate::ast::Forest`] into a single LLVM
//! module containing one `tree_<idx>` function per tree plus the
//! `forest_root` dispatch/accumulation function.

mod forest;
mod objective;
pub mod primitives;
mod tree;

use inkwell::context::Context;
use inkwell::module::Module;

use crate::ast::Forest;
use crate::error::CodegenError;
use primitives::{Intrinsics, Types};

/// Lower `forest` into a fresh LLVM module named `module_name`.
///
/// Fails if the forest doesn't validate (malformed nodes, unsupported
/// objective, multiclass) or if module verification fails after emission.
/// No partial modules are ever returned.
pub fn build_module<'ctx>(
    context: &'ctx Context,
    module_name: &str,
    forest: &Forest,
) -> Result<Module<'ctx>, CodegenError> {
    forest.validate()?;

    let span = tracing::info_span!(
        "compile_forest",
        trees = forest.trees.len(),
        features = forest.features.len(),
        objective = ?forest.objective,
    );
    let _enter = span.enter();

    let module = context.create_module(module_name);
    let types = Types::new(context);
    let intrinsics = Intrinsics::declare(&module, &types);

    let mut tree_funcs = Vec::with_capacity(forest.trees.len());
    for t in &forest.trees {
        tracing::debug!(tree = t.idx, "emitting tree");
        let func = tree::emit_tree(context, &module, &types, t, &forest.features)?;
        tree_funcs.push(func);
    }

    forest::emit_forest_root(context, &module, &types, &intrinsics, forest, &tree_funcs)?;

    module
        .verify()
        .map_err(|e| CodegenError::VerificationFailed(e.to_string()))?;

    Ok(module)
}
