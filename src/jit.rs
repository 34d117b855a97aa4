//! JIT driver: target-machine configuration, object caching, and exposing
//! `forest_root` as a callable.

use std::path::{Path, PathBuf};
use std::sync::Once;

use inkwell::execution_engine::{ExecutionEngine, JitFunction};
use inkwell::module::Module;
use inkwell::targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

use crate::error::JitError;

static LLVM_INIT: Once = Once::new();

fn initialize_native_target() {
    // Process-wide one-shot init; there is no teardown obligation.
    LLVM_INIT.call_once(|| {
        Target::initialize_native(&InitializationConfig::default())
            .expect("failed to initialize native LLVM target");
    });
}

/// JIT compilation configuration.
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Large is the documented default: very large forests can produce
    /// relocations past the 2GB boundary.
    pub code_model: CodeModel,
    /// If set, the compiled object is persisted here once the engine
    /// finalizes, for reuse by a later process (e.g. ahead-of-time
    /// linking). A hit does not currently skip native codegen in this
    /// process: see `compile_module`'s doc comment.
    pub object_cache_path: Option<PathBuf>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            code_model: CodeModel::Large,
            object_cache_path: None,
        }
    }
}

/// The function pointer signature of the emitted `forest_root`.
pub type ForestRootFn = unsafe extern "C" fn(*const f64, *mut f64, i32, i32);

/// Keeps the execution engine (and therefore the JIT-compiled code) alive
/// alongside a handle to `forest_root`.
pub struct CompiledForest<'ctx> {
    engine: ExecutionEngine<'ctx>,
    forest_root: JitFunction<'ctx, ForestRootFn>,
}

impl<'ctx> CompiledForest<'ctx> {
    /// Score rows `[start, end)` of a row-major `data` buffer of
    /// `end * n_features` `f64`s into `out[start..end]`.
    ///
    /// # Safety
    /// `data` must have at least `end * n_features` valid elements and
    /// `out` at least `end`; `n_features` is whatever the compiled forest
    /// was built with. Distinct, non-overlapping `[start, end)` ranges may
    /// be called from different threads concurrently.
    pub unsafe fn call(&self, data: &[f64], out: &mut [f64], start: i32, end: i32) {
        unsafe {
            self.forest_root.call(data.as_ptr(), out.as_mut_ptr(), start, end);
        }
    }

    pub fn engine(&self) -> &ExecutionEngine<'ctx> {
        &self.engine
    }
}

/// Select a host target machine: host triple, host CPU and features, PIC
/// relocation, the configured code model.
fn host_target_machine(code_model: CodeModel) -> Result<TargetMachine, JitError> {
    initialize_native_target();

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple).map_err(|e| JitError::TargetLookup {
        triple: triple.as_str().to_string_lossy().into_owned(),
        message: e.to_string(),
    })?;

    let cpu = TargetMachine::get_host_cpu_name();
    let features = TargetMachine::get_host_cpu_features();

    target
        .create_target_machine(
            &triple,
            cpu.to_str().unwrap_or("generic"),
            features.to_str().unwrap_or(""),
            OptimizationLevel::Default,
            RelocMode::PIC,
            code_model,
        )
        .ok_or_else(|| JitError::TargetMachineCreation(triple.as_str().to_string_lossy().into_owned()))
}

/// Compile `module` to native code and expose `forest_root` as a callable.
///
/// `config.object_cache_path`, if set, names a file the compiled object is
/// persisted to after finalization for reuse by a later process. A cache
/// hit is *not* wired back into this process's JIT: `inkwell`'s safe
/// `ExecutionEngine` has no hook onto `LLVMMCJITCompilerOptions.ObjectCache`
/// to feed cached bytes back in, so every call here still finalizes
/// through `create_jit_execution_engine` regardless of a hit (see
/// DESIGN.md). Closing that gap needs a from-scratch build against
/// `inkwell`'s raw FFI escape hatches.
pub fn compile_module<'ctx>(
    module: Module<'ctx>,
    config: &CompileConfig,
) -> Result<CompiledForest<'ctx>, JitError> {
    let target_machine = host_target_machine(config.code_model)?;
    module.set_triple(&target_machine.get_triple());
    module.set_data_layout(&target_machine.get_target_data().get_data_layout());

    if let Some(path) = &config.object_cache_path {
        if path.exists() {
            tracing::debug!(
                ?path,
                "object cache file exists but cannot be fed into this process's JIT; \
                 recompiling from IR"
            );
        }
    }

    let engine = module
        .create_jit_execution_engine(OptimizationLevel::Default)
        .map_err(|_| JitError::TargetMachineCreation("jit engine creation failed".into()))?;

    if let Some(path) = &config.object_cache_path {
        if !path.exists() {
            persist_object(&target_machine, &module, path)?;
        }
    }

    if std::env::var("BOREAL_PRINT_ASM").as_deref() == Ok("1") {
        if let Ok(asm) = target_machine.write_to_memory_buffer(&module, FileType::Assembly) {
            print!("{}", String::from_utf8_lossy(asm.as_slice()));
        }
    }

    let forest_root = unsafe {
        engine
            .get_function::<ForestRootFn>("forest_root")
            .map_err(|_| JitError::MissingSymbol)?
    };

    Ok(CompiledForest { engine, forest_root })
}

fn persist_object(target_machine: &TargetMachine, module: &Module, path: &Path) -> Result<(), JitError> {
    let buffer = target_machine
        .write_to_memory_buffer(module, FileType::Object)
        .map_err(|e| JitError::TargetMachineCreation(e.to_string()))?;
    std::fs::write(path, buffer.as_slice()).map_err(|source| JitError::ObjectCacheIo {
        path: path.to_path_buf(),
        source,
    })
}
