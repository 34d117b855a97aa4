use std::path::PathBuf;

/// Failures that can occur while lowering a [`crate::ast::Forest`] to LLVM IR.
///
/// Codegen either yields a complete module or one of these; there is no
/// partial-module case and nothing is swallowed.
#[derive(thiserror::Error, Debug)]
pub enum CodegenError {
    #[error("categorical decision node {idx} has no cat_threshold bitset")]
    MissingCategoricalBitset { idx: usize },

    #[error("sigmoid parameter alpha must be > 0, got {alpha}")]
    InvalidSigmoidAlpha { alpha: f64 },

    #[error("objective '{0}' is not implemented; see the project issue tracker")]
    UnsupportedObjective(String),

    #[error("multiclass forests (n_classes={0}) are not supported by this core")]
    UnsupportedMulticlass(usize),

    #[error("LLVM module verification failed: {0}")]
    VerificationFailed(String),

    #[error("LLVM builder error: {0}")]
    Builder(String),
}

/// Failures from the JIT driver: target lookup, machine creation, object
/// cache I/O, and post-finalization symbol resolution.
#[derive(thiserror::Error, Debug)]
pub enum JitError {
    #[error("failed to look up target for triple {triple}: {message}")]
    TargetLookup { triple: String, message: String },

    #[error("failed to create target machine for triple {0}")]
    TargetMachineCreation(String),

    #[error("object cache I/O error at {path}: {source}")]
    ObjectCacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("forest_root symbol not found after finalization")]
    MissingSymbol,

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
