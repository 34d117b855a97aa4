pub mod ast;
pub mod codegen;
pub mod error;
pub mod interp;
pub mod jit;

pub use ast::Forest;
pub use codegen::build_module;
pub use error::{CodegenError, JitError};
