//! Stateless codegen helpers: constant constructors, the fixed LLVM types
//! used throughout the emitter, and the module-scoped intrinsic
//! declarations (`llvm.exp.f64`, `llvm.log.f64`, `llvm.copysign.f64`).

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{FloatType, IntType};
use inkwell::values::{FloatValue, FunctionValue, IntValue};

/// The fixed LLVM types this crate ever builds IR with.
pub struct Types<'ctx> {
    pub i1: IntType<'ctx>,
    pub i32: IntType<'ctx>,
    pub f64: FloatType<'ctx>,
}

impl<'ctx> Types<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self {
            i1: context.bool_type(),
            i32: context.i32_type(),
            f64: context.f64_type(),
        }
    }
}

pub fn iconst<'ctx>(types: &Types<'ctx>, value: i64) -> IntValue<'ctx> {
    types.i32.const_int(value as u64, true)
}

pub fn uconst<'ctx>(types: &Types<'ctx>, value: u64) -> IntValue<'ctx> {
    types.i32.const_int(value, false)
}

pub fn dconst<'ctx>(types: &Types<'ctx>, value: f64) -> FloatValue<'ctx> {
    types.f64.const_float(value)
}

/// The three transcendental intrinsics the objective transforms need.
/// Declared once per module; re-declaring is a codegen bug, not handled
/// defensively here (the forest emitter calls this exactly once).
pub struct Intrinsics<'ctx> {
    pub exp: FunctionValue<'ctx>,
    pub log: FunctionValue<'ctx>,
    pub copysign: FunctionValue<'ctx>,
}

impl<'ctx> Intrinsics<'ctx> {
    pub fn declare(module: &Module<'ctx>, types: &Types<'ctx>) -> Self {
        let unary = types.f64.fn_type(&[types.f64.into()], false);
        let binary = types.f64.fn_type(&[types.f64.into(), types.f64.into()], false);

        let exp = module.add_function("llvm.exp.f64", unary, None);
        let log = module.add_function("llvm.log.f64", unary, None);
        let copysign = module.add_function("llvm.copysign.f64", binary, None);

        Self { exp, log, copysign }
    }
}
