//! Objective post-transform lowering.

use inkwell::builder::Builder;
use inkwell::values::FloatValue;

use crate::ast::Objective;
use crate::codegen::primitives::{dconst, Intrinsics, Types};
use crate::error::CodegenError;

pub fn emit_objective<'ctx>(
    builder: &Builder<'ctx>,
    types: &Types<'ctx>,
    intrinsics: &Intrinsics<'ctx>,
    objective: Objective,
    acc: FloatValue<'ctx>,
) -> Result<FloatValue<'ctx>, CodegenError> {
    let b = |e: inkwell::builder::BuilderError| CodegenError::Builder(e.to_string());

    match objective {
        Objective::Binary { alpha } => emit_sigmoid(builder, types, intrinsics, acc, alpha),
        Objective::XEntropy => emit_sigmoid(builder, types, intrinsics, acc, 1.0),
        Objective::XEntLambda => {
            let exp = builder
                .build_call(intrinsics.exp, &[acc.into()], "xent_exp")
                .map_err(b)?
                .try_as_basic_value()
                .left()
                .expect("llvm.exp.f64 returns a value")
                .into_float_value();
            let plus_one = builder
                .build_float_add(dconst(types, 1.0), exp, "xent_plus_one")
                .map_err(b)?;
            let log = builder
                .build_call(intrinsics.log, &[plus_one.into()], "xent_log")
                .map_err(b)?
                .try_as_basic_value()
                .left()
                .expect("llvm.log.f64 returns a value")
                .into_float_value();
            Ok(log)
        }
        Objective::ExpOnly => {
            let exp = builder
                .build_call(intrinsics.exp, &[acc.into()], "exp_only")
                .map_err(b)?
                .try_as_basic_value()
                .left()
                .expect("llvm.exp.f64 returns a value")
                .into_float_value();
            Ok(exp)
        }
        Objective::Regression { sqrt } => {
            if sqrt {
                let squared = builder.build_float_mul(acc, acc, "sq").map_err(b)?;
                let copied = builder
                    .build_call(intrinsics.copysign, &[squared.into(), acc.into()], "copysign")
                    .map_err(b)?
                    .try_as_basic_value()
                    .left()
                    .expect("llvm.copysign.f64 returns a value")
                    .into_float_value();
                Ok(copied)
            } else {
                Ok(acc)
            }
        }
        Objective::Identity => Ok(acc),
    }
}

fn emit_sigmoid<'ctx>(
    builder: &Builder<'ctx>,
    types: &Types<'ctx>,
    intrinsics: &Intrinsics<'ctx>,
    acc: FloatValue<'ctx>,
    alpha: f64,
) -> Result<FloatValue<'ctx>, CodegenError> {
    let b = |e: inkwell::builder::BuilderError| CodegenError::Builder(e.to_string());
    let neg_alpha = dconst(types, -alpha);
    let inner = builder.build_float_mul(neg_alpha, acc, "sigmoid_inner").map_err(b)?;
    let exp = builder
        .build_call(intrinsics.exp, &[inner.into()], "sigmoid_exp")
        .map_err(b)?
        .try_as_basic_value()
        .left()
        .expect("llvm.exp.f64 returns a value")
        .into_float_value();
    let denom = builder
        .build_float_add(dconst(types, 1.0), exp, "sigmoid_denom")
        .map_err(b)?;
    builder
        .build_float_div(dconst(types, 1.0), denom, "sigmoid")
        .map_err(b)
}
