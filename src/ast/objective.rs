use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// The objective post-transform applied to a forest's summed accumulator.
///
/// Resolved once at `Forest`-construction time from the raw
/// `(objective_func, objective_func_config)` tag pair, so codegen never
/// string-matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    /// `1 / (1 + exp(-alpha * x))`
    Binary { alpha: f64 },
    /// Sigmoid with `alpha = 1.0`.
    XEntropy,
    /// `log(1 + exp(x))`, naive.
    XEntLambda,
    /// `exp(x)`. Covers `poisson`, `gamma`, `tweedie`.
    ExpOnly,
    /// Identity, or `copysign(x * x, x)` if the config requested `sqrt`.
    Regression { sqrt: bool },
    /// Identity. Covers `lambdarank`, `rank_xendcg`, `custom`.
    Identity,
}

impl Objective {
    /// Parse the LightGBM `objective_func` tag and its opaque
    /// `objective_func_config` string into a resolved [`Objective`].
    ///
    /// Fails if the tag is unrecognized, or if `binary`'s sigmoid `alpha`
    /// (parsed from the config after the first `:`) is not `> 0`.
    pub fn parse(objective_func: &str, objective_func_config: &str) -> Result<Self, CodegenError> {
        match objective_func {
            "binary" => {
                let alpha_str = objective_func_config
                    .split_once(':')
                    .map(|(_, v)| v)
                    .unwrap_or(objective_func_config);
                let alpha: f64 = alpha_str
                    .trim()
                    .parse()
                    .map_err(|_| CodegenError::InvalidSigmoidAlpha { alpha: f64::NAN })?;
                if alpha <= 0.0 {
                    return Err(CodegenError::InvalidSigmoidAlpha { alpha });
                }
                Ok(Objective::Binary { alpha })
            }
            "xentropy" | "cross_entropy" => Ok(Objective::XEntropy),
            "xentlambda" | "cross_entropy_lambda" => Ok(Objective::XEntLambda),
            "poisson" | "gamma" | "tweedie" => Ok(Objective::ExpOnly),
            "regression" | "regression_l1" | "huber" | "fair" | "quantile" | "mape" => {
                let sqrt = objective_func_config.contains("sqrt");
                Ok(Objective::Regression { sqrt })
            }
            "lambdarank" | "rank_xendcg" | "custom" => Ok(Objective::Identity),
            other => Err(CodegenError::UnsupportedObjective(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_parses_alpha_after_colon() {
        let obj = Objective::parse("binary", "sigmoid:1.0").unwrap();
        assert_eq!(obj, Objective::Binary { alpha: 1.0 });
    }

    #[test]
    fn binary_rejects_non_positive_alpha() {
        assert!(Objective::parse("binary", "sigmoid:0.0").is_err());
        assert!(Objective::parse("binary", "sigmoid:-1.0").is_err());
    }

    #[test]
    fn xentropy_aliases() {
        assert_eq!(Objective::parse("xentropy", "").unwrap(), Objective::XEntropy);
        assert_eq!(
            Objective::parse("cross_entropy", "").unwrap(),
            Objective::XEntropy
        );
    }

    #[test]
    fn regression_detects_sqrt_config() {
        assert_eq!(
            Objective::parse("regression", "sqrt").unwrap(),
            Objective::Regression { sqrt: true }
        );
        assert_eq!(
            Objective::parse("regression", "").unwrap(),
            Objective::Regression { sqrt: false }
        );
    }

    #[test]
    fn unknown_objective_rejected() {
        assert!(Objective::parse("unknown_thing", "").is_err());
    }
}
