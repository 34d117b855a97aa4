use serde::{Deserialize, Serialize};

use crate::ast::feature::Feature;
use crate::ast::objective::Objective;
use crate::ast::tree::Tree;
use crate::error::CodegenError;

/// An additive ensemble of decision trees: score = sum of tree outputs,
/// then the objective transform. Owns its trees and features exclusively;
/// features are shared immutably by every tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<Tree>,
    pub features: Vec<Feature>,
    pub n_classes: usize,
    pub objective: Objective,
}

impl Forest {
    pub fn new(
        trees: Vec<Tree>,
        features: Vec<Feature>,
        n_classes: usize,
        objective: Objective,
    ) -> Self {
        Self {
            trees,
            features,
            n_classes,
            objective,
        }
    }

    pub fn n_args(&self) -> usize {
        self.features.len()
    }

    /// Validate every tree's categorical/bitset invariant and reject
    /// multiclass forests, which this core does not implement.
    pub fn validate(&self) -> Result<(), CodegenError> {
        if self.n_classes > 1 {
            return Err(CodegenError::UnsupportedMulticlass(self.n_classes));
        }
        for tree in &self.trees {
            tree.validate()?;
        }
        Ok(())
    }
}
