use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// LightGBM's three missing-value regimes.
///
/// - `MNone`: NaNs are treated as the literal value `0.0`.
/// - `MZero`: both `0.0` and NaN are treated as missing.
/// - `MNaN`: only NaN is treated as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingType {
    MNone,
    MZero,
    MNaN,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    Numerical(f64),
    Categorical(i32),
}

impl Threshold {
    pub fn is_categorical(&self) -> bool {
        matches!(self, Threshold::Categorical(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionNode {
    pub idx: usize,
    pub split_feature: usize,
    pub threshold: Threshold,
    pub default_left: bool,
    pub missing_type: MissingType,
    /// one `u32` per 32 categories. Present and nonempty iff `threshold` is `Categorical`.
    pub cat_threshold: Option<Vec<u32>>,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

impl DecisionNode {
    #[allow(clippy::too_many_arguments)]
    pub fn numerical(
        idx: usize,
        split_feature: usize,
        threshold: f64,
        default_left: bool,
        missing_type: MissingType,
        left: Node,
        right: Node,
    ) -> Self {
        Self {
            idx,
            split_feature,
            threshold: Threshold::Numerical(threshold),
            default_left,
            missing_type,
            cat_threshold: None,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn categorical(
        idx: usize,
        split_feature: usize,
        cat_bitset_idx: i32,
        default_left: bool,
        missing_type: MissingType,
        cat_threshold: Vec<u32>,
        left: Node,
        right: Node,
    ) -> Self {
        Self {
            idx,
            split_feature,
            threshold: Threshold::Categorical(cat_bitset_idx),
            default_left,
            missing_type,
            cat_threshold: Some(cat_threshold),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.threshold.is_categorical()
    }

    pub fn validate(&self) -> Result<(), CodegenError> {
        if self.is_categorical() && self.cat_threshold.as_ref().is_none_or(|b| b.is_empty()) {
            return Err(CodegenError::MissingCategoricalBitset { idx: self.idx });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub idx: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Decision(DecisionNode),
    Leaf(LeafNode),
}

impl Node {
    pub fn leaf(idx: usize, value: f64) -> Self {
        Node::Leaf(LeafNode { idx, value })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_decision(&self) -> Option<&DecisionNode> {
        match self {
            Node::Decision(d) => Some(d),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Decision(_) => None,
        }
    }
}
