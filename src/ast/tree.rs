use serde::{Deserialize, Serialize};

use crate::ast::node::Node;
use crate::error::CodegenError;

/// One additive tree in a [`crate::ast::Forest`]. Owns its nodes outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub idx: usize,
    pub root: Node,
    pub class_id: usize,
}

impl Tree {
    pub fn new(idx: usize, root: Node, class_id: usize) -> Self {
        Self { idx, root, class_id }
    }

    pub fn name(&self) -> String {
        format!("tree_{}", self.idx)
    }

    /// Walk every decision node and check the categorical/bitset invariant.
    pub fn validate(&self) -> Result<(), CodegenError> {
        fn walk(node: &Node) -> Result<(), CodegenError> {
            if let Node::Decision(d) = node {
                d.validate()?;
                walk(&d.left)?;
                walk(&d.right)?;
            }
            Ok(())
        }
        walk(&self.root)
    }
}
