mod feature;
mod forest;
mod node;
mod objective;
mod tree;

pub use feature::Feature;
pub use forest::Forest;
pub use node::{DecisionNode, LeafNode, MissingType, Node, Threshold};
pub use objective::Objective;
pub use tree::Tree;
