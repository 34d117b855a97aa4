use serde::{Deserialize, Serialize};

/// Per-feature metadata shared immutably by every tree in a [`crate::ast::Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub is_categorical: bool,
}

impl Feature {
    pub fn numerical() -> Self {
        Self {
            is_categorical: false,
        }
    }

    pub fn categorical() -> Self {
        Self {
            is_categorical: true,
        }
    }
}
