//! Artist model

use serde::{Deserialize, Serialize};

/// An artist. Read-only from the service's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}
