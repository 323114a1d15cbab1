use serde::{Deserialize, Serialize};

/// Plan identifier as reported by the panel (numeric or textual).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A service tier on the remote panel. Fetched live, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: Option<PlanId>,
    pub name: String,
}

impl Plan {
    /// Display label, e.g. `Basic (ID 1)`.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{} (ID {id})", self.name),
            None => self.name.clone(),
        }
    }
}
