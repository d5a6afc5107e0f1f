//! Segregation-of-duties warnings returned by the server

use serde::{Deserialize, Deserializer, Serialize};

/// Severity of a segregation-of-duties warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Low,
    Medium,
    High,
}

/// Server-computed advisory about a conflicting combination of grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoDWarning {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub severity: WarningSeverity,
    pub message: String,
    /// Action ids implicated, in server order
    #[serde(default)]
    pub actions: Vec<String>,
}

impl SoDWarning {
    /// Whether `action` is one of the implicated actions
    pub fn implicates(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
