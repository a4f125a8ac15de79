use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub reporting_year: i32,
}

impl Default for LedgerMetadata {
    fn default() -> Self {
        Self {
            name: "Resource occupancy".to_string(),
            description: String::new(),
            reporting_year: 2025,
        }
    }
}
