//! Loyalty company model.

use serde::{Deserialize, Serialize};

/// A loyalty company (airline program) members can hold accounts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Unit the balance is expressed in ("milhas", "pontos")
    pub points_name: String,
}

/// Default unit for companies created on demand.
pub const DEFAULT_POINTS_NAME: &str = "pontos";

/// Default color for companies created on demand without one.
pub const DEFAULT_COMPANY_COLOR: &str = "#4a5568";

impl Company {
    pub fn new(name: &str, color: Option<&str>) -> Self {
        let color = color
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COMPANY_COLOR);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.to_string(),
            points_name: DEFAULT_POINTS_NAME.to_string(),
        }
    }
}

/// Request body for updating a company (the rename flow).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub points_name: Option<String>,
}
