//! Post-it model: free-text notes, independent of members and companies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostIt {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a post-it.
#[derive(Debug, Clone, Deserialize)]
pub struct PostItRequest {
    #[serde(default)]
    pub content: String,
}
