//! Persisted script records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::Script;

/// A generated script together with the idea it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub id: Uuid,
    pub campaign_idea: String,
    pub script: Script,
    pub created_at: DateTime<Utc>,
}

impl ScriptRecord {
    pub fn new(campaign_idea: impl Into<String>, script: Script) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_idea: campaign_idea.into(),
            script,
            created_at: Utc::now(),
        }
    }
}
