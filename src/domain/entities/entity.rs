use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle fields shared by every stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entity {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only meaningful while `is_deleted` is set.
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl Entity {
    /// A live record created at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Entity {
            created_at: now,
            updated_at: now,
            deleted_at: None,
            is_deleted: false,
        }
    }
}
