use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// An upload endpoint. Read-only from the gallery's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Server {
    pub id: i64,
    pub url: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub entity: Entity,
}
