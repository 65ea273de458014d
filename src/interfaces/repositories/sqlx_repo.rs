use sqlx::PgPool;

use crate::repositories::context::RequestContext;

/// Postgres-backed repository bound to one request.
#[derive(Clone)]
pub struct SqlxImageRepo {
    pub pool: PgPool,
    pub ctx: RequestContext,
    pub save_retry_attempts: u32,
}

impl SqlxImageRepo {
    pub fn new(pool: PgPool, ctx: RequestContext, save_retry_attempts: u32) -> Self {
        SqlxImageRepo { pool, ctx, save_retry_attempts }
    }
}
