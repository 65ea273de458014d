use std::{future::Future, time::Duration};

use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use crate::errors::AppError;

/// Scopes repository calls to one logical request: carries the request id used
/// in logs and the deadline every backend interaction must finish by.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    deadline: Instant,
}

impl RequestContext {
    pub fn new(timeout: Duration) -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Runs one backend interaction under the request deadline. Running out of
    /// time is reported as a storage failure.
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match timeout_at(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    request_id = %self.request_id,
                    operation,
                    "Repository call exceeded the request deadline"
                );
                Err(AppError::StorageError(format!(
                    "{operation} exceeded the request deadline"
                )))
            }
        }
    }
}
