use std::borrow::Cow;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::entity::Entity;

pub const MAX_IMAGE_URL_LEN: u64 = 2048;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub id: i64,
    pub url: String,
    /// Weak reference to the hosting server; nothing cascades through it.
    pub server_id: Option<i64>,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub entity: Entity,
}

/// Candidate record handed to `save_image`. Identity and timestamps are
/// assigned by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub url: String,
    pub server_id: Option<i64>,
}

impl NewImage {
    pub fn new(url: impl Into<String>) -> Self {
        NewImage {
            url: url.into(),
            server_id: None,
        }
    }

    pub fn hosted_on(mut self, server_id: i64) -> Self {
        self.server_id = Some(server_id);
        self
    }
}

// Submission form for `POST /images/`
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitImageForm {
    #[validate(
        length(min = 1, max = MAX_IMAGE_URL_LEN, message = "image_url must be between 1 and 2048 characters"),
        custom(function = "validate_http_url")
    )]
    pub image_url: String,
}

pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme() == "http" || parsed.scheme() == "https" {
                Ok(())
            } else {
                Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://"))
            }
        }
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

fn new_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}
