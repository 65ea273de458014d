use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, ResponseError,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{fmt, rc::Rc, task::{Context, Poll}};

use crate::{errors::ConsoleAuthError, AppState};

/// Operator credentials guarding `/console`.
#[derive(Clone, Default)]
pub struct ConsoleCredentials {
    pub username: String,
    pub password: String,
}

impl ConsoleCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        ConsoleCredentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks a raw `Authorization` header value.
    ///
    /// Empty supplied credentials are refused before the configuration is
    /// consulted; an unconfigured console refuses everybody else.
    pub fn verify(&self, authorization: Option<&str>) -> Result<(), ConsoleAuthError> {
        let (username, password) = parse_basic_auth(authorization)?;

        if username.is_empty() || password.is_empty() {
            return Err(ConsoleAuthError::WrongCredentials);
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConsoleAuthError::NotConfigured);
        }
        if username == self.username && password == self.password {
            Ok(())
        } else {
            Err(ConsoleAuthError::WrongCredentials)
        }
    }
}

impl fmt::Debug for ConsoleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn parse_basic_auth(authorization: Option<&str>) -> Result<(String, String), ConsoleAuthError> {
    let value = authorization.ok_or(ConsoleAuthError::MissingCredentials)?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or(ConsoleAuthError::MalformedHeader)?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ConsoleAuthError::MalformedHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ConsoleAuthError::MalformedHeader)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(ConsoleAuthError::MalformedHeader)?;

    Ok((username.to_string(), password.to_string()))
}

pub struct ConsoleAuth;

impl<S> Transform<S, ServiceRequest> for ConsoleAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ConsoleAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ConsoleAuthService {
            service: Rc::new(service),
        })
    }
}

pub struct ConsoleAuthService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for ConsoleAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let verdict = match req.app_data::<web::Data<AppState>>() {
                Some(state) => {
                    let authorization = req
                        .headers()
                        .get(header::AUTHORIZATION)
                        .and_then(|h| h.to_str().ok());
                    state.console.verify(authorization)
                }
                None => {
                    tracing::error!("AppState missing in console middleware");
                    Err(ConsoleAuthError::NotConfigured)
                }
            };

            match verdict {
                Ok(()) => service.call(req).await,
                Err(e) => {
                    tracing::warn!(path = req.path(), "Console access denied: {}", e);
                    let response = e.error_response();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_for(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
    }

    #[test]
    fn accepts_matching_credentials() {
        let creds = ConsoleCredentials::new("admin", "s3cret");
        assert!(creds.verify(Some(&header_for("admin", "s3cret"))).is_ok());
    }

    #[test]
    fn rejects_wrong_password() {
        let creds = ConsoleCredentials::new("admin", "s3cret");
        assert!(matches!(
            creds.verify(Some(&header_for("admin", "nope"))),
            Err(ConsoleAuthError::WrongCredentials)
        ));
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        let creds = ConsoleCredentials::new("admin", "s3cret");
        assert!(matches!(creds.verify(None), Err(ConsoleAuthError::MissingCredentials)));
        assert!(matches!(
            creds.verify(Some("Bearer abc")),
            Err(ConsoleAuthError::MalformedHeader)
        ));
        assert!(matches!(
            creds.verify(Some("Basic !!!")),
            Err(ConsoleAuthError::MalformedHeader)
        ));
    }

    #[test]
    fn empty_supplied_credentials_are_refused_before_configuration() {
        let unconfigured = ConsoleCredentials::default();
        assert!(matches!(
            unconfigured.verify(Some(&header_for("", ""))),
            Err(ConsoleAuthError::WrongCredentials)
        ));
    }

    #[test]
    fn unconfigured_console_refuses_everyone() {
        let unconfigured = ConsoleCredentials::default();
        assert!(matches!(
            unconfigured.verify(Some(&header_for("admin", "s3cret"))),
            Err(ConsoleAuthError::NotConfigured)
        ));
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = ConsoleCredentials::new("admin", "s3cret");
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }
}
