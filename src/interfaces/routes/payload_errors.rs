use actix_web::web;

use crate::errors::AppError;

/// Reports malformed query strings, forms and path segments as JSON 400s.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Query error: {}", err)).into()
    }));
    cfg.app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Form error: {}", err)).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Path error: {}", err)).into()
    }));
}
