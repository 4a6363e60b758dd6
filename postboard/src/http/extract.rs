use axum::extract::FromRequest;

use super::error::ApiError;

/// `Json` extractor whose rejection is reported through [`ApiError`], so a body
/// that fails to parse gets the same JSON error shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
