//! Request extractors that report rejections with the app's [Error] type.

use axum::extract::FromRequest;

use crate::Error;

/// Like [axum::Json], but a malformed body is reported as
/// [Error::InvalidRequestBody] so that it gets the same JSON error body as
/// every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);
