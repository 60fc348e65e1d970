//! Request extractors whose rejections render through [`AppError`].
//!
//! axum's own `Json`, `Path` and `Query` answer malformed input with a plain
//! text body (and 422 for JSON that does not fit the target type). These
//! wrappers turn every such rejection into a 400 with the usual error body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
