//! Extractors that report rejections in the API error format.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query},
    Json,
};

use crate::error::ServerError;

/// JSON body extractor.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ServerError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ServerError))]
pub struct ApiPath<T>(pub T);
