use crate::CardError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;

/// Faults the HTTP surface can't turn into a notice and redirect.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Card(#[from] CardError),

    #[error("Session middleware is not installed on this route")]
    MissingSession,

    #[error("Storage task did not finish: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Details go to the log, never to the client
        error!("Request failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
