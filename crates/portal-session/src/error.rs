//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] portal_api::ApiError),

    #[error("Superseded by a later session operation")]
    Superseded,
}
