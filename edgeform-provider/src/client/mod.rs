//! Remote clients, one trait per entity family
//!
//! Resource types only see the family traits; [`HttpClient`] implements all
//! of them against the platform REST API, and tests substitute recording
//! mocks.

pub mod appsec;
pub mod botman;
pub mod cps;
pub mod http;
pub mod iam;

pub use appsec::AppSecApi;
pub use botman::BotmanApi;
pub use cps::CpsApi;
pub use http::HttpClient;
pub use iam::IamApi;

use edgeform_core::provider::ProviderError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-success response, decoded from the problem details body
    #[error("API error {status}: {title}: {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for ProviderError {
    fn from(e: ClientError) -> Self {
        ProviderError::remote(e)
    }
}
