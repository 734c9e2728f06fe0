//! HTTP client for the Traduka translation endpoint
//!
//! This crate provides the wire-level half of the translation layer: a pooled
//! [`reqwest`]-based client for the remote translation endpoint, the request
//! and response models it exchanges, and the [`TranslationBackend`] trait that
//! decouples the coordinator from the transport so tests can script responses.
//!
//! # Example
//!
//! ```rust,no_run
//! use traduka_client::{EndpointConfig, TranslationBackend, TranslationEndpoint};
//!
//! # async fn example() -> traduka_common::Result<()> {
//! let endpoint = TranslationEndpoint::new(
//!     EndpointConfig::new("https://api.example.com")?.with_timeout(10),
//! )?;
//! let translated = endpoint.translate("Bienvenido", "en").await?;
//! println!("{}", translated);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod endpoint;

pub use backend::TranslationBackend;
pub use endpoint::{EndpointConfig, TranslateRequest, TranslateResponse, TranslationEndpoint};
