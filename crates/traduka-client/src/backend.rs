//! Backend abstraction over the translation transport

use async_trait::async_trait;
use traduka_common::Result;

/// A source of translations for the coordinator.
///
/// Implemented by [`crate::TranslationEndpoint`] for production use; tests
/// substitute scripted implementations to exercise coordination behavior
/// without network access.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `text` into the language identified by `target`.
    ///
    /// Returns the translated string on success. Any failure (transport
    /// error, non-success status, unusable payload) surfaces as an error;
    /// the caller decides how to recover.
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}
