//! Translation cache and request coordination for the listing site
//!
//! This crate implements the runtime translation layer: a coordinator that
//! memoizes translated strings in two cache tiers and deduplicates concurrent
//! requests per (text, language) pair, subscription bindings that keep UI
//! strings resolved into the selected language with stale-result protection,
//! and a derived activity signal for loading indicators.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use traduka_client::TranslationEndpoint;
//! use traduka_core::{Language, TranslationCoordinator};
//!
//! # async fn example() -> traduka_common::Result<()> {
//! let endpoint = TranslationEndpoint::with_defaults("https://api.example.com")?;
//! let coordinator = TranslationCoordinator::builder(Arc::new(endpoint)).build();
//!
//! coordinator.set_language(Language::English);
//! let headline = coordinator.translate("Villa con vistas al mar").await;
//! println!("{}", headline);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod coordinator;
pub mod indicator;
pub mod language;
pub mod store;

pub use binding::{TextBinding, TextListBinding};
pub use coordinator::{CoordinatorBuilder, TranslationCoordinator};
pub use indicator::TranslationActivity;
pub use language::Language;
pub use store::{ClientStore, JsonFileStore, MemoryStore};

// Re-export the backend seam so implementors need not depend on the client
// crate directly.
pub use traduka_client::TranslationBackend;
