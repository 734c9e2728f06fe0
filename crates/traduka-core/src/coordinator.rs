//! Translation cache and request coordinator
//!
//! The coordinator sits between UI consumers and the remote translation
//! backend. It owns two cache tiers (an unbounded in-process map and a
//! best-effort per-session store), a registry of in-flight requests so that
//! concurrent callers asking for the same (text, language) pair share a
//! single network call, and the "is translating" signal derived from the
//! number of outstanding calls.
//!
//! Coordination rules:
//! - requests targeting the native language short-circuit to the source text;
//! - a failed call resolves every waiter with the source text and caches
//!   nothing, so the next identical request retries;
//! - switching back to the native language clears both cache tiers.

use crate::indicator::TranslationActivity;
use crate::language::Language;
use crate::store::{ClientStore, MemoryStore};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use traduka_client::TranslationBackend;

/// Session-store key prefix for cached translations
const SESSION_PREFIX: &str = "traduka:";

/// Preference-store key remembering the last chosen language
const LANGUAGE_KEY: &str = "traduka-language";

/// Cache key for one translation request
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    text: String,
    language: Language,
}

impl CacheKey {
    fn new(text: &str, language: Language) -> Self {
        Self {
            text: text.to_string(),
            language,
        }
    }

    /// Key under which this entry lives in the session store
    fn storage_key(&self) -> String {
        format!("{}{}_{}", SESSION_PREFIX, self.text, self.language.code())
    }
}

/// In-flight request registry plus the outstanding-call counter.
///
/// Both live under one mutex so the busy signal can never disagree with the
/// registry contents.
#[derive(Default)]
struct InFlight {
    pending: HashMap<CacheKey, watch::Sender<Option<String>>>,
    active: usize,
}

struct Inner {
    backend: Arc<dyn TranslationBackend>,
    native: Language,
    memory: DashMap<CacheKey, String>,
    session: Arc<dyn ClientStore>,
    preferences: Arc<dyn ClientStore>,
    inflight: Mutex<InFlight>,
    busy_tx: watch::Sender<bool>,
    language_tx: watch::Sender<Language>,
}

/// Builder for [`TranslationCoordinator`]
pub struct CoordinatorBuilder {
    backend: Arc<dyn TranslationBackend>,
    native: Language,
    session: Arc<dyn ClientStore>,
    preferences: Arc<dyn ClientStore>,
}

impl CoordinatorBuilder {
    /// Set the native language (default: [`Language::NATIVE`])
    pub fn native_language(mut self, language: Language) -> Self {
        self.native = language;
        self
    }

    /// Set the per-session cache store (default: in-memory)
    pub fn session_store(mut self, store: Arc<dyn ClientStore>) -> Self {
        self.session = store;
        self
    }

    /// Set the durable preference store (default: in-memory)
    pub fn preference_store(mut self, store: Arc<dyn ClientStore>) -> Self {
        self.preferences = store;
        self
    }

    /// Build the coordinator.
    ///
    /// The selected language always starts at the native language; the
    /// persisted preference is written for other components to read but is
    /// never restored here, so a fresh session issues no translation calls
    /// until the user explicitly picks a language.
    pub fn build(self) -> TranslationCoordinator {
        let (busy_tx, _) = watch::channel(false);
        let (language_tx, _) = watch::channel(self.native);

        info!(
            "Translation coordinator ready, native language '{}'",
            self.native.code()
        );

        TranslationCoordinator {
            inner: Arc::new(Inner {
                backend: self.backend,
                native: self.native,
                memory: DashMap::new(),
                session: self.session,
                preferences: self.preferences,
                inflight: Mutex::new(InFlight::default()),
                busy_tx,
                language_tx,
            }),
        }
    }
}

/// Mediates between consumers needing translated strings and the backend.
///
/// Cheap to clone; all clones share the same caches, registry, and signals.
#[derive(Clone)]
pub struct TranslationCoordinator {
    inner: Arc<Inner>,
}

impl TranslationCoordinator {
    /// Start building a coordinator around the given backend
    pub fn builder(backend: Arc<dyn TranslationBackend>) -> CoordinatorBuilder {
        CoordinatorBuilder {
            backend,
            native: Language::NATIVE,
            session: Arc::new(MemoryStore::new()),
            preferences: Arc::new(MemoryStore::new()),
        }
    }

    /// The language source text is authored in
    pub fn native_language(&self) -> Language {
        self.inner.native
    }

    /// The currently selected target language
    pub fn current_language(&self) -> Language {
        *self.inner.language_tx.borrow()
    }

    /// Watch for changes of the selected language
    pub fn subscribe_language(&self) -> watch::Receiver<Language> {
        self.inner.language_tx.subscribe()
    }

    /// Whether at least one translation call is outstanding
    pub fn is_translating(&self) -> bool {
        *self.inner.busy_tx.borrow()
    }

    /// A read-only view over the busy signal for loading indicators
    pub fn activity(&self) -> TranslationActivity {
        TranslationActivity::new(self.inner.busy_tx.subscribe())
    }

    /// Switch the selected target language.
    ///
    /// Switching to the native language clears both cache tiers: once the
    /// user is back on the source-language path no previously translated
    /// text may be served, and the cache never grows across language cycles.
    /// The chosen code is persisted on every call regardless of change.
    #[instrument(skip(self), fields(language = %language.code()))]
    pub fn set_language(&self, language: Language) {
        let changed = self.inner.language_tx.send_if_modified(|current| {
            if *current != language {
                *current = language;
                true
            } else {
                false
            }
        });

        if changed {
            info!("Language switched to '{}'", language.code());
        }

        if language == self.inner.native {
            self.clear_cache();
        }

        if let Err(e) = self.inner.preferences.put(LANGUAGE_KEY, language.code()) {
            debug!("Preference store write failed: {}", e);
        }
    }

    /// Clear both cache tiers
    pub fn clear_cache(&self) {
        let cleared = self.inner.memory.len();
        self.inner.memory.clear();
        if let Err(e) = self.inner.session.remove_prefix(SESSION_PREFIX) {
            debug!("Session store clear failed: {}", e);
        }
        debug!("Cleared {} cached translations", cleared);
    }

    /// Translate into the currently selected language
    pub async fn translate(&self, text: &str) -> String {
        let target = self.current_language();
        self.translate_to(text, target).await
    }

    /// Translate into an explicit target language.
    ///
    /// Never fails from the caller's point of view: on any backend failure
    /// the original text is returned and nothing is cached, so a later call
    /// for the same pair retries.
    pub async fn translate_to(&self, text: &str, target: Language) -> String {
        if target == self.inner.native {
            return text.to_string();
        }

        let key = CacheKey::new(text, target);

        if let Some(hit) = self.inner.memory.get(&key) {
            return hit.clone();
        }

        let storage_key = key.storage_key();
        match self.inner.session.get(&storage_key) {
            Ok(Some(hit)) => {
                debug!("Session tier hit for '{}'", storage_key);
                self.inner.memory.insert(key, hit.clone());
                return hit;
            }
            Ok(None) => {}
            Err(e) => debug!("Session store read failed for '{}': {}", storage_key, e),
        }

        let mut rx = {
            // The whole check-and-register step happens under the registry
            // lock with no await point, so two callers for the same key
            // cannot both miss the registry and issue duplicate calls.
            let mut inflight = self.inner.inflight.lock();

            if let Some(hit) = self.inner.memory.get(&key) {
                // A concurrent fetch finished between the cache check above
                // and taking the lock.
                return hit.clone();
            }

            let joined = inflight.pending.get(&key).map(|tx| tx.subscribe());
            match joined {
                Some(rx) => {
                    debug!("Joining in-flight request for '{}'", storage_key);
                    rx
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.pending.insert(key.clone(), tx);
                    inflight.active += 1;
                    if inflight.active == 1 {
                        self.inner.busy_tx.send_replace(true);
                    }
                    Inner::spawn_fetch(Arc::clone(&self.inner), key);
                    rx
                }
            }
        };

        let resolved = match rx.wait_for(|value| value.is_some()).await {
            Ok(value) => value.clone().unwrap_or_else(|| text.to_string()),
            // Sender dropped without resolving; fall back to the source text.
            Err(_) => text.to_string(),
        };
        resolved
    }
}

impl Inner {
    /// Run the network call for one registered key on its own task.
    ///
    /// Spawned rather than driven by the registering caller so that a caller
    /// dropping its future cannot strand the other waiters.
    fn spawn_fetch(inner: Arc<Inner>, key: CacheKey) {
        tokio::spawn(async move {
            let outcome = inner
                .backend
                .translate(&key.text, key.language.code())
                .await;

            let resolved = match outcome {
                Ok(translated) => {
                    inner.memory.insert(key.clone(), translated.clone());
                    if let Err(e) = inner.session.put(&key.storage_key(), &translated) {
                        debug!("Session store write failed: {}", e);
                    }
                    translated
                }
                Err(e) => {
                    // Non-fatal: waiters see the untranslated text, and the
                    // failure is not cached so the next request retries.
                    warn!(
                        "Translation into '{}' failed: {}",
                        key.language.code(),
                        e
                    );
                    key.text.clone()
                }
            };

            let mut inflight = inner.inflight.lock();
            let sender = inflight.pending.remove(&key);
            inflight.active = inflight.active.saturating_sub(1);
            if inflight.active == 0 {
                inner.busy_tx.send_replace(false);
            }
            if let Some(tx) = sender {
                let _ = tx.send(Some(resolved));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use traduka_common::{Result, TradukaError};

    /// Backend that answers `text::target`, with optional latency and
    /// scripted failures, counting every call it receives.
    #[derive(Default)]
    struct ScriptedBackend {
        calls: AtomicUsize,
        delay_ms: u64,
        fail_next: AtomicBool,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self::default()
        }

        fn with_delay(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranslationBackend for ScriptedBackend {
        async fn translate(&self, text: &str, target: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(TradukaError::endpoint_with_status("scripted failure", 502));
            }
            Ok(format!("{}::{}", text, target))
        }
    }

    fn coordinator_with(backend: Arc<ScriptedBackend>) -> TranslationCoordinator {
        TranslationCoordinator::builder(backend).build()
    }

    #[tokio::test]
    async fn test_sequential_calls_hit_cache() {
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = coordinator_with(Arc::clone(&backend));

        let first = coordinator.translate_to("hola", Language::English).await;
        let second = coordinator.translate_to("hola", Language::English).await;

        assert_eq!(first, "hola::en");
        assert_eq!(second, first);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_deduplicated() {
        let backend = Arc::new(ScriptedBackend::with_delay(20));
        let coordinator = coordinator_with(Arc::clone(&backend));

        let (first, second) = tokio::join!(
            coordinator.translate_to("hola", Language::English),
            coordinator.translate_to("hola", Language::English),
        );

        assert_eq!(first, "hola::en");
        assert_eq!(second, first);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_are_not_deduplicated() {
        let backend = Arc::new(ScriptedBackend::with_delay(10));
        let coordinator = coordinator_with(Arc::clone(&backend));

        let (a, b) = tokio::join!(
            coordinator.translate_to("hola", Language::English),
            coordinator.translate_to("hola", Language::French),
        );

        assert_eq!(a, "hola::en");
        assert_eq!(b, "hola::fr");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_native_language_short_circuits() {
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = coordinator_with(Arc::clone(&backend));

        let explicit = coordinator.translate_to("hola", Language::NATIVE).await;
        // Current language defaults to native on cold start.
        let implicit = coordinator.translate("hola").await;

        assert_eq!(explicit, "hola");
        assert_eq!(implicit, "hola");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_back_without_poisoning_cache() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.fail_next.store(true, Ordering::SeqCst);
        let coordinator = coordinator_with(Arc::clone(&backend));

        let failed = coordinator.translate_to("hola", Language::English).await;
        assert_eq!(failed, "hola");
        assert_eq!(backend.call_count(), 1);

        // The failed attempt was not cached; the next call retries and
        // succeeds.
        let retried = coordinator.translate_to("hola", Language::English).await;
        assert_eq!(retried, "hola::en");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_switch_to_native_purges_both_tiers() {
        let backend = Arc::new(ScriptedBackend::new());
        let session = Arc::new(MemoryStore::new());
        let coordinator = TranslationCoordinator::builder(Arc::clone(&backend) as _)
            .session_store(Arc::clone(&session) as _)
            .build();

        coordinator.set_language(Language::English);
        coordinator.translate("hola").await;
        assert_eq!(backend.call_count(), 1);
        assert!(!session.is_empty());

        coordinator.set_language(Language::NATIVE);
        assert!(session.is_empty());

        // Re-selecting the language must re-fetch rather than reuse the
        // pre-purge value.
        coordinator.set_language(Language::English);
        let translated = coordinator.translate("hola").await;
        assert_eq!(translated, "hola::en");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_session_tier_promotes_into_memory() {
        let backend = Arc::new(ScriptedBackend::new());
        let session = Arc::new(MemoryStore::new());
        let stored_key = CacheKey::new("hola", Language::English).storage_key();
        session.put(&stored_key, "hello from session").unwrap();

        let coordinator = TranslationCoordinator::builder(Arc::clone(&backend) as _)
            .session_store(Arc::clone(&session) as _)
            .build();

        let hit = coordinator.translate_to("hola", Language::English).await;
        assert_eq!(hit, "hello from session");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_busy_signal_tracks_outstanding_calls() {
        let backend = Arc::new(ScriptedBackend::with_delay(40));
        let coordinator = coordinator_with(Arc::clone(&backend));
        assert!(!coordinator.is_translating());

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.translate_to("uno", Language::English).await })
        };
        let second = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.translate_to("dos", Language::French).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(coordinator.is_translating());

        first.await.unwrap();
        second.await.unwrap();

        let mut activity = coordinator.activity();
        activity.wait_until_idle().await;
        assert!(!coordinator.is_translating());
    }

    #[tokio::test]
    async fn test_preference_written_on_every_set_language() {
        let backend = Arc::new(ScriptedBackend::new());
        let preferences = Arc::new(MemoryStore::new());
        let coordinator = TranslationCoordinator::builder(Arc::clone(&backend) as _)
            .preference_store(Arc::clone(&preferences) as _)
            .build();

        coordinator.set_language(Language::English);
        assert_eq!(
            preferences.get(LANGUAGE_KEY).unwrap().as_deref(),
            Some("en")
        );

        coordinator.set_language(Language::NATIVE);
        assert_eq!(
            preferences.get(LANGUAGE_KEY).unwrap().as_deref(),
            Some("es")
        );

        // Re-setting the same language still writes the preference.
        coordinator.set_language(Language::NATIVE);
        assert_eq!(
            preferences.get(LANGUAGE_KEY).unwrap().as_deref(),
            Some("es")
        );
    }

    #[tokio::test]
    async fn test_language_defaults_to_native_and_is_not_restored() {
        let backend = Arc::new(ScriptedBackend::new());
        let preferences = Arc::new(MemoryStore::new());
        preferences.put(LANGUAGE_KEY, "fr").unwrap();

        let coordinator = TranslationCoordinator::builder(Arc::clone(&backend) as _)
            .preference_store(Arc::clone(&preferences) as _)
            .build();

        // The stored preference exists for other components; a cold start
        // still begins on the native path to avoid translation spend.
        assert_eq!(coordinator.current_language(), Language::NATIVE);
    }

    /// Store whose every operation fails, for exercising the best-effort
    /// persistence contract.
    struct BrokenStore;

    impl ClientStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(TradukaError::store("storage disabled"))
        }
        fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(TradukaError::store("storage disabled"))
        }
        fn remove_prefix(&self, _prefix: &str) -> Result<()> {
            Err(TradukaError::store("storage disabled"))
        }
    }

    #[tokio::test]
    async fn test_broken_stores_do_not_break_translation() {
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = TranslationCoordinator::builder(Arc::clone(&backend) as _)
            .session_store(Arc::new(BrokenStore))
            .preference_store(Arc::new(BrokenStore))
            .build();

        coordinator.set_language(Language::English);
        let translated = coordinator.translate("hola").await;
        assert_eq!(translated, "hola::en");

        // In-process tier still works on its own.
        let cached = coordinator.translate("hola").await;
        assert_eq!(cached, "hola::en");
        assert_eq!(backend.call_count(), 1);

        coordinator.set_language(Language::NATIVE);
    }
}
