//! Subscription adapters binding source strings to the selected language
//!
//! A binding keeps one string (or an ordered list of strings) resolved into
//! the coordinator's current language, re-resolving whenever the source text
//! or the language changes. Every resolution attempt carries a generation
//! token; a result is applied only while its token is still the latest, so a
//! slow response for a superseded (text, language) pair can never overwrite
//! newer output.

use crate::coordinator::TranslationCoordinator;
use crate::language::Language;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

struct TextState {
    text: String,
    generation: u64,
}

/// Binds a single source string to the current language.
///
/// Output is exposed as a [`watch`] channel initialized to the source text;
/// dropping the binding tears down its driver task and leaves the last
/// output in place.
pub struct TextBinding {
    state: Arc<Mutex<TextState>>,
    output_rx: watch::Receiver<String>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
}

impl TextBinding {
    /// Create a binding for `text` and start resolving it
    pub fn new(coordinator: &TranslationCoordinator, text: impl Into<String>) -> Self {
        let text = text.into();
        let (output_tx, output_rx) = watch::channel(text.clone());
        let state = Arc::new(Mutex::new(TextState {
            text,
            generation: 0,
        }));
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        tokio::spawn(drive_text(
            coordinator.clone(),
            Arc::clone(&state),
            Arc::new(output_tx),
            Arc::clone(&refresh),
            cancel.clone(),
        ));

        Self {
            state,
            output_rx,
            refresh,
            cancel,
        }
    }

    /// Watch the resolved output
    pub fn output(&self) -> watch::Receiver<String> {
        self.output_rx.clone()
    }

    /// The currently resolved value
    pub fn current(&self) -> String {
        self.output_rx.borrow().clone()
    }

    /// Replace the source text, triggering re-resolution if it differs
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self.state.lock();
            if state.text == text {
                return;
            }
            state.text = text;
        }
        self.refresh.notify_one();
    }
}

impl Drop for TextBinding {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive_text(
    coordinator: TranslationCoordinator,
    state: Arc<Mutex<TextState>>,
    output_tx: Arc<watch::Sender<String>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) {
    let mut language_rx = coordinator.subscribe_language();

    loop {
        let language = *language_rx.borrow_and_update();
        let (generation, text) = {
            let mut st = state.lock();
            st.generation += 1;
            (st.generation, st.text.clone())
        };

        if language == coordinator.native_language() {
            // Bypasses the coordinator and cache entirely.
            let st = state.lock();
            if st.generation == generation {
                output_tx.send_replace(text);
            }
        } else {
            let coordinator = coordinator.clone();
            let state = Arc::clone(&state);
            let output_tx = Arc::clone(&output_tx);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let resolved = coordinator.translate_to(&text, language).await;
                if cancel.is_cancelled() {
                    return;
                }
                // Check-and-apply under the state lock: the driver bumps the
                // generation under the same lock, so a stale result can
                // never slip through between check and send.
                let st = state.lock();
                if st.generation == generation {
                    output_tx.send_replace(resolved);
                }
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = language_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = refresh.notified() => {}
        }
    }
}

struct TextListState {
    texts: Vec<String>,
    generation: u64,
    /// Last (texts, language) pair actually applied, for skipping redundant
    /// re-resolution on unrelated wakeups.
    last_resolved: Option<(Vec<String>, Language)>,
}

/// Binds an ordered list of source strings to the current language.
///
/// Results are applied atomically: either every entry updates together after
/// all resolve, or none do. Output order always matches input order.
pub struct TextListBinding {
    state: Arc<Mutex<TextListState>>,
    output_rx: watch::Receiver<Vec<String>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
}

impl TextListBinding {
    /// Create a binding for `texts` and start resolving them
    pub fn new(coordinator: &TranslationCoordinator, texts: Vec<String>) -> Self {
        let (output_tx, output_rx) = watch::channel(texts.clone());
        let state = Arc::new(Mutex::new(TextListState {
            texts,
            generation: 0,
            last_resolved: None,
        }));
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        tokio::spawn(drive_text_list(
            coordinator.clone(),
            Arc::clone(&state),
            Arc::new(output_tx),
            Arc::clone(&refresh),
            cancel.clone(),
        ));

        Self {
            state,
            output_rx,
            refresh,
            cancel,
        }
    }

    /// Watch the resolved output list
    pub fn output(&self) -> watch::Receiver<Vec<String>> {
        self.output_rx.clone()
    }

    /// The currently resolved values
    pub fn current(&self) -> Vec<String> {
        self.output_rx.borrow().clone()
    }

    /// Replace the source list, triggering re-resolution if it differs
    pub fn set_texts(&self, texts: Vec<String>) {
        {
            let mut state = self.state.lock();
            if state.texts == texts {
                return;
            }
            state.texts = texts;
        }
        self.refresh.notify_one();
    }
}

impl Drop for TextListBinding {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive_text_list(
    coordinator: TranslationCoordinator,
    state: Arc<Mutex<TextListState>>,
    output_tx: Arc<watch::Sender<Vec<String>>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) {
    let mut language_rx = coordinator.subscribe_language();

    loop {
        let language = *language_rx.borrow_and_update();
        let (generation, texts, skip) = {
            let mut st = state.lock();
            let unchanged = st
                .last_resolved
                .as_ref()
                .is_some_and(|(texts, lang)| *texts == st.texts && *lang == language);
            if !unchanged {
                st.generation += 1;
            }
            (st.generation, st.texts.clone(), unchanged)
        };

        if !skip {
            if language == coordinator.native_language() {
                let mut st = state.lock();
                if st.generation == generation {
                    st.last_resolved = Some((texts.clone(), language));
                    output_tx.send_replace(texts);
                }
            } else {
                let coordinator = coordinator.clone();
                let state = Arc::clone(&state);
                let output_tx = Arc::clone(&output_tx);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    // One combined wait over all entries; nothing is applied
                    // until every entry has resolved.
                    let resolved = futures::future::join_all(
                        texts
                            .iter()
                            .map(|text| coordinator.translate_to(text, language)),
                    )
                    .await;
                    if cancel.is_cancelled() {
                        return;
                    }
                    let mut st = state.lock();
                    if st.generation == generation {
                        st.last_resolved = Some((texts, language));
                        output_tx.send_replace(resolved);
                    }
                });
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = language_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = refresh.notified() => {}
        }
    }
}
