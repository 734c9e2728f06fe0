//! Loading-indicator view over the coordinator's busy signal

use tokio::sync::watch;

/// Read-only view of whether any translation call is outstanding.
///
/// Carries no state of its own: the value is derived exclusively from the
/// coordinator's outstanding-call counter, so it cannot drift from it and
/// consumers cannot set it.
#[derive(Debug, Clone)]
pub struct TranslationActivity {
    rx: watch::Receiver<bool>,
}

impl TranslationActivity {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Whether at least one translation call is currently outstanding
    pub fn is_translating(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next transition and return the new value.
    ///
    /// Returns `false` if the coordinator has been dropped.
    pub async fn changed(&mut self) -> bool {
        if self.rx.changed().await.is_err() {
            return false;
        }
        *self.rx.borrow_and_update()
    }

    /// Wait until no translation call is outstanding
    pub async fn wait_until_idle(&mut self) {
        let _ = self.rx.wait_for(|busy| !*busy).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reflects_channel_value() {
        let (tx, rx) = watch::channel(false);
        let mut activity = TranslationActivity::new(rx);
        assert!(!activity.is_translating());

        tx.send_replace(true);
        assert!(activity.is_translating());
        assert!(activity.changed().await);

        tx.send_replace(false);
        activity.wait_until_idle().await;
        assert!(!activity.is_translating());
    }

    #[tokio::test]
    async fn test_changed_reports_idle_after_sender_drop() {
        let (tx, rx) = watch::channel(true);
        let mut activity = TranslationActivity::new(rx);
        drop(tx);
        assert!(!activity.changed().await);
    }
}
