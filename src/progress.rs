use tokio::sync::watch;

/// Sentinel fraction for indeterminate/spinner progress.
pub const INDETERMINATE: f64 = -1.0;

/// A single progress update.
///
/// `fraction` is in `[0, 1]` for determinate progress, or
/// [`INDETERMINATE`] when the total is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub label: String,
    pub fraction: f64,
}

/// Single-slot, last-write-wins progress signal.
///
/// The channel holds only the most recent event; a `None` value means
/// "idle, ready to launch". Slow or absent consumers observe only the
/// latest state — progress is advisory and never carries errors.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: watch::Sender<Option<ProgressEvent>>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Subscribe to the latest progress state.
    pub fn subscribe(&self) -> watch::Receiver<Option<ProgressEvent>> {
        self.tx.subscribe()
    }

    /// Publish determinate progress, clamped to `[0, 1]`.
    pub fn emit(&self, label: &str, fraction: f64) {
        self.tx.send_replace(Some(ProgressEvent {
            label: label.to_string(),
            fraction: fraction.clamp(0.0, 1.0),
        }));
    }

    /// Publish indeterminate progress.
    pub fn indeterminate(&self, label: &str) {
        self.tx.send_replace(Some(ProgressEvent {
            label: label.to_string(),
            fraction: INDETERMINATE,
        }));
    }

    /// Clear the channel back to the idle state.
    pub fn idle(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_event_is_observable() {
        let channel = ProgressChannel::new();
        let rx = channel.subscribe();

        channel.emit("libraries", 0.25);
        channel.emit("libraries", 0.50);
        channel.emit("assets", 0.75);

        let latest = rx.borrow().clone();
        assert_eq!(
            latest,
            Some(ProgressEvent {
                label: "assets".into(),
                fraction: 0.75
            })
        );
    }

    #[test]
    fn idle_clears_the_slot() {
        let channel = ProgressChannel::new();
        let rx = channel.subscribe();

        channel.indeterminate("resolving");
        channel.idle();

        assert!(rx.borrow().is_none());
    }

    #[test]
    fn fractions_are_clamped() {
        let channel = ProgressChannel::new();
        let rx = channel.subscribe();

        channel.emit("assets", 3.2);
        assert_eq!(rx.borrow().as_ref().map(|e| e.fraction), Some(1.0));
    }
}
