/// Quiet period before a displayed value is committed.
pub(in crate::app) const DEBOUNCE_SECS: f64 = 0.3;

/// A value with an immediate `display` copy bound to the widget and a
/// `committed` copy that follows once input has been quiet for
/// [`DEBOUNCE_SECS`]. Every edit restarts the single timer.
#[derive(Clone, Debug)]
pub(in crate::app) struct Debounced<T> {
    display: T,
    committed: T,
    pending_since: Option<f64>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub(in crate::app) fn new(value: T) -> Self {
        Self {
            display: value.clone(),
            committed: value,
            pending_since: None,
        }
    }

    pub(in crate::app) fn display(&self) -> &T {
        &self.display
    }

    pub(in crate::app) fn committed(&self) -> &T {
        &self.committed
    }

    pub(in crate::app) fn set(&mut self, value: T, now: f64) {
        if value == self.display {
            return;
        }
        self.display = value;
        self.pending_since = Some(now);
    }

    /// Commits the display value once the window has elapsed.
    /// Returns `true` when the committed value changed.
    pub(in crate::app) fn poll(&mut self, now: f64) -> bool {
        match self.pending_since {
            Some(since) if now - since >= DEBOUNCE_SECS => self.commit_now(),
            _ => false,
        }
    }

    pub(in crate::app) fn commit_now(&mut self) -> bool {
        self.pending_since = None;
        if self.committed == self.display {
            return false;
        }
        self.committed = self.display.clone();
        true
    }

    /// Seconds until the pending edit commits, if any.
    pub(in crate::app) fn remaining(&self, now: f64) -> Option<f64> {
        self.pending_since
            .map(|since| (DEBOUNCE_SECS - (now - since)).max(0.0))
    }
}
