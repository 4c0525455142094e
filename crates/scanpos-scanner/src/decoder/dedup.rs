//! Suppresses repeat reports of the payload that is still in view.

/// Remembers the last reported payload of a session.
///
/// A payload is accepted unless it equals the IMMEDIATELY preceding accepted
/// payload, so `A, A, B, A` yields `A, B, A`.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    last: Option<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true (and remembers `payload`) if it should be reported.
    pub fn accept(&mut self, payload: &str) -> bool {
        if self.last.as_deref() == Some(payload) {
            return false;
        }
        self.last = Some(payload.to_string());
        true
    }

    /// Forgets the last payload (`clearLast`).
    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}
