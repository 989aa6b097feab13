//! Optimistic state held on top of the last server-confirmed snapshot.
//!
//! `confirmed` is only ever replaced by data the server returned. An
//! optimistic value lives beside it until the matching request settles:
//! success swaps in the server copy, failure drops the optimistic value so
//! the view is exactly the confirmed snapshot again.

/// Identifies one optimistic update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

#[derive(Debug, Clone)]
pub struct PendingOverlay<T> {
    confirmed: T,
    pending: Option<(PendingId, T)>,
    next_id: u64,
}

impl<T> PendingOverlay<T> {
    pub fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            pending: None,
            next_id: 0,
        }
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    /// What the user sees: the optimistic value if one is in flight.
    pub fn view(&self) -> &T {
        self.pending
            .as_ref()
            .map_or(&self.confirmed, |(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts an optimistic update. Only one may be in flight; returns
    /// `None` while another is pending.
    pub fn begin(&mut self, optimistic: T) -> Option<PendingId> {
        if self.pending.is_some() {
            return None;
        }
        self.next_id += 1;
        let id = PendingId(self.next_id);
        self.pending = Some((id, optimistic));
        Some(id)
    }

    /// Settles `id` with the server's copy. Stale ids are ignored.
    pub fn confirm(&mut self, id: PendingId, server: T) -> bool {
        if !self.owns(id) {
            return false;
        }
        self.pending = None;
        self.confirmed = server;
        true
    }

    /// Discards the optimistic value for `id`.
    pub fn rollback(&mut self, id: PendingId) -> bool {
        if !self.owns(id) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Replaces the confirmed snapshot after a plain refresh. An in-flight
    /// update stays in place.
    pub fn refresh(&mut self, server: T) {
        self.confirmed = server;
    }

    fn owns(&self, id: PendingId) -> bool {
        matches!(&self.pending, Some((pending, _)) if *pending == id)
    }
}
