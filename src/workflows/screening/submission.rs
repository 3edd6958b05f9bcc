use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::domain::SessionId;

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_sequence() -> u64 {
    SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Proof that a submission was started; only the newest ticket per session may commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    session: SessionId,
    sequence: u64,
}

impl SubmissionTicket {
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Last-submission-wins bookkeeping keyed by session.
#[derive(Debug, Default)]
pub struct SubmissionTracker {
    latest: Mutex<HashMap<SessionId, u64>>,
}

impl SubmissionTracker {
    pub fn issue(&self, session: &SessionId) -> SubmissionTicket {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = next_sequence();
        latest.insert(session.clone(), sequence);
        SubmissionTicket {
            session: session.clone(),
            sequence,
        }
    }

    /// Issue a ticket whose slot is released when the guard drops, so abandoned or failed
    /// submissions do not leave an entry behind.
    pub fn begin(&self, session: &SessionId) -> PendingSubmission<'_> {
        PendingSubmission {
            tracker: self,
            ticket: self.issue(session),
        }
    }

    pub fn is_current(&self, ticket: &SubmissionTicket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.get(&ticket.session) == Some(&ticket.sequence)
    }

    /// Run `commit` only if `ticket` is still the newest for its session.
    ///
    /// The check and the commit happen under one lock, so a newer submission cannot be
    /// issued between them.
    pub fn complete_if_current<T>(
        &self,
        ticket: &SubmissionTicket,
        commit: impl FnOnce() -> T,
    ) -> Option<T> {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.get(&ticket.session) == Some(&ticket.sequence) {
            latest.remove(&ticket.session);
            Some(commit())
        } else {
            None
        }
    }

    /// Forget `ticket` unless a newer submission already replaced it.
    pub fn release(&self, ticket: &SubmissionTicket) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.get(&ticket.session) == Some(&ticket.sequence) {
            latest.remove(&ticket.session);
        }
    }

    pub fn tracked_sessions(&self) -> usize {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// In-flight submission; releases its tracker slot on drop.
#[derive(Debug)]
pub struct PendingSubmission<'a> {
    tracker: &'a SubmissionTracker,
    ticket: SubmissionTicket,
}

impl PendingSubmission<'_> {
    pub fn ticket(&self) -> &SubmissionTicket {
        &self.ticket
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        self.tracker.release(&self.ticket);
    }
}
