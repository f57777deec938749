//! State owned by the presenter for the query currently on screen.

use crate::aggregator::AggregatedResult;
use crate::moves::{MoveListState, MovePage};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryTicket(u64);

/// Hands out tickets; only the newest one is current. A finished query whose
/// ticket is no longer current is stale and its result is dropped.
#[derive(Debug, Default)]
pub struct QueryTracker {
    latest: AtomicU64,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> QueryTicket {
        QueryTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

pub struct Session {
    tracker: QueryTracker,
    current: Option<AggregatedResult>,
    moves: MoveListState,
    move_page_size: usize,
}

impl Session {
    pub fn new(move_page_size: usize) -> Self {
        Self {
            tracker: QueryTracker::new(),
            current: None,
            moves: MoveListState::new(move_page_size),
            move_page_size,
        }
    }

    pub fn begin_query(&self) -> QueryTicket {
        self.tracker.begin()
    }

    /// Installs `result` if `ticket` is still the newest query. Returns
    /// whether it was accepted. A new result starts with fresh move filters.
    pub fn complete(&mut self, ticket: QueryTicket, result: AggregatedResult) -> bool {
        if !self.tracker.is_current(ticket) {
            tracing::debug!(
                "Discarding stale result for {} ({:?})",
                result.pokemon.name,
                ticket
            );
            return false;
        }
        self.current = Some(result);
        self.moves = MoveListState::new(self.move_page_size);
        true
    }

    /// Whether a failure for `ticket` should still be shown.
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.tracker.is_current(ticket)
    }

    pub fn current(&self) -> Option<&AggregatedResult> {
        self.current.as_ref()
    }

    pub fn moves_mut(&mut self) -> &mut MoveListState {
        &mut self.moves
    }

    pub fn move_page(&mut self) -> Option<MovePage<'_>> {
        let result = self.current.as_ref()?;
        Some(self.moves.view(&result.moves))
    }

    /// The shown result together with its move-list state.
    pub fn current_mut(&mut self) -> Option<(&AggregatedResult, &mut MoveListState)> {
        let result = self.current.as_ref()?;
        Some((result, &mut self.moves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let tracker = QueryTracker::new();
        let first = tracker.begin();
        assert!(tracker.is_current(first));

        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn test_empty_session_has_no_moves() {
        let mut session = Session::new(10);
        assert!(session.current().is_none());
        assert!(session.move_page().is_none());
    }
}
