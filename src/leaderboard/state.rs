//! Leaderboard State
//!
//! The two view collections: the sorted leaderboard rebuilt from full loads,
//! and the recent list fed by push events.

use std::collections::VecDeque;

use crate::hero::HeroEntry;

/// Sequence number handed out when a load starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Sort heroes by descending humility score. Equal scores keep server order.
pub fn sort_by_score(heroes: &mut [HeroEntry]) {
    heroes.sort_by(|a, b| b.humility_score.total_cmp(&a.humility_score));
}

/// Leaderboard state for one view session
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    sorted: Vec<HeroEntry>,
    recent: VecDeque<HeroEntry>,
    next_ticket: u64,
    applied: Option<LoadTicket>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heroes ordered by descending score
    pub fn sorted(&self) -> &[HeroEntry] {
        &self.sorted
    }

    /// Heroes announced over the push channel, newest first
    pub fn recent(&self) -> impl Iterator<Item = &HeroEntry> + '_ {
        self.recent.iter()
    }

    pub fn recent_len(&self) -> usize {
        self.recent.len()
    }

    /// Whether any load has been applied yet
    pub fn is_loaded(&self) -> bool {
        self.applied.is_some()
    }

    /// Reserve a ticket for a load that is about to be issued
    pub fn begin_load(&mut self) -> LoadTicket {
        self.next_ticket += 1;
        LoadTicket(self.next_ticket)
    }

    /// Apply a finished load. Results from a load older than the one already
    /// shown are dropped. Returns whether the list was replaced.
    pub fn finish_load(&mut self, ticket: LoadTicket, mut heroes: Vec<HeroEntry>) -> bool {
        if matches!(self.applied, Some(applied) if applied > ticket) {
            tracing::debug!(
                ticket = ticket.sequence(),
                "Dropping load result older than the current leaderboard"
            );
            return false;
        }
        sort_by_score(&mut heroes);
        self.sorted = heroes;
        self.applied = Some(ticket);
        true
    }

    /// Prepend a pushed hero. No deduplication against either list.
    pub fn push_recent(&mut self, hero: HeroEntry) {
        self.recent.push_front(hero);
    }

    /// Snapshot of the recent list
    pub fn recent_vec(&self) -> Vec<HeroEntry> {
        self.recent.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(name: &str, score: f64) -> HeroEntry {
        HeroEntry::new(name, "power", score)
    }

    fn scores(heroes: &[HeroEntry]) -> Vec<f64> {
        heroes.iter().map(|h| h.humility_score).collect()
    }

    #[test]
    fn test_load_sorts_descending() {
        let mut board = Leaderboard::new();
        let ticket = board.begin_load();
        assert!(board.finish_load(ticket, vec![hero("a", 5.0), hero("b", 9.0), hero("c", 2.0)]));
        assert_eq!(scores(board.sorted()), vec![9.0, 5.0, 2.0]);
        assert!(board.is_loaded());
    }

    #[test]
    fn test_ties_keep_server_order() {
        let mut board = Leaderboard::new();
        let ticket = board.begin_load();
        board.finish_load(ticket, vec![hero("first", 7.0), hero("top", 8.0), hero("second", 7.0)]);
        let names: Vec<_> = board.sorted().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let mut board = Leaderboard::new();
        let initial = board.begin_load();
        let refresh = board.begin_load();

        assert!(board.finish_load(refresh, vec![hero("new", 4.0), hero("old", 3.0)]));
        assert!(!board.finish_load(initial, vec![hero("old", 3.0)]));
        assert_eq!(board.sorted().len(), 2);
    }

    #[test]
    fn test_push_prepends_independently() {
        let mut board = Leaderboard::new();
        board.push_recent(hero("one", 3.0));
        board.push_recent(hero("two", 6.0));
        board.push_recent(hero("one", 3.0));

        let names: Vec<_> = board.recent().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "one"]);
        assert!(board.sorted().is_empty());
        assert!(!board.is_loaded());
    }
}
