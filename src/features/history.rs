//! Team history indexing
//!
//! Splits the match log into one chronological subsequence per team.

use crate::data::MatchStore;
use crate::{MatchId, Role};
use std::collections::BTreeMap;

/// One appearance of a team in the match log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub match_id: MatchId,
    pub role: Role,
    /// Position of the match in the store
    pub position: usize,
}

/// Matches a team played, in ascending id order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMatchHistory {
    pub team: String,
    pub entries: Vec<HistoryEntry>,
}

impl TeamMatchHistory {
    pub fn new(team: impl Into<String>) -> Self {
        TeamMatchHistory {
            team: team.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the history of every team in the store.
///
/// Teams are keyed by identifier; an empty store gives an empty map.
pub fn index(store: &MatchStore) -> BTreeMap<String, TeamMatchHistory> {
    let mut histories: BTreeMap<String, TeamMatchHistory> = BTreeMap::new();

    for (position, record) in store.records().iter().enumerate() {
        for role in Role::ALL {
            let team = record.team(role);
            histories
                .entry(team.to_string())
                .or_insert_with(|| TeamMatchHistory::new(team))
                .entries
                .push(HistoryEntry {
                    match_id: record.id,
                    role,
                    position,
                });
        }
    }

    log::debug!(
        "Indexed {} teams over {} matches",
        histories.len(),
        store.len()
    );
    histories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::fixtures::make_match;

    fn sample_store() -> MatchStore {
        MatchStore::new(vec![
            make_match(10, "Arsenal", "Chelsea", 1, 0),
            make_match(11, "Everton", "Fulham", 2, 2),
            make_match(12, "Chelsea", "Everton", 0, 3),
            make_match(13, "Fulham", "Arsenal", 1, 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_index_covers_both_roles() {
        let histories = index(&sample_store());
        assert_eq!(histories.len(), 4);

        let chelsea = &histories["Chelsea"];
        assert_eq!(chelsea.len(), 2);
        assert_eq!(chelsea.entries[0].match_id, MatchId(10));
        assert_eq!(chelsea.entries[0].role, Role::Away);
        assert_eq!(chelsea.entries[1].match_id, MatchId(12));
        assert_eq!(chelsea.entries[1].role, Role::Home);
    }

    #[test]
    fn test_index_preserves_chronology() {
        let store = sample_store();
        for history in index(&store).values() {
            assert!(history
                .entries
                .windows(2)
                .all(|w| w[0].match_id < w[1].match_id));
            for entry in &history.entries {
                let record = &store.records()[entry.position];
                assert_eq!(record.id, entry.match_id);
                assert_eq!(record.team(entry.role), history.team);
            }
        }
    }

    #[test]
    fn test_each_match_appears_once_per_team() {
        let store = sample_store();
        let histories = index(&store);
        let total: usize = histories.values().map(|h| h.len()).sum();
        assert_eq!(total, store.len() * 2);
    }

    #[test]
    fn test_empty_store() {
        assert!(index(&MatchStore::default()).is_empty());
    }
}
