//! Connected players, their spawn indices and name lookups.

use std::collections::{BTreeMap, BTreeSet};

use capyvent_core::{CellCoord, PlayerName, SessionId};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) session: SessionId,
    pub(crate) index: u32,
    pub(crate) name: PlayerName,
    pub(crate) cell: CellCoord,
}

/// Players keyed by session, with dense reusable spawn indices.
#[derive(Debug, Default)]
pub(crate) struct PlayerRoster {
    players: BTreeMap<SessionId, Player>,
    sessions_by_name: BTreeMap<PlayerName, SessionId>,
    used_indices: BTreeSet<u32>,
}

impl PlayerRoster {
    /// Lowest spawn index not held by a connected player.
    pub(crate) fn next_free_index(&self) -> u32 {
        let mut index = 0;
        while self.used_indices.contains(&index) {
            index += 1;
        }
        index
    }

    pub(crate) fn contains(&self, session: &SessionId) -> bool {
        self.players.contains_key(session)
    }

    pub(crate) fn index_in_use(&self, index: u32) -> bool {
        self.used_indices.contains(&index)
    }

    /// Stores a player. Callers guarantee the session and index are unused.
    pub(crate) fn insert(&mut self, player: Player) {
        let _ = self.used_indices.insert(player.index);
        let _ = self
            .sessions_by_name
            .insert(player.name.clone(), player.session.clone());
        let _ = self.players.insert(player.session.clone(), player);
    }

    pub(crate) fn remove(&mut self, session: &SessionId) -> Option<Player> {
        let player = self.players.remove(session)?;
        let _ = self.used_indices.remove(&player.index);
        if self.sessions_by_name.get(&player.name) == Some(session) {
            let _ = self.sessions_by_name.remove(&player.name);
        }
        Some(player)
    }

    pub(crate) fn get(&self, session: &SessionId) -> Option<&Player> {
        self.players.get(session)
    }

    pub(crate) fn relocate(&mut self, session: &SessionId, cell: CellCoord) {
        if let Some(player) = self.players.get_mut(session) {
            player.cell = cell;
        }
    }

    pub(crate) fn occupies(&self, cell: CellCoord) -> bool {
        self.players.values().any(|player| player.cell == cell)
    }

    pub(crate) fn session_for_name(&self, raw: &str) -> Option<&SessionId> {
        self.sessions_by_name
            .get(&PlayerName::normalized(Some(raw)))
    }

    /// Players ordered by spawn index.
    pub(crate) fn by_index(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|player| player.index);
        players
    }

    pub(crate) fn len(&self) -> usize {
        self.players.len()
    }

    pub(crate) fn clear(&mut self) {
        self.players.clear();
        self.sessions_by_name.clear();
        self.used_indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(session: &str, index: u32, name: &str) -> Player {
        Player {
            session: SessionId::new(session),
            index,
            name: PlayerName::normalized(Some(name)),
            cell: CellCoord::new(0, 0),
        }
    }

    #[test]
    fn indices_are_reused_lowest_first() {
        let mut roster = PlayerRoster::default();
        roster.insert(player("a", roster.next_free_index(), "a"));
        roster.insert(player("b", roster.next_free_index(), "b"));
        roster.insert(player("c", roster.next_free_index(), "c"));
        assert_eq!(roster.next_free_index(), 3);

        let _ = roster.remove(&SessionId::new("a"));
        assert_eq!(roster.next_free_index(), 0);
    }

    #[test]
    fn name_lookup_ignores_case_and_whitespace() {
        let mut roster = PlayerRoster::default();
        roster.insert(player("s1", 0, "Alice"));
        assert_eq!(
            roster.session_for_name(" alice "),
            Some(&SessionId::new("s1"))
        );

        let _ = roster.remove(&SessionId::new("s1"));
        assert_eq!(roster.session_for_name("ALICE"), None);
    }

    #[test]
    fn removing_a_shadowed_name_keeps_the_newer_mapping() {
        let mut roster = PlayerRoster::default();
        roster.insert(player("old", 0, "bob"));
        roster.insert(player("new", 1, "bob"));

        let _ = roster.remove(&SessionId::new("old"));
        assert_eq!(roster.session_for_name("bob"), Some(&SessionId::new("new")));
    }
}
