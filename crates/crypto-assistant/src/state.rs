//! Session State
//!
//! Everything one conversation owns. Handlers receive it by `&mut` from the
//! turn graph; nothing is shared between sessions.

use agent_core::message::Conversation;
use serde::{Deserialize, Serialize};

use crate::model::{Coin, CoinPatch, SearchProgress};
use crate::watchlist::Watchlist;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub messages: Conversation,

    pub watchlist: Watchlist,

    /// Most recently referenced coin; never points at a deleted coin
    pub selected_coin_id: Option<String>,

    /// Scratch entries of an in-flight search, empty between steps
    #[serde(default)]
    pub search_progress: Vec<SearchProgress>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coins(&mut self, coins: Vec<Coin>) -> usize {
        self.watchlist.add(coins)
    }

    /// Remove coins by id, clearing the selection if it was among them
    pub fn delete_coins(&mut self, ids: &[String]) -> usize {
        if self
            .selected_coin_id
            .as_ref()
            .is_some_and(|selected| ids.contains(selected))
        {
            self.selected_coin_id = None;
        }
        self.watchlist.remove(ids)
    }

    pub fn update_coins(&mut self, patches: &[CoinPatch]) -> usize {
        self.watchlist.update(patches)
    }

    pub fn select(&mut self, coin_id: impl Into<String>) {
        self.selected_coin_id = Some(coin_id.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(ids: &[&str], selected: Option<&str>) -> SessionState {
        let mut state = SessionState::new();
        state.add_coins(ids.iter().map(|id| Coin::new(*id, *id, *id)).collect());
        state.selected_coin_id = selected.map(str::to_string);
        state
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut state = state_with(&["bitcoin", "ether", "solana"], Some("bitcoin"));
        assert_eq!(state.delete_coins(&["bitcoin".into()]), 1);
        assert!(state.selected_coin_id.is_none());
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let mut state = state_with(&["bitcoin", "ether", "solana"], Some("bitcoin"));
        assert_eq!(state.delete_coins(&["solana".into()]), 1);
        assert_eq!(state.selected_coin_id.as_deref(), Some("bitcoin"));
    }

    #[test]
    fn test_delete_selected_not_on_watchlist_still_clears() {
        let mut state = state_with(&["solana"], Some("bitcoin"));
        assert_eq!(state.delete_coins(&["bitcoin".into()]), 0);
        assert!(state.selected_coin_id.is_none());
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let state = state_with(&["bitcoin"], Some("bitcoin"));
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
