//! Watchlist Store
//!
//! Ordered, session-scoped collection of tracked coins keyed by id.

use serde::{Deserialize, Serialize};

use crate::model::{Coin, CoinPatch};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    coins: Vec<Coin>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append coins in order. Ids are not deduplicated against existing entries.
    pub fn add(&mut self, coins: impl IntoIterator<Item = Coin>) -> usize {
        let before = self.coins.len();
        self.coins.extend(coins);
        self.coins.len() - before
    }

    /// Remove every entry whose id is listed; returns how many entries went away
    pub fn remove(&mut self, ids: &[String]) -> usize {
        let before = self.coins.len();
        self.coins.retain(|c| !ids.contains(&c.id));
        before - self.coins.len()
    }

    /// Merge each patch into the first entry with the same id; unknown ids are skipped
    pub fn update(&mut self, patches: &[CoinPatch]) -> usize {
        let mut updated = 0;
        for patch in patches {
            if let Some(coin) = self.coins.iter_mut().find(|c| c.id == patch.id) {
                coin.merge(patch);
                updated += 1;
            }
        }
        updated
    }

    pub fn get(&self, id: &str) -> Option<&Coin> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.coins.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

impl FromIterator<Coin> for Watchlist {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        Self {
            coins: iter.into_iter().collect(),
        }
    }
}
