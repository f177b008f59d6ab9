//! Watchlist actions: add, delete, update
//!
//! Mutate the session's watchlist and report a count. Unknown ids are not
//! errors; they just lower the count.

use agent_core::ToolResult;

use super::tools::CryptoTool;
use crate::state::SessionState;

pub(super) fn execute(state: &mut SessionState, tool: CryptoTool) -> ToolResult {
    let name = tool.kind().name();

    let output = match tool {
        CryptoTool::AddCryptos { cryptos } => {
            let added = state.add_coins(cryptos);
            format!("Added {added} cryptocurrencies!")
        }
        CryptoTool::DeleteCryptos { crypto_ids } => {
            let deleted = state.delete_coins(&crypto_ids);
            format!("Deleted {deleted} cryptocurrencies!")
        }
        CryptoTool::UpdateCryptos { cryptos } => {
            let updated = state.update_coins(&cryptos);
            format!("Updated {updated} cryptocurrencies!")
        }
        _ => return ToolResult::failure(name, format!("Error: '{name}' is not a watchlist action")),
    };

    tracing::info!(tool = name, watchlist_len = state.watchlist.len(), "{}", output);
    ToolResult::success(name, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::model::{Coin, CoinPatch};

    fn state_with(ids: &[&str]) -> SessionState {
        let mut state = SessionState::new();
        state.add_coins(ids.iter().map(|id| Coin::new(*id, *id, *id)).collect());
        state
    }

    #[test]
    fn test_add_reports_count() {
        let mut state = state_with(&["bitcoin"]);
        let result = execute(
            &mut state,
            CryptoTool::AddCryptos {
                cryptos: vec![Coin::new("solana", "Solana", "sol"), Coin::new("bitcoin", "Bitcoin", "btc")],
            },
        );
        assert_eq!(result.output, "Added 2 cryptocurrencies!");
        assert_eq!(state.watchlist.ids(), vec!["bitcoin", "solana", "bitcoin"]);
    }

    #[test]
    fn test_delete_counts_by_membership() {
        let mut state = state_with(&["bitcoin", "ether", "solana"]);
        state.select("bitcoin");

        let result = execute(
            &mut state,
            CryptoTool::DeleteCryptos {
                crypto_ids: vec!["bitcoin".into(), "ether".into(), "dogecoin".into()],
            },
        );
        assert_eq!(result.output, "Deleted 2 cryptocurrencies!");
        assert_eq!(state.watchlist.ids(), vec!["solana"]);
        assert!(state.selected_coin_id.is_none());
    }

    #[test]
    fn test_update_skips_unknown_ids() {
        let mut state = state_with(&["bitcoin"]);
        let result = execute(
            &mut state,
            CryptoTool::UpdateCryptos {
                cryptos: vec![
                    CoinPatch {
                        id: "bitcoin".into(),
                        current_price: Some(dec!(67000.5)),
                        ..Default::default()
                    },
                    CoinPatch {
                        id: "cardano".into(),
                        ..Default::default()
                    },
                ],
            },
        );
        assert_eq!(result.output, "Updated 1 cryptocurrencies!");
        assert_eq!(state.watchlist.get("bitcoin").unwrap().current_price, Some(dec!(67000.5)));
    }
}
