//! # crypto-assistant
//!
//! Conversational cryptocurrency assistant: live prices, trending coins,
//! market insights, price history, coin search, and a per-session watchlist.
//!
//! ## Turn flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  "what's the price of bitcoin?"                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Dialogue  → model requests get_price(coin_id="bitcoin")    │
//! │  Prices    → {"coin_id": "bitcoin", "price": 67000.5}       │
//! │  Dialogue  → "Bitcoin is trading at $67,000.50."            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Market-data failures never abort a turn: they come back to the model as
//! error-shaped tool results.

pub mod error;
pub mod graph;
pub mod market;
pub mod model;
pub mod state;
pub mod svckit;
pub mod watchlist;

pub use error::{AssistantError, Result};
pub use graph::{GraphConfig, Node, TurnGraph, TurnOutcome, TurnSnapshot};
pub use market::{
    CoinGeckoClient, CoinGeckoConfig, CoinProfile, MarketChart, MarketData, MarketDataClient,
    MockMarketClient,
};
pub use model::{Coin, CoinPatch, Lookup};
pub use state::SessionState;
pub use watchlist::Watchlist;

/// System instruction for the dialogue node
pub const ASSISTANT_PROMPT: &str = r"You are a cryptocurrency assistant that provides the latest prices, market trends, insights, and history for coins, and manages the user's watchlist.

## Answering Questions

- If the user asks for the price of a coin, use `get_price` (or `get_prices` for several coins).
- If the user asks for trends, use `get_trends` and list the top trending coins.
- If the user asks for insights, use `get_insights` and report market cap and volume.
- If the user asks for historical data, use `get_history`; dates are DD-MM-YYYY and default to yesterday.
- If you do not know a coin's id, use `search_cryptos` first.

## Watchlist

- `add_cryptos`, `delete_cryptos` and `update_cryptos` change the user's watchlist.
- Coins are identified by their CoinGecko id (e.g. 'bitcoin', 'ethereum').

Prices are in USD. If a tool returns an error, tell the user plainly instead of guessing a number.";
