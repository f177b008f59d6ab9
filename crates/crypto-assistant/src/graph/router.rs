//! Turn Router
//!
//! The single routing table of the turn graph. Looks only at the last message.

use agent_core::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::svckit::ToolKind;

/// Graph node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Dialogue,
    Prices,
    Insights,
    /// Pass-through seam ahead of execution, reserved for user confirmation
    WatchlistAnnounce,
    WatchlistExecute,
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dialogue => write!(f, "dialogue"),
            Self::Prices => write!(f, "prices"),
            Self::Insights => write!(f, "insights"),
            Self::WatchlistAnnounce => write!(f, "watchlist_announce"),
            Self::WatchlistExecute => write!(f, "watchlist_execute"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Goto(Node),
    End,
}

/// Next step after the dialogue node
///
/// | last message | next |
/// |---|---|
/// | assistant, first call is price/prices/trends/history | `Prices` |
/// | assistant, first call is insights | `Insights` |
/// | assistant, first call is a watchlist action | `WatchlistAnnounce` |
/// | assistant, any other call | `Dialogue` |
/// | assistant, no call | end |
/// | tool result or user message | `Dialogue` |
/// | system message, or no messages | end |
pub fn route(messages: &[Message]) -> Route {
    let Some(last) = messages.last() else {
        return Route::End;
    };

    match last.role {
        Role::Assistant => last
            .first_tool_call()
            .map_or(Route::End, |call| Route::Goto(node_for(&call.name))),
        Role::Tool | Role::User => Route::Goto(Node::Dialogue),
        Role::System => Route::End,
    }
}

fn node_for(tool_name: &str) -> Node {
    match ToolKind::from_name(tool_name) {
        Some(ToolKind::Price | ToolKind::Prices | ToolKind::Trends | ToolKind::History) => {
            Node::Prices
        }
        Some(ToolKind::Insights) => Node::Insights,
        Some(kind) if kind.is_watchlist_action() => Node::WatchlistAnnounce,
        _ => Node::Dialogue,
    }
}
