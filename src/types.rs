//! Common type definitions for pmce-stats.
//!
//! Provides the small enums that describe the simulated endpoint and how
//! its memory figures should be read.
//!
//! # Overview
//!
//! - [`Role`]: Distinguishes a server endpoint from a client endpoint
//! - [`Direction`]: Whether the endpoint compresses (sends) or decompresses (receives)
//! - [`MemoryScope`]: Whether a memory figure is held per connection or only transiently

use serde::Serialize;
use strum::Display;

/// Which side of the WebSocket connection is simulated.
///
/// Only clients mask the frames they send, so the role feeds the frame overhead model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Accepts connections; never masks outgoing frames.
    Server,

    /// Opens connections; masks every outgoing frame.
    Client,
}

impl Role {
    /// Maps the `server=` flag onto a role.
    #[inline]
    pub fn from_server_flag(server: bool) -> Self {
        if server { Self::Server } else { Self::Client }
    }
}

/// Direction of the simulated traffic.
///
/// Sending endpoints hold a deflate state; receiving endpoints hold an inflate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The endpoint compresses outgoing messages.
    Sending,

    /// The endpoint decompresses incoming messages.
    Receiving,
}

impl Direction {
    /// Maps the `sending=` flag onto a direction.
    #[inline]
    pub fn from_sending_flag(sending: bool) -> Self {
        if sending { Self::Sending } else { Self::Receiving }
    }

    /// Returns the name of the zlib state this direction keeps.
    #[inline]
    pub fn state_label(self) -> &'static str {
        match self {
            Self::Sending => "compression",
            Self::Receiving => "decompression",
        }
    }
}

/// How long a memory figure stays allocated.
///
/// With context takeover the state lives as long as the connection; without it the same
/// amount is only needed while a message is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    #[strum(serialize = "per connection")]
    PerConnection,

    #[strum(serialize = "total")]
    Total,
}

impl MemoryScope {
    /// Picks the scope implied by the context takeover setting.
    #[inline]
    pub fn from_context_takeover(context_takeover: bool) -> Self {
        if context_takeover { Self::PerConnection } else { Self::Total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Role::Server.to_string(), "server");
        assert_eq!(Role::Client.to_string(), "client");
        assert_eq!(Direction::Sending.to_string(), "sending");
        assert_eq!(Direction::Receiving.to_string(), "receiving");
        assert_eq!(MemoryScope::PerConnection.to_string(), "per connection");
        assert_eq!(MemoryScope::Total.to_string(), "total");
    }

    #[test]
    fn test_flag_mapping() {
        assert_eq!(Role::from_server_flag(false), Role::Client);
        assert_eq!(Direction::from_sending_flag(false), Direction::Receiving);
        assert_eq!(MemoryScope::from_context_takeover(true), MemoryScope::PerConnection);
        assert_eq!(MemoryScope::from_context_takeover(false), MemoryScope::Total);
    }
}
