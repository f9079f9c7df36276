//! Negotiated permessage-deflate parameters.
//!
//! [`Parameters`] is the immutable configuration of one simulated connection.
//! It can only be built through validation, so every value that reaches the
//! compression session is already known to be in range.
//!
//! # Token Syntax
//! Parameters arrive as `key=value` tokens. Flags are true only for the literal
//! `true`; levels take the leading integer of the value and fall back to 0.
//! Unknown keys and tokens without `=` are skipped.

use serde::Serialize;
use tracing::debug;

use crate::config::{
    DEFAULT_CONTEXT_TAKEOVER, DEFAULT_MEMORY_LEVEL, DEFAULT_SENDING, DEFAULT_SERVER, DEFAULT_SPEED_LEVEL, DEFAULT_WINDOW_BITS, MEMORY_LEVEL_RANGE, SPEED_LEVEL_RANGE,
    WINDOW_BITS_RANGE,
};
use crate::error::ParameterError;
use crate::types::{Direction, Role};

/// Validated configuration of one simulated connection.
///
/// # Fields
/// - `role`: server or client, decides frame masking
/// - `direction`: sending or receiving, decides which memory figures apply
/// - `context_takeover`: keep the sliding window between messages
/// - `speed_level`: zlib compression level
/// - `window_bits`: base 2 logarithm of the LZ77 window
/// - `memory_level`: zlib memory level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Parameters {
    role: Role,
    direction: Direction,
    context_takeover: bool,
    speed_level: i32,
    window_bits: i32,
    memory_level: i32,
}

impl Parameters {
    /// Builds a configuration, rejecting any level outside its documented range.
    ///
    /// # Errors
    /// Returns the first [`ParameterError`] found, checking speed level, then window
    /// bits, then memory level.
    pub fn new(role: Role, direction: Direction, context_takeover: bool, speed_level: i32, window_bits: i32, memory_level: i32) -> Result<Self, ParameterError> {
        if !SPEED_LEVEL_RANGE.contains(&speed_level) {
            return Err(ParameterError::SpeedLevel(speed_level));
        }
        if !WINDOW_BITS_RANGE.contains(&window_bits) {
            return Err(ParameterError::WindowBits(window_bits));
        }
        if !MEMORY_LEVEL_RANGE.contains(&memory_level) {
            return Err(ParameterError::MemoryLevel(memory_level));
        }

        Ok(Self { role, direction, context_takeover, speed_level, window_bits, memory_level })
    }

    /// Applies `key=value` tokens on top of the defaults and validates the result.
    ///
    /// # Errors
    /// Returns a [`ParameterError`] when a level ends up out of range.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut draft = Draft::default();
        for token in tokens {
            draft.apply(token.as_ref());
        }

        draft.build()
    }

    /// Returns a copy with another window, memory level and takeover setting.
    ///
    /// # Errors
    /// Returns a [`ParameterError`] when the new levels are out of range.
    pub fn with_grid_point(&self, context_takeover: bool, window_bits: i32, memory_level: i32) -> Result<Self, ParameterError> {
        Self::new(self.role, self.direction, context_takeover, self.speed_level, window_bits, memory_level)
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn context_takeover(&self) -> bool {
        self.context_takeover
    }

    #[inline]
    pub fn speed_level(&self) -> i32 {
        self.speed_level
    }

    #[inline]
    pub fn window_bits(&self) -> i32 {
        self.window_bits
    }

    #[inline]
    pub fn memory_level(&self) -> i32 {
        self.memory_level
    }

    /// Whether outgoing frames carry a masking key.
    ///
    /// Only a client that is sending masks; servers and receivers never do.
    #[inline]
    pub fn masks_frames(&self) -> bool {
        self.direction == Direction::Sending && self.role == Role::Client
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            role: Role::from_server_flag(DEFAULT_SERVER),
            direction: Direction::from_sending_flag(DEFAULT_SENDING),
            context_takeover: DEFAULT_CONTEXT_TAKEOVER,
            speed_level: DEFAULT_SPEED_LEVEL,
            window_bits: DEFAULT_WINDOW_BITS,
            memory_level: DEFAULT_MEMORY_LEVEL,
        }
    }
}

/// Unvalidated parameters collected while reading tokens.
struct Draft {
    server: bool,
    sending: bool,
    context_takeover: bool,
    speed_level: i32,
    window_bits: i32,
    memory_level: i32,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER,
            sending: DEFAULT_SENDING,
            context_takeover: DEFAULT_CONTEXT_TAKEOVER,
            speed_level: DEFAULT_SPEED_LEVEL,
            window_bits: DEFAULT_WINDOW_BITS,
            memory_level: DEFAULT_MEMORY_LEVEL,
        }
    }
}

impl Draft {
    fn apply(&mut self, token: &str) {
        let Some((key, value)) = token.split_once('=') else {
            debug!(token, "ignoring token without '='");
            return;
        };

        match key {
            "server" => self.server = parse_flag(value),
            "sending" => self.sending = parse_flag(value),
            "context_takeover" => self.context_takeover = parse_flag(value),
            "speed_level" => self.speed_level = parse_level(value),
            "window_bits" => self.window_bits = parse_level(value),
            "memory_level" => self.memory_level = parse_level(value),
            _ => debug!(key, "ignoring unknown parameter"),
        }
    }

    fn build(self) -> Result<Parameters, ParameterError> {
        Parameters::new(
            Role::from_server_flag(self.server),
            Direction::from_sending_flag(self.sending),
            self.context_takeover,
            self.speed_level,
            self.window_bits,
            self.memory_level,
        )
    }
}

#[inline]
fn parse_flag(value: &str) -> bool {
    value == "true"
}

/// Reads the leading integer of `value`, like C's `atoi`.
fn parse_level(value: &str) -> i32 {
    let trimmed = value.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    let digits_len = trimmed[sign_len..].bytes().take_while(u8::is_ascii_digit).count();

    trimmed[..sign_len + digits_len].parse().unwrap_or(0)
}
