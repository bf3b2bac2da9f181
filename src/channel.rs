use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// One controllable output of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    Light,
    Fan,
    Alarm,
}

impl ChannelId {
    pub const ALL: [ChannelId; 3] = [ChannelId::Light, ChannelId::Fan, ChannelId::Alarm];

    /// Position of this channel in [`ChannelId::ALL`].
    pub const fn index(&self) -> usize {
        match self {
            Self::Light => 0,
            Self::Fan => 1,
            Self::Alarm => 2,
        }
    }

    /// Topic segment for this channel ("light", "fan", "alarm").
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Fan => "fan",
            Self::Alarm => "alarm",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Power {
    #[default]
    Off,
    On,
}

impl Power {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating mode of a channel. Stored and reported, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Manual,
    Auto,
}

impl Mode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognized command payload: {0:?}")]
    UnknownPayload(String),
}

/// A decoded payload from a channel's command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetPower(Power),
    SetMode(Mode),
}

impl FromStr for Command {
    type Err = ParseError;

    /// Accepts ON/OFF and MANUAL/AUTO, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::SetPower(Power::On)),
            "OFF" => Ok(Self::SetPower(Power::Off)),
            "MANUAL" => Ok(Self::SetMode(Mode::Manual)),
            "AUTO" => Ok(Self::SetMode(Mode::Auto)),
            _ => Err(ParseError::UnknownPayload(s.to_string())),
        }
    }
}

/// Live state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelState {
    pub power: Power,
    pub mode: Mode,
}
