use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Severity of a buffered record as assigned by the host logging framework.
///
/// The discriminants are the host framework's bit values. Anything outside the
/// known set is preserved in `Other` so it can still be forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Error,
    Warning,
    Info,
    Trace,
    ProfileBegin,
    ProfileEnd,
    Other(u32),
}

impl Level {
    pub const ERROR: u32 = 0x01;
    pub const WARNING: u32 = 0x02;
    pub const INFO: u32 = 0x04;
    pub const TRACE: u32 = 0x08;
    pub const PROFILE: u32 = 0x40;
    pub const PROFILE_BEGIN: u32 = 0x50;
    pub const PROFILE_END: u32 = 0x60;

    pub fn from_bits(bits: u32) -> Self {
        match bits {
            Self::ERROR => Level::Error,
            Self::WARNING => Level::Warning,
            Self::INFO => Level::Info,
            Self::TRACE => Level::Trace,
            Self::PROFILE_BEGIN => Level::ProfileBegin,
            Self::PROFILE_END => Level::ProfileEnd,
            other => Level::Other(other),
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            Level::Error => Self::ERROR,
            Level::Warning => Self::WARNING,
            Level::Info => Self::INFO,
            Level::Trace => Self::TRACE,
            Level::ProfileBegin => Self::PROFILE_BEGIN,
            Level::ProfileEnd => Self::PROFILE_END,
            Level::Other(bits) => *bits,
        }
    }

    /// Case-insensitive lookup by the host framework's level name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "error" => Some(Level::Error),
            "warning" => Some(Level::Warning),
            "info" => Some(Level::Info),
            "trace" => Some(Level::Trace),
            "profile_begin" | "profile-begin" => Some(Level::ProfileBegin),
            "profile_end" | "profile-end" => Some(Level::ProfileEnd),
            _ => None,
        }
    }
}

impl From<u32> for Level {
    fn from(bits: u32) -> Self {
        Level::from_bits(bits)
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LevelVisitor;

        impl Visitor<'_> for LevelVisitor {
            type Value = Level;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a level name or the host framework's numeric level")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Level, E> {
                u32::try_from(value)
                    .map(Level::from_bits)
                    .map_err(|_| E::custom(format!("level out of range: {value}")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Level, E> {
                u32::try_from(value)
                    .map(Level::from_bits)
                    .map_err(|_| E::custom(format!("level out of range: {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Level, E> {
                Level::from_name(value)
                    .ok_or_else(|| E::custom(format!("unknown level name: {value}")))
            }
        }

        deserializer.deserialize_any(LevelVisitor)
    }
}

/// Level vocabulary of the error-tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Error => "error",
            EventLevel::Warning => "warning",
            EventLevel::Info => "info",
            EventLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed translation from host levels to service levels. Unknown levels are
/// reported as errors.
pub fn map_level(level: Level) -> EventLevel {
    match level {
        Level::Error => EventLevel::Error,
        Level::Warning => EventLevel::Warning,
        Level::Info => EventLevel::Info,
        Level::Trace | Level::ProfileBegin | Level::ProfileEnd => EventLevel::Debug,
        Level::Other(_) => EventLevel::Error,
    }
}
