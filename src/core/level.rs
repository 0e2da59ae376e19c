//! Level definitions
//!
//! Two disjoint level kinds exist: [`Level`] is used by the system logger
//! call surface, [`PlatformLevel`] by the platform bridge. Both share the
//! same severity scale so they can be mapped onto each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    All,
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Off,
}

impl Level {
    pub const fn severity(&self) -> i32 {
        match self {
            Level::All => i32::MIN,
            Level::Trace => 400,
            Level::Debug => 500,
            Level::Info => 800,
            Level::Warning => 900,
            Level::Error => 1000,
            Level::Off => i32::MAX,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::All => "ALL",
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    /// Returns true if a message at `self` passes a `threshold`
    #[inline]
    pub fn passes(&self, threshold: Level) -> bool {
        *self != Level::Off && self.severity() >= threshold.severity()
    }

    pub fn to_platform(&self) -> PlatformLevel {
        match self {
            Level::All => PlatformLevel::All,
            Level::Trace => PlatformLevel::Finer,
            Level::Debug => PlatformLevel::Fine,
            Level::Info => PlatformLevel::Info,
            Level::Warning => PlatformLevel::Warning,
            Level::Error => PlatformLevel::Severe,
            Level::Off => PlatformLevel::Off,
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::All | Level::Trace => BrightBlack,
            Level::Debug => Blue,
            Level::Info => Green,
            Level::Warning => Yellow,
            Level::Error => Red,
            Level::Off => White,
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(Level::All),
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "OFF" => Ok(Level::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Levels of the platform bridge surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlatformLevel {
    All,
    Finest,
    Finer,
    Fine,
    Config,
    Info,
    Warning,
    Severe,
    Off,
}

impl PlatformLevel {
    pub const fn severity(&self) -> i32 {
        match self {
            PlatformLevel::All => i32::MIN,
            PlatformLevel::Finest => 300,
            PlatformLevel::Finer => 400,
            PlatformLevel::Fine => 500,
            PlatformLevel::Config => 700,
            PlatformLevel::Info => 800,
            PlatformLevel::Warning => 900,
            PlatformLevel::Severe => 1000,
            PlatformLevel::Off => i32::MAX,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            PlatformLevel::All => "ALL",
            PlatformLevel::Finest => "FINEST",
            PlatformLevel::Finer => "FINER",
            PlatformLevel::Fine => "FINE",
            PlatformLevel::Config => "CONFIG",
            PlatformLevel::Info => "INFO",
            PlatformLevel::Warning => "WARNING",
            PlatformLevel::Severe => "SEVERE",
            PlatformLevel::Off => "OFF",
        }
    }

    #[inline]
    pub fn passes(&self, threshold: PlatformLevel) -> bool {
        *self != PlatformLevel::Off && self.severity() >= threshold.severity()
    }

    pub fn to_system(&self) -> Level {
        match self {
            PlatformLevel::All => Level::All,
            PlatformLevel::Finest | PlatformLevel::Finer => Level::Trace,
            PlatformLevel::Fine | PlatformLevel::Config => Level::Debug,
            PlatformLevel::Info => Level::Info,
            PlatformLevel::Warning => Level::Warning,
            PlatformLevel::Severe => Level::Error,
            PlatformLevel::Off => Level::Off,
        }
    }
}

impl PartialOrd for PlatformLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlatformLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for PlatformLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for PlatformLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(PlatformLevel::All),
            "FINEST" => Ok(PlatformLevel::Finest),
            "FINER" => Ok(PlatformLevel::Finer),
            "FINE" => Ok(PlatformLevel::Fine),
            "CONFIG" => Ok(PlatformLevel::Config),
            "INFO" => Ok(PlatformLevel::Info),
            "WARNING" => Ok(PlatformLevel::Warning),
            "SEVERE" => Ok(PlatformLevel::Severe),
            "OFF" => Ok(PlatformLevel::Off),
            _ => Err(format!("Invalid platform level: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_follows_severity() {
        assert!(Level::All < Level::Trace);
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_passes_threshold() {
        assert!(Level::Warning.passes(Level::Info));
        assert!(Level::Info.passes(Level::Info));
        assert!(!Level::Debug.passes(Level::Info));
        assert!(!Level::Off.passes(Level::All));
        assert!(PlatformLevel::Config.passes(PlatformLevel::Fine));
        assert!(!PlatformLevel::Finest.passes(PlatformLevel::Finer));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(Level::Trace.to_platform(), PlatformLevel::Finer);
        assert_eq!(Level::Error.to_platform(), PlatformLevel::Severe);
        assert_eq!(PlatformLevel::Config.to_system(), Level::Debug);
        assert_eq!(PlatformLevel::Finest.to_system(), Level::Trace);
        assert_eq!(PlatformLevel::Severe.to_system(), Level::Error);
    }

    #[test]
    fn test_parse() {
        assert_eq!("warn".parse::<Level>(), Ok(Level::Warning));
        assert_eq!(" WARNING ".parse::<Level>(), Ok(Level::Warning));
        assert!("verbose".parse::<Level>().is_err());
        assert_eq!("config".parse::<PlatformLevel>(), Ok(PlatformLevel::Config));
    }
}
