//! Call/put classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Option type of a single contract.
///
/// Serialises as `"call"` / `"put"`. Parsing is lenient and accepts the
/// exchange-style `CE`/`PE` suffixes as well as single letters.
///
/// # Examples
/// ```
/// use greeks_core::types::OptionType;
///
/// assert_eq!("CE".parse::<OptionType>().unwrap(), OptionType::Call);
/// assert_eq!("put".parse::<OptionType>().unwrap(), OptionType::Put);
/// assert_eq!(OptionType::Call.to_string(), "call");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Right to buy at the strike.
    Call,
    /// Right to sell at the strike.
    Put,
}

impl OptionType {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }

    /// True for calls.
    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(self, OptionType::Call)
    }
}

impl FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" | "ce" | "c" => Ok(OptionType::Call),
            "put" | "pe" | "p" => Ok(OptionType::Put),
            other => Err(format!("unknown option type: {other}")),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        for s in ["call", "CALL", "Ce", "c", " call "] {
            assert_eq!(s.parse::<OptionType>().unwrap(), OptionType::Call, "{s}");
        }
        for s in ["put", "PUT", "pe", "P"] {
            assert_eq!(s.parse::<OptionType>().unwrap(), OptionType::Put, "{s}");
        }
        assert!("straddle".parse::<OptionType>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for t in [OptionType::Call, OptionType::Put] {
            assert_eq!(t.to_string().parse::<OptionType>().unwrap(), t);
        }
    }

    #[test]
    fn test_is_call() {
        assert!(OptionType::Call.is_call());
        assert!(!OptionType::Put.is_call());
    }
}
