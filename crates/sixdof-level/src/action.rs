//! Trigger actions
//!
//! Named effects referenced by triggers and dynamic objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an action does to whoever sets it off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Generic damage, absorbed by shields first
    Damage,
    /// Damage that bypasses shields
    HpDamage,
    /// Drains shields only
    ShieldDrain,
    /// Collectible
    Pickup,
    /// Ends the level successfully
    Win,
}

impl ActionKind {
    /// Name used in level descriptions
    pub fn name(&self) -> &'static str {
        match self {
            Self::Damage => "damage",
            Self::HpDamage => "hpdamage",
            Self::ShieldDrain => "shielddrain",
            Self::Pickup => "pickup",
            Self::Win => "win",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised action type string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown action type `{0}`")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "damage" => Ok(Self::Damage),
            "hpdamage" => Ok(Self::HpDamage),
            "shielddrain" => Ok(Self::ShieldDrain),
            "pickup" => Ok(Self::Pickup),
            "win" => Ok(Self::Win),
            other => Err(UnknownActionKind(other.to_string())),
        }
    }
}

/// Action with its magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub value: f32,
}

impl Action {
    pub fn new(kind: ActionKind, value: f32) -> Self {
        Self { kind, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        for kind in [
            ActionKind::Damage,
            ActionKind::HpDamage,
            ActionKind::ShieldDrain,
            ActionKind::Pickup,
            ActionKind::Win,
        ] {
            assert_eq!(kind.name().parse::<ActionKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "heal".parse::<ActionKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown action type `heal`");
    }

    #[test]
    fn test_serde_names_match() {
        let json = serde_json::to_string(&ActionKind::ShieldDrain).unwrap();
        assert_eq!(json, "\"shielddrain\"");
    }
}
