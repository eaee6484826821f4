use std::fmt;

use serde::{Deserialize, Serialize};

/// Move quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Forced,
    Theory,
    Brilliant,
    Critical,
    Best,
    Excellent,
    Okay,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Classification {
    /// Quality rank used by the upgrade rule. Forced and Theory sit outside
    /// the scale and are never upgraded.
    pub fn rank(self) -> Option<u8> {
        match self {
            Classification::Blunder => Some(0),
            Classification::Mistake => Some(1),
            Classification::Inaccuracy => Some(2),
            Classification::Okay => Some(3),
            Classification::Excellent => Some(4),
            Classification::Best => Some(5),
            Classification::Critical => Some(6),
            Classification::Brilliant => Some(7),
            Classification::Forced | Classification::Theory => None,
        }
    }

    /// Replace `self` with `to` if `self` already ranks at least `floor`.
    /// Brilliant and Critical can only be layered on top of Best this way.
    pub fn upgrade(self, to: Classification, floor: Classification) -> Classification {
        match (self.rank(), floor.rank()) {
            (Some(current), Some(min)) if current >= min => to,
            _ => self,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Forced => "forced",
            Classification::Theory => "theory",
            Classification::Brilliant => "brilliant",
            Classification::Critical => "critical",
            Classification::Best => "best",
            Classification::Excellent => "excellent",
            Classification::Okay => "okay",
            Classification::Inaccuracy => "inaccuracy",
            Classification::Mistake => "mistake",
            Classification::Blunder => "blunder",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
