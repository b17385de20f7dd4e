use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Voices offered by the speech synthesis endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Anna,
    Alex,
    Bella,
    Benjamin,
    Charles,
    Claire,
    David,
    Diana,
}

impl Voice {
    pub const ALL: [Voice; 8] = [
        Voice::Anna,
        Voice::Alex,
        Voice::Bella,
        Voice::Benjamin,
        Voice::Charles,
        Voice::Claire,
        Voice::David,
        Voice::Diana,
    ];

    /// Pick a voice for a session that has none configured
    pub fn random() -> Self {
        *Self::ALL.choose(&mut rand::thread_rng()).unwrap_or(&Voice::Anna)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Voice::Anna => "anna",
            Voice::Alex => "alex",
            Voice::Bella => "bella",
            Voice::Benjamin => "benjamin",
            Voice::Charles => "charles",
            Voice::Claire => "claire",
            Voice::David => "david",
            Voice::Diana => "diana",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| format!("unknown voice '{s}' (expected one of: anna, alex, bella, benjamin, charles, claire, david, diana)"))
    }
}
