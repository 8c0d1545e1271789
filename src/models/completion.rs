//! Completion events fed into the progression engine.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accuracy at or above this percentage counts as passed.
pub const PASS_ACCURACY: u8 = 50;

/// Multisensory practice mode; each one carries a flat bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    Rhythm,
    Blurting,
    AirWriting,
    Build,
    None,
}

impl Modality {
    pub const ALL: [Modality; 5] = [
        Modality::Rhythm,
        Modality::Blurting,
        Modality::AirWriting,
        Modality::Build,
        Modality::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Rhythm => "rhythm",
            Modality::Blurting => "blurting",
            Modality::AirWriting => "air-writing",
            Modality::Build => "build",
            Modality::None => "none",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modality::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown practice modality '{}'", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CompletionKind {
    Lesson {
        xp_reward: u32,
        is_first_completion: bool,
    },
    Practice {
        modality: Modality,
    },
    IsraeliUnit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub accuracy: u8,
    pub kind: CompletionKind,
}

impl CompletionEvent {
    pub fn lesson(accuracy: u8, xp_reward: u32, is_first_completion: bool) -> Self {
        Self {
            accuracy,
            kind: CompletionKind::Lesson {
                xp_reward,
                is_first_completion,
            },
        }
    }

    pub fn practice(accuracy: u8, modality: Modality) -> Self {
        Self {
            accuracy,
            kind: CompletionKind::Practice { modality },
        }
    }

    pub fn israeli_unit(accuracy: u8) -> Self {
        Self {
            accuracy,
            kind: CompletionKind::IsraeliUnit,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.accuracy >= PASS_ACCURACY
    }

    pub fn is_perfect(&self) -> bool {
        self.accuracy == 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_names_round_trip() {
        for modality in Modality::ALL {
            assert_eq!(modality.as_str().parse::<Modality>(), Ok(modality));
        }
        assert!("tracing".parse::<Modality>().is_err());
    }

    #[test]
    fn test_pass_threshold() {
        assert!(CompletionEvent::israeli_unit(50).is_passed());
        assert!(!CompletionEvent::israeli_unit(49).is_passed());
        assert!(CompletionEvent::practice(100, Modality::Rhythm).is_perfect());
    }

    #[test]
    fn test_event_json_shape() {
        let event = CompletionEvent::practice(80, Modality::AirWriting);
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["kind"]["kind"], "practice");
        assert_eq!(json["kind"]["modality"], "air-writing");
    }
}
