//! Reward policies: one value per completion kind, consumed by the engine.
use crate::models::{CompletionEvent, CompletionKind, Modality};

/// Base points for a lesson that was already passed before.
pub const LESSON_REPEAT_BASE: u32 = 5;
pub const ISRAELI_UNIT_BASE: u32 = 30;
pub const PRACTICE_BASE: u32 = 15;
pub const PERFECT_BONUS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerfectBonus {
    None,
    Always(u32),
    FirstCompletionOnly(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModalityBonuses {
    pub rhythm: u32,
    pub blurting: u32,
    pub air_writing: u32,
    pub build: u32,
}

impl ModalityBonuses {
    pub const NONE: ModalityBonuses = ModalityBonuses {
        rhythm: 0,
        blurting: 0,
        air_writing: 0,
        build: 0,
    };

    pub const PRACTICE: ModalityBonuses = ModalityBonuses {
        rhythm: 10,
        blurting: 15,
        air_writing: 5,
        build: 10,
    };

    pub fn bonus(&self, modality: Modality) -> u32 {
        match modality {
            Modality::Rhythm => self.rhythm,
            Modality::Blurting => self.blurting,
            Modality::AirWriting => self.air_writing,
            Modality::Build => self.build,
            Modality::None => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardPolicy {
    /// Base used on a first completion, or always when `repeat_base` is unset.
    pub base: u32,
    pub repeat_base: Option<u32>,
    pub perfect_bonus: PerfectBonus,
    pub modality_bonuses: ModalityBonuses,
}

/// `round(base * accuracy / 100)`, half up, in integers.
pub fn scale_by_accuracy(base: u32, accuracy: u8) -> u32 {
    ((u64::from(base) * u64::from(accuracy) + 50) / 100) as u32
}

impl RewardPolicy {
    pub fn lesson(xp_reward: u32) -> Self {
        Self {
            base: xp_reward,
            repeat_base: Some(LESSON_REPEAT_BASE),
            perfect_bonus: PerfectBonus::FirstCompletionOnly(PERFECT_BONUS),
            modality_bonuses: ModalityBonuses::NONE,
        }
    }

    pub fn israeli_unit() -> Self {
        Self {
            base: ISRAELI_UNIT_BASE,
            repeat_base: None,
            perfect_bonus: PerfectBonus::Always(PERFECT_BONUS),
            modality_bonuses: ModalityBonuses::NONE,
        }
    }

    pub fn practice() -> Self {
        Self {
            base: PRACTICE_BASE,
            repeat_base: None,
            perfect_bonus: PerfectBonus::None,
            modality_bonuses: ModalityBonuses::PRACTICE,
        }
    }

    pub fn for_event(event: &CompletionEvent) -> Self {
        match event.kind {
            CompletionKind::Lesson { xp_reward, .. } => Self::lesson(xp_reward),
            CompletionKind::Practice { .. } => Self::practice(),
            CompletionKind::IsraeliUnit => Self::israeli_unit(),
        }
    }

    /// Points for a passed event. Failed events earn nothing; the engine
    /// checks that before calling this.
    pub fn points_for(&self, event: &CompletionEvent) -> u32 {
        let (first_completion, modality) = match event.kind {
            CompletionKind::Lesson {
                is_first_completion,
                ..
            } => (is_first_completion, Modality::None),
            CompletionKind::Practice { modality } => (true, modality),
            CompletionKind::IsraeliUnit => (true, Modality::None),
        };

        let base = match self.repeat_base {
            Some(repeat) if !first_completion => repeat,
            _ => self.base,
        };

        let perfect = match self.perfect_bonus {
            PerfectBonus::Always(bonus) if event.is_perfect() => bonus,
            PerfectBonus::FirstCompletionOnly(bonus) if event.is_perfect() && first_completion => {
                bonus
            }
            _ => 0,
        };

        scale_by_accuracy(base, event.accuracy) + perfect + self.modality_bonuses.bonus(modality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(event: CompletionEvent) -> u32 {
        RewardPolicy::for_event(&event).points_for(&event)
    }

    #[test]
    fn test_scale_rounds_half_up() {
        assert_eq!(scale_by_accuracy(15, 80), 12);
        assert_eq!(scale_by_accuracy(5, 50), 3);
        assert_eq!(scale_by_accuracy(30, 55), 17);
        assert_eq!(scale_by_accuracy(0, 100), 0);
    }

    #[test]
    fn test_lesson_first_completion_perfect() {
        assert_eq!(points(CompletionEvent::lesson(100, 50, true)), 60);
        assert_eq!(points(CompletionEvent::lesson(90, 50, true)), 45);
    }

    #[test]
    fn test_lesson_repeat_uses_small_base_and_no_bonus() {
        assert_eq!(points(CompletionEvent::lesson(100, 50, false)), 5);
        assert_eq!(points(CompletionEvent::lesson(60, 50, false)), 3);
    }

    #[test]
    fn test_israeli_unit() {
        assert_eq!(points(CompletionEvent::israeli_unit(100)), 40);
        assert_eq!(points(CompletionEvent::israeli_unit(70)), 21);
    }

    #[test]
    fn test_practice_modality_bonus() {
        assert_eq!(points(CompletionEvent::practice(80, Modality::Blurting)), 27);
        assert_eq!(points(CompletionEvent::practice(80, Modality::Rhythm)), 22);
        assert_eq!(points(CompletionEvent::practice(80, Modality::AirWriting)), 17);
        assert_eq!(points(CompletionEvent::practice(80, Modality::Build)), 22);
        assert_eq!(points(CompletionEvent::practice(80, Modality::None)), 12);
        // no perfect bonus for practice
        assert_eq!(points(CompletionEvent::practice(100, Modality::None)), 15);
    }
}
