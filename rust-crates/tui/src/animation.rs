use randomness::games::{
    GameRecord,
    YoloVerdict,
};
use std::time::{
    Duration,
    Instant,
};

pub const REVEAL_DURATION: Duration = Duration::from_secs(2);
pub const BATTLE_DURATION: Duration = Duration::from_secs(3);
pub const YOLO_ROLL_DURATION: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    Reveal,
    Battle,
    Result,
}

impl RevealPhase {
    pub fn at(elapsed: Duration) -> Self {
        if elapsed < REVEAL_DURATION {
            RevealPhase::Reveal
        } else if elapsed < REVEAL_DURATION + BATTLE_DURATION {
            RevealPhase::Battle
        } else {
            RevealPhase::Result
        }
    }
}

/// Detail view of a finished battle: both cards are shown, they fight, then
/// the winner is announced.
#[derive(Clone, Debug)]
pub struct BattleReveal {
    pub game: GameRecord,
    started: Instant,
}

impl BattleReveal {
    pub fn new(game: GameRecord, now: Instant) -> Self {
        Self { game, started: now }
    }

    pub fn phase(&self, now: Instant) -> RevealPhase {
        RevealPhase::at(now.saturating_duration_since(self.started))
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.phase(now) != RevealPhase::Result
    }
}

/// A YOLO roll keeps "rolling" for a fixed time even if the oracle answers
/// sooner.
#[derive(Clone, Debug)]
pub struct YoloRoll {
    started: Instant,
    verdict: Option<YoloVerdict>,
}

impl YoloRoll {
    pub fn start(now: Instant) -> Self {
        Self {
            started: now,
            verdict: None,
        }
    }

    pub fn settle(&mut self, verdict: YoloVerdict) {
        self.verdict = Some(verdict);
    }

    /// The verdict once both the oracle answered and the roll time passed.
    pub fn visible_verdict(&self, now: Instant) -> Option<YoloVerdict> {
        let rolled_long_enough =
            now.saturating_duration_since(self.started) >= YOLO_ROLL_DURATION;
        self.verdict.filter(|_| rolled_long_enough)
    }

    pub fn is_rolling(&self, now: Instant) -> bool {
        self.visible_verdict(now).is_none()
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn finished_game() -> GameRecord {
        GameRecord {
            id: 3,
            creator: Address::repeat_byte(1),
            player: Address::repeat_byte(2),
            active: false,
            completed: true,
            creator_nft_index: 4,
            player_nft_index: 9,
        }
    }

    #[test]
    fn phase__moves_from_reveal_to_battle_to_result() {
        // given
        let start = Instant::now();
        let reveal = BattleReveal::new(finished_game(), start);

        // when
        let phases = [
            reveal.phase(start),
            reveal.phase(start + Duration::from_millis(1999)),
            reveal.phase(start + Duration::from_secs(2)),
            reveal.phase(start + Duration::from_millis(4999)),
            reveal.phase(start + Duration::from_secs(5)),
        ];

        // then
        assert_eq!(
            phases,
            [
                RevealPhase::Reveal,
                RevealPhase::Reveal,
                RevealPhase::Battle,
                RevealPhase::Battle,
                RevealPhase::Result,
            ]
        );
        assert!(!reveal.is_running(start + Duration::from_secs(6)));
    }

    #[test]
    fn visible_verdict__waits_for_roll_time_and_answer() {
        // given
        let start = Instant::now();
        let mut roll = YoloRoll::start(start);
        let after = start + YOLO_ROLL_DURATION;

        // when
        let before_answer = roll.visible_verdict(after);
        roll.settle(YoloVerdict { roll: 77 });
        let too_early = roll.visible_verdict(start + Duration::from_millis(500));
        let shown = roll.visible_verdict(after);

        // then
        assert_eq!(before_answer, None);
        assert_eq!(too_early, None);
        assert_eq!(shown, Some(YoloVerdict { roll: 77 }));
        assert!(!roll.is_rolling(after));
    }
}
