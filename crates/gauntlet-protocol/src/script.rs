//! The cosmetic fight script delivered with a match result.
//!
//! A script is pure presentation: the winner is fixed before the script is
//! written, and every event in it is consistent with that winner.

use serde::{Deserialize, Serialize};

use crate::{MatchId, ParticipantId, Side};

/// Display information for one fighter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterInfo {
    pub id: ParticipantId,
    pub username: String,
    pub character: String,
    pub skin: String,
}

/// Kind of a single timed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightEventKind {
    MoveFwd,
    AttackLight,
    AttackHeavy,
    AttackSpecial,
    ReactHit,
    ReactDodge,
    ReactBlock,
    FinishMove,
    Ko,
    Victory,
}

impl FightEventKind {
    pub fn is_attack(self) -> bool {
        matches!(
            self,
            Self::AttackLight | Self::AttackHeavy | Self::AttackSpecial | Self::FinishMove
        )
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// One timed event. `time` is seconds since the start of the fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightEvent {
    pub time: f64,
    #[serde(rename = "type")]
    pub kind: FightEventKind,
    pub actor: Side,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hit: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub crit: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dodge: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub damage: u32,
}

impl FightEvent {
    /// An event with no hit flags and no damage.
    pub fn new(time: f64, kind: FightEventKind, actor: Side) -> Self {
        Self {
            time,
            kind,
            actor,
            hit: false,
            crit: false,
            dodge: false,
            damage: 0,
        }
    }
}

/// The full scripted fight for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightScript {
    pub match_id: MatchId,
    pub player_a: FighterInfo,
    pub player_b: FighterInfo,
    pub winner: Side,
    pub duration: f64,
    pub events: Vec<FightEvent>,
}

impl FightScript {
    /// Returns the fighter on the given side.
    pub fn fighter(&self, side: Side) -> &FighterInfo {
        match side {
            Side::PlayerA => &self.player_a,
            Side::PlayerB => &self.player_b,
        }
    }
}
