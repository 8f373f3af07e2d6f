//! The narrator: writes a cosmetic fight script for a decided match.
//!
//! The winner comes from the fairness engine and is an input here, never
//! an output. Exchanges are rolled with fixed odds, but damage is clamped
//! so neither fighter falls below 1 health before the finish. The closing
//! `finish_move` deals exactly the loser's remaining health, so replaying
//! the damage in the script always knocks out the loser and only the loser.

use gauntlet_protocol::{FightEvent, FightEventKind, FightScript, FighterInfo, MatchId, Side};
use rand::Rng;

pub const STARTING_HEALTH: u32 = 100;

const MIN_DURATION: f64 = 8.0;
const DURATION_SPREAD: f64 = 7.0;
/// Exchanges stop this long before the end to leave room for the finish.
const FINISH_WINDOW: f64 = 2.0;
const FIRST_EXCHANGE_AT: f64 = 0.5;

const HIT_CHANCE: f64 = 0.7;
const CRIT_CHANCE: f64 = 0.2;
const DODGE_CHANCE: f64 = 0.5;

const ATTACKS: [FightEventKind; 3] = [
    FightEventKind::AttackLight,
    FightEventKind::AttackHeavy,
    FightEventKind::AttackSpecial,
];

/// Writes the script for a match whose winner is already known.
pub fn narrate<R: Rng>(
    match_id: MatchId,
    player_a: FighterInfo,
    player_b: FighterInfo,
    winner: Side,
    rng: &mut R,
) -> FightScript {
    let duration = MIN_DURATION + rng.random::<f64>() * DURATION_SPREAD;
    let mut health = Health::default();

    let mut events = vec![
        FightEvent::new(0.2, FightEventKind::MoveFwd, Side::PlayerA),
        FightEvent::new(0.3, FightEventKind::MoveFwd, Side::PlayerB),
    ];

    let mut time = FIRST_EXCHANGE_AT;
    while time < duration - FINISH_WINDOW {
        let attacker = if rng.random_bool(0.5) {
            Side::PlayerA
        } else {
            Side::PlayerB
        };
        let defender = attacker.opponent();

        let kind = ATTACKS[rng.random_range(0..ATTACKS.len())];
        let hit = rng.random_bool(HIT_CHANCE);
        let crit = hit && rng.random_bool(CRIT_CHANCE);
        let dodge = !hit && rng.random_bool(DODGE_CHANCE);

        let damage = if hit {
            let rolled = 10 + rng.random_range(0..15u32);
            let rolled = if crit { rolled * 2 } else { rolled };
            health.wound(defender, rolled)
        } else {
            0
        };

        events.push(FightEvent {
            hit,
            crit,
            damage,
            ..FightEvent::new(time, kind, attacker)
        });

        let reaction = if dodge {
            FightEventKind::ReactDodge
        } else if hit {
            FightEventKind::ReactHit
        } else {
            FightEventKind::ReactBlock
        };
        events.push(FightEvent {
            dodge,
            ..FightEvent::new(time + 0.1, reaction, defender)
        });

        time += 0.8 + rng.random::<f64>() * 0.6;
    }

    let loser = winner.opponent();
    events.push(FightEvent {
        hit: true,
        damage: health.get(loser),
        ..FightEvent::new(duration - 1.0, FightEventKind::FinishMove, winner)
    });
    events.push(FightEvent::new(duration - 0.5, FightEventKind::Ko, loser));
    events.push(FightEvent::new(duration, FightEventKind::Victory, winner));

    FightScript {
        match_id,
        player_a,
        player_b,
        winner,
        duration,
        events,
    }
}

/// Replays the damage in a script and returns each side's final health.
pub fn replay(script: &FightScript) -> (u32, u32) {
    let mut health = Health::default();
    for event in &script.events {
        if event.kind.is_attack() && event.hit {
            let target = event.actor.opponent();
            let current = health.get(target);
            health.set(target, current.saturating_sub(event.damage));
        }
    }
    (health.a, health.b)
}

struct Health {
    a: u32,
    b: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            a: STARTING_HEALTH,
            b: STARTING_HEALTH,
        }
    }
}

impl Health {
    fn get(&self, side: Side) -> u32 {
        match side {
            Side::PlayerA => self.a,
            Side::PlayerB => self.b,
        }
    }

    fn set(&mut self, side: Side, value: u32) {
        match side {
            Side::PlayerA => self.a = value,
            Side::PlayerB => self.b = value,
        }
    }

    /// Applies up to `amount` damage, leaving at least 1 health. Returns
    /// the damage actually dealt.
    fn wound(&mut self, side: Side, amount: u32) -> u32 {
        let current = self.get(side);
        let dealt = amount.min(current.saturating_sub(1));
        self.set(side, current - dealt);
        dealt
    }
}
