//! Two against two until one side falls.
//!
//! Run with `cargo run -p tpb-core --example skirmish`.

use std::sync::Arc;

use tpb_core::action::{Action, Relation, TargetSelector, UsableRef};
use tpb_core::battler::{BattlerView, ResultFlags, Side};
use tpb_core::catalog::{ActionDefinition, BattlerProfile, MemoryCatalog, ProfileId};
use tpb_core::config::SchedulerConfig;
use tpb_core::effect::{Mend, Restrain, Strike};
use tpb_core::event::{InterruptCause, Outcome};
use tpb_core::hook::Presenter;
use tpb_core::session::BattleSession;

const BASH: UsableRef = UsableRef::Skill(1);
const FIREBALL: UsableRef = UsableRef::Skill(2);
const SHIELD_BASH: UsableRef = UsableRef::Skill(3);
const CURE: UsableRef = UsableRef::Skill(4);

const KNIGHT: ProfileId = ProfileId(1);
const MAGE: ProfileId = ProfileId(2);
const GOBLIN: ProfileId = ProfileId(3);

const CONFIG: &str = r#"{
    "turn_length": 100,
    "interrupt_on_damage": true,
    "seed": 2024
}"#;

struct Narrator;

impl Presenter for Narrator {
    fn cast_started(&self, battler: &BattlerView, usable: UsableRef, delay: u32) {
        println!("  {} begins {usable} ({delay} ticks)", battler.id);
    }

    fn action_interrupted(&self, battler: &BattlerView, cause: &InterruptCause, flags: ResultFlags) {
        println!("  {} loses its cast to {cause:?} (flags {flags:?})", battler.id);
    }
}

fn profile(name: &str, speed: u32, max_hp: u32, max_mp: u32) -> BattlerProfile {
    BattlerProfile {
        name: name.into(),
        speed,
        max_hp,
        max_mp,
        max_tp: 0,
    }
}

fn tables() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.insert_profile(KNIGHT, profile("Knight", 9, 160, 0));
    catalog.insert_profile(MAGE, profile("Mage", 12, 90, 60));
    catalog.insert_profile(GOBLIN, profile("Goblin", 10, 70, 0));

    catalog.insert_action(BASH, ActionDefinition::instant(Arc::new(Strike { amount: 9 })));
    catalog.insert_action(
        FIREBALL,
        ActionDefinition::instant(Arc::new(Strike { amount: 25 }))
            .with_cast_delay(12)
            .with_mp_cost(12),
    );
    catalog.insert_action(SHIELD_BASH, ActionDefinition::instant(Arc::new(Restrain)));
    catalog.insert_action(
        CURE,
        ActionDefinition::instant(Arc::new(Mend { amount: 30 }))
            .with_cast_delay(6)
            .with_mp_cost(8),
    );
    catalog
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config: SchedulerConfig = serde_json::from_str(CONFIG)?;
    let catalog = Arc::new(tables());
    let mut session = BattleSession::new(config, catalog.clone(), catalog)?;
    session.hooks_mut().register_presenter(Arc::new(Narrator));

    let knight = session.enlist(Side::Ally, KNIGHT)?;
    let mage = session.enlist(Side::Ally, MAGE)?;
    let goblins = [
        session.enlist(Side::Opponent, GOBLIN)?,
        session.enlist(Side::Opponent, GOBLIN)?,
    ];

    while session.tick() < 400 {
        for id in session.pending_input() {
            let (usable, target) = if id == mage {
                let knight_hp = session.battler(knight).map_or(0, |b| b.pools().hp);
                if knight_hp < 80 {
                    (CURE, TargetSelector::Battler(knight))
                } else {
                    (FIREBALL, TargetSelector::Side(Relation::Opponents))
                }
            } else if id == knight && session.tick() % 3 == 0 {
                (SHIELD_BASH, TargetSelector::Random(Relation::Opponents))
            } else {
                (BASH, TargetSelector::Random(Relation::Opponents))
            };
            session.queue_action(Action::new(id, usable, target))?;
        }

        let report = session.step();
        for (id, outcome) in &report.outcomes {
            match outcome {
                Outcome::Resolved(resolution) => println!(
                    "[{:>3}] {id} uses {:?}: {} damage",
                    report.tick,
                    resolution.usable,
                    resolution.hp_damage
                ),
                Outcome::Faulted(fault) => println!("[{:>3}] {id} fumbles: {fault:?}", report.tick),
                Outcome::CastStarted { .. } | Outcome::Interrupted { .. } => {}
            }
        }
        // Stunned goblins shake it off after a few ticks.
        if report.tick % 5 == 0 {
            for goblin in goblins {
                session.lift_restriction(goblin)?;
            }
        }

        for side in [Side::Ally, Side::Opponent] {
            if session.is_side_defeated(side) {
                println!("{side} side defeated at tick {}", report.tick);
                return Ok(());
            }
        }
    }

    println!("no winner after {} ticks", session.tick());
    Ok(())
}
