//! Construction of the opening state.

use std::collections::BTreeMap;

use crate::config::KernelConfig;
use crate::def::{GameDef, TurnOrderDef};
use crate::effect::{EffectEnv, apply_effects};
use crate::eval::Bindings;
use crate::rng::Rng;
use crate::state::{
    CardDrivenState, GameState, PlayerId, StateHash, TurnOrderState, ZoneId,
};
use crate::trigger::dispatch_events;
use crate::turn::{enter_turn, start_card};

use super::SetupError;

fn validate(def: &GameDef, player_count: u32) -> Result<(), SetupError> {
    let (min, max) = (def.metadata.min_players, def.metadata.max_players);
    if player_count < min || player_count > max {
        return Err(SetupError::PlayerCount {
            count: player_count,
            min,
            max,
        });
    }
    if def.first_phase().is_none() {
        return Err(SetupError::NoPhases);
    }
    Ok(())
}

/// State before setup effects run: declared initial values, empty zones and
/// default marker states.
fn blank_state(def: &GameDef, seed: u64, player_count: u32) -> GameState {
    let global_vars = def
        .global_vars
        .iter()
        .map(|var| (var.name.clone(), var.initial.clone()))
        .collect();
    let seat_vars: BTreeMap<_, _> = def
        .per_player_vars
        .iter()
        .map(|var| (var.name.clone(), var.initial.clone()))
        .collect();
    let per_player_vars = (0..player_count)
        .map(|seat| (PlayerId(seat), seat_vars.clone()))
        .collect();

    let zones: BTreeMap<ZoneId, _> = def
        .zones
        .iter()
        .flat_map(|zone| zone.instances(player_count))
        .map(|id| (id, Vec::new()))
        .collect();
    let defaults: BTreeMap<_, _> = def
        .markers
        .iter()
        .map(|lattice| (lattice.id.clone(), lattice.default.clone()))
        .collect();
    let markers = if defaults.is_empty() {
        BTreeMap::new()
    } else {
        def.zones
            .iter()
            .filter(|zone| zone.map_space)
            .map(|zone| (zone.id.clone(), defaults.clone()))
            .collect()
    };
    let global_markers = def
        .global_markers
        .iter()
        .map(|lattice| (lattice.id.clone(), lattice.default.clone()))
        .collect();

    let turn_order = match &def.turn_order {
        TurnOrderDef::RoundRobin => TurnOrderState::RoundRobin,
        TurnOrderDef::CardDriven(rules) => TurnOrderState::CardDriven(CardDrivenState {
            lookahead_zone: rules.lookahead_zone.clone(),
            leader_zone: rules.leader_zone.clone(),
            ..CardDrivenState::default()
        }),
    };

    GameState {
        player_count,
        global_vars,
        per_player_vars,
        zones,
        markers,
        global_markers,
        action_usage: BTreeMap::new(),
        turn_order,
        interrupt_stack: Vec::new(),
        reveals: BTreeMap::new(),
        free_operation_grants: Vec::new(),
        rng: Rng::new(seed),
        current_phase: def.first_phase().cloned().unwrap_or_default(),
        active_player: PlayerId(0),
        turn_count: 1,
        next_token_id: 0,
        state_hash: StateHash::ZERO,
    }
}

/// Builds the opening state for `player_count` seats from `seed`.
///
/// Setup effects run with seat 0 as actor before the first turn opens. Only
/// the opening `turnStart`/`phaseEnter` events reach triggers.
pub fn initial_state(
    def: &GameDef,
    seed: u64,
    player_count: u32,
    config: &KernelConfig,
) -> Result<GameState, SetupError> {
    validate(def, player_count)?;
    let blank = blank_state(def, seed, player_count);

    let decisions = BTreeMap::new();
    let env =
        EffectEnv::execution(def, PlayerId(0), &decisions).with_query_limit(config.max_query_items);
    let mut state = apply_effects(&def.setup, &blank, &Bindings::new(), &env)?.state;

    let mut events = Vec::new();
    if state.turn_order.card_driven().is_some() {
        start_card(def, &mut state, &mut events);
    }
    enter_turn(def, &mut state, &mut events);

    let mut state = dispatch_events(def, state, &events, config)?.state;
    state.rehash()?;
    tracing::debug!(
        game = %def.metadata.id,
        seed,
        players = player_count,
        hash = %state.state_hash,
        "initial state built"
    );
    Ok(state)
}
