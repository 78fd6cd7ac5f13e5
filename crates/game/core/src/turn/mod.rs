//! Phase and turn progression.
//!
//! These functions only move the turn structure forward and report the
//! events they raise. Trigger dispatch is the caller's job (see
//! [`crate::engine::advance_phase`]).
mod card_driven;

pub(crate) use card_driven::{record_card_driven_move, start_card};

use crate::def::{GameDef, LimitScope};
use crate::state::GameState;
use crate::trigger::KernelEvent;

/// Result of one turn-flow step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowStep {
    pub state: GameState,
    pub events: Vec<KernelEvent>,
}

/// Zeroes per-phase usage counters, and per-turn ones at a turn boundary.
fn reset_usage(state: &mut GameState, scope: LimitScope) {
    for usage in state.action_usage.values_mut() {
        usage.phase = 0;
        if scope == LimitScope::Turn {
            usage.turn = 0;
        }
    }
}

/// Leaves the current phase.
///
/// An interrupt phase on top of the stack pops back to its resume phase.
/// A regular phase enters the next declared phase, or ends the turn after
/// the last one.
pub fn advance_phase(def: &GameDef, state: &GameState) -> FlowStep {
    let mut next = state.clone();
    let mut events = Vec::new();

    let on_interrupt = next
        .interrupt_stack
        .last()
        .is_some_and(|frame| frame.phase == next.current_phase);
    if on_interrupt {
        if let Some(frame) = next.interrupt_stack.pop() {
            tracing::debug!(phase = %frame.phase, resume = %frame.resume_phase, "interrupt phase exited");
            events.push(KernelEvent::PhaseExit { phase: frame.phase });
            next.current_phase = frame.resume_phase;
            reset_usage(&mut next, LimitScope::Phase);
        }
        return FlowStep {
            state: next,
            events,
        };
    }

    events.push(KernelEvent::PhaseExit {
        phase: next.current_phase.clone(),
    });
    reset_usage(&mut next, LimitScope::Phase);
    match def.next_phase(&next.current_phase).cloned() {
        Some(phase) => {
            tracing::debug!(from = %next.current_phase, to = %phase, "phase advanced");
            next.current_phase = phase.clone();
            events.push(KernelEvent::PhaseEnter { phase });
        }
        None => roll_turn(def, &mut next, &mut events),
    }
    FlowStep {
        state: next,
        events,
    }
}

/// Ends the turn from whatever phase is current.
pub fn end_turn(def: &GameDef, state: &GameState) -> FlowStep {
    let mut next = state.clone();
    let mut events = vec![KernelEvent::PhaseExit {
        phase: next.current_phase.clone(),
    }];
    roll_turn(def, &mut next, &mut events);
    FlowStep {
        state: next,
        events,
    }
}

fn roll_turn(def: &GameDef, state: &mut GameState, events: &mut Vec<KernelEvent>) {
    events.push(KernelEvent::TurnEnd {
        player: state.active_player,
        turn: state.turn_count,
    });
    reset_usage(state, LimitScope::Turn);
    state.turn_count = state.turn_count.saturating_add(1);
    if state.turn_order.card_driven().is_some() {
        start_card(def, state, events);
    } else if state.player_count > 0 {
        state.active_player.0 = (state.active_player.0 + 1) % state.player_count;
    }
    tracing::debug!(turn = state.turn_count, player = %state.active_player, "turn started");
    enter_turn(def, state, events);
}

/// Opens the turn recorded in `state`: `turnStart` followed by entering the
/// first phase.
pub(crate) fn enter_turn(def: &GameDef, state: &mut GameState, events: &mut Vec<KernelEvent>) {
    events.push(KernelEvent::TurnStart {
        player: state.active_player,
        turn: state.turn_count,
    });
    if let Some(first) = def.first_phase() {
        state.current_phase = first.clone();
        events.push(KernelEvent::PhaseEnter {
            phase: first.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::fixtures::small_def;
    use crate::state::fixtures::small_state;
    use crate::state::{ActionId, ActionUsage, InterruptFrame, PhaseId, PlayerId};
    use crate::trigger::EventKind;

    fn kinds(step: &FlowStep) -> Vec<EventKind> {
        step.events.iter().map(KernelEvent::kind).collect()
    }

    #[test]
    fn phases_advance_then_roll_the_turn() {
        let def = small_def();
        let mut state = small_state();
        state.action_usage.insert(
            ActionId::new("rally"),
            ActionUsage {
                turn: 1,
                phase: 1,
                game: 1,
            },
        );

        let cleanup = advance_phase(&def, &state);
        assert_eq!(cleanup.state.current_phase, PhaseId::new("cleanup"));
        assert_eq!(kinds(&cleanup), vec![EventKind::PhaseExit, EventKind::PhaseEnter]);
        assert_eq!(
            cleanup.state.usage(&ActionId::new("rally")),
            ActionUsage {
                turn: 1,
                phase: 0,
                game: 1,
            }
        );

        let rolled = advance_phase(&def, &cleanup.state);
        assert_eq!(rolled.state.current_phase, PhaseId::new("main"));
        assert_eq!(rolled.state.active_player, PlayerId(1));
        assert_eq!(rolled.state.turn_count, 2);
        assert_eq!(
            kinds(&rolled),
            vec![
                EventKind::PhaseExit,
                EventKind::TurnEnd,
                EventKind::TurnStart,
                EventKind::PhaseEnter,
            ]
        );
        assert_eq!(rolled.state.usage(&ActionId::new("rally")).turn, 0);
    }

    #[test]
    fn interrupt_phase_pops_to_resume_phase() {
        let def = small_def();
        let mut state = small_state();
        state.interrupt_stack.push(InterruptFrame {
            phase: PhaseId::new("react"),
            resume_phase: PhaseId::new("main"),
        });
        state.current_phase = PhaseId::new("react");

        let step = advance_phase(&def, &state);
        assert_eq!(step.state.current_phase, PhaseId::new("main"));
        assert!(step.state.interrupt_stack.is_empty());
        assert_eq!(step.state.turn_count, state.turn_count);
        assert_eq!(kinds(&step), vec![EventKind::PhaseExit]);
    }
}
