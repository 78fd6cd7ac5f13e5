//! Turn-flow effects: free operations and interrupt phases.

use super::EffectError;
use super::context::EffectContext;
use crate::error::ErrorContext;
use crate::eval::{PlayerSel, resolve_players};
use crate::state::{ActionId, FreeOperationGrant, InterruptFrame, PhaseId};
use crate::trigger::KernelEvent;

pub(super) fn grant_free_operation(
    ctx: &mut EffectContext<'_>,
    player: &PlayerSel,
    action: Option<&ActionId>,
    action_class: Option<&str>,
) -> Result<(), EffectError> {
    let players = resolve_players(player, &ctx.eval())?;
    for player in players {
        ctx.state.free_operation_grants.push(FreeOperationGrant {
            player,
            action: action.cloned(),
            action_class: action_class.map(str::to_owned),
        });
    }
    Ok(())
}

/// Enters `phase` on top of the interrupt stack. Popping returns to
/// `resume`, or to the phase active now.
pub(super) fn push_interrupt(ctx: &mut EffectContext<'_>, phase: &PhaseId, resume: Option<&PhaseId>) {
    let resume_phase = resume.unwrap_or(&ctx.state.current_phase).clone();
    ctx.state.interrupt_stack.push(InterruptFrame {
        phase: phase.clone(),
        resume_phase,
    });
    ctx.state.current_phase = phase.clone();
    ctx.emit(KernelEvent::PhaseEnter {
        phase: phase.clone(),
    });
}

pub(super) fn pop_interrupt(ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
    let frame = ctx
        .state
        .interrupt_stack
        .pop()
        .ok_or_else(|| EffectError::EmptyInterruptStack {
            context: ErrorContext::new().with_effect("popInterruptPhase"),
        })?;
    ctx.emit(KernelEvent::PhaseExit {
        phase: frame.phase,
    });
    ctx.state.current_phase = frame.resume_phase;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::def::fixtures::small_def;
    use crate::effect::{Effect, EffectEnv, EffectError, EffectOutcome, apply_effects};
    use crate::eval::{Bindings, PlayerSel};
    use crate::state::fixtures::small_state;
    use crate::state::{ActionId, PhaseId, PlayerId};

    fn run(effects: &[Effect]) -> Result<EffectOutcome, EffectError> {
        let (def, state) = (small_def(), small_state());
        let decisions = BTreeMap::new();
        let env = EffectEnv::execution(&def, PlayerId(0), &decisions);
        apply_effects(effects, &state, &Bindings::new(), &env)
    }

    fn push(phase: &str) -> Effect {
        Effect::PushInterruptPhase {
            phase: PhaseId::new(phase),
            resume: None,
        }
    }

    #[test]
    fn interrupts_resume_in_lifo_order() {
        let nested = run(&[push("react"), push("counter")]).unwrap();
        assert_eq!(nested.state.current_phase, PhaseId::new("counter"));
        assert_eq!(nested.state.interrupt_stack.len(), 2);

        let unwound = run(&[
            push("react"),
            push("counter"),
            Effect::PopInterruptPhase,
        ])
        .unwrap();
        assert_eq!(unwound.state.current_phase, PhaseId::new("react"));

        let done = run(&[push("react"), Effect::PopInterruptPhase]).unwrap();
        assert_eq!(done.state.current_phase, PhaseId::new("main"));
        assert!(done.state.interrupt_stack.is_empty());
    }

    #[test]
    fn two_pushes_and_two_pops_restore_the_original_phase() {
        let before = small_state();
        let outcome = run(&[
            push("react"),
            push("counter"),
            Effect::PopInterruptPhase,
            Effect::PopInterruptPhase,
        ])
        .unwrap();
        assert_eq!(outcome.state.current_phase, before.current_phase);
        assert!(outcome.state.interrupt_stack.is_empty());
        assert_eq!(outcome.state.turn_count, before.turn_count);
    }

    #[test]
    fn popping_an_empty_stack_fails() {
        assert!(matches!(
            run(&[Effect::PopInterruptPhase]),
            Err(EffectError::EmptyInterruptStack { .. })
        ));
    }

    #[test]
    fn free_operations_are_granted_per_seat() {
        let outcome = run(&[Effect::GrantFreeOperation {
            player: PlayerSel::AllOther,
            action: Some(ActionId::new("rally")),
            action_class: None,
        }])
        .unwrap();
        let grants = &outcome.state.free_operation_grants;
        assert_eq!(grants.len(), 1);
        assert!(grants[0].matches(PlayerId(1), &ActionId::new("rally"), None));
    }
}
