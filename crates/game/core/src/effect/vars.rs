//! Variable effects: `setVar`, `addVar`, `transferVar`.
//!
//! Int writes are clamped to the declared bounds. Writes of the wrong type
//! are type mismatches.

use super::context::EffectContext;
use super::{EffectError, VarTarget};
use crate::def::VarDef;
use crate::error::ErrorContext;
use crate::eval::{
    ArithOp, EvalError, ValueExpr, apply_arith, eval_int, eval_value, resolve_players,
};
use crate::state::PlayerId;
use crate::trigger::KernelEvent;
use crate::value::{Value, is_safe_integer};

/// One concrete variable cell.
#[derive(Clone, Debug)]
enum Slot {
    Global(String),
    Player(PlayerId, String),
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Slot::Global(name) | Slot::Player(_, name) => name,
        }
    }

    fn player(&self) -> Option<PlayerId> {
        match self {
            Slot::Global(_) => None,
            Slot::Player(player, _) => Some(*player),
        }
    }
}

fn slots(ctx: &EffectContext<'_>, target: &VarTarget) -> Result<Vec<Slot>, EvalError> {
    match target {
        VarTarget::Global(name) => Ok(vec![Slot::Global(name.clone())]),
        VarTarget::Player { player, var } => Ok(resolve_players(player, &ctx.eval())?
            .into_iter()
            .map(|p| Slot::Player(p, var.clone()))
            .collect()),
    }
}

fn single_slot(ctx: &EffectContext<'_>, target: &VarTarget) -> Result<Slot, EvalError> {
    let mut all = slots(ctx, target)?;
    if all.len() != 1 {
        return Err(EvalError::AmbiguousPlayer {
            count: all.len(),
            context: ErrorContext::new().with_effect("transferVar"),
        });
    }
    Ok(all.remove(0))
}

fn declaration<'d>(ctx: &EffectContext<'d>, slot: &Slot) -> Result<&'d VarDef, EvalError> {
    let def = ctx.def();
    match slot {
        Slot::Global(name) => def.global_var(name),
        Slot::Player(_, name) => def.player_var(name),
    }
    .ok_or_else(|| EvalError::missing_variable(slot.name()))
}

fn read(ctx: &EffectContext<'_>, slot: &Slot) -> Result<Value, EvalError> {
    let current = match slot {
        Slot::Global(name) => ctx.state.global_vars.get(name),
        Slot::Player(player, name) => ctx.state.player_var(*player, name),
    };
    match current {
        Some(value) => Ok(value.clone()),
        None => Ok(declaration(ctx, slot)?.initial.clone()),
    }
}

fn read_int(ctx: &EffectContext<'_>, slot: &Slot) -> Result<i64, EvalError> {
    match read(ctx, slot)? {
        Value::Int(v) => Ok(v),
        other => Err(EvalError::type_mismatch(slot.name(), other)),
    }
}

fn write(ctx: &mut EffectContext<'_>, slot: &Slot, value: Value) -> Result<(), EvalError> {
    let decl = declaration(ctx, slot)?;
    if value.value_type() != decl.ty {
        return Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_field(slot.name())
                .with_value(&value)
                .with_message(format!("variable is declared {}", decl.ty)),
        });
    }
    let value = match value {
        Value::Int(v) if !is_safe_integer(v) => {
            return Err(EvalError::type_mismatch(slot.name(), v));
        }
        Value::Int(v) => Value::Int(decl.clamp(v)),
        other => other,
    };

    let old = read(ctx, slot)?;
    match slot {
        Slot::Global(name) => {
            ctx.state.global_vars.insert(name.clone(), value.clone());
        }
        Slot::Player(player, name) => {
            ctx.state
                .per_player_vars
                .entry(*player)
                .or_default()
                .insert(name.clone(), value.clone());
        }
    }
    if old != value {
        ctx.emit(KernelEvent::VarChanged {
            var: slot.name().to_owned(),
            player: slot.player(),
            old,
            new: value,
        });
    }
    Ok(())
}

pub(super) fn set_var(
    ctx: &mut EffectContext<'_>,
    target: &VarTarget,
    value: &ValueExpr,
) -> Result<(), EffectError> {
    let value = eval_value(value, &ctx.eval())?;
    for slot in slots(ctx, target)? {
        write(ctx, &slot, value.clone())?;
    }
    Ok(())
}

pub(super) fn add_var(
    ctx: &mut EffectContext<'_>,
    target: &VarTarget,
    delta: &ValueExpr,
) -> Result<(), EffectError> {
    let delta = eval_int(delta, &ctx.eval())?;
    for slot in slots(ctx, target)? {
        let current = read_int(ctx, &slot)?;
        let next = apply_arith(ArithOp::Add, current, delta)?;
        write(ctx, &slot, Value::Int(next))?;
    }
    Ok(())
}

/// Moves as much of `amount` as the source can spare and the destination
/// can hold.
pub(super) fn transfer_var(
    ctx: &mut EffectContext<'_>,
    from: &VarTarget,
    to: &VarTarget,
    amount: &ValueExpr,
) -> Result<(), EffectError> {
    let amount = eval_int(amount, &ctx.eval())?;
    if amount < 0 {
        return Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_effect("transferVar")
                .with_field("amount")
                .with_value(amount)
                .with_message("amount must be non-negative"),
        }
        .into());
    }
    let source = single_slot(ctx, from)?;
    let sink = single_slot(ctx, to)?;
    let (have, want) = (read_int(ctx, &source)?, read_int(ctx, &sink)?);

    let spare = declaration(ctx, &source)?
        .min
        .map_or(amount, |min| have.saturating_sub(min).max(0));
    let room = declaration(ctx, &sink)?
        .max
        .map_or(amount, |max| max.saturating_sub(want).max(0));
    let moved = amount.min(spare).min(room);
    if moved == 0 {
        return Ok(());
    }
    write(ctx, &source, Value::Int(apply_arith(ArithOp::Sub, have, moved)?))?;
    write(ctx, &sink, Value::Int(apply_arith(ArithOp::Add, want, moved)?))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::def::fixtures::small_def;
    use crate::effect::{Effect, EffectEnv, EffectError, VarTarget, apply_effects};
    use crate::eval::{Bindings, EvalError, PlayerSel, ValueExpr};
    use crate::state::PlayerId;
    use crate::state::fixtures::small_state;
    use crate::trigger::KernelEvent;
    use crate::value::Value;

    fn score(player: PlayerSel) -> VarTarget {
        VarTarget::Player {
            player,
            var: "score".into(),
        }
    }

    fn run(effects: &[Effect]) -> Result<crate::effect::EffectOutcome, EffectError> {
        let (def, state) = (small_def(), small_state());
        let decisions = BTreeMap::new();
        let env = EffectEnv::execution(&def, PlayerId(0), &decisions);
        apply_effects(effects, &state, &Bindings::new(), &env)
    }

    #[test]
    fn int_writes_clamp_and_emit_changes() {
        let outcome = run(&[
            Effect::AddVar {
                target: score(PlayerSel::All),
                delta: ValueExpr::int(95),
            },
            Effect::SetVar {
                target: VarTarget::Global("round".into()),
                value: ValueExpr::int(0),
            },
        ])
        .unwrap();
        assert_eq!(outcome.state.player_var(PlayerId(0), "score"), Some(&Value::Int(99)));
        assert_eq!(outcome.state.player_var(PlayerId(1), "score"), Some(&Value::Int(100)));
        assert_eq!(outcome.state.global_vars.get("round"), Some(&Value::Int(1)));
        // round was already 1, so only the two score changes are reported
        assert_eq!(outcome.events.len(), 2);
        assert!(matches!(
            &outcome.events[1],
            KernelEvent::VarChanged { player: Some(PlayerId(1)), new: Value::Int(100), .. }
        ));
    }

    #[test]
    fn writes_are_type_checked() {
        let err = run(&[Effect::SetVar {
            target: score(PlayerSel::Active),
            value: Value::from("lots").into(),
        }])
        .unwrap_err();
        assert!(matches!(err, EffectError::Eval(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn transfer_is_limited_by_bounds() {
        let outcome = run(&[Effect::TransferVar {
            from: score(PlayerSel::Id(0)),
            to: score(PlayerSel::Id(1)),
            amount: ValueExpr::int(10),
        }])
        .unwrap();
        assert_eq!(outcome.state.player_var(PlayerId(0), "score"), Some(&Value::Int(0)));
        assert_eq!(outcome.state.player_var(PlayerId(1), "score"), Some(&Value::Int(13)));
    }
}
