use serde::{Deserialize, Serialize};

use crate::def::{GameDef, TerminalOutcome};
use crate::eval::{Bindings, EvalContext, EvalError, eval_condition, eval_int, resolve_player};
use crate::state::{GameState, PlayerId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub player: PlayerId,
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalResult {
    Win { player: PlayerId },
    Draw,
    /// Highest score first; ties keep seat order.
    Ranking(Vec<RankEntry>),
}

/// Outcome of the first terminal condition that holds, if any.
pub fn terminal_result(def: &GameDef, state: &GameState) -> Result<Option<TerminalResult>, EvalError> {
    let empty = Bindings::new();
    let ctx = EvalContext::new(def, state, &empty, state.active_player);
    for terminal in &def.terminal {
        if !eval_condition(&terminal.when, &ctx)? {
            continue;
        }
        let result = match &terminal.result {
            TerminalOutcome::Win(winner) => TerminalResult::Win {
                player: resolve_player(winner, &ctx)?,
            },
            TerminalOutcome::Draw => TerminalResult::Draw,
            TerminalOutcome::Ranking { score } => {
                let mut ranking = state
                    .players()
                    .map(|player| {
                        let seat = EvalContext::new(def, state, &empty, player);
                        Ok(RankEntry {
                            player,
                            score: eval_int(score, &seat)?,
                        })
                    })
                    .collect::<Result<Vec<_>, EvalError>>()?;
                ranking.sort_by(|a, b| b.score.cmp(&a.score).then(a.player.cmp(&b.player)));
                TerminalResult::Ranking(ranking)
            }
        };
        return Ok(Some(result));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::TerminalCondition;
    use crate::def::fixtures::small_def;
    use crate::eval::{CmpOp, Condition, PlayerSel, Reference, ValueExpr};
    use crate::state::fixtures::small_state;

    fn score() -> ValueExpr {
        ValueExpr::Ref(Reference::PlayerVar {
            player: PlayerSel::Actor,
            var: "score".into(),
        })
    }

    #[test]
    fn first_holding_condition_decides() {
        let mut def = small_def();
        def.terminal = vec![
            TerminalCondition {
                when: Condition::compare(CmpOp::Gte, score(), ValueExpr::int(50)),
                result: TerminalOutcome::Win(PlayerSel::Actor),
            },
            TerminalCondition {
                when: Condition::Const(true),
                result: TerminalOutcome::Ranking { score: score() },
            },
        ];
        let mut state = small_state();
        assert_eq!(
            terminal_result(&def, &state).unwrap(),
            Some(TerminalResult::Ranking(vec![
                RankEntry {
                    player: PlayerId(1),
                    score: 9
                },
                RankEntry {
                    player: PlayerId(0),
                    score: 4
                },
            ]))
        );

        state
            .per_player_vars
            .entry(PlayerId(0))
            .or_default()
            .insert("score".into(), crate::value::Value::Int(50));
        assert_eq!(
            terminal_result(&def, &state).unwrap(),
            Some(TerminalResult::Win {
                player: PlayerId(0)
            })
        );
    }

    #[test]
    fn no_conditions_no_result() {
        assert_eq!(terminal_result(&small_def(), &small_state()).unwrap(), None);
    }
}
