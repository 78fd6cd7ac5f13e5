//! Deterministic replay of move scripts.

use game_kernel::{
    GameDef, GameState, KernelConfig, Resolution, Rng, StateHash, Warning, apply_move,
    complete_template_move, initial_state,
};

use crate::loaders::{LoadResult, MoveScript, ScriptStep};

/// Outcome of a replayed script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay {
    pub state: GameState,
    /// Hash after setup, then after every step.
    pub hashes: Vec<StateHash>,
    pub warnings: Vec<Warning>,
}

/// Plays `script` from the initial state of `def`.
///
/// Random completions draw from a generator forked off the script seed, so
/// they never disturb the game's own random stream.
pub fn replay(def: &GameDef, script: &MoveScript, config: &KernelConfig) -> LoadResult<Replay> {
    let mut state = initial_state(def, script.seed, script.players, config)?;
    let (_, mut chooser) = Rng::new(script.seed).fork();
    let mut hashes = vec![state.state_hash];
    let mut warnings = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        let mv = match step {
            ScriptStep::Apply(mv) => mv.clone(),
            ScriptStep::Complete(template) => {
                let (resolution, next) =
                    complete_template_move(def, &state, template, chooser, config)?;
                chooser = next;
                match resolution {
                    Resolution::Complete(mv) => mv,
                    Resolution::Unplayable(reason) => anyhow::bail!(
                        "step {}: `{}` cannot be completed ({})",
                        index,
                        template.action_id,
                        reason.as_str()
                    ),
                }
            }
        };
        let result = apply_move(def, &state, &mv, config)
            .map_err(|e| anyhow::anyhow!("step {}: {}", index, e))?;
        tracing::debug!(step = index, action = %mv.action_id, hash = %result.state.state_hash, "replayed move");
        state = result.state;
        hashes.push(state.state_hash);
        warnings.extend(result.warnings);
    }

    Ok(Replay {
        state,
        hashes,
        warnings,
    })
}
