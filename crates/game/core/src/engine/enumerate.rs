//! Budgeted legal-move enumeration.
//!
//! Every declared action yields one template (plus a free-operation variant
//! when the active player holds a matching grant). Templates are expanded
//! depth-first through the choice layer: each pending decision fans out into
//! one candidate per option (chooseOne) or per admissible subset (chooseN).
//! Subsets are produced lazily so the expansion budget trips before a wide
//! decision is ever materialized.

use crate::choice::{ChoiceRequest, IllegalReason, legal_choices_evaluate};
use crate::config::KernelConfig;
use crate::def::{ActionDef, GameDef};
use crate::effect::{DecisionKind, PendingDecision};
use crate::error::ErrorContext;
use crate::moves::{Move, MoveParam};
use crate::state::GameState;
use crate::value::Value;

use super::MoveError;

struct Enumerator<'a> {
    def: &'a GameDef,
    state: &'a GameState,
    config: &'a KernelConfig,
    templates: u32,
    expansions: u32,
    moves: Vec<Move>,
}

impl Enumerator<'_> {
    fn template(&mut self, mv: Move) -> Result<(), MoveError> {
        self.templates += 1;
        if self.templates > self.config.max_templates {
            tracing::warn!(limit = self.config.max_templates, "template budget exhausted");
            return Err(MoveError::TemplateBudgetExceeded {
                limit: self.config.max_templates,
                context: ErrorContext::new().with_value(&mv.action_id),
            });
        }
        self.expand(mv)
    }

    fn expand(&mut self, mv: Move) -> Result<(), MoveError> {
        match legal_choices_evaluate(self.def, self.state, &mv, self.config)? {
            ChoiceRequest::Complete(done) => self.moves.push(done),
            ChoiceRequest::Illegal {
                reason: IllegalReason::Outcome(outcome),
            } if !outcome.view().excluded_from_enumeration => self.moves.push(mv),
            ChoiceRequest::Illegal { reason } => {
                tracing::trace!(action = %mv.action_id, reason = reason.as_str(), "template pruned");
            }
            ChoiceRequest::Pending(choice) => {
                for param in candidates(&choice.decision) {
                    self.expansions += 1;
                    if self.expansions > self.config.max_param_expansions {
                        tracing::warn!(
                            limit = self.config.max_param_expansions,
                            "parameter expansion budget exhausted"
                        );
                        return Err(MoveError::ParamExpansionBudgetExceeded {
                            limit: self.config.max_param_expansions,
                            context: ErrorContext::new()
                                .with_field(choice.decision.decision.as_str())
                                .with_value(&mv.action_id),
                        });
                    }
                    let mut next = mv.clone();
                    next.params.insert(choice.decision.decision.clone(), param);
                    self.expand(next)?;
                }
            }
        }
        Ok(())
    }
}

/// Every answer the decision admits, in enumeration order.
fn candidates(pending: &PendingDecision) -> Box<dyn Iterator<Item = MoveParam> + '_> {
    let options = &pending.options;
    match pending.kind {
        DecisionKind::ChooseOne => Box::new(options.iter().cloned().map(MoveParam::One)),
        DecisionKind::ChooseN => Box::new(
            (pending.min..=pending.max.min(options.len()))
                .flat_map(move |size| Combinations::new(options, size))
                .map(MoveParam::Many),
        ),
    }
}

/// Subsets of `size` items in lexicographic index order.
struct Combinations<'a> {
    items: &'a [Value],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    fn new(items: &'a [Value], size: usize) -> Self {
        let done = size > items.len();
        Self {
            items,
            indices: if done { Vec::new() } else { (0..size).collect() },
            done,
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Vec<Value>> {
        if self.done {
            return None;
        }
        let subset = self.indices.iter().map(|&i| self.items[i].clone()).collect();
        let (n, k) = (self.items.len(), self.indices.len());
        // rightmost index that can still move
        match (0..k).rev().find(|&i| self.indices[i] < n - k + i) {
            Some(pivot) => {
                self.indices[pivot] += 1;
                for i in pivot + 1..k {
                    self.indices[i] = self.indices[i - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(subset)
    }
}

fn template_for(action: &ActionDef) -> Move {
    let mut mv = Move::new(action.id.as_str());
    mv.action_class = action.action_class.clone();
    mv
}

/// Complete moves the active player can make, in declaration order.
///
/// Templates with no completion are pruned. Exceeding `max_templates` or
/// `max_param_expansions` is a fault.
pub fn legal_moves(
    def: &GameDef,
    state: &GameState,
    config: &KernelConfig,
) -> Result<Vec<Move>, MoveError> {
    let mut enumerator = Enumerator {
        def,
        state,
        config,
        templates: 0,
        expansions: 0,
        moves: Vec::new(),
    };
    for action in &def.actions {
        let template = template_for(action);
        let granted = state.free_operation_grants.iter().any(|grant| {
            grant.matches(state.active_player, &action.id, action.action_class.as_deref())
        });
        if granted {
            enumerator.template(template.clone().as_free_operation())?;
        }
        enumerator.template(template)?;
    }
    tracing::trace!(
        count = enumerator.moves.len(),
        templates = enumerator.templates,
        expansions = enumerator.expansions,
        "legal moves enumerated"
    );
    Ok(enumerator.moves)
}
