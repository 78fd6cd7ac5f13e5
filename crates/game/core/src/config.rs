use serde::{Deserialize, Serialize};

/// Kernel budgets and tunable switches.
///
/// Every unbounded recursion in the kernel (trigger cascades, choice loops,
/// move enumeration) is capped by one of these counters so runaway
/// expansion becomes a deterministic fault instead of a hang.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Maximum trigger cascade depth. Deeper firings are truncated with a warning.
    pub max_trigger_depth: u32,
    /// Maximum next-decision iterations while resolving a single move.
    pub max_choice_steps: u32,
    /// Maximum action templates considered by one `legal_moves` call.
    pub max_templates: u32,
    /// Maximum parameter bindings expanded by one `legal_moves` call.
    pub max_param_expansions: u32,
    /// Maximum option probes per decision; unprobed options are reported as unknown.
    pub max_decision_probes: u32,
    /// Maximum automatic phase advances after a move.
    pub max_phase_advances: u32,
    /// Maximum items one range query may produce.
    pub max_query_items: u32,
    /// Offer illegal options when no legal or unknown option exists.
    pub allow_illegal_fallback: bool,
    /// Record an effect trace in `ApplyMoveResult`.
    pub collect_trace: bool,
}

impl KernelConfig {
    pub const DEFAULT_MAX_TRIGGER_DEPTH: u32 = 8;
    pub const DEFAULT_MAX_CHOICE_STEPS: u32 = 64;
    pub const DEFAULT_MAX_TEMPLATES: u32 = 256;
    pub const DEFAULT_MAX_PARAM_EXPANSIONS: u32 = 1024;
    pub const DEFAULT_MAX_DECISION_PROBES: u32 = 512;
    pub const DEFAULT_MAX_PHASE_ADVANCES: u32 = 32;
    pub const DEFAULT_MAX_QUERY_ITEMS: u32 = 4096;

    pub fn new() -> Self {
        Self {
            max_trigger_depth: Self::DEFAULT_MAX_TRIGGER_DEPTH,
            max_choice_steps: Self::DEFAULT_MAX_CHOICE_STEPS,
            max_templates: Self::DEFAULT_MAX_TEMPLATES,
            max_param_expansions: Self::DEFAULT_MAX_PARAM_EXPANSIONS,
            max_decision_probes: Self::DEFAULT_MAX_DECISION_PROBES,
            max_phase_advances: Self::DEFAULT_MAX_PHASE_ADVANCES,
            max_query_items: Self::DEFAULT_MAX_QUERY_ITEMS,
            allow_illegal_fallback: false,
            collect_trace: false,
        }
    }

    pub fn with_trigger_depth(max_trigger_depth: u32) -> Self {
        Self {
            max_trigger_depth,
            ..Self::new()
        }
    }

    pub fn with_choice_steps(max_choice_steps: u32) -> Self {
        Self {
            max_choice_steps,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn illegal_fallback(mut self, allow: bool) -> Self {
        self.allow_illegal_fallback = allow;
        self
    }

    #[must_use]
    pub fn tracing(mut self, collect: bool) -> Self {
        self.collect_trace = collect;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}
