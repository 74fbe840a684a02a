//! Pragma kinds, clause sets, and per-directive generated names.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// The construct a pragma requests.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum DirectiveKind {
    Parallel,
    ParallelFor,
    For,
    Sections,
    Section,
    Single,
    Master,
    Critical,
    Barrier,
    Atomic,
}

impl DirectiveKind {
    /// Spawning directives create a context object, an executor, and a
    /// team of worker tasks. Everything else only wraps code that already
    /// runs on an enclosing team.
    pub fn is_spawning(self) -> bool {
        matches!(self, DirectiveKind::Parallel | DirectiveKind::ParallelFor)
    }

    /// Directives that end with an implicit team-wide barrier.
    pub fn has_implicit_barrier(self) -> bool {
        matches!(
            self,
            DirectiveKind::For | DirectiveKind::Sections | DirectiveKind::Single
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DirectiveKind::Parallel => "parallel",
            DirectiveKind::ParallelFor => "parallel for",
            DirectiveKind::For => "for",
            DirectiveKind::Sections => "sections",
            DirectiveKind::Section => "section",
            DirectiveKind::Single => "single",
            DirectiveKind::Master => "master",
            DirectiveKind::Critical => "critical",
            DirectiveKind::Barrier => "barrier",
            DirectiveKind::Atomic => "atomic",
        }
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Reduction combiners.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ReductionOp {
    Add,
    Mul,
    Sub,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
}

impl ReductionOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ReductionOp::Add => "+",
            ReductionOp::Mul => "*",
            ReductionOp::Sub => "-",
            ReductionOp::BitAnd => "&",
            ReductionOp::BitOr => "|",
            ReductionOp::BitXor => "^",
            ReductionOp::LogicalAnd => "&&",
            ReductionOp::LogicalOr => "||",
        }
    }

    /// Per-worker seed value. The combination loop folds into the live
    /// variable, so only the neutral element matters here. `-` combines
    /// with `+` as usual.
    pub fn identity_text(self) -> &'static str {
        match self {
            ReductionOp::Add | ReductionOp::Sub | ReductionOp::BitOr | ReductionOp::BitXor => "0",
            ReductionOp::Mul => "1",
            ReductionOp::BitAnd => "-1",
            ReductionOp::LogicalAnd => "true",
            ReductionOp::LogicalOr => "false",
        }
    }

    /// The operator the combination loop applies; `-` reduces by summing
    /// the per-worker deltas.
    pub fn combine_symbol(self) -> &'static str {
        match self {
            ReductionOp::Sub => "+",
            other => other.symbol(),
        }
    }
}

/// Data-sharing and scheduling attributes of one pragma.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Clauses {
    pub private_vars: IndexSet<String>,
    pub firstprivate_vars: IndexSet<String>,
    /// Explicitly shared names (`shared(...)`, spelled `public(...)` in the
    /// original pragma dialect). Captured variables are shared by default;
    /// the clause only exists so intent can be stated and checked.
    pub shared_vars: IndexSet<String>,
    pub reduction_vars: IndexMap<String, ReductionOp>,
    pub thread_num: Option<u32>,
}

impl Clauses {
    /// Names that get a per-worker slot in the context object.
    pub fn privatized(&self) -> IndexSet<String> {
        let mut out = self.private_vars.clone();
        out.extend(self.firstprivate_vars.iter().cloned());
        out.extend(self.reduction_vars.keys().cloned());
        out
    }

    /// Whether `name` already appears in any data-sharing clause.
    pub fn mentions(&self, name: &str) -> bool {
        self.private_vars.contains(name)
            || self.firstprivate_vars.contains(name)
            || self.shared_vars.contains(name)
            || self.reduction_vars.contains_key(name)
    }
}

/// Identifiers synthesized for one directive, allocated at discovery in
/// document order so output is deterministic.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedNames {
    pub context_class: String,
    pub context_var: String,
    pub executor_var: String,
    pub nth_var: String,
    pub tid_var: String,
    pub barrier_var: String,
    pub thrown_var: String,
    pub loop_var: String,
}

impl GeneratedNames {
    pub fn new(ordinal: usize) -> Self {
        Self {
            context_class: format!("JavampContext_{ordinal}"),
            context_var: format!("javampCtx_{ordinal}"),
            executor_var: format!("javampExec_{ordinal}"),
            nth_var: format!("javampNth_{ordinal}"),
            tid_var: format!("javampTid_{ordinal}"),
            barrier_var: format!("javampBarrier_{ordinal}"),
            thrown_var: format!("javampThrown_{ordinal}"),
            loop_var: format!("javampT_{ordinal}"),
        }
    }
}

/// Class name of the per-unit executor emitted alongside translated code.
pub const EXECUTOR_CLASS: &str = "JavampExecutor";
