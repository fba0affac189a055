//! Compiles an absolute child-axis path (`/a/b/c`) into a flat automaton.
//!
//! The shape (a small `compile()` entrypoint producing a flat op/edge table,
//! returning `Result<_, CompileError>`) follows
//! `xpath::compiler::{compile, CompiledExpr}` in the teacher crate. The edge
//! construction itself — a descend edge and its paired ascend edge per path
//! step, with only the last step's pair marked as output-bearing — mirrors
//! `createAutoMachine` in the original reference implementation.

use thiserror::Error;

/// A single path step, matched against an element name byte-for-byte.
pub type Step = Vec<u8>;

/// One transition of the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub label: Step,
    pub to: usize,
    pub emits: bool,
}

/// A compiled path: `k` steps produce states `1..=k+1`.
#[derive(Debug, Clone)]
pub struct Automaton {
    steps: Vec<Step>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("path must start with '/'")]
    MissingLeadingSlash,
    #[error("path must have at least one step")]
    Empty,
    #[error("path step {0} is empty (double '/' or trailing '/')")]
    EmptyStep(usize),
}

impl Automaton {
    /// Compile a path string of the form `/a/b/c`.
    pub fn compile(path: &str) -> Result<Self, CompileError> {
        if !path.starts_with('/') {
            return Err(CompileError::MissingLeadingSlash);
        }

        let steps: Vec<Step> = path[1..].split('/').map(|s| s.as_bytes().to_vec()).collect();

        if steps.is_empty() {
            return Err(CompileError::Empty);
        }
        for (i, step) in steps.iter().enumerate() {
            if step.is_empty() {
                return Err(CompileError::EmptyStep(i + 1));
            }
        }

        Ok(Automaton { steps })
    }

    /// Number of path steps (`k`); states range `1..=k+1`.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// The final, output-bearing state.
    pub fn accepting_state(&self) -> usize {
        self.steps.len() + 1
    }

    /// The descend edge originating at `state`, if `state <= step_count()`.
    pub fn descend_from(&self, state: usize) -> Option<Edge> {
        let idx = state.checked_sub(1)?;
        let label = self.steps.get(idx)?.clone();
        Some(Edge {
            from: state,
            label,
            to: state + 1,
            emits: state + 1 == self.accepting_state(),
        })
    }

    /// The ascend edge originating at `state` (`state >= 2`), if any.
    pub fn ascend_from(&self, state: usize) -> Option<Edge> {
        if state < 2 {
            return None;
        }
        let idx = state.checked_sub(2)?;
        let label = self.steps.get(idx)?.clone();
        Some(Edge {
            from: state,
            label,
            to: state - 1,
            emits: state == self.accepting_state(),
        })
    }

    /// Find a descend edge anywhere in the automaton matching `name`,
    /// searching from the deepest state down to the shallowest — used only
    /// when a chunk's entry context is not yet known (mirrors the reverse
    /// scan over `stateMachine[]` in the reference implementation).
    pub fn find_descend(&self, name: &[u8]) -> Option<Edge> {
        for state in (1..=self.step_count()).rev() {
            if let Some(edge) = self.descend_from(state) {
                if edge.label == name {
                    return Some(edge);
                }
            }
        }
        None
    }

    /// Find an ascend edge anywhere in the automaton matching `/name`,
    /// searching from the deepest state down to the shallowest.
    pub fn find_ascend(&self, name: &[u8]) -> Option<Edge> {
        for state in (2..=self.accepting_state()).rev() {
            if let Some(edge) = self.ascend_from(state) {
                if edge.label == name {
                    return Some(edge);
                }
            }
        }
        None
    }

    /// All edges, descend pairs then ascend pairs, in the order the
    /// reference implementation prints the automaton: forward by step, then
    /// each step's pair together.
    pub fn edges_forward(&self) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(self.steps.len() * 2);
        for state in 1..=self.step_count() {
            edges.push(self.descend_from(state).unwrap());
            edges.push(self.ascend_from(state + 1).unwrap());
        }
        edges
    }

    /// All edges in reverse step order (innermost pair first), matching the
    /// reference's second `print_result`-adjacent pass over `stateMachine[]`.
    pub fn edges_reverse(&self) -> Vec<Edge> {
        let mut edges = self.edges_forward();
        edges.reverse();
        edges
    }
}
