//! Path compiler and per-chunk automaton driver.
//!
//! A path `/a/b/c` compiles to states `1..=k+1`: state `1` is "outside",
//! state `k+1` is "inside the innermost matching element". Transitions are
//! stored as a flat array of descend/ascend edge pairs indexed by state,
//! mirroring the `stateMachine[]` array built by `createAutoMachine` in the
//! reference implementation, rather than a pointer-linked graph.

pub mod compiler;
pub mod driver;

pub use compiler::{Automaton, CompileError, Edge};
pub use driver::PartialState;
