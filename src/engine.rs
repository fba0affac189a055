//! Runs a compiled automaton over a document: split, parse each chunk
//! (optionally in parallel), merge.
//!
//! The parallel path follows `strategy::parallel::evaluate_parallel` in the
//! teacher crate — a `rayon` `par_iter().map().collect()` over independent
//! units of work, generalized here from "one XPath query per task" to "one
//! chunk per task".

use crate::automaton::{Automaton, PartialState};
use crate::error::ParseError;
use crate::merge::{self, FinalResult};
use crate::split;
use rayon::prelude::*;

/// One chunk's outcome: the state it produced, and `Some(message)` if its
/// tokenizer hit malformed input.
pub struct ChunkOutcome {
    pub state: PartialState,
    pub error: Option<String>,
}

/// The result of a full run: either a stitched `FinalResult`, or `None`
/// together with the first chunk parse error encountered, if any.
pub struct RunOutcome {
    pub result: Option<FinalResult>,
    pub first_error: Option<ParseError>,
}

fn run_chunk(automaton: &Automaton, chunk: &[u8]) -> ChunkOutcome {
    let (state, error) = crate::automaton::driver::process_chunk(automaton, chunk);
    ChunkOutcome { state, error }
}

/// Sequential mode: the whole document is one chunk.
pub fn run_sequential(automaton: &Automaton, input: &[u8]) -> RunOutcome {
    run_with_chunks(automaton, vec![input])
}

/// Parallel mode: split into `threads` chunks and drive them concurrently
/// via `rayon`.
pub fn run_parallel(automaton: &Automaton, input: &[u8], threads: usize) -> RunOutcome {
    let chunks = split::split(input, threads);
    tracing::debug!(requested = threads, effective = chunks.len(), "split document into chunks");

    let outcomes: Vec<ChunkOutcome> =
        chunks.par_iter().map(|chunk| run_chunk(automaton, chunk)).collect();

    finish(outcomes)
}

fn run_with_chunks(automaton: &Automaton, chunks: Vec<&[u8]>) -> RunOutcome {
    let outcomes: Vec<ChunkOutcome> = chunks.iter().map(|chunk| run_chunk(automaton, chunk)).collect();
    finish(outcomes)
}

fn finish(outcomes: Vec<ChunkOutcome>) -> RunOutcome {
    let first_error = outcomes.iter().find_map(|o| {
        o.error.as_ref().map(|message| ParseError::MalformedXml {
            message: message.clone(),
            position: 0,
        })
    });

    let states: Vec<PartialState> = outcomes.into_iter().map(|o| o.state).collect();
    let result = if first_error.is_some() { None } else { merge::merge(&states) };

    RunOutcome { result, first_error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::compiler::Automaton;

    #[test]
    fn sequential_and_parallel_agree_on_a_well_formed_document() {
        let automaton = Automaton::compile("/r/i").unwrap();
        let doc = b"<r><i>1</i><i>2</i><i>3</i></r>";

        let sequential = run_sequential(&automaton, doc);
        let parallel = run_parallel(&automaton, doc, 3);

        assert_eq!(
            sequential.result.as_ref().unwrap().outputs,
            parallel.result.as_ref().unwrap().outputs
        );
    }

    #[test]
    fn unterminated_tag_surfaces_as_first_error_with_no_result() {
        let automaton = Automaton::compile("/root").unwrap();
        let outcome = run_sequential(&automaton, b"<root");
        assert!(outcome.result.is_none());
        assert!(outcome.first_error.is_some());
    }

    #[test]
    fn document_with_no_matching_element_is_unstitchable() {
        let automaton = Automaton::compile("/a/b").unwrap();
        let outcome = run_sequential(&automaton, b"<x>y</x>");
        assert!(outcome.result.is_none());
        assert!(outcome.first_error.is_none());
    }
}
