//! Stitches the `PartialState` produced by each chunk into one
//! `FinalResult`, or decides the document is not stitchable.
//!
//! Grounded directly on `getresult` in the original reference
//! implementation, including its less obvious index arithmetic: a chunk's
//! `entry_queue[0]` is always the presumed-entry value established by the
//! first matched edge in that chunk, and is never folded into the visible
//! "begin stack" — it is the value this chunk assumes was already open when
//! it started, so it is what gets checked against the previous chunk's
//! ending state. Symmetrically, a chunk's `exit_stack` always yields one
//! scalar "end" state (its last element) with the remainder becoming the
//! visible "end stack".

use crate::automaton::PartialState;

/// The result of merging every chunk's `PartialState`, or nothing if the
/// chunks could not be stitched into one consistent automaton run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResult {
    pub begin: usize,
    pub begin_stack: Vec<usize>,
    pub end: usize,
    pub end_stack: Vec<usize>,
    pub outputs: Vec<String>,
}

/// One chunk's contribution, reshaped the way `getresult` reshapes
/// `state_stack[i]` before folding it into the running total.
struct Shaped {
    /// This chunk's own presumed entry state, i.e. `entry_queue[0]`. `None`
    /// if the chunk had no structural events at all (pure text, no tags),
    /// in which case there is nothing to check it against.
    natural_begin: Option<usize>,
    /// The true state open when the chunk finished (`exit_stack`'s last
    /// element), used only to check agreement with the next chunk's
    /// `natural_begin`. Distinct from `end`: `end` is a reduced, already
    /// partly-cancelled view used for display and reconciliation, and for a
    /// chunk with more than one state still open it is not the same value.
    top: usize,
    begin_stack: Vec<usize>,
    end: usize,
    end_stack: Vec<usize>,
}

fn shape(part: &PartialState) -> Option<Shaped> {
    if part.exit_stack.is_empty() {
        return None;
    }

    let natural_begin = part.entry_queue.first().copied();
    let top = *part.exit_stack.last().expect("checked non-empty above");
    let begin_stack = part.entry_queue.iter().skip(1).copied().collect();

    let mut end_stack: Vec<usize> = if part.exit_stack.len() == 1 {
        vec![part.exit_stack[0]]
    } else {
        part.exit_stack[..part.exit_stack.len() - 1].to_vec()
    };
    let end = *end_stack.last().expect("exit_stack is non-empty, so end_stack is too");
    end_stack.pop();

    Some(Shaped { natural_begin, top, begin_stack, end, end_stack })
}

/// Merge a document's chunks, in order, into a `FinalResult`. Returns `None`
/// if any chunk reports an empty `exit_stack` (mirrors the reference's
/// `top_stack==0` bail-out) or if two adjacent chunks don't agree on the
/// state open at their shared boundary.
pub fn merge(parts: &[PartialState]) -> Option<FinalResult> {
    let mut final_result: Option<FinalResult> = None;
    let mut running_top: usize = 0;

    for part in parts {
        let shaped = shape(part)?;

        match &mut final_result {
            None => {
                final_result = Some(FinalResult {
                    begin: shaped.natural_begin.unwrap_or(1),
                    begin_stack: shaped.begin_stack,
                    end: shaped.end,
                    end_stack: shaped.end_stack,
                    outputs: part.outputs.clone(),
                });
            }
            Some(running) => {
                if let Some(natural_begin) = shaped.natural_begin {
                    if running_top != natural_begin {
                        return None;
                    }
                }
                reconcile(running, shaped);
                running.outputs.extend(part.outputs.iter().cloned());
            }
        }

        running_top = part
            .exit_stack
            .last()
            .copied()
            .unwrap_or(running_top);
    }

    final_result
}

/// Reconcile the running `end_stack` against the next chunk's `begin_stack`:
/// if the deepest pending opens on the left match the right chunk's
/// presumed entries (compared in reverse), they cancel and the right
/// chunk's `end_stack` replaces the tail; otherwise the right chunk's
/// `end_stack` is appended, since the two describe disjoint segments.
fn reconcile(running: &mut FinalResult, shaped: Shaped) {
    let matches = running.end_stack.len() == shaped.begin_stack.len()
        && shaped
            .begin_stack
            .iter()
            .enumerate()
            .all(|(k, v)| running.end_stack.get(shaped.begin_stack.len() - k - 1) == Some(v));

    if matches {
        running.end_stack = shaped.end_stack;
    } else {
        running.end_stack.extend(shaped.end_stack);
    }
    running.end = shaped.end;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{compiler::Automaton, driver::process_chunk};

    fn parse(path: &str, xml: &[u8]) -> PartialState {
        let automaton = Automaton::compile(path).unwrap();
        let (state, err) = process_chunk(&automaton, xml);
        assert!(err.is_none());
        state
    }

    #[test]
    fn stack_balance_on_well_formed_document() {
        let part = parse("/a/b", b"<a><b>x</b></a>");
        let result = merge(&[part]).expect("well-formed document should stitch");
        assert_eq!(result.begin, 1);
        assert!(result.begin_stack.is_empty());
        assert_eq!(result.end, 1);
        assert!(result.end_stack.is_empty());
        assert_eq!(result.outputs, vec!["x".to_string()]);
    }

    #[test]
    fn three_chunks_reassemble_in_document_order() {
        let automaton = Automaton::compile("/r/i").unwrap();
        let chunks: Vec<&[u8]> = vec![b"<r><i>1</i>", b"<i>2</i>", b"<i>3</i></r>"];
        let parts: Vec<PartialState> = chunks
            .iter()
            .map(|c| {
                let (state, err) = process_chunk(&automaton, c);
                assert!(err.is_none());
                state
            })
            .collect();

        let result = merge(&parts).expect("chunked parse of a balanced document should stitch");
        assert_eq!(result.outputs, vec!["1", "2", "3"]);
        assert_eq!(result.begin, 1);
        assert_eq!(result.end, 1);
    }

    #[test]
    fn parallel_equals_sequential() {
        let automaton = Automaton::compile("/r/i").unwrap();
        let whole = b"<r><i>1</i><i>2</i><i>3</i></r>";
        let (sequential, _) = process_chunk(&automaton, whole);
        let sequential_result = merge(&[sequential]).unwrap();

        let chunked: Vec<&[u8]> = vec![b"<r><i>1</i><i>2</i>", b"<i>3</i></r>"];
        let parts: Vec<PartialState> = chunked
            .iter()
            .map(|c| process_chunk(&automaton, c).0)
            .collect();
        let chunked_result = merge(&parts).unwrap();

        assert_eq!(sequential_result.outputs, chunked_result.outputs);
        assert_eq!(sequential_result.begin, chunked_result.begin);
        assert_eq!(sequential_result.end, chunked_result.end);
    }

    #[test]
    fn discontinuous_chunks_are_unstitchable() {
        // The first chunk closes cleanly back to the root state (end == 1).
        // The second chunk opens as if it were starting at depth 2 (inside
        // an already-open <a>), which disagrees with the first chunk's end.
        let automaton = Automaton::compile("/a/b").unwrap();
        let first = parse("/a/b", b"<a><b>x</b></a>");
        let second = {
            let (state, _) = process_chunk(&automaton, b"<b>y</b>");
            state
        };
        assert!(merge(&[first, second]).is_none());
    }

    #[test]
    fn empty_exit_stack_chunk_is_unstitchable() {
        let part = PartialState::default();
        assert!(merge(&[part]).is_none());
    }

    #[test]
    fn document_with_no_matching_element_is_null_not_empty() {
        // Nothing in this document ever matches /a/b, so no edge is ever
        // established and `exit_stack` never leaves its initial empty state.
        let part = parse("/a/b", b"<x>y</x>");
        assert!(merge(&[part]).is_none());
    }

    #[test]
    fn chunk_with_no_tags_is_transparent_to_continuity() {
        // A pure-text chunk never reaches `establish_entry`, so its
        // `exit_stack` is empty and it bails out under the same rule as a
        // document with no recognizable structure at all — matching the
        // reference's `top_stack==0` check, which does not special-case an
        // all-text chunk sitting between two structural ones.
        let automaton = Automaton::compile("/a").unwrap();
        let first = parse("/a", b"<a>x</a>");
        let (empty, _) = process_chunk(&automaton, b"   ");
        assert!(merge(&[first, empty]).is_none());
    }
}
