//! Per-chunk automaton execution: consumes tokens from `core::tokenizer`,
//! advances the automaton, and collects the `PartialState` describing what
//! happened without any knowledge of what came before this chunk.
//!
//! Grounded directly on `xml_process`/`push`/`pop` in the original reference
//! implementation. Three behaviors are load-bearing and easy to get wrong by
//! "cleaning up" the design, so they are called out here:
//!
//! - A self-closing tag (`<b/>`) never touches the automaton at all — it is
//!   not treated as an open-then-close pair. The reference's state machine
//!   never runs its tag-name search for the self-closing path.
//! - Whether a text run is collected depends only on whether the *single tag
//!   immediately preceding it* matched an output-bearing edge — not on a
//!   maintained nesting depth. A non-matching nested tag silently clears
//!   eligibility for the text that follows it.
//! - Only the leading ASCII space character (`' '`, not tab/newline) is
//!   trimmed from emitted text.

use super::compiler::{Automaton, Edge};
use std::borrow::Cow;

/// What one chunk's parse produced, independent of any other chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialState {
    /// States this chunk presumed were already open on entry, in the order
    /// they were discovered (index 0 is the initial presumption; later
    /// entries come from an ascend with no matching descend in this chunk).
    pub entry_queue: Vec<usize>,
    /// The automaton states open at chunk end, outermost first.
    pub exit_stack: Vec<usize>,
    /// Collected text fragments, in document order.
    pub outputs: Vec<String>,
}

impl PartialState {
    pub fn is_empty_run(&self) -> bool {
        self.entry_queue.is_empty() && self.exit_stack.is_empty() && self.outputs.is_empty()
    }
}

/// Drives one chunk's tokens through the automaton.
pub struct Driver<'a> {
    automaton: &'a Automaton,
    entry_queue: Vec<usize>,
    exit_stack: Vec<usize>,
    entry_fixed: bool,
    last_match_emits: bool,
    outputs: Vec<String>,
}

impl<'a> Driver<'a> {
    pub fn new(automaton: &'a Automaton) -> Self {
        Driver {
            automaton,
            entry_queue: Vec::new(),
            exit_stack: Vec::new(),
            entry_fixed: false,
            last_match_emits: false,
            outputs: Vec::new(),
        }
    }

    fn establish_entry(&mut self, edge: &Edge) {
        if !self.entry_fixed {
            self.entry_queue.push(edge.from);
            self.exit_stack.push(edge.from);
            self.entry_fixed = true;
        }
    }

    pub fn on_open(&mut self, name: &[u8]) {
        match self.automaton.find_descend(name) {
            Some(edge) => {
                self.establish_entry(&edge);
                self.exit_stack.push(edge.to);
                self.last_match_emits = edge.emits;
            }
            None => self.last_match_emits = false,
        }
    }

    pub fn on_close(&mut self, name: &[u8]) {
        if let Some(edge) = self.automaton.find_ascend(name) {
            self.establish_entry(&edge);
            self.apply_ascend(edge.to);
        }
        // A close never hands off to a following text run: the state after
        // any ascend is never the emitting state (to = from - 1).
        self.last_match_emits = false;
    }

    /// Mirrors `pop()`: cancel the top of the stack if the state beneath it
    /// matches where we're ascending to; otherwise this ascend had no
    /// matching descend in this chunk, so it overwrites the top and is
    /// recorded in the entry queue as well.
    fn apply_ascend(&mut self, to: usize) {
        let top = self.exit_stack.len();
        let second_from_top = if top > 1 { Some(self.exit_stack[top - 2]) } else { None };

        if second_from_top == Some(to) {
            self.exit_stack.pop();
        } else if let Some(slot) = self.exit_stack.last_mut() {
            *slot = to;
            self.entry_queue.push(to);
        }
    }

    pub fn on_text(&mut self, content: &[u8]) {
        let eligible = self.last_match_emits;
        self.last_match_emits = false;
        if !eligible {
            return;
        }
        let trimmed = left_trim_spaces(content);
        if trimmed.is_empty() {
            return;
        }
        self.outputs.push(String::from_utf8_lossy(trimmed).into_owned());
    }

    pub fn finish(self) -> PartialState {
        PartialState {
            entry_queue: self.entry_queue,
            exit_stack: self.exit_stack,
            outputs: self.outputs,
        }
    }
}

fn left_trim_spaces(content: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < content.len() && content[i] == b' ' {
        i += 1;
    }
    &content[i..]
}

/// Run the tokenizer over one chunk and produce its `PartialState`.
///
/// A tokenizer error is reported alongside whatever partial progress had
/// already been made, so the merger can still fold in the successful
/// chunks around it. CDATA, comments, processing instructions, and DOCTYPE
/// are recognized by the tokenizer but are complete no-ops here: they never
/// open/close automaton states and never clear text eligibility.
pub fn process_chunk(automaton: &Automaton, chunk: &[u8]) -> (PartialState, Option<String>) {
    use crate::core::tokenizer::{Token, TokenKind, Tokenizer};

    let mut driver = Driver::new(automaton);
    let mut tokenizer = Tokenizer::new(chunk);

    while let Some(token) = tokenizer.next_token() {
        let Token { kind, name, content, .. } = token;
        match kind {
            TokenKind::StartTag => {
                if let Some(name) = name {
                    driver.on_open(name_bytes(&name));
                }
            }
            TokenKind::EndTag => {
                if let Some(name) = name {
                    driver.on_close(name_bytes(&name));
                }
            }
            TokenKind::EmptyTag => {
                // Self-closing tags never reach the automaton; see module docs.
            }
            TokenKind::Text => {
                if let Some(content) = content {
                    driver.on_text(content_bytes(&content));
                }
            }
            TokenKind::CData
            | TokenKind::Comment
            | TokenKind::ProcessingInstruction
            | TokenKind::DocType
            | TokenKind::Eof => {}
        }
    }

    let error = tokenizer.error().map(|e| e.message.clone());
    (driver.finish(), error)
}

fn name_bytes<'a>(c: &'a Cow<'a, [u8]>) -> &'a [u8] {
    c.as_ref()
}

fn content_bytes<'a>(c: &'a Cow<'a, [u8]>) -> &'a [u8] {
    c.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(path: &str, xml: &[u8]) -> PartialState {
        let automaton = Automaton::compile(path).unwrap();
        let (state, err) = process_chunk(&automaton, xml);
        assert!(err.is_none(), "unexpected parse error: {err:?}");
        state
    }

    #[test]
    fn s1_direct_child_match() {
        let state = run("/a/b", b"<a><b>x</b></a>");
        assert_eq!(state.outputs, vec!["x".to_string()]);
    }

    #[test]
    fn s2_text_in_descendant_of_match_not_collected() {
        let state = run("/a", b"<a><b>x</b></a>");
        assert!(state.outputs.is_empty());
    }

    #[test]
    fn s3_repeated_siblings() {
        let state = run("/r/i", b"<r><i>1</i><i>2</i><i>3</i></r>");
        assert_eq!(state.outputs, vec!["1", "2", "3"]);
    }

    #[test]
    fn s4_self_closing_is_invisible() {
        let state = run("/a/b", b"<a><b/><b>y</b></a>");
        assert_eq!(state.outputs, vec!["y".to_string()]);
    }

    #[test]
    fn s5_comment_is_ignored() {
        let state = run("/a/b", b"<a><!-- <b>z</b> --><b>q</b></a>");
        assert_eq!(state.outputs, vec!["q".to_string()]);
    }

    #[test]
    fn balanced_document_settles_back_on_the_root_state() {
        // The root state (1) established at the very first open is never
        // popped again once the document closes cleanly back to it; `merge`
        // is what turns this into an empty entry/exit sequence (see
        // `merge::tests::stack_balance_on_well_formed_document`).
        let state = run("/a/b", b"<a><b>x</b></a>");
        assert_eq!(state.exit_stack, vec![1]);
        assert_eq!(state.entry_queue, vec![1]);
    }

    #[test]
    fn unmatched_close_is_recorded_in_entry_queue() {
        // Neither close has a prior matching open in this chunk: each one
        // overwrites the single-element exit stack and adds to the entry
        // queue, exactly as `pop()` does when `top_stack` stays at 1.
        let automaton = Automaton::compile("/a/b").unwrap();
        let (state, err) = process_chunk(&automaton, b"</b></a>");
        assert!(err.is_none());
        assert_eq!(state.entry_queue, vec![3, 2, 1]);
        assert_eq!(state.exit_stack, vec![1]);
    }

    #[test]
    fn only_leading_space_is_trimmed() {
        let state = run("/a", b"<a>  hi  </a>");
        assert_eq!(state.outputs, vec!["hi  ".to_string()]);
    }

    #[test]
    fn text_after_innermost_close_is_not_collected() {
        // The ascend back out of the matching state must not leave
        // `last_match_emits` set: "tail" sits outside </b>, not inside it.
        let state = run("/a/b", b"<a><b>x</b>tail</a>");
        assert_eq!(state.outputs, vec!["x".to_string()]);
    }

    #[test]
    fn nested_same_name_element_still_matches() {
        // The inner <b> re-enters the same accepting edge as the outer one;
        // matching is a global name lookup, not gated on current depth.
        let state = run("/a/b", b"<a><b><b>x</b></b></a>");
        assert_eq!(state.outputs, vec!["x".to_string()]);
    }
}
