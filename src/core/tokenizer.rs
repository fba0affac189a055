//! XML tokenizer: a pull-parser state machine that classifies a byte slice
//! into structural tokens (start/end/empty tags, text, comments, CDATA,
//! processing instructions). Full XML 1.0 conformance, DTD validation, and
//! entity decoding are out of scope: text and attribute content are passed
//! through as raw bytes.

use super::scanner::Scanner;
use std::borrow::Cow;

/// Current parsing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Initial state before parsing starts.
    Init,
    /// Inside text content between tags.
    InsideText,
    /// Inside a markup construct (`<...>`).
    InsideMarkup,
    /// End of input reached.
    Done,
}

/// Type of XML token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: `<element>`.
    StartTag,
    /// Element end tag: `</element>`.
    EndTag,
    /// Empty element: `<element/>`.
    EmptyTag,
    /// Text content.
    Text,
    /// CDATA section: `<![CDATA[...]]>`.
    CData,
    /// Comment: `<!--...-->`.
    Comment,
    /// Processing instruction, including the XML declaration.
    ProcessingInstruction,
    /// DOCTYPE declaration.
    DocType,
    /// End of file.
    Eof,
}

/// A parsed XML token.
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in the input (start, end).
    pub span: (usize, usize),
    /// For tags: the element name.
    pub name: Option<Cow<'a, [u8]>>,
    /// For text/CDATA/comment: the content.
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(Cow::Borrowed(name));
        self
    }

    fn with_content(mut self, content: &'a [u8]) -> Self {
        self.content = Some(Cow::Borrowed(content));
        self
    }
}

/// A tokenizer-level parse failure: unterminated markup, a malformed tag, or
/// a name that does not start at the expected position.
#[derive(Debug, Clone)]
pub struct TokenizerError {
    pub message: String,
    pub position: usize,
}

impl TokenizerError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        TokenizerError {
            message: message.into(),
            position,
        }
    }
}

/// XML tokenizer implementing a pull-parser pattern.
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    state: ParseState,
    error: Option<TokenizerError>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input.
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            state: ParseState::Init,
            error: None,
        }
    }

    /// The first tokenizer error encountered, if any.
    pub fn error(&self) -> Option<&TokenizerError> {
        self.error.as_ref()
    }

    fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(TokenizerError::new(message, self.scanner.position()));
        }
    }

    /// The current parse state.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// The current byte offset in the input.
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next token, or `None` once the input is exhausted or a parse
    /// error has been recorded.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if self.state == ParseState::Done || self.error.is_some() {
            return None;
        }

        if self.state == ParseState::Init {
            self.scanner.skip_whitespace();
            self.state = ParseState::InsideText;
        }

        if self.scanner.is_eof() {
            self.state = ParseState::Done;
            let pos = self.scanner.position();
            return Some(Token::new(TokenKind::Eof, (pos, pos)));
        }

        match self.scanner.peek() {
            Some(b'<') => self.parse_markup(),
            Some(_) => self.parse_text(),
            None => {
                self.state = ParseState::Done;
                let pos = self.scanner.position();
                Some(Token::new(TokenKind::Eof, (pos, pos)))
            }
        }
    }

    fn parse_markup(&mut self) -> Option<Token<'a>> {
        let start = self.scanner.position();
        self.scanner.advance(1); // skip '<'
        self.state = ParseState::InsideMarkup;

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => {
                self.fail("unexpected end of input after '<'");
                None
            }
        }
    }

    /// Parse a start tag or self-closing tag. Attributes are scanned only
    /// far enough to locate the tag's closing `>`; their names and values
    /// are discarded (they never influence matching or output).
    fn parse_start_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => {
                self.fail("expected element name after '<'");
                return None;
            }
        };

        let end = match self.scanner.find_tag_end_quoted() {
            Some(end) => end,
            None => {
                self.fail("unterminated start tag");
                return None;
            }
        };

        let is_empty = end > 0 && self.scanner.slice(end - 1, end) == b"/";

        self.scanner.set_position(end + 1);
        self.state = ParseState::InsideText;

        let kind = if is_empty {
            TokenKind::EmptyTag
        } else {
            TokenKind::StartTag
        };
        Some(Token::new(kind, (start, end + 1)).with_name(name))
    }

    fn parse_end_tag(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // skip '/'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => {
                self.fail("expected element name after '</'");
                return None;
            }
        };

        let end = match self.scanner.find_tag_end() {
            Some(end) => end,
            None => {
                self.fail("unterminated end tag");
                return None;
            }
        };

        self.scanner.set_position(end + 1);
        self.state = ParseState::InsideText;

        Some(Token::new(TokenKind::EndTag, (start, end + 1)).with_name(name))
    }

    fn parse_bang_markup(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // skip '!'

        if self.scanner.starts_with(b"--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            self.fail("unrecognized '<!' markup");
            None
        }
    }

    fn parse_comment(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(2); // skip '--'
        let content_start = self.scanner.position();

        loop {
            let pos = match self.scanner.find_byte(b'-') {
                Some(pos) => pos,
                None => {
                    self.fail("unterminated comment");
                    return None;
                }
            };
            self.scanner.set_position(pos);

            if self.scanner.starts_with(b"-->") {
                let content = self.scanner.slice(content_start, pos);
                self.scanner.advance(3);
                self.state = ParseState::InsideText;
                return Some(Token::new(TokenKind::Comment, (start, self.scanner.position()))
                    .with_content(content));
            }
            self.scanner.advance(1);
        }
    }

    fn parse_cdata(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(7); // skip '[CDATA['
        let content_start = self.scanner.position();

        loop {
            let pos = match self.scanner.find_byte(b']') {
                Some(pos) => pos,
                None => {
                    self.fail("unterminated CDATA section");
                    return None;
                }
            };
            self.scanner.set_position(pos);

            if self.scanner.starts_with(b"]]>") {
                let content = self.scanner.slice(content_start, pos);
                self.scanner.advance(3);
                self.state = ParseState::InsideText;
                return Some(Token::new(TokenKind::CData, (start, self.scanner.position()))
                    .with_content(content));
            }
            self.scanner.advance(1);
        }
    }

    /// DOCTYPE is recognized only far enough to skip it; no internal subset
    /// validation is performed (DTD support is out of scope).
    fn parse_doctype(&mut self, start: usize) -> Option<Token<'a>> {
        let mut in_subset = false;
        let mut in_string = false;
        let mut string_char = 0u8;

        while !self.scanner.is_eof() {
            let b = self.scanner.peek()?;

            if in_string {
                if b == string_char {
                    in_string = false;
                }
                self.scanner.advance(1);
                continue;
            }

            match b {
                b'"' | b'\'' => {
                    in_string = true;
                    string_char = b;
                    self.scanner.advance(1);
                }
                b'[' => {
                    in_subset = true;
                    self.scanner.advance(1);
                }
                b']' => {
                    in_subset = false;
                    self.scanner.advance(1);
                }
                b'>' if !in_subset => {
                    self.scanner.advance(1);
                    self.state = ParseState::InsideText;
                    return Some(Token::new(TokenKind::DocType, (start, self.scanner.position())));
                }
                _ => self.scanner.advance(1),
            }
        }

        self.fail("unterminated DOCTYPE declaration");
        None
    }

    fn parse_pi(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // skip '?'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => {
                self.fail("expected target name after '<?'");
                return None;
            }
        };

        loop {
            let pos = match self.scanner.find_byte(b'?') {
                Some(pos) => pos,
                None => {
                    self.fail("unterminated processing instruction");
                    return None;
                }
            };
            self.scanner.set_position(pos);

            if self.scanner.starts_with(b"?>") {
                self.scanner.advance(2);
                self.state = ParseState::InsideText;
                return Some(
                    Token::new(TokenKind::ProcessingInstruction, (start, self.scanner.position()))
                        .with_name(name),
                );
            }
            self.scanner.advance(1);
        }
    }

    /// Text content is emitted raw; the automaton driver applies the
    /// left-trim-only whitespace policy when it collects output.
    fn parse_text(&mut self) -> Option<Token<'a>> {
        let start = self.scanner.position();
        self.state = ParseState::InsideText;

        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + self.scanner.remaining().len());

        if end == start {
            return None;
        }

        let content = self.scanner.slice(start, end);
        self.scanner.set_position(end);

        Some(Token::new(TokenKind::Text, (start, end)).with_content(content))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_element() {
        let mut tok = Tokenizer::new(b"<root>content</root>");

        let t1 = tok.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::StartTag);
        assert_eq!(t1.name.as_deref(), Some(b"root" as &[u8]));

        let t2 = tok.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::Text);
        assert_eq!(t2.content.as_deref(), Some(b"content" as &[u8]));

        let t3 = tok.next_token().unwrap();
        assert_eq!(t3.kind, TokenKind::EndTag);
        assert_eq!(t3.name.as_deref(), Some(b"root" as &[u8]));
    }

    #[test]
    fn test_empty_element() {
        let mut tok = Tokenizer::new(b"<br/>");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::EmptyTag);
        assert_eq!(t.name.as_deref(), Some(b"br" as &[u8]));
    }

    #[test]
    fn test_cdata() {
        let mut tok = Tokenizer::new(b"<![CDATA[<script>code</script>]]>");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::CData);
        assert_eq!(t.content.as_deref(), Some(b"<script>code</script>" as &[u8]));
    }

    #[test]
    fn test_comment() {
        let mut tok = Tokenizer::new(b"<!-- comment -->");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Comment);
        assert_eq!(t.content.as_deref(), Some(b" comment " as &[u8]));
    }

    #[test]
    fn test_attribute_is_skipped() {
        let mut tok = Tokenizer::new(b"<a href=\"x>y\">z</a>");
        let t1 = tok.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::StartTag);
        assert_eq!(t1.name.as_deref(), Some(b"a" as &[u8]));
        let t2 = tok.next_token().unwrap();
        assert_eq!(t2.content.as_deref(), Some(b"z" as &[u8]));
    }

    #[test]
    fn test_unterminated_tag_is_an_error() {
        let mut tok = Tokenizer::new(b"<root");
        assert!(tok.next_token().is_none());
        assert!(tok.error().is_some());
    }
}
