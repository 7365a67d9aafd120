//! Path-driven BER parse engine
//!
//! [`DerParser`] walks a buffer once, depth-first, keeping a stack of
//! `(tag, sibling index)` pairs. Every registered [`DerPath`] that matches
//! the stack fires, each handler getting its own view bounded to that
//! element's value bytes. Constructed elements are then descended into
//! whether or not a handler fired, so paths registered beneath a matched
//! element are still reached. Primitive elements nobody asked for are
//! skipped by their declared length, so an unknown subtree never
//! desynchronizes the walk.
//!
//! Handlers are plain function pointers over a caller-chosen state type.
//! A handler that needs to look inside a composite value runs its own
//! nested parser over the view it was given.

use crate::ber::decoder::DerBuffer;
use crate::ber::path::DerPath;
use crate::ber::types::Tag;
use ldapwire_core::{LdapError, LdapResult};

/// Callback invoked for a matched element
///
/// The buffer covers exactly the element's value bytes, positioned at
/// their start.
pub type Handler<S> = fn(&mut S, &mut DerBuffer<'_>) -> LdapResult<()>;

/// Parse engine dispatching matched elements to handlers
///
/// # Registration
///
/// Paths are registered once, before parsing. A parser holding only
/// function pointers carries no per-parse state, so one instance can be
/// kept in a `static` and shared by every decode of the same message type.
///
/// # Error Handling
///
/// A parse pass fails on:
/// - a truncated tag or length, or a length running past its enclosing view
/// - nesting deeper than the configured maximum
/// - the first handler returning an error
pub struct DerParser<S> {
    handlers: Vec<(DerPath, Handler<S>)>,
    max_depth: usize,
}

impl<S> DerParser<S> {
    /// Nesting limit used unless [`DerParser::with_max_depth`] says otherwise
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Create a parser with no registered paths
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deep constructed elements are descended into
    ///
    /// # Arguments
    /// * `max_depth` - Deepest stack length accepted; the outermost element is depth 1
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Associate `handler` with `path`
    ///
    /// Paths are independent: when several match the same element, each
    /// handler runs, in registration order, on a fresh view of the value.
    ///
    /// # Returns
    /// The parser itself, so registrations can be chained.
    pub fn register(&mut self, path: DerPath, handler: Handler<S>) -> &mut Self {
        self.handlers.push((path, handler));
        self
    }

    /// Number of registered paths
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Walk `buffer` from its current position to its end
    ///
    /// Top-level elements are treated as siblings, so a nested parser can
    /// run over the content of a constructed element. Callers that expect
    /// exactly one top-level element anchor their paths with `[0]` and
    /// check for trailing bytes themselves.
    ///
    /// # Arguments
    /// * `buffer` - View to parse; it is consumed to its end
    /// * `state` - Value handed to every handler
    ///
    /// # Error Handling
    /// Returns the first decode or handler error; `state` may then hold
    /// partial results and should be discarded.
    pub fn parse(&self, buffer: &mut DerBuffer<'_>, state: &mut S) -> LdapResult<()> {
        let mut stack = Vec::with_capacity(8);
        self.parse_level(buffer, state, &mut stack)
    }

    fn parse_level(
        &self,
        buffer: &mut DerBuffer<'_>,
        state: &mut S,
        stack: &mut Vec<(Tag, usize)>,
    ) -> LdapResult<()> {
        if stack.len() > self.max_depth {
            return Err(LdapError::Decode(format!(
                "TLV nesting exceeds maximum depth {}",
                self.max_depth
            )));
        }

        // Per-tag sibling counters at this level
        let mut siblings: Vec<(Tag, usize)> = Vec::new();
        while buffer.has_remaining() {
            let (tag, value) = buffer.read_tlv()?;
            let index = match siblings.iter_mut().find(|(t, _)| *t == tag) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    siblings.push((tag, 0));
                    0
                }
            };

            stack.push((tag, index));
            let result = self.visit(tag, index, value, state, stack);
            stack.pop();
            result?;
        }
        Ok(())
    }

    fn visit(
        &self,
        tag: Tag,
        index: usize,
        value: DerBuffer<'_>,
        state: &mut S,
        stack: &mut Vec<(Tag, usize)>,
    ) -> LdapResult<()> {
        let mut matched = false;
        for (path, handler) in self.handlers.iter().filter(|(path, _)| path.matches(stack)) {
            log::trace!("dispatching {} ({} bytes)", path, value.limit());
            let mut view = value;
            handler(state, &mut view)?;
            matched = true;
        }
        if tag.is_constructed() {
            let mut children = value;
            return self.parse_level(&mut children, state, stack);
        }
        if !matched {
            log::trace!("skipping {}[{}] ({} bytes)", tag, index, value.limit());
        }
        Ok(())
    }
}

impl<S> Default for DerParser<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collected {
        strings: Vec<String>,
        ints: Vec<i64>,
    }

    fn collect_string(state: &mut Collected, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
        state.strings.push(buffer.read_string_value()?);
        Ok(())
    }

    fn collect_int(state: &mut Collected, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
        state.ints.push(buffer.read_integer_value()?);
        Ok(())
    }

    fn fail(_: &mut Collected, _: &mut DerBuffer<'_>) -> LdapResult<()> {
        Err(LdapError::decode("handler failure"))
    }

    // SEQ { INT 7, SEQ { OCTSTR "a", OCTSTR "b", OCTSTR "c" }, BOOL true }
    const TREE: [u8; 19] = [
        0x30, 0x11, 0x02, 0x01, 0x07, 0x30, 0x09, 0x04, 0x01, b'a', 0x04, 0x01, b'b', 0x04, 0x01,
        b'c', 0x01, 0x01, 0xFF,
    ];

    #[test]
    fn test_sibling_indexing() {
        for (i, expected) in ["a", "b", "c"].iter().enumerate() {
            let mut parser = DerParser::new();
            let path = format!("/SEQ/SEQ/OCTSTR[{}]", i);
            parser.register(DerPath::parse(&path).unwrap(), collect_string);
            let mut state = Collected::default();
            parser.parse(&mut DerBuffer::new(&TREE), &mut state).unwrap();
            assert_eq!(state.strings, vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_unindexed_path_matches_all_siblings() {
        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ/SEQ/OCTSTR").unwrap(), collect_string);
        parser.register(DerPath::parse("/SEQ/INT").unwrap(), collect_int);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&TREE), &mut state).unwrap();
        assert_eq!(state.strings, vec!["a", "b", "c"]);
        assert_eq!(state.ints, vec![7]);
    }

    #[test]
    fn test_unregistered_subtrees_are_skipped() {
        fn collect_bool(state: &mut Collected, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
            state.ints.push(buffer.read_boolean_value()? as i64);
            Ok(())
        }
        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ/BOOL").unwrap(), collect_bool);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&TREE), &mut state).unwrap();
        assert_eq!(state.ints, vec![1]);
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ/INT").unwrap(), fail);
        let mut state = Collected::default();
        assert!(parser.parse(&mut DerBuffer::new(&TREE), &mut state).is_err());
    }

    #[test]
    fn test_truncation_always_fails() {
        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ/SEQ/OCTSTR").unwrap(), collect_string);
        for k in 1..TREE.len() {
            let mut state = Collected::default();
            assert!(
                parser.parse(&mut DerBuffer::new(&TREE[..k]), &mut state).is_err(),
                "truncation at {} parsed",
                k
            );
        }
    }

    #[test]
    fn test_max_depth() {
        // Five nested SEQUENCEs
        let data = [0x30, 0x08, 0x30, 0x06, 0x30, 0x04, 0x30, 0x02, 0x30, 0x00];
        let parser: DerParser<Collected> = DerParser::new().with_max_depth(3);
        let mut state = Collected::default();
        assert!(parser.parse(&mut DerBuffer::new(&data), &mut state).is_err());

        let parser: DerParser<Collected> = DerParser::new().with_max_depth(5);
        assert!(parser.parse(&mut DerBuffer::new(&data), &mut state).is_ok());
    }

    #[test]
    fn test_overlapping_paths_all_fire() {
        fn tag_any(state: &mut Collected, _: &mut DerBuffer<'_>) -> LdapResult<()> {
            state.strings.push("any".to_string());
            Ok(())
        }
        let mut parser = DerParser::new();
        parser
            .register(DerPath::parse("/SEQ/SEQ/OCTSTR").unwrap(), tag_any)
            .register(DerPath::parse("/SEQ/SEQ/OCTSTR[0]").unwrap(), collect_string);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&TREE), &mut state).unwrap();
        assert_eq!(state.strings, vec!["any", "a", "any", "any"]);
    }

    #[test]
    fn test_matched_constructed_element_is_descended() {
        fn outer(state: &mut Collected, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
            state.strings.push(format!("outer:{}", buffer.limit()));
            buffer.remaining_bytes();
            Ok(())
        }
        let mut parser = DerParser::new();
        parser
            .register(DerPath::parse("/SEQ/SEQ").unwrap(), outer)
            .register(DerPath::parse("/SEQ/SEQ/OCTSTR").unwrap(), collect_string);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&TREE), &mut state).unwrap();
        // The handler consuming its view does not hide the children
        assert_eq!(state.strings, vec!["outer:9", "a", "b", "c"]);
    }

    #[test]
    fn test_trailing_top_level_element() {
        let mut data = TREE.to_vec();
        // A second SEQ { INT 9 } after the first element
        data.extend_from_slice(&[0x30, 0x03, 0x02, 0x01, 0x09]);

        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ/INT").unwrap(), collect_int);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&data), &mut state).unwrap();
        assert_eq!(state.ints, vec![7, 9]);

        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ[0]/INT").unwrap(), collect_int);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&data), &mut state).unwrap();
        assert_eq!(state.ints, vec![7]);
    }

    #[test]
    fn test_nested_parser_in_handler() {
        fn inner(state: &mut Collected, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
            let mut nested = DerParser::new();
            nested.register(DerPath::parse("/OCTSTR[2]").unwrap(), collect_string);
            nested.parse(buffer, state)
        }
        let mut parser = DerParser::new();
        parser.register(DerPath::parse("/SEQ/SEQ").unwrap(), inner);
        let mut state = Collected::default();
        parser.parse(&mut DerBuffer::new(&TREE), &mut state).unwrap();
        assert_eq!(state.strings, vec!["c"]);
    }
}
