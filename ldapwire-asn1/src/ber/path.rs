//! Path matchers addressing positions in a TLV tree
//!
//! A path is written as a sequence of `/`-separated nodes:
//!
//! ```text
//! /SEQ/APP(4)/OCTSTR[0]
//! ```
//!
//! | Node        | Matches                                        |
//! |-------------|------------------------------------------------|
//! | `SEQ`, `SET`| universal constructed SEQUENCE / SET           |
//! | `OCTSTR`, `INT`, `ENUM`, `BOOL`, `NULL` | universal primitive types |
//! | `APP(n)`    | application tag n, primitive or constructed    |
//! | `CTX(n)`    | context tag n, primitive or constructed        |
//!
//! An optional `[k]` suffix selects the k-th (0-based) sibling carrying
//! that tag at that level; without it every such sibling matches.

use crate::ber::types::{Tag, TagClass};
use ldapwire_core::{LdapError, LdapResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static NODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(SEQ|SET|OCTSTR|INT|ENUM|BOOL|NULL|APP|CTX)(?:\((\d+)\))?(?:\[(\d+)\])?$")
        .expect("node pattern is a valid regex")
});

/// One level of a [`DerPath`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathNode {
    class: TagClass,
    number: u32,
    /// `None` accepts both forms
    constructed: Option<bool>,
    index: Option<usize>,
}

impl PathNode {
    /// Node matching exactly `tag`
    pub fn new(tag: Tag) -> Self {
        Self {
            class: tag.class(),
            number: tag.number(),
            constructed: Some(tag.is_constructed()),
            index: None,
        }
    }

    /// Node matching `class`/`number` in either primitive or constructed form
    pub fn any_form(class: TagClass, number: u32) -> Self {
        Self {
            class,
            number,
            constructed: None,
            index: None,
        }
    }

    /// `APP(number)` in either form
    pub fn application(number: u32) -> Self {
        Self::any_form(TagClass::Application, number)
    }

    /// `CTX(number)` in either form
    pub fn context(number: u32) -> Self {
        Self::any_form(TagClass::Context, number)
    }

    /// Restrict the node to the `index`-th sibling with this tag
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Sibling index restriction, if any
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Test a tree position: the element's tag and its sibling index
    pub fn matches(&self, tag: &Tag, sibling_index: usize) -> bool {
        tag.class() == self.class
            && tag.number() == self.number
            && self.constructed.is_none_or(|c| c == tag.is_constructed())
            && self.index.is_none_or(|i| i == sibling_index)
    }

    fn parse(text: &str) -> LdapResult<Self> {
        let caps = NODE_PATTERN
            .captures(text)
            .ok_or_else(|| LdapError::InvalidPath(format!("malformed node '{}'", text)))?;
        let name = &caps[1];
        let number = caps
            .get(2)
            .map(|m| parse_number::<u32>(m.as_str(), text))
            .transpose()?;
        let index = caps
            .get(3)
            .map(|m| parse_number::<usize>(m.as_str(), text))
            .transpose()?;

        let node = match (name, number) {
            ("APP", Some(n)) => Self::application(n),
            ("CTX", Some(n)) => Self::context(n),
            ("APP" | "CTX", None) => {
                return Err(LdapError::InvalidPath(format!(
                    "node '{}' requires a tag number",
                    text
                )));
            }
            (_, Some(_)) => {
                return Err(LdapError::InvalidPath(format!(
                    "node '{}' does not take a tag number",
                    text
                )));
            }
            ("SEQ", None) => Self::new(Tag::SEQ),
            ("SET", None) => Self::new(Tag::SET),
            ("OCTSTR", None) => Self::new(Tag::OCTSTR),
            ("INT", None) => Self::new(Tag::INT),
            ("ENUM", None) => Self::new(Tag::ENUM),
            ("BOOL", None) => Self::new(Tag::BOOL),
            ("NULL", None) => Self::new(Tag::NULL),
            _ => {
                return Err(LdapError::InvalidPath(format!("unknown node '{}'", text)));
            }
        };
        Ok(match index {
            Some(i) => node.at(i),
            None => node,
        })
    }
}

fn parse_number<T: FromStr>(digits: &str, node: &str) -> LdapResult<T> {
    digits
        .parse()
        .map_err(|_| LdapError::InvalidPath(format!("number out of range in '{}'", node)))
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            TagClass::Application => write!(f, "APP({})", self.number)?,
            TagClass::Context => write!(f, "CTX({})", self.number)?,
            _ => write!(
                f,
                "{}",
                Tag::new(self.class, self.constructed.unwrap_or(false), self.number)
            )?,
        }
        if let Some(i) = self.index {
            write!(f, "[{}]", i)?;
        }
        Ok(())
    }
}

/// Hierarchical address of an element in a TLV tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerPath {
    nodes: Vec<PathNode>,
}

impl DerPath {
    /// Empty path; extend it with [`DerPath::push`] or [`DerPath::child`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from its textual form
    ///
    /// # Arguments
    /// * `text` - Slash-separated nodes such as `/SEQ/APP(3)/INT[0]`
    ///
    /// # Error Handling
    /// Malformed notation is an error rather than a matcher that never fires.
    pub fn parse(text: &str) -> LdapResult<Self> {
        let rest = text
            .strip_prefix('/')
            .ok_or_else(|| LdapError::InvalidPath(format!("path '{}' must start with '/'", text)))?;
        if rest.is_empty() {
            return Err(LdapError::InvalidPath("path has no nodes".to_string()));
        }
        let nodes = rest
            .split('/')
            .map(PathNode::parse)
            .collect::<LdapResult<Vec<_>>>()?;
        Ok(Self { nodes })
    }

    /// Append `node` as the deepest level
    pub fn push(&mut self, node: PathNode) {
        self.nodes.push(node);
    }

    /// Copy of this path extended by `node`
    pub fn child(&self, node: PathNode) -> Self {
        let mut path = self.clone();
        path.push(node);
        path
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Test the parse stack of (tag, sibling index) pairs against this path
    pub fn matches(&self, stack: &[(Tag, usize)]) -> bool {
        self.nodes.len() == stack.len()
            && self
                .nodes
                .iter()
                .zip(stack)
                .all(|(node, (tag, index))| node.matches(tag, *index))
    }
}

impl FromStr for DerPath {
    type Err = LdapError;

    fn from_str(s: &str) -> LdapResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "/{}", node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for text in [
            "/SEQ/INT[0]",
            "/SEQ/APP(4)/OCTSTR[0]",
            "/SEQ/CTX(0)/SEQ",
            "/SEQ/APP(1)/CTX(7)",
            "/SET/OCTSTR",
            "/BOOL",
            "/SEQ/APP(2)/NULL",
        ] {
            assert_eq!(DerPath::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_malformed_paths_fail() {
        for text in [
            "",
            "/",
            "SEQ/INT",
            "/SEQ//INT",
            "/SEQUENCE",
            "/APP",
            "/CTX()",
            "/SEQ(1)",
            "/OCTSTR[x]",
            "/APP(99999999999)",
            "/seq",
        ] {
            assert!(
                matches!(DerPath::parse(text), Err(LdapError::InvalidPath(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_programmatic_path_equals_parsed() {
        let built = DerPath::new()
            .child(PathNode::new(Tag::SEQ))
            .child(PathNode::application(4))
            .child(PathNode::new(Tag::OCTSTR).at(0));
        assert_eq!(built, DerPath::parse("/SEQ/APP(4)/OCTSTR[0]").unwrap());
    }

    #[test]
    fn test_matches_stack() {
        let path = DerPath::parse("/SEQ/APP(4)/OCTSTR[1]").unwrap();
        let app = Tag::application(true, 4);
        assert!(path.matches(&[(Tag::SEQ, 0), (app, 0), (Tag::OCTSTR, 1)]));
        assert!(!path.matches(&[(Tag::SEQ, 0), (app, 0), (Tag::OCTSTR, 0)]));
        assert!(!path.matches(&[(Tag::SEQ, 0), (app, 0)]));
        assert!(!path.matches(&[(Tag::SEQ, 0), (Tag::application(true, 5), 0), (Tag::OCTSTR, 1)]));
    }

    #[test]
    fn test_context_node_accepts_both_forms() {
        let node = PathNode::context(3);
        assert!(node.matches(&Tag::context(true, 3), 0));
        assert!(node.matches(&Tag::context(false, 3), 4));
        assert!(!node.matches(&Tag::application(true, 3), 0));
    }

    #[test]
    fn test_universal_node_is_exact() {
        let node = PathNode::new(Tag::OCTSTR);
        assert!(node.matches(&Tag::OCTSTR, 0));
        assert!(!node.matches(&Tag::universal(true, 4), 0));
    }
}
