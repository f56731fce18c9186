//! Slash-delimited path expressions into a configuration tree.
//!
//! A path such as `config/variable settings/gap junctions/gj minimum` starts
//! with a root selector (`config` for the primary document, `grn` for the
//! gene regulatory network document it references) followed by the mapping
//! keys to descend through.

use std::fmt;
use std::str::FromStr;

use crate::error::ParamError;

/// Literal path-list entry that stands for the sample identifier.
pub const SAMPLE_ID: &str = "ID";

/// Which document a path expression addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RootSelector {
    /// The primary simulation configuration.
    Config,
    /// The gene regulatory network configuration referenced by the primary one.
    Grn,
}

/// A parsed, immutable path expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathExpression {
    text: String,
    segments: Vec<String>,
}

impl PathExpression {
    pub fn parse(input: &str) -> Result<Self, ParamError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ParamError::MalformedPath(input.to_string()));
        }

        let segments: Vec<String> = text.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ParamError::MalformedPath(input.to_string()));
        }

        Ok(PathExpression {
            text: text.to_string(),
            segments,
        })
    }

    /// First segment, naming the document to resolve against.
    pub fn root_selector(&self) -> &str {
        &self.segments[0]
    }

    /// The recognized root, or `None` for selectors no document answers to.
    pub fn root(&self) -> Option<RootSelector> {
        RootSelector::from_str(self.root_selector()).ok()
    }

    pub fn remaining_segments(&self) -> &[String] {
        &self.segments[1..]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for PathExpression {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathExpression::parse(s)
    }
}

/// One entry of a path list: either the sample identifier or a tree path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    SampleId,
    Path(PathExpression),
}

impl Field {
    /// Column name this field is recorded under before any disambiguation.
    pub fn key(&self) -> &str {
        match self {
            Field::SampleId => SAMPLE_ID,
            Field::Path(path) => path.as_str(),
        }
    }
}

impl FromStr for Field {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == SAMPLE_ID {
            return Ok(Field::SampleId);
        }
        PathExpression::parse(s).map(Field::Path)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parse newline-separated path-list text. Blank lines are ignored.
pub fn parse_path_list(text: &str) -> Result<Vec<Field>, ParamError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Field::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_root_and_segments() {
        let path = PathExpression::parse("config/a/b").unwrap();
        assert_eq!(path.root_selector(), "config");
        assert_eq!(path.root(), Some(RootSelector::Config));
        assert_eq!(path.remaining_segments(), ["a", "b"]);
        assert_eq!(path.to_string(), "config/a/b");
    }

    #[test]
    fn segments_may_contain_spaces() {
        let path = PathExpression::parse("grn/growth and decay/decay rate").unwrap();
        assert_eq!(path.root(), Some(RootSelector::Grn));
        assert_eq!(path.remaining_segments(), ["growth and decay", "decay rate"]);
    }

    #[test]
    fn unknown_selector_has_no_root() {
        let path = PathExpression::parse("sim/a").unwrap();
        assert_eq!(path.root_selector(), "sim");
        assert_eq!(path.root(), None);
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(
            PathExpression::parse("   "),
            Err(ParamError::MalformedPath(_))
        ));
        assert!(matches!(
            PathExpression::parse(""),
            Err(ParamError::MalformedPath(_))
        ));
    }

    #[test]
    fn empty_segment_is_malformed() {
        assert!(PathExpression::parse("config//b").is_err());
        assert!(PathExpression::parse("config/a/").is_err());
        assert!(PathExpression::parse("/a").is_err());
    }

    #[test]
    fn path_list_skips_blank_lines() {
        let fields = parse_path_list("ID\n\nconfig/a/b\n  \ngrn/x\n").unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], Field::SampleId);
        assert_eq!(fields[1].key(), "config/a/b");
        assert_eq!(fields[2].key(), "grn/x");
    }
}
