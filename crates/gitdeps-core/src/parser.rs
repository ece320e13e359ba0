//! Parser for the version-constraint language.
//!
//! ```text
//! constraint := and | or | revision | tag | branch | semverExpr | literal
//! and        := "and" "(" constraint* ")"
//! or         := "or" "(" constraint* ")"
//! revision   := "revision" "=" identifier
//! tag        := "tag" "=" identifier
//! branch     := "branch" "=" identifier
//! semverExpr := ("^" | "~" | ">=" | "<=" | ">" | "<") semver | semver "-" semver
//! semver     := digits "." digits "." digits
//! literal    := identifier
//! ```
//!
//! Whitespace is insignificant around tokens and children of `and`/`or` may
//! be separated by commas. Alternatives are tried in the order above with
//! full backtracking, so `android` is the tag `android` rather than a broken
//! `and(...)` group. The whole input must be consumed. Groups nest at most
//! [`MAX_NESTING`] deep.

use gitdeps_util::errors::GitdepsError;

use crate::constraint::Constraint;
use crate::version::{Comparator, SemanticVersion};

/// Parse constraint text into a [`Constraint`] tree.
pub fn parse(input: &str) -> Result<Constraint, GitdepsError> {
    let mut cursor = Cursor::new(input);
    if let Some(constraint) = cursor.constraint() {
        cursor.skip_ws();
        if cursor.at_end() {
            return Ok(constraint);
        }
        cursor.mark_failure();
    }
    Err(cursor.error())
}

/// Deepest `and`/`or` nesting accepted before the input is rejected.
pub const MAX_NESTING: usize = 64;

type Alternative<'a> = fn(&mut Cursor<'a>) -> Option<Constraint>;

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    /// Furthest position at which an expected token was missing.
    furthest: usize,
    /// Number of enclosing groups.
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            furthest: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn mark_failure(&mut self) {
        self.furthest = self.furthest.max(self.pos);
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn skip_separators(&mut self) {
        let trimmed = self
            .rest()
            .trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        self.pos = self.input.len() - trimmed.len();
    }

    /// Consume `token` after optional whitespace.
    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            self.mark_failure();
            false
        }
    }

    fn constraint(&mut self) -> Option<Constraint> {
        let alternatives: [Alternative<'a>; 7] = [
            Self::all,
            Self::any,
            Self::revision,
            Self::tag,
            Self::branch,
            Self::semver_expr,
            Self::literal,
        ];
        let start = self.pos;
        for alternative in alternatives {
            if let Some(constraint) = alternative(self) {
                return Some(constraint);
            }
            self.pos = start;
        }
        None
    }

    fn all(&mut self) -> Option<Constraint> {
        self.group("and").map(Constraint::All)
    }

    fn any(&mut self) -> Option<Constraint> {
        self.group("or").map(Constraint::Any)
    }

    fn group(&mut self, keyword: &str) -> Option<Vec<Constraint>> {
        if !(self.eat(keyword) && self.eat("(")) {
            return None;
        }
        if self.depth == MAX_NESTING {
            self.mark_failure();
            return None;
        }
        self.depth += 1;
        let children = self.children();
        self.depth -= 1;
        children
    }

    fn children(&mut self) -> Option<Vec<Constraint>> {
        let mut children = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(")") {
                return Some(children);
            }
            children.push(self.constraint()?);
        }
    }

    fn revision(&mut self) -> Option<Constraint> {
        self.assignment("revision").map(Constraint::ByRevision)
    }

    fn tag(&mut self) -> Option<Constraint> {
        self.assignment("tag").map(Constraint::ByTag)
    }

    fn branch(&mut self) -> Option<Constraint> {
        self.assignment("branch").map(Constraint::ByBranch)
    }

    fn assignment(&mut self, keyword: &str) -> Option<String> {
        if self.eat(keyword) && self.eat("=") {
            self.identifier()
        } else {
            None
        }
    }

    fn literal(&mut self) -> Option<Constraint> {
        self.identifier().map(Constraint::ByTag)
    }

    fn semver_expr(&mut self) -> Option<Constraint> {
        let prefixed: [(&str, fn(SemanticVersion) -> Comparator); 6] = [
            ("^", Comparator::GreaterOrEqual),
            ("~", Comparator::SameMajorGreaterMinor),
            (">=", Comparator::GreaterOrEqual),
            ("<=", Comparator::LessOrEqual),
            (">", Comparator::GreaterThan),
            ("<", Comparator::LessThan),
        ];
        let start = self.pos;
        for (op, make) in prefixed {
            if self.eat(op) {
                if let Some(version) = self.semver() {
                    return Some(Constraint::BySemver(make(version)));
                }
            }
            self.pos = start;
        }

        let low = self.semver()?;
        if !self.eat("-") {
            return None;
        }
        let high = self.semver()?;
        Some(Constraint::BySemver(Comparator::in_range(low, high)))
    }

    fn semver(&mut self) -> Option<SemanticVersion> {
        self.skip_ws();
        let major = self.digits()?;
        self.dot()?;
        let minor = self.digits()?;
        self.dot()?;
        let patch = self.digits()?;
        Some(SemanticVersion::new(major, minor, patch))
    }

    fn dot(&mut self) -> Option<()> {
        if self.rest().starts_with('.') {
            self.pos += 1;
            Some(())
        } else {
            self.mark_failure();
            None
        }
    }

    fn digits(&mut self) -> Option<u64> {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if len == 0 {
            self.mark_failure();
            return None;
        }
        let value = self.rest()[..len].parse().ok();
        if value.is_none() {
            self.mark_failure();
            return None;
        }
        self.pos += len;
        value
    }

    fn identifier(&mut self) -> Option<String> {
        self.skip_ws();
        let len: usize = self
            .rest()
            .chars()
            .take_while(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
            .map(char::len_utf8)
            .sum();
        if len == 0 {
            self.mark_failure();
            return None;
        }
        let ident = self.rest()[..len].to_string();
        self.pos += len;
        Some(ident)
    }

    fn error(&self) -> GitdepsError {
        let at = self.furthest.max(self.pos).min(self.input.len());
        let remainder = &self.input[at..];
        GitdepsError::Syntax {
            input: self.input.to_string(),
            remainder: if remainder.is_empty() {
                "<end of input>".to_string()
            } else {
                remainder.to_string()
            },
            span: (at, remainder.len()).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64, patch: u64) -> SemanticVersion {
        SemanticVersion::new(major, minor, patch)
    }

    #[test]
    fn caret_is_greater_or_equal() {
        assert_eq!(
            parse("^1.2.3").unwrap(),
            Constraint::BySemver(Comparator::GreaterOrEqual(v(1, 2, 3)))
        );
    }

    #[test]
    fn tilde_is_same_major_greater_minor() {
        assert_eq!(
            parse("~1.2.3").unwrap(),
            Constraint::BySemver(Comparator::SameMajorGreaterMinor(v(1, 2, 3)))
        );
    }

    #[test]
    fn relational_operators() {
        assert_eq!(
            parse(">=1.0.0").unwrap(),
            Constraint::BySemver(Comparator::GreaterOrEqual(v(1, 0, 0)))
        );
        assert_eq!(
            parse("<=1.0.0").unwrap(),
            Constraint::BySemver(Comparator::LessOrEqual(v(1, 0, 0)))
        );
        assert_eq!(
            parse(">1.0.0").unwrap(),
            Constraint::BySemver(Comparator::GreaterThan(v(1, 0, 0)))
        );
        assert_eq!(
            parse("<1.0.0").unwrap(),
            Constraint::BySemver(Comparator::LessThan(v(1, 0, 0)))
        );
    }

    #[test]
    fn range_is_normalized() {
        assert_eq!(
            parse("2.0.0 - 1.0.0").unwrap(),
            Constraint::BySemver(Comparator::InRange {
                low: v(1, 0, 0),
                high: v(2, 0, 0)
            })
        );
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let input = format!("{}tag=v1{}", "and(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        let mut constraint = parse(&input).unwrap();
        for _ in 0..MAX_NESTING {
            constraint = match constraint {
                Constraint::All(mut children) => children.remove(0),
                other => panic!("expected a group, got {other}"),
            };
        }
        assert_eq!(constraint, Constraint::ByTag("v1".into()));
    }

    #[test]
    fn nesting_past_the_limit_is_a_syntax_error() {
        let input = format!("{}{}", "and(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(parse(&input), Err(GitdepsError::Syntax { .. })));

        let deep = format!("{}{}", "or(".repeat(20_000), ")".repeat(20_000));
        match parse(&deep).unwrap_err() {
            GitdepsError::Syntax { remainder, .. } => assert!(remainder.starts_with("or(")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn and_with_comma_separated_children() {
        assert_eq!(
            parse("and(tag=v1, branch=main)").unwrap(),
            Constraint::All(vec![
                Constraint::ByTag("v1".into()),
                Constraint::ByBranch("main".into()),
            ])
        );
    }

    #[test]
    fn nested_groups_and_whitespace() {
        assert_eq!(
            parse("  or( and( ^1.0.0 <2.0.0 ) revision = abc123 )  ").unwrap(),
            Constraint::Any(vec![
                Constraint::All(vec![
                    Constraint::BySemver(Comparator::GreaterOrEqual(v(1, 0, 0))),
                    Constraint::BySemver(Comparator::LessThan(v(2, 0, 0))),
                ]),
                Constraint::ByRevision("abc123".into()),
            ])
        );
    }

    #[test]
    fn empty_groups_are_legal() {
        assert_eq!(parse("and()").unwrap(), Constraint::All(vec![]));
        assert_eq!(parse("or( )").unwrap(), Constraint::Any(vec![]));
    }

    #[test]
    fn bare_word_is_a_tag() {
        assert_eq!(parse("stable").unwrap(), Constraint::ByTag("stable".into()));
    }

    #[test]
    fn keyword_prefixes_fall_back_to_literals() {
        assert_eq!(parse("android").unwrap(), Constraint::ByTag("android".into()));
        assert_eq!(parse("tagged").unwrap(), Constraint::ByTag("tagged".into()));
        assert_eq!(parse("origin").unwrap(), Constraint::ByTag("origin".into()));
    }

    #[test]
    fn dotted_identifiers() {
        assert_eq!(
            parse("tag=v1.4.0").unwrap(),
            Constraint::ByTag("v1.4.0".into())
        );
        assert_eq!(
            parse("branch=release/2.x").unwrap(),
            Constraint::ByBranch("release/2.x".into())
        );
        assert_eq!(parse("1.2.3").unwrap(), Constraint::ByTag("1.2.3".into()));
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "^1.2.3",
            "and(tag=v1 branch=main)",
            "or(revision=abc ~2.1.0 1.0.0-1.5.0)",
            "and()",
        ] {
            let parsed = parse(text).unwrap();
            assert_eq!(parse(&parsed.to_string()).unwrap(), parsed, "{text}");
        }
    }

    #[test]
    fn unbalanced_parenthesis_is_an_error() {
        let err = parse("and(tag=v1").unwrap_err();
        match err {
            GitdepsError::Syntax { remainder, .. } => assert_eq!(remainder, "<end of input>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trailing_garbage_is_reported() {
        let err = parse("tag=v1 )").unwrap_err();
        match err {
            GitdepsError::Syntax { remainder, .. } => assert_eq!(remainder, ")"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_operator_is_an_error() {
        assert!(matches!(parse("=1.0.0"), Err(GitdepsError::Syntax { .. })));
        assert!(matches!(parse(">=1.0"), Err(GitdepsError::Syntax { .. })));
        assert!(matches!(parse(""), Err(GitdepsError::Syntax { .. })));
    }
}
