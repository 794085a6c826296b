//! Placeholder expansion
//!
//! Replaces `${name}` placeholders using a lookup callback.
//!
//! # Rules
//! - names are trimmed before lookup
//! - placeholders inside a name are expanded first: `${table.${env}}`
//! - `${:name}` yields the literal text `${name}`
//! - an unterminated `${` is copied verbatim
//! - substituted values are not rescanned

use crate::error::{ExpandError, ParameterError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// What to do with a placeholder whose name resolves to nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPropertyMode {
    /// Leave `${name}` in the output
    #[default]
    Preserve,

    /// Substitute the empty string
    Empty,

    /// Fail with [`ExpandError::UnresolvedParameter`]
    Error,
}

impl FromStr for MissingPropertyMode {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "empty" => Ok(Self::Empty),
            "error" => Ok(Self::Error),
            _ => Err(ParameterError::UnknownMissingPropertyMode(s.to_string())),
        }
    }
}

impl Display for MissingPropertyMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preserve => "preserve",
            Self::Empty => "empty",
            Self::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Placeholder expander
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpressionExpander {
    mode: MissingPropertyMode,
}

impl ExpressionExpander {
    /// Create expander with policy
    #[inline]
    #[must_use]
    pub fn new(mode: MissingPropertyMode) -> Self {
        Self { mode }
    }

    /// Missing-name policy
    #[inline]
    #[must_use]
    pub fn mode(&self) -> MissingPropertyMode {
        self.mode
    }

    /// Expand every placeholder in `text`
    ///
    /// `location` is reported in errors; `lookup` returns the rendered value
    /// of a name, or `None` when absent.
    ///
    /// # Errors
    /// Returns [`ExpandError::UnresolvedParameter`] under
    /// [`MissingPropertyMode::Error`] when a name is absent
    pub fn expand<F>(&self, text: &str, location: Option<&str>, lookup: F) -> Result<String, ExpandError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !text.contains("${") {
            return Ok(text.to_string());
        }

        let expanded = self.scan(text, location, &lookup)?;
        if expanded != text {
            tracing::trace!(text, expanded = %expanded, "expanded expressions");
        }
        Ok(expanded)
    }

    fn scan<F>(&self, text: &str, location: Option<&str>, lookup: &F) -> Result<String, ExpandError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let body = &rest[start + 2..];
            let Some(end) = closing_brace(body) else {
                // nothing inside an unterminated placeholder is looked up
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let name = self.scan(&body[..end], location, lookup)?;
            out.push_str(&self.substitute(&name, location, lookup)?);
            rest = &body[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn substitute<F>(&self, raw: &str, location: Option<&str>, lookup: &F) -> Result<String, ExpandError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(escaped) = raw.strip_prefix(':') {
            return Ok(format!("${{{}}}", escaped.trim()));
        }

        let name = raw.trim();
        if let Some(value) = lookup(name) {
            return Ok(value);
        }

        match self.mode {
            MissingPropertyMode::Preserve => {
                tracing::warn!(name, location, "unresolved parameter left in place");
                Ok(format!("${{{raw}}}"))
            }
            MissingPropertyMode::Empty => Ok(String::new()),
            MissingPropertyMode::Error => {
                tracing::warn!(name, location, "unresolved parameter");
                Err(ExpandError::unresolved(name, location))
            }
        }
    }
}

/// Byte offset of the `}` closing a placeholder whose `${` precedes `body`
fn closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn expand(mode: MissingPropertyMode, text: &str, pairs: &[(&str, &str)]) -> Result<String, ExpandError> {
        ExpressionExpander::new(mode).expand(text, Some("root.xml"), lookup(pairs))
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(expand(MissingPropertyMode::Error, "select 1", &[]).unwrap(), "select 1");
        assert_eq!(expand(MissingPropertyMode::Error, "cost: $5 {x}", &[]).unwrap(), "cost: $5 {x}");
    }

    #[test]
    fn substitutes_known_names() {
        let out = expand(
            MissingPropertyMode::Error,
            "create table ${schema}.${ table }",
            &[("schema", "app"), ("table", "users")],
        )
        .unwrap();
        assert_eq!(out, "create table app.users");
    }

    #[test]
    fn nested_placeholder_in_name() {
        let out = expand(
            MissingPropertyMode::Error,
            "${table.${env}}",
            &[("env", "prod"), ("table.prod", "users_prod")],
        )
        .unwrap();
        assert_eq!(out, "users_prod");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let out = expand(
            MissingPropertyMode::Error,
            "${a}",
            &[("a", "${b}"), ("b", "never")],
        )
        .unwrap();
        assert_eq!(out, "${b}");
    }

    #[test]
    fn escape_produces_literal_placeholder() {
        let out = expand(MissingPropertyMode::Error, "${: user.name }", &[("user.name", "x")]).unwrap();
        assert_eq!(out, "${user.name}");
    }

    #[test]
    fn unterminated_placeholder_copied() {
        let out = expand(MissingPropertyMode::Error, "value=${oops", &[]).unwrap();
        assert_eq!(out, "value=${oops");
    }

    #[test]
    fn unterminated_outer_placeholder_is_not_expanded_inside() {
        let out = expand(MissingPropertyMode::Preserve, "v=${a ${b}", &[("b", "X")]).unwrap();
        assert_eq!(out, "v=${a ${b}");

        let out = expand(MissingPropertyMode::Error, "v=${a ${missing}", &[]).unwrap();
        assert_eq!(out, "v=${a ${missing}");
    }

    #[test]
    fn text_after_closed_placeholder_then_unterminated() {
        let out = expand(MissingPropertyMode::Error, "${a}-${b", &[("a", "1")]).unwrap();
        assert_eq!(out, "1-${b");
    }

    #[test]
    fn multibyte_text_around_placeholders() {
        let out = expand(MissingPropertyMode::Error, "ä${k}ö${ü", &[("k", "é")]).unwrap();
        assert_eq!(out, "äéö${ü");
    }

    #[test]
    fn preserve_mode_leaves_placeholder() {
        let out = expand(MissingPropertyMode::Preserve, "value=${missingKey}", &[]).unwrap();
        assert_eq!(out, "value=${missingKey}");
    }

    #[test]
    fn empty_mode_removes_placeholder() {
        let out = expand(MissingPropertyMode::Empty, "value=${missingKey};", &[]).unwrap();
        assert_eq!(out, "value=;");
    }

    #[test]
    fn error_mode_fails_with_name_and_location() {
        let err = expand(MissingPropertyMode::Error, "value=${missingKey}", &[]).unwrap_err();
        assert_eq!(
            err,
            ExpandError::UnresolvedParameter {
                name: "missingKey".into(),
                location: Some("root.xml".into()),
            }
        );
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("ERROR".parse::<MissingPropertyMode>().unwrap(), MissingPropertyMode::Error);
        assert_eq!(" empty ".parse::<MissingPropertyMode>().unwrap(), MissingPropertyMode::Empty);
        assert!("fail".parse::<MissingPropertyMode>().is_err());
    }

    #[test]
    fn mode_display_round_trips() {
        for mode in [MissingPropertyMode::Preserve, MissingPropertyMode::Empty, MissingPropertyMode::Error] {
            assert_eq!(mode.to_string().parse::<MissingPropertyMode>().unwrap(), mode);
        }
    }
}
