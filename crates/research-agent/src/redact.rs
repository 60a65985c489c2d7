use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

/// Replaces every redacted term.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// The terms redacted when no deny-list is configured.
pub const DEFAULT_SENSITIVE_TERMS: &[&str] = &[
    "Project Falcon",
    "Internal-Only",
    "Confidential",
    "SECRET",
    "CLASSIFIED",
];

/// Deny-list redaction.
///
/// Terms match case-insensitively anywhere in the text, longer terms
/// first, and each match is replaced with [`REDACTION_MARKER`]. Redacting
/// already redacted text changes nothing.
#[derive(Clone, Debug)]
pub struct Redactor {
    terms: Vec<String>,
    pattern: Option<Regex>,
}

impl Redactor {
    /// Creates a redactor for the given terms.
    ///
    /// Terms that are empty, contain brackets or occur inside the marker
    /// itself are skipped, since they would match the marker on a second
    /// pass.
    pub fn new<I, S>(terms: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let marker = REDACTION_MARKER.to_lowercase();
        let mut accepted: Vec<String> = vec![];
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty()
                || term.contains(['[', ']'])
                || marker.contains(&term.to_lowercase())
            {
                warn!("ignoring sensitive term {term:?}");
                continue;
            }
            if !accepted.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                accepted.push(term.to_owned());
            }
        }

        // Alternation prefers the first branch that matches at a position,
        // so longer terms must come first.
        let mut ordered = accepted.clone();
        ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        let pattern = if ordered.is_empty() {
            None
        } else {
            let alternation = ordered
                .iter()
                .map(|term| regex::escape(term))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&alternation).case_insensitive(true).build()?)
        };

        Ok(Self {
            terms: accepted,
            pattern,
        })
    }

    /// Returns the accepted terms, in the order they were given.
    #[inline]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Returns `true` if the text contains any term.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(text))
    }

    /// Redacts the text. Text without any term is returned as-is.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, REDACTION_MARKER),
            None => Cow::Borrowed(text),
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_TERMS)
            .expect("default sensitive terms are valid")
    }
}
