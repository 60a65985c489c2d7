//! Parsing of free-text model completions into actions.
//!
//! The model is asked to answer in the following shape:
//!
//! ```text
//! Thought: <free text>
//! Action: <tool name>
//! Action Input: <argument text>
//! ```
//!
//! or, to finish the task:
//!
//! ```text
//! Thought: <free text>
//! Final Answer: <answer text>
//! ```
//!
//! Models don't follow this reliably, so parsing is line oriented and
//! forgiving: keywords are case-insensitive, markdown emphasis and odd
//! spacing around the colon are accepted, and anything after the first
//! usable block is ignored.

use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ActionRequest {
    /// Name of the tool, not yet resolved against any registry.
    pub tool_name: String,
    /// The argument text, which only the target tool interprets.
    pub raw_input: String,
}

impl ActionRequest {
    /// Creates a new action request.
    #[inline]
    pub fn new<S1: Into<String>, S2: Into<String>>(
        tool_name: S1,
        raw_input: S2,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_input: raw_input.into(),
        }
    }
}

/// The decision extracted from one completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedCompletion {
    /// The model wants to call a tool.
    Action {
        /// The requested invocation.
        request: ActionRequest,
        /// The reasoning preceding the action, if any.
        thought: Option<String>,
    },
    /// The model has finished the task.
    FinalAnswer {
        /// The answer text.
        answer: String,
        /// The reasoning preceding the answer, if any.
        thought: Option<String>,
    },
    /// Neither form could be recognized.
    Failure(ParseFailure),
}

/// Why a completion could not be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseFailure {
    /// No `Action` or `Final Answer` marker was found.
    NoMarkers,
    /// An `Action` marker was found, but without a tool name.
    EmptyActionName,
    /// An `Action` marker was not followed by an `Action Input` section.
    MissingActionInput,
    /// A `Final Answer` marker was found, but without any text.
    EmptyFinalAnswer,
}

impl Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::NoMarkers => {
                write!(f, "no `Action` or `Final Answer` line was found")
            }
            ParseFailure::EmptyActionName => {
                write!(f, "the `Action` line does not name a tool")
            }
            ParseFailure::MissingActionInput => {
                write!(f, "the `Action` line is not followed by `Action Input`")
            }
            ParseFailure::EmptyFinalAnswer => {
                write!(f, "the `Final Answer` is empty")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Thought,
    Action,
    ActionInput,
    FinalAnswer,
    Observation,
}

#[derive(Clone, Copy, Debug)]
enum Line<'a> {
    Marker(Marker, &'a str),
    Plain(&'a str),
}

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s>*_#-]*(thought|action[\s_]*input|action|final[\s_]*answer|observation)[\s*_]*:[*_]*\s*(.*)$",
    )
    .expect("marker pattern is valid")
});

static INLINE_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s[\s*_]*action[\s_]*input[\s*_]*:[*_]*")
        .expect("inline input pattern is valid")
});

/// Splits `get_company_info Action Input: Tesla` into the tool name part
/// and the input part.
fn split_inline_input(rest: &str) -> (&str, Option<&str>) {
    match INLINE_INPUT_RE.find(rest) {
        Some(m) => (&rest[..m.start()], Some(&rest[m.end()..])),
        None => (rest, None),
    }
}

fn classify(line: &str) -> Line<'_> {
    let Some(caps) = MARKER_RE.captures(line) else {
        return Line::Plain(line);
    };
    let keyword = caps[1]
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    let marker = match keyword.as_str() {
        "thought" => Marker::Thought,
        "actioninput" => Marker::ActionInput,
        "action" => Marker::Action,
        "finalanswer" => Marker::FinalAnswer,
        _ => Marker::Observation,
    };
    let rest = caps.get(2).map_or("", |m| m.as_str());
    Line::Marker(marker, rest)
}

/// Parses one raw completion.
///
/// The first well-formed block wins, in textual order: either an
/// `Action` line naming a tool followed by an `Action Input` section, or
/// a non-empty `Final Answer`. Any text after that block, including
/// further actions and made-up `Observation` sections, is ignored.
pub fn parse_completion(text: &str) -> ParsedCompletion {
    let lines = text.lines().map(classify).collect::<Vec<_>>();

    // The prompt ends with `Thought:`, so the completion usually starts
    // with unmarked reasoning.
    let leading_end = next_marker(&lines, 0).unwrap_or(lines.len());
    let mut thought = join_section(&lines, None, 0, leading_end);
    let mut problem = None;

    let mut idx = leading_end;
    while idx < lines.len() {
        let Line::Marker(marker, rest) = lines[idx] else {
            idx += 1;
            continue;
        };
        let section_end = next_marker(&lines, idx + 1).unwrap_or(lines.len());

        match marker {
            Marker::Thought => {
                thought = join_section(&lines, Some(rest), idx + 1, section_end);
            }
            Marker::FinalAnswer => {
                match join_section(&lines, Some(rest), idx + 1, section_end) {
                    Some(answer) => {
                        return ParsedCompletion::FinalAnswer { answer, thought };
                    }
                    None => {
                        problem.get_or_insert(ParseFailure::EmptyFinalAnswer);
                    }
                }
            }
            Marker::Action => {
                let (name, inline_input) = split_inline_input(rest);
                let tool_name = clean_tool_name(name);
                let input_section = match (inline_input, lines.get(section_end)) {
                    (Some(input_rest), _) => {
                        Some(extract_input(&lines, idx, input_rest))
                    }
                    (None, Some(Line::Marker(Marker::ActionInput, input_rest))) => {
                        Some(extract_input(&lines, section_end, input_rest))
                    }
                    _ => None,
                };
                match (tool_name.is_empty(), input_section) {
                    (false, Some(raw_input)) => {
                        return ParsedCompletion::Action {
                            request: ActionRequest {
                                tool_name,
                                raw_input,
                            },
                            thought,
                        };
                    }
                    (true, _) => {
                        problem.get_or_insert(ParseFailure::EmptyActionName);
                    }
                    (false, None) => {
                        problem.get_or_insert(ParseFailure::MissingActionInput);
                    }
                }
            }
            // Whatever follows a made-up observation is not the model's
            // own decision.
            Marker::Observation => break,
            Marker::ActionInput => {}
        }
        idx = section_end;
    }

    ParsedCompletion::Failure(problem.unwrap_or(ParseFailure::NoMarkers))
}

fn next_marker(lines: &[Line<'_>], from: usize) -> Option<usize> {
    (from..lines.len()).find(|idx| matches!(lines[*idx], Line::Marker(..)))
}

fn join_section(
    lines: &[Line<'_>],
    first: Option<&str>,
    from: usize,
    to: usize,
) -> Option<String> {
    let mut parts = Vec::with_capacity(to.saturating_sub(from) + 1);
    parts.extend(first);
    for line in &lines[from..to] {
        if let Line::Plain(text) = *line {
            parts.push(text);
        }
    }
    let joined = parts.join("\n");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_owned())
    }
}

fn clean_tool_name(rest: &str) -> String {
    const WRAPPERS: &[char] = &['`', '"', '\'', '[', ']', '*', '(', ')'];
    let unwrapped = rest.trim().trim_matches(WRAPPERS).trim();
    let first_token = unwrapped.split_whitespace().next().unwrap_or("");
    first_token
        .trim_matches(WRAPPERS)
        .trim_end_matches(['.', ',', ':', ';'])
        .to_owned()
}

/// Extracts the action input starting at the `Action Input` marker line.
///
/// One line is taken, unless it opens a JSON object or array that isn't
/// closed on that line, in which case lines are added until brackets
/// balance. An empty marker line takes the next non-empty line.
fn extract_input(lines: &[Line<'_>], marker_idx: usize, rest: &str) -> String {
    let mut idx = marker_idx;
    let mut first = rest.trim();
    if first.is_empty() {
        let next = (marker_idx + 1..lines.len()).find(|idx| {
            !matches!(lines[*idx], Line::Plain(text) if text.trim().is_empty())
        });
        match next.map(|next_idx| (next_idx, lines[next_idx])) {
            Some((next_idx, Line::Plain(text))) => {
                idx = next_idx;
                first = text.trim();
            }
            _ => return String::new(),
        }
    }

    let mut input = first.to_owned();
    if !(first.starts_with('{') || first.starts_with('[')) {
        return input;
    }

    let mut depth = bracket_depth(first);
    for line in &lines[idx + 1..] {
        if depth <= 0 {
            break;
        }
        let Line::Plain(text) = line else {
            break;
        };
        input.push('\n');
        input.push_str(text);
        depth += bracket_depth(text);
    }
    input.trim().to_owned()
}

fn bracket_depth(text: &str) -> i64 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth
}
