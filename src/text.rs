//! Text classification and normalization
//!
//! Pure helpers shared by the input controller and the console facade.
//! A submission is either plain text or a script block; script blocks are
//! flagged by a leading marker (default `=>`).

use regex::Regex;
use std::sync::LazyLock;

/// Default marker that flags input as a script block
pub const DEFAULT_MARKER: &str = "=>";

static NUM_TXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(.*)$").expect("valid num/txt pattern"));

/// The script-block marker and the rules that depend on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMarker {
    marker: String,
}

impl ScriptMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.marker
    }

    /// True if `s` starts with the marker
    pub fn is_script(&self, s: &str) -> bool {
        s.starts_with(&self.marker)
    }

    /// Marker-stripped, normalized content; empty for plain text
    pub fn script_body(&self, s: &str) -> String {
        match s.strip_prefix(&self.marker) {
            Some(body) => clean(body),
            None => String::new(),
        }
    }

    /// Scripts need a non-empty body, text needs non-empty normalized content
    pub fn is_submittable(&self, s: &str) -> bool {
        if self.is_script(s) {
            !self.script_body(s).is_empty()
        } else {
            !clean(s).is_empty()
        }
    }

    /// Submittable and finished with the double-Enter terminator
    pub fn is_submittable_script(&self, s: &str) -> bool {
        self.is_submittable(s) && s.ends_with("\n\n")
    }
}

impl Default for ScriptMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

/// Collapse newline runs, drop trailing newlines, trim surrounding whitespace.
pub fn clean(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\n' && out.ends_with('\n') {
            continue;
        }
        out.push(ch);
    }
    out.trim_end_matches('\n').trim().to_string()
}

/// Strip trailing newlines until at most one remains.
///
/// Turns an incomplete double-Enter back into a single Enter while the user
/// keeps typing a script.
pub fn trim_trailing_blank_script_lines(s: &str) -> String {
    let mut out = s;
    while out.ends_with("\n\n") {
        out = &out[..out.len() - 1];
    }
    out.to_string()
}

/// Non-overlapping occurrences of `needle` in `haystack`
pub fn count(haystack: &str, needle: &str) -> usize {
    if haystack.is_empty() || needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Newline-delimited lines; the empty string is one line.
pub fn count_lines(s: &str) -> usize {
    count(s, "\n") + 1
}

/// A CSS-like value split into its number and unit, e.g. `14px`
#[derive(Debug, Clone, PartialEq)]
pub struct NumTxtPair {
    pub num: f64,
    pub txt: String,
}

/// Parse `"14px"` into `{ num: 14, txt: "px" }`.
pub fn parse_num_txt_pair(s: &str) -> Option<NumTxtPair> {
    if s.is_empty() {
        return None;
    }
    let caps = NUM_TXT.captures(s)?;
    let num = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let txt = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Some(NumTxtPair { num, txt })
}

/// Everything before the last `/`, e.g. the directory of a script URL.
/// Without a `/` the result is empty.
pub fn parent_path(path: &str, with_end_separator: bool) -> &str {
    match path.rfind('/') {
        Some(i) if with_end_separator => &path[..=i],
        Some(i) => &path[..i],
        None => "",
    }
}
