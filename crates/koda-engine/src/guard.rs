//! Access guard: rejects source text naming a host global.
//!
//! This is a lexical deny-list, not isolation. It scans the raw text
//! (comments and strings included) for whole-word occurrences.

use regex::Regex;

/// Host globals student code may not mention.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "window",
    "document",
    "fetch",
    "XMLHttpRequest",
    "localStorage",
    "sessionStorage",
    "eval",
    "Function",
];

/// Compiled deny-list scanner.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    /// `None` for an empty deny-list, which never matches.
    pattern: Option<Regex>,
}

impl AccessGuard {
    /// Build one `\b(id1|id2|...)\b` alternation over the escaped names.
    pub fn new<S: AsRef<str>>(denylist: &[S]) -> Result<Self, regex::Error> {
        if denylist.is_empty() {
            return Ok(Self { pattern: None });
        }
        let alternatives: Vec<String> = denylist
            .iter()
            .map(|name| regex::escape(name.as_ref()))
            .collect();
        let pattern = Regex::new(&format!(r"\b({})\b", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// The guard over [`DEFAULT_DENYLIST`].
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_DENYLIST)
    }

    /// The first deny-listed identifier in `source`, if any.
    pub fn check(&self, source: &str) -> Option<String> {
        let found = self.pattern.as_ref()?.find(source)?;
        log::debug!(
            target: "koda::guard",
            "denied identifier {:?} at byte {}",
            found.as_str(),
            found.start()
        );
        Some(found.as_str().to_string())
    }
}
