use regex::{Regex, RegexBuilder};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Compile the query as a pattern instead of a literal.
    pub regex: bool,
    pub case_sensitive: bool,
}

/// A match as byte offsets into the buffer, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
}

/// Query, options and the match list derived from the current buffer.
///
/// The match list is recomputed (`run`) whenever the query, the options or
/// the buffer change; offsets are only meaningful against the text they
/// were computed from.
#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    options: SearchOptions,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<SearchMatch> {
        self.current.map(|i| self.matches[i])
    }

    /// An invalid pattern is logged and behaves as "no matches"; it is
    /// never surfaced as a distinct error state.
    fn compile(&self) -> Option<Regex> {
        if self.query.is_empty() {
            return None;
        }
        let pattern = if self.options.regex {
            self.query.clone()
        } else {
            regex::escape(&self.query)
        };
        match RegexBuilder::new(&pattern)
            .case_insensitive(!self.options.case_sensitive)
            .build()
        {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(query = %self.query, %err, "invalid search pattern");
                None
            }
        }
    }

    /// Recompute the match list against `text`, in document order, and
    /// reset the selection to the first match.
    pub fn run(&mut self, text: &str) {
        self.matches.clear();
        if let Some(re) = self.compile() {
            for m in re.find_iter(text) {
                self.matches.push(SearchMatch {
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
        self.current = if self.matches.is_empty() { None } else { Some(0) };
    }

    /// Step the selection by `delta`, wrapping in either direction.
    pub fn navigate(&mut self, delta: isize) -> Option<SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let cur = self.current.unwrap_or(0) as isize;
        let next = (cur + delta).rem_euclid(len as isize) as usize;
        self.current = Some(next);
        Some(self.matches[next])
    }

    /// Splice `replacement` over the currently selected match only. The
    /// returned text invalidates every stored offset, so callers must
    /// `run` again rather than patch the list in place.
    pub fn replace_current(&self, text: &str, replacement: &str) -> Option<String> {
        let m = self.current()?;
        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..m.start]);
        out.push_str(replacement);
        out.push_str(&text[m.end..]);
        Some(out)
    }

    /// One global substitution with the compiled expression (`$n` group
    /// references expand in the replacement, as in the single-substitution
    /// path of the original).
    pub fn replace_all(&self, text: &str, replacement: &str) -> Option<String> {
        if self.matches.is_empty() {
            return None;
        }
        let re = self.compile()?;
        Some(re.replace_all(text, replacement).into_owned())
    }
}
