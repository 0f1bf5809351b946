use std::collections::HashSet;

use super::index::{BracketKind, FoldIndex};

/// The set of start lines the user has collapsed.
///
/// The set survives buffer edits; the session reconciles it against the
/// freshly scanned [`FoldIndex`] after every change (`retain_valid`), so an
/// entry whose range disappeared is dropped rather than left dangling.
#[derive(Debug, Clone, Default)]
pub struct FoldState {
    folded: HashSet<usize>,
}

impl FoldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_folded(&self, line: usize) -> bool {
        self.folded.contains(&line)
    }

    /// Flip the fold at `line`. No-op when the line heads no range in the
    /// current index. Returns whether anything changed.
    pub fn toggle(&mut self, line: usize, index: &FoldIndex) -> bool {
        if index.range(line).is_none() {
            return false;
        }
        if !self.folded.remove(&line) {
            self.folded.insert(line);
        }
        true
    }

    pub fn expand_all(&mut self) {
        self.folded.clear();
    }

    /// Fold every range in the index. Callers must scan a fresh index first
    /// if the buffer changed since the last scan.
    pub fn collapse_all(&mut self, index: &FoldIndex) {
        self.folded = index.ranges().map(|(start, _)| start).collect();
    }

    /// Drop folded lines that no longer head a range.
    pub fn retain_valid(&mut self, index: &FoldIndex) {
        self.folded.retain(|line| index.is_foldable(*line));
    }

    pub fn folded_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.folded.iter().copied()
    }

    pub fn any_folded(&self) -> bool {
        !self.folded.is_empty()
    }

    /// Lines hidden by the current folds: for each folded start line with a
    /// live range, every line strictly after it through the range end.
    pub fn hidden_lines(&self, index: &FoldIndex) -> HashSet<usize> {
        let mut hidden = HashSet::new();
        for start in self.folded.iter().copied() {
            if let Some(end) = index.range(start) {
                hidden.extend(start + 1..=end);
            }
        }
        hidden
    }

    /// The collapsed projection of `text`: hidden lines elided, each folded
    /// start line trimmed of trailing whitespace and suffixed with `...}` or
    /// `...]` per its bracket kind. Callers re-highlight the result.
    pub fn collapsed_text(&self, text: &str, index: &FoldIndex) -> String {
        let hidden = self.hidden_lines(index);
        let mut display_lines = Vec::new();

        for (idx, line) in text.split('\n').enumerate() {
            if hidden.contains(&idx) {
                continue;
            }
            if self.is_folded(idx) && index.range(idx).is_some() {
                let placeholder = index
                    .bracket(idx)
                    .unwrap_or(BracketKind::Brace)
                    .placeholder();
                display_lines.push(format!("{}{}", line.trim_end(), placeholder));
            } else {
                display_lines.push(line.to_string());
            }
        }

        display_lines.join("\n")
    }
}
