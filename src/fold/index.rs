use std::collections::HashMap;

/// Which bracket opened a foldable range; decides the collapsed placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Brace,   // { ... }
    Bracket, // [ ... ]
}

impl BracketKind {
    pub fn placeholder(&self) -> &'static str {
        match self {
            BracketKind::Brace => "...}",
            BracketKind::Bracket => "...]",
        }
    }
}

/// Line-keyed map of foldable bracket pairs.
///
/// Built with a plain character scan and a bracket stack: a `}`/`]` pops the
/// stack only when the top holds its matching opener, and a range is recorded
/// only when opener and closer sit on different lines. Unmatched brackets are
/// ignored without comment; structural errors belong to the validator.
#[derive(Debug, Clone, Default)]
pub struct FoldIndex {
    ranges: HashMap<usize, usize>,
    brackets: HashMap<usize, BracketKind>,
}

impl FoldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(text: &str) -> Self {
        let mut index = Self::new();
        let mut stack: Vec<(u8, usize)> = Vec::new(); // (bracket byte, line)

        for (line_idx, line) in text.split('\n').enumerate() {
            for ch in line.bytes() {
                match ch {
                    b'{' | b'[' => stack.push((ch, line_idx)),
                    b'}' | b']' => {
                        let expected = if ch == b'}' { b'{' } else { b'[' };
                        if let Some(&(open, open_line)) = stack.last() {
                            if open == expected {
                                stack.pop();
                                if line_idx > open_line {
                                    index.ranges.insert(open_line, line_idx);
                                    index.brackets.insert(
                                        open_line,
                                        if open == b'{' {
                                            BracketKind::Brace
                                        } else {
                                            BracketKind::Bracket
                                        },
                                    );
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        index
    }

    pub fn is_foldable(&self, line: usize) -> bool {
        self.ranges.contains_key(&line)
    }

    /// End line of the range starting at `line`, if one exists.
    pub fn range(&self, line: usize) -> Option<usize> {
        self.ranges.get(&line).copied()
    }

    pub fn bracket(&self, line: usize) -> Option<BracketKind> {
        self.brackets.get(&line).copied()
    }

    pub fn ranges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranges.iter().map(|(start, end)| (*start, *end))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
