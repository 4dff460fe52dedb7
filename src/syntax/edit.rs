//! Node replacement and removal as byte-range edits.
//!
//! tree-sitter trees are immutable, so a pass describes its mutations as an
//! [`EditSet`] against the text the tree was parsed from, and applying the set
//! serializes the mutated tree back to text. A replacement is either fresh
//! text or a [`Splice`] of another range of the same source (the surviving
//! operand, the taken branch). Edits nested inside a spliced range are applied
//! to the spliced text, so rewrites found in one pass compose even when one
//! node is moved into the place of its ancestor.

use std::ops::Range;

use memchr::memrchr;
use tracing::{debug, trace};

/// What an edited range becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Literal text (empty for a removal).
    Text(String),
    /// Another range of the source, with edits inside it applied.
    Splice(Splice),
}

/// A range of the source moved into the place of an enclosing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub from: Range<usize>,
    /// Leading whitespace removed from every line, so the moved text lines up
    /// with the node it replaces.
    pub dedent: usize,
    pub prefix: &'static str,
    pub suffix: &'static str,
}

/// A single text edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Range to replace.
    pub range: Range<usize>,
    pub replacement: Replacement,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            replacement: Replacement::Text(text.into()),
        }
    }

    pub fn remove(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }

    /// Replace `range` with the (edited) text at `from`, which must lie
    /// strictly inside `range`.
    pub fn splice(range: Range<usize>, from: Range<usize>) -> Self {
        debug_assert!(range.start <= from.start && from.end <= range.end && range != from);
        Self {
            range,
            replacement: Replacement::Splice(Splice {
                from,
                dedent: 0,
                prefix: "",
                suffix: "",
            }),
        }
    }

    pub fn with_dedent(mut self, dedent: usize) -> Self {
        if let Replacement::Splice(splice) = &mut self.replacement {
            splice.dedent = dedent;
        }
        self
    }

    pub fn wrapped(mut self, prefix: &'static str, suffix: &'static str) -> Self {
        if let Replacement::Splice(splice) = &mut self.replacement {
            splice.prefix = prefix;
            splice.suffix = suffix;
        }
        self
    }
}

/// The edits one pass collected against one source text.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: Edit) {
        trace!(range = ?edit.range, "queued edit");
        self.edits.push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit to `source` and return the new text.
    ///
    /// An edit nested inside another edit only survives if it falls in the
    /// outer edit's spliced range. Edits that partially overlap an earlier
    /// one are dropped.
    pub fn apply(mut self, source: &str) -> String {
        if self.edits.is_empty() {
            return source.to_string();
        }
        self.edits.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then(b.range.end.cmp(&a.range.end))
        });
        let mut out = String::with_capacity(source.len());
        render(source, &self.edits, 0..source.len(), &mut out);
        out
    }
}

fn render(source: &str, edits: &[Edit], range: Range<usize>, out: &mut String) {
    let mut cursor = range.start;
    let first = edits.partition_point(|e| e.range.start < range.start);

    for edit in &edits[first..] {
        if edit.range.start >= range.end {
            break;
        }
        if edit.range.start < cursor {
            if edit.range.end > cursor {
                debug!(range = ?edit.range, "dropping edit that overlaps an earlier one");
            }
            continue;
        }
        if edit.range.end > range.end {
            debug!(range = ?edit.range, "dropping edit that straddles a spliced range");
            continue;
        }

        out.push_str(&source[cursor..edit.range.start]);
        match &edit.replacement {
            Replacement::Text(text) => out.push_str(text),
            Replacement::Splice(splice) => {
                out.push_str(splice.prefix);
                if splice.dedent == 0 {
                    render(source, edits, splice.from.clone(), out);
                } else {
                    let mut moved = String::new();
                    render(source, edits, splice.from.clone(), &mut moved);
                    out.push_str(&dedent_lines(&moved, splice.dedent));
                }
                out.push_str(splice.suffix);
            }
        }
        cursor = edit.range.end;
    }

    out.push_str(&source[cursor..range.end]);
}

/// Remove up to `amount` spaces or tabs from the start of every line.
fn dedent_lines(text: &str, amount: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let strip = line
            .bytes()
            .take(amount)
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        out.push_str(&line[strip..]);
    }
    out
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

/// Byte offset of the start of the line containing `pos`.
pub fn line_start(source: &str, pos: usize) -> usize {
    memrchr(b'\n', &source.as_bytes()[..pos]).map_or(0, |i| i + 1)
}

/// Byte column of `pos` within its line.
pub fn column(source: &str, pos: usize) -> usize {
    pos - line_start(source, pos)
}

/// Whether `a` and `b` are on the same line.
pub fn same_line(source: &str, a: usize, b: usize) -> bool {
    line_start(source, a) == line_start(source, b)
}

/// The whole lines spanned by `range`, indentation and line break included,
/// when nothing but blanks shares those lines with it.
pub fn owned_lines(source: &str, range: Range<usize>) -> Option<Range<usize>> {
    let bytes = source.as_bytes();
    let start_of_line = line_start(source, range.start);
    if !bytes[start_of_line..range.start]
        .iter()
        .all(|b| *b == b' ' || *b == b'\t')
    {
        return None;
    }

    let mut end = range.end;
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    match bytes.get(end) {
        None => Some(start_of_line..end),
        Some(b'\n') => Some(start_of_line..end + 1),
        Some(_) => None,
    }
}

/// The range to delete when removing the statement at `range`.
///
/// A statement alone on its line takes the whole line with it, indentation
/// and line break included. Otherwise only the statement and the blanks
/// after it go.
pub fn removal_range(source: &str, range: Range<usize>) -> Range<usize> {
    if let Some(lines) = owned_lines(source, range.clone()) {
        return lines;
    }
    let bytes = source.as_bytes();
    let mut end = range.end;
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }
    range.start..end
}

/// Replace `outer` with the statements at `inner`, re-indented to the column
/// of `outer`.
///
/// When both ranges own their lines the splice is done line-wise, so edits
/// that remove whole lines inside `inner` still fall inside the spliced text.
pub fn splice_statements(source: &str, outer: Range<usize>, inner: Range<usize>) -> Edit {
    let dedent = column(source, inner.start).saturating_sub(column(source, outer.start));
    match (
        owned_lines(source, outer.clone()),
        owned_lines(source, inner.clone()),
    ) {
        (Some(outer_lines), Some(inner_lines)) if inner_lines != outer_lines => {
            Edit::splice(outer_lines, inner_lines).with_dedent(dedent)
        }
        _ if same_line(source, outer.start, inner.start) => Edit::splice(outer, inner),
        _ => Edit::splice(outer, inner).with_dedent(dedent),
    }
}
