use std::ops::Range;
use vendiff_common::{Hunk, HunkLine, LineOperation, DEFAULT_CONTEXT_LINES};

/// Group an edit script into unified diff hunks with `context_lines` of
/// surrounding context. Change regions separated by at most `2 * context_lines`
/// equal lines share a hunk. An all-equal script yields no hunks.
pub fn build_hunks(ops: &[LineOperation], context_lines: usize) -> Vec<Hunk> {
    let ranges = merge_ranges(change_ranges(ops), context_lines);

    ranges
        .into_iter()
        .map(|range| {
            let start = range.start.saturating_sub(context_lines);
            let end = (range.end + context_lines).min(ops.len());
            hunk_for_window(ops, start..end)
        })
        .collect()
}

/// Hunks with the default three lines of context
pub fn build_default_hunks(ops: &[LineOperation]) -> Vec<Hunk> {
    build_hunks(ops, DEFAULT_CONTEXT_LINES)
}

/// Maximal runs of contiguous non-equal operations
fn change_ranges(ops: &[LineOperation]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut change_start = None;

    for (i, op) in ops.iter().enumerate() {
        match (op.is_change(), change_start) {
            (true, None) => change_start = Some(i),
            (false, Some(start)) => {
                ranges.push(start..i);
                change_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = change_start {
        ranges.push(start..ops.len());
    }

    ranges
}

fn merge_ranges(ranges: Vec<Range<usize>>, context_lines: usize) -> Vec<Range<usize>> {
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start - last.end <= 2 * context_lines => last.end = range.end,
            _ => merged.push(range),
        }
    }
    merged
}

fn hunk_for_window(ops: &[LineOperation], window: Range<usize>) -> Hunk {
    // Line numbers are 1-based
    let mut old_start = 1 + ops[..window.start]
        .iter()
        .filter(|op| op.tag.on_old_side())
        .count();
    let mut new_start = 1 + ops[..window.start]
        .iter()
        .filter(|op| op.tag.on_new_side())
        .count();

    let mut old_count = 0;
    let mut new_count = 0;
    let mut lines = Vec::with_capacity(window.len());

    for op in &ops[window] {
        if op.tag.on_old_side() {
            old_count += 1;
        }
        if op.tag.on_new_side() {
            new_count += 1;
        }
        // Patches are LF-only
        let text = op.text.strip_suffix('\r').unwrap_or(&op.text);
        lines.push(HunkLine {
            tag: op.tag,
            text: text.to_string(),
        });
    }

    // A side without lines starts at 0
    if old_count == 0 {
        old_start = 0;
    }
    if new_count == 0 {
        new_start = 0;
    }

    Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        lines,
    }
}
