use similar::{capture_diff_slices, Algorithm, DiffTag};
use vendiff_common::LineOperation;

/// Split text on LF. A final terminator does not produce a trailing empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Compute a line-granular edit script turning `old` into `new`.
///
/// Lines are compared as whole tokens with Myers' algorithm, then a semantic
/// cleanup pass regroups short equal runs that are sandwiched between larger
/// edits. The cleanup only reorders; the deleted and inserted lines stay the
/// same.
pub fn diff_lines(old: &str, new: &str) -> Vec<LineOperation> {
    let old_lines = split_lines(old);

    if old == new {
        return old_lines.into_iter().map(LineOperation::equal).collect();
    }

    let new_lines = split_lines(new);
    let ops = capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines);

    let mut segments: Vec<Segment> = Vec::new();
    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => push_segment(&mut segments, Segment::equal(&old_lines[old_range])),
            DiffTag::Delete => {
                push_segment(&mut segments, Segment::change(&old_lines[old_range], &[]))
            }
            DiffTag::Insert => {
                push_segment(&mut segments, Segment::change(&[], &new_lines[new_range]))
            }
            DiffTag::Replace => push_segment(
                &mut segments,
                Segment::change(&old_lines[old_range], &new_lines[new_range]),
            ),
        }
    }

    let mut script = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    for segment in segments {
        match segment {
            Segment::Equal(lines) => script.extend(lines.into_iter().map(LineOperation::equal)),
            Segment::Change { deleted, inserted } => {
                script.extend(deleted.into_iter().map(LineOperation::delete));
                script.extend(inserted.into_iter().map(LineOperation::insert));
            }
        }
    }
    script
}

/// A maximal run of equal lines, or of changed lines between two equal runs
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Equal(Vec<&'a str>),
    Change {
        deleted: Vec<&'a str>,
        inserted: Vec<&'a str>,
    },
}

impl<'a> Segment<'a> {
    fn equal(lines: &[&'a str]) -> Self {
        Segment::Equal(lines.to_vec())
    }

    fn change(deleted: &[&'a str], inserted: &[&'a str]) -> Self {
        Segment::Change {
            deleted: deleted.to_vec(),
            inserted: inserted.to_vec(),
        }
    }

    /// Size of the larger side of a change, in lines
    fn edit_len(&self) -> usize {
        match self {
            Segment::Equal(_) => 0,
            Segment::Change { deleted, inserted } => deleted.len().max(inserted.len()),
        }
    }
}

/// Append a segment, coalescing with the previous one and eliminating equal
/// runs that are no longer than the edits on both of their sides.
fn push_segment<'a>(segments: &mut Vec<Segment<'a>>, segment: Segment<'a>) {
    match segment {
        Segment::Equal(lines) => {
            if lines.is_empty() {
                return;
            }
            if let Some(Segment::Equal(prev)) = segments.last_mut() {
                prev.extend(lines);
            } else {
                segments.push(Segment::Equal(lines));
            }
        }
        Segment::Change { deleted, inserted } => {
            if let Some(Segment::Change {
                deleted: prev_deleted,
                inserted: prev_inserted,
            }) = segments.last_mut()
            {
                prev_deleted.extend(deleted);
                prev_inserted.extend(inserted);
            } else {
                segments.push(Segment::Change { deleted, inserted });
            }
            while absorb_sandwiched_equality(segments) {}
        }
    }
}

/// Merge a trailing `Change, Equal, Change` triple into one change when the
/// equal run is short relative to both neighbours. Returns whether it merged.
fn absorb_sandwiched_equality(segments: &mut Vec<Segment<'_>>) -> bool {
    let n = segments.len();
    if n < 3 {
        return false;
    }

    let equal_len = match &segments[n - 2] {
        Segment::Equal(lines) => lines.len(),
        Segment::Change { .. } => return false,
    };
    let before = segments[n - 3].edit_len();
    let after = segments[n - 1].edit_len();
    if before == 0 || after == 0 || equal_len > before || equal_len > after {
        return false;
    }

    let tail = segments.pop();
    let middle = segments.pop();
    if let (
        Some(Segment::Change {
            deleted: tail_deleted,
            inserted: tail_inserted,
        }),
        Some(Segment::Equal(equal)),
        Some(Segment::Change { deleted, inserted }),
    ) = (tail, middle, segments.last_mut())
    {
        deleted.extend(equal.iter().copied());
        deleted.extend(tail_deleted);
        inserted.extend(equal);
        inserted.extend(tail_inserted);
    }
    true
}
