//! Selection state as seen by the engine (read-only input supplied by the host).

/// One selection range. `anchor == head` is a plain cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionRange {
    /// Fixed end of the selection.
    pub anchor: usize,
    /// Moving end (where the caret is drawn).
    pub head: usize,
}

impl SelectionRange {
    /// A range from `anchor` to `head`.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// An empty range at `pos`.
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    /// Lower bound.
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound.
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Whether the range selects nothing.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    fn contains_inclusive(&self, pos: usize) -> bool {
        self.from() <= pos && pos <= self.to()
    }
}

/// All selection ranges plus the index of the primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSelection {
    ranges: Vec<SelectionRange>,
    main: usize,
}

impl EditorSelection {
    /// Build a normalized selection: ranges are sorted, overlapping ranges are merged and the
    /// primary index follows the primary head.
    pub fn new(ranges: Vec<SelectionRange>, main: usize) -> Self {
        if ranges.is_empty() {
            return Self::cursor(0);
        }
        let (ranges, main) = normalize_ranges(ranges, main);
        Self { ranges, main }
    }

    /// A single cursor.
    pub fn cursor(pos: usize) -> Self {
        Self {
            ranges: vec![SelectionRange::cursor(pos)],
            main: 0,
        }
    }

    /// A single range.
    pub fn single(anchor: usize, head: usize) -> Self {
        Self {
            ranges: vec![SelectionRange::new(anchor, head)],
            main: 0,
        }
    }

    /// All ranges in document order.
    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    /// Index of the primary range.
    pub fn main_index(&self) -> usize {
        self.main
    }

    /// The primary range.
    pub fn primary(&self) -> SelectionRange {
        self.ranges[self.main]
    }

    /// Head of the primary range: the reference point for hide/show decisions.
    pub fn primary_head(&self) -> usize {
        self.primary().head
    }
}

fn normalize_ranges(
    mut ranges: Vec<SelectionRange>,
    main: usize,
) -> (Vec<SelectionRange>, usize) {
    let primary_head = ranges.get(main).map_or(ranges[0].head, |r| r.head);

    ranges.sort_by(|a, b| {
        a.from()
            .cmp(&b.from())
            .then_with(|| a.to().cmp(&b.to()))
            .then_with(|| a.head.cmp(&b.head))
    });

    // Touching ranges stay separate; only real overlap (or exact duplicates) merges.
    let mut merged: Vec<SelectionRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        let Some(last) = merged.last_mut() else {
            merged.push(range);
            continue;
        };

        if range.from() < last.to() {
            let from = last.from().min(range.from());
            let to = last.to().max(range.to());
            let keep_head = if range.head == primary_head {
                range.head
            } else {
                last.head
            };
            *last = if keep_head == from {
                SelectionRange::new(to, from)
            } else {
                SelectionRange::new(from, to)
            };
        } else if range.from() == last.from() && range.to() == last.to() {
            if range.head == primary_head {
                *last = range;
            }
        } else {
            merged.push(range);
        }
    }

    let main = merged
        .iter()
        .position(|r| r.head == primary_head)
        .or_else(|| merged.iter().position(|r| r.contains_inclusive(primary_head)))
        .unwrap_or_else(|| merged.len().saturating_sub(1));

    (merged, main)
}
