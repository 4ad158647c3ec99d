//! Drop-target geometry for grab-and-move row reordering.
//!
//! While a grab is active the engine re-runs on every pointer movement so
//! the visible order tracks the pointer; the resulting order only becomes
//! durable when the row is dropped.

/// Vertical extent of one candidate row, in the same units as the pointer
/// coordinate (screen cells in the TUI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub top: f32,
    pub height: f32,
}

impl RowBounds {
    pub fn new(top: f32, height: f32) -> Self {
        RowBounds { top, height }
    }

    fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// Picks the candidate the grabbed row should be inserted *before*.
///
/// `candidates` are the rows of the column excluding the grabbed one, in
/// display order. A candidate qualifies when its midpoint lies below the
/// pointer (`pointer_y - midpoint < 0`); among qualifiers the one closest
/// to the pointer wins. The scan starts from a negative-infinity sentinel
/// so the first qualifier always beats it. `None` means the pointer is
/// below every candidate and the grabbed row goes to the end.
pub fn drop_target(candidates: &[RowBounds], pointer_y: f32) -> Option<usize> {
    let mut closest = f32::NEG_INFINITY;
    let mut target = None;
    for (index, row) in candidates.iter().enumerate() {
        let offset = pointer_y - row.midpoint();
        if offset < 0.0 && offset > closest {
            closest = offset;
            target = Some(index);
        }
    }
    target
}

/// Maps an engine result onto an insertion index for the column's row list
/// after the grabbed row has been removed: insert-before a candidate keeps
/// its index, append lands past the last candidate.
pub fn insertion_index(candidate_count: usize, target: Option<usize>) -> usize {
    target.unwrap_or(candidate_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacked(tops: &[f32]) -> Vec<RowBounds> {
        tops.iter().map(|&top| RowBounds::new(top, 50.0)).collect()
    }

    // --- drop_target ---

    #[test]
    fn picks_first_row_below_pointer() {
        // Midpoints 25, 75, 125, 175; pointer 120 is above 125 and 175, and
        // 125 is the nearer of the two.
        let rows = stacked(&[0.0, 50.0, 100.0, 150.0]);
        assert_eq!(drop_target(&rows, 120.0), Some(2));
    }

    #[test]
    fn pointer_below_all_rows_appends() {
        let rows = stacked(&[0.0, 50.0, 100.0, 150.0]);
        assert_eq!(drop_target(&rows, 500.0), None);
    }

    #[test]
    fn pointer_above_all_rows_targets_first() {
        let rows = stacked(&[0.0, 50.0, 100.0]);
        assert_eq!(drop_target(&rows, -10.0), Some(0));
    }

    #[test]
    fn no_candidates_appends() {
        assert_eq!(drop_target(&[], 10.0), None);
    }

    #[test]
    fn pointer_exactly_on_midpoint_skips_that_row() {
        // Offset zero does not qualify; the next row down wins.
        let rows = stacked(&[0.0, 50.0]);
        assert_eq!(drop_target(&rows, 25.0), Some(1));
    }

    // --- insertion_index ---

    #[test]
    fn insertion_index_maps_append_past_candidates() {
        assert_eq!(insertion_index(3, Some(1)), 1);
        assert_eq!(insertion_index(3, None), 3);
    }
}
