//! Ranked local-maximum tracking for marker placement.
//!
//! [`PeakTable`] keeps the strongest local maxima of a trace in descending
//! level order. It is fed either one whole trace at a time
//! ([`PeakTable::scan`]) or segment by segment with a running bin offset,
//! which is how swept captures stitch their tiles.

/// Markers a plot can display at once.
pub const MAX_MARKERS: usize = 10;

/// Ranked entries kept by a [`PeakTable`]; one spare slot beyond the
/// displayable markers absorbs shifted-out candidates.
const TABLE_LEN: usize = MAX_MARKERS + 1;

/// Level below any real trace data; fresh slots start here so the first
/// scan always beats them.
pub const LEVEL_FLOOR: f32 = -200.0;

/// Descending table of the strongest local maxima seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakTable {
    bins: [usize; TABLE_LEN],
    levels: [f32; TABLE_LEN],
}

impl Default for PeakTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakTable {
    /// Empty table with every level at [`LEVEL_FLOOR`].
    pub fn new() -> Self {
        Self {
            bins: [0; TABLE_LEN],
            levels: [LEVEL_FLOOR; TABLE_LEN],
        }
    }

    /// Clear all entries back to the floor.
    pub fn reset(&mut self) {
        self.bins = [0; TABLE_LEN];
        self.levels = [LEVEL_FLOOR; TABLE_LEN];
    }

    /// Force the top entry to a known bin and level.
    ///
    /// Scans never visit the first bin of a trace, so the caller plants it
    /// here before scanning; a genuinely stronger maximum will displace it.
    pub fn seed(&mut self, bin: usize, level: f32) {
        self.bins[0] = bin;
        self.levels[0] = level;
    }

    /// Bin of the entry at `rank` (0 = strongest).
    pub fn bin(&self, rank: usize) -> usize {
        self.bins[rank]
    }

    /// Level of the entry at `rank`.
    pub fn level(&self, rank: usize) -> f32 {
        self.levels[rank]
    }

    /// Insert a candidate, keeping the table sorted by descending level.
    ///
    /// Entries below the current weakest are dropped; everything from the
    /// insertion point shifts down one rank.
    pub fn insert(&mut self, bin: usize, level: f32) {
        for rank in 0..TABLE_LEN {
            if level > self.levels[rank] {
                for shifted in (rank + 1..TABLE_LEN).rev() {
                    self.levels[shifted] = self.levels[shifted - 1];
                    self.bins[shifted] = self.bins[shifted - 1];
                }
                self.levels[rank] = level;
                self.bins[rank] = bin;
                break;
            }
        }
    }

    /// Scan a trace for local maxima and insert each into the table.
    ///
    /// A sample qualifies when it beats both neighbors and the weakest
    /// table entry; the first two samples have no left context and are
    /// skipped. `base_bin` offsets recorded bins so segment scans index
    /// into the stitched trace.
    pub fn scan(&mut self, levels: &[f32], base_bin: usize) {
        for i in 2..levels.len() {
            let candidate = levels[i - 1];
            if candidate > self.levels[TABLE_LEN - 1]
                && levels[i - 2] < candidate
                && candidate > levels[i]
            {
                self.insert(base_bin + i - 1, candidate);
            }
        }
    }

    /// [`PeakTable::scan`] over sample magnitudes, for bipolar traces.
    pub fn scan_abs(&mut self, values: &[f32], base_bin: usize) {
        for i in 2..values.len() {
            let candidate = values[i - 1].abs();
            if candidate > self.levels[TABLE_LEN - 1]
                && values[i - 2].abs() < candidate
                && candidate > values[i].abs()
            {
                self.insert(base_bin + i - 1, candidate);
            }
        }
    }
}

/// Walk from `start` to the nearest local maximum of `levels`.
///
/// Both directions are explored while the neighbor keeps rising; when both
/// sides lead uphill the higher summit wins. Out-of-range starts are
/// clamped to the last sample.
pub fn climb_to_local_max(levels: &[f32], start: usize) -> usize {
    if levels.is_empty() {
        return 0;
    }
    let start = start.min(levels.len() - 1);
    let mut up = start;
    while up + 1 < levels.len() && levels[up + 1] > levels[up] {
        up += 1;
    }
    let mut down = start;
    while down > 0 && levels[down - 1] > levels[down] {
        down -= 1;
    }
    if levels[up] >= levels[down] { up } else { down }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_sits_at_the_floor() {
        let table = PeakTable::new();
        for rank in 0..=MAX_MARKERS {
            assert_eq!(table.bin(rank), 0);
            assert_eq!(table.level(rank), LEVEL_FLOOR);
        }
    }

    #[test]
    fn insert_keeps_descending_order() {
        let mut table = PeakTable::new();
        table.insert(3, -10.0);
        table.insert(7, -3.0);
        table.insert(5, -6.0);
        assert_eq!(table.bin(0), 7);
        assert_eq!(table.bin(1), 5);
        assert_eq!(table.bin(2), 3);
        assert_eq!(table.level(0), -3.0);
    }

    #[test]
    fn weak_candidates_fall_off_a_full_table() {
        let mut table = PeakTable::new();
        for i in 0..TABLE_LEN {
            table.insert(i, -(i as f32));
        }
        // Weaker than every kept entry: rejected outright.
        table.insert(99, -100.0);
        assert_eq!(table.level(MAX_MARKERS), -(MAX_MARKERS as f32));
        // Stronger than the weakest: pushes it out.
        table.insert(42, -0.5);
        assert_eq!(table.bin(1), 42);
        assert_eq!(table.level(MAX_MARKERS), -(MAX_MARKERS as f32 - 1.0));
    }

    #[test]
    fn scan_finds_interior_local_maxima() {
        let trace = [-80.0, -20.0, -70.0, -75.0, -10.0, -60.0, -65.0];
        let mut table = PeakTable::new();
        table.scan(&trace, 0);
        assert_eq!(table.bin(0), 4);
        assert_eq!(table.level(0), -10.0);
        assert_eq!(table.bin(1), 1);
        assert_eq!(table.level(1), -20.0);
    }

    #[test]
    fn scan_never_reports_the_first_sample() {
        // Trace falls from its very first sample; no interior maximum exists.
        let trace = [0.0, -10.0, -20.0, -30.0];
        let mut table = PeakTable::new();
        table.scan(&trace, 0);
        assert_eq!(table.level(0), LEVEL_FLOOR);
    }

    #[test]
    fn seed_is_displaced_by_stronger_scans() {
        let trace = [-6.0, -30.0, -2.0, -40.0];
        let mut table = PeakTable::new();
        table.seed(0, trace[0]);
        table.scan(&trace, 0);
        assert_eq!(table.bin(0), 2);
        assert_eq!(table.bin(1), 0);
    }

    #[test]
    fn base_bin_offsets_recorded_positions() {
        let segment = [-50.0, -5.0, -55.0];
        let mut table = PeakTable::new();
        table.scan(&segment, 128);
        assert_eq!(table.bin(0), 129);
    }

    #[test]
    fn scan_abs_ranks_by_magnitude() {
        let trace = [0.0, -0.9, 0.0, 0.4, 0.0];
        let mut table = PeakTable::new();
        table.scan_abs(&trace, 0);
        assert_eq!(table.bin(0), 1);
        assert_eq!(table.level(0), 0.9);
        assert_eq!(table.bin(1), 3);
    }

    #[test]
    fn climb_walks_uphill_both_ways() {
        let trace = [0.0, 3.0, 1.0, 2.0, 5.0, 4.0];
        // From the valley at 2, the right slope tops out higher.
        assert_eq!(climb_to_local_max(&trace, 2), 4);
        // From 1 there is nowhere higher nearby.
        assert_eq!(climb_to_local_max(&trace, 1), 1);
    }

    #[test]
    fn climb_clamps_out_of_range_starts() {
        let trace = [1.0, 2.0, 3.0];
        assert_eq!(climb_to_local_max(&trace, 10), 2);
        assert_eq!(climb_to_local_max(&[], 5), 0);
    }
}
