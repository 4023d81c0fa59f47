//! Incrementally maintained set of all sequences on the board

use std::sync::Arc;

use crate::board::{Grid, Pos, Stone, TOTAL_CELLS};

use super::{Axis, Move, Sequence};

/// Sequences with an open end on one cell. Shared between index versions
/// until a move touches the cell.
type Cell = Arc<Vec<Arc<Sequence>>>;

/// Per-cell lookup from open-end cell to the sequences ending there.
#[derive(Debug, Clone)]
struct EndTable {
    cells: Vec<Cell>,
}

impl EndTable {
    fn new() -> Self {
        Self {
            cells: vec![Arc::new(Vec::new()); TOTAL_CELLS],
        }
    }

    #[inline]
    fn at(&self, pos: Pos) -> &[Arc<Sequence>] {
        &self.cells[pos.to_index()]
    }

    fn insert(&mut self, seq: &Arc<Sequence>) {
        for end in seq.ends() {
            Arc::make_mut(&mut self.cells[end.to_index()]).push(Arc::clone(seq));
        }
    }

    fn remove(&mut self, seq: &Arc<Sequence>) {
        for end in seq.ends() {
            let cell = Arc::make_mut(&mut self.cells[end.to_index()]);
            let found = cell.iter().position(|s| same(s, seq));
            debug_assert!(found.is_some(), "{:?} should be indexed at its end {}", seq, end);
            if let Some(i) = found {
                cell.swap_remove(i);
            }
        }
    }
}

#[inline]
fn same(a: &Arc<Sequence>, b: &Arc<Sequence>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

/// The complete set of sequences for a position.
///
/// An index built by [`SequenceIndex::new`], [`SequenceIndex::append`] or
/// [`SequenceIndex::rebuild`] carries the open-end table and can be
/// extended. Query methods return filtered *views*: they share the same
/// sequences, have no table, and cannot be appended to.
#[derive(Debug, Clone)]
pub struct SequenceIndex {
    sequences: Vec<Arc<Sequence>>,
    ends: Option<EndTable>,
}

impl Default for SequenceIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceIndex {
    /// Empty, appendable index for an empty board
    pub fn new() -> Self {
        Self {
            sequences: Vec::new(),
            ends: Some(EndTable::new()),
        }
    }

    fn view(sequences: Vec<Arc<Sequence>>) -> Self {
        Self {
            sequences,
            ends: None,
        }
    }

    /// Only indexes produced by `new`, `append` or `rebuild` accept moves
    #[inline]
    pub fn is_appendable(&self) -> bool {
        self.ends.is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Sequence>> {
        self.sequences.iter()
    }

    /// Sequences with an open end on `pos`. Always empty for views.
    pub fn ends_at(&self, pos: Pos) -> &[Arc<Sequence>] {
        self.ends.as_ref().map_or(&[], |table| table.at(pos))
    }

    /// Longest sequence, first one wins ties
    pub fn longest(&self) -> Option<&Arc<Sequence>> {
        self.sequences
            .iter()
            .reduce(|best, s| if s.len() > best.len() { s } else { best })
    }

    /// Fold `mv` into the index and return the updated index.
    ///
    /// Same-player sequences with an open end on the move's cell are
    /// extended, axes without an extension get a fresh length-1 seed, and
    /// sequences sharing an axis through the move are merged into one.
    /// `self` is left unchanged.
    ///
    /// # Panics
    ///
    /// Panics when called on a filtered view.
    #[must_use]
    pub fn append(&self, mv: Move) -> SequenceIndex {
        let Some(table) = &self.ends else {
            panic!("cannot append {:?} to a filtered sequence view", mv);
        };
        let mut sequences = self.sequences.clone();
        let mut ends = table.clone();
        let mut touched: Vec<Arc<Sequence>> = Vec::with_capacity(4);

        // 1. Extend the runs that end on this cell
        let local: Vec<Arc<Sequence>> = ends
            .at(mv.pos)
            .iter()
            .filter(|s| s.player() == mv.player)
            .cloned()
            .collect();
        for old in local {
            let Some(extended) = old.append(mv) else {
                debug_assert!(false, "{:?} should extend {:?}", mv, old);
                continue;
            };
            remove_sequence(&mut sequences, &old);
            ends.remove(&old);
            let extended = Arc::new(extended);
            ends.insert(&extended);
            sequences.push(Arc::clone(&extended));
            touched.push(extended);
        }

        // 2. Seed the axes nothing extended
        for seed in Sequence::for_move(mv) {
            if touched.iter().any(|s| s.axis() == seed.axis()) {
                continue;
            }
            let seed = Arc::new(seed);
            ends.insert(&seed);
            sequences.push(Arc::clone(&seed));
            touched.push(seed);
        }

        // 3. Join runs that now meet through the move
        for axis in Axis::ALL {
            let mut group: Vec<Arc<Sequence>> =
                touched.iter().filter(|s| s.axis() == axis).cloned().collect();
            if group.len() < 2 {
                continue;
            }
            let mut merged: Option<Sequence> = None;
            while let Some(seq) = group.pop() {
                remove_sequence(&mut sequences, &seq);
                ends.remove(&seq);
                merged = Some(match merged {
                    None => (*seq).clone(),
                    Some(acc) => match acc.merge(&seq) {
                        Some(joined) => joined,
                        None => {
                            debug_assert!(false, "{:?} should merge with {:?}", acc, seq);
                            // Keep the unjoined run indexed rather than losing it
                            ends.insert(&seq);
                            sequences.push(seq);
                            acc
                        }
                    },
                });
            }
            if let Some(merged) = merged {
                let merged = Arc::new(merged);
                ends.insert(&merged);
                sequences.push(merged);
            }
        }

        SequenceIndex {
            sequences,
            ends: Some(ends),
        }
    }

    /// Build the index from scratch by scanning every stone on `grid`
    pub fn rebuild(grid: &Grid) -> SequenceIndex {
        let mut sequences = Vec::new();
        let mut ends = EndTable::new();

        for (pos, player) in grid.occupied() {
            for axis in Axis::ALL {
                let (dr, dc) = axis.backward();
                let starts_run = pos
                    .offset(dr, dc, 1)
                    .map_or(true, |prev| grid.get(prev) != player);
                if !starts_run {
                    continue;
                }
                let Some(mut seq) = Sequence::for_move(Move::at(pos, player)).find(|s| s.axis() == axis)
                else {
                    continue;
                };
                while let Some(next) = seq.top_end().filter(|&p| grid.get(p) == player) {
                    match seq.append(Move::at(next, player)) {
                        Some(longer) => seq = longer,
                        None => break,
                    }
                }
                let seq = Arc::new(seq);
                ends.insert(&seq);
                sequences.push(seq);
            }
        }

        SequenceIndex {
            sequences,
            ends: Some(ends),
        }
    }

    fn filtered(&self, keep: impl Fn(&Sequence) -> bool) -> SequenceIndex {
        Self::view(self.sequences.iter().filter(|s| keep(s)).cloned().collect())
    }

    /// Sequences that contain `pos`
    pub fn get_by_position(&self, pos: Pos) -> SequenceIndex {
        self.filtered(|s| s.contains(pos))
    }

    pub fn get_by_player(&self, player: Stone) -> SequenceIndex {
        self.filtered(|s| s.player() == player)
    }

    pub fn get_by_length(&self, length: usize) -> SequenceIndex {
        self.filtered(|s| s.len() == length)
    }

    /// Sequences with exactly `sides` blocked ends within `n` cells
    pub fn get_by_sides_blocked(&self, grid: &Grid, sides: usize, n: Option<usize>) -> SequenceIndex {
        self.filtered(|s| s.count_blocked(grid, n) == sides)
    }

    /// Sequences with exactly `sides` ends near a same-player run within `n` cells
    pub fn get_by_near_merge(&self, grid: &Grid, sides: usize, n: Option<usize>) -> SequenceIndex {
        self.filtered(|s| s.count_near_merge(grid, n) == sides)
    }

    /// Sequences with at least one end still open
    pub fn get_by_not_blocked(&self, grid: &Grid, n: Option<usize>) -> SequenceIndex {
        self.filtered(|s| s.count_blocked(grid, n) < 2)
    }

    /// Up to `n` sequences by descending length after skipping `skip`
    pub fn get_largest_sequences(&self, n: usize, skip: usize) -> SequenceIndex {
        let mut sorted = self.sequences.clone();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()));
        Self::view(sorted.into_iter().skip(skip).take(n).collect())
    }

    /// Up to `n` sequences by ascending length after skipping `skip`
    pub fn get_smallest_sequences(&self, n: usize, skip: usize) -> SequenceIndex {
        let mut sorted = self.sequences.clone();
        sorted.sort_by_key(|s| s.len());
        Self::view(sorted.into_iter().skip(skip).take(n).collect())
    }
}

fn remove_sequence(sequences: &mut Vec<Arc<Sequence>>, seq: &Arc<Sequence>) {
    let found = sequences.iter().position(|s| same(s, seq));
    debug_assert!(found.is_some(), "{:?} should be in the sequence list", seq);
    if let Some(i) = found {
        sequences.swap_remove(i);
    }
}

impl<'a> IntoIterator for &'a SequenceIndex {
    type Item = &'a Arc<Sequence>;
    type IntoIter = std::slice::Iter<'a, Arc<Sequence>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}
