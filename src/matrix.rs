use std::fmt;

use itertools::Itertools;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::indices::{CellIndex, ItemIndex};

/// An item (column) header in the matrix.
#[derive(Debug, Copy, Clone)]
struct Item {
    /// The previous item in the (horizontal) list of active items, in cyclic
    /// order. The contents of this variable are preserved when the item is
    /// removed from the list, which is what makes the dancing links
    /// technique applicable to lists of active items.
    ///
    /// This field corresponds to the `LLINK` pointer in Knuth's data structure.
    left: ItemIndex,
    /// The next item in the (horizontal) list of active items, in cyclic
    /// order. The contents of this variable are preserved when the item
    /// is removed from the list. (See `self.left` for details.)
    ///
    /// This field corresponds to the `RLINK` pointer in Knuth's data structure.
    right: ItemIndex,
    /// The first active cell in the vertical list for this item, if any.
    ///
    /// This field corresponds to the `DLINK` pointer in Knuth's data structure.
    ///
    /// # Invariant
    ///
    /// `first` is [`None`] if and only if `last` is [`None`].
    first: Option<CellIndex>,
    /// The last active cell in the vertical list for this item, if any.
    ///
    /// This field corresponds to the `ULINK` pointer in Knuth's data structure.
    last: Option<CellIndex>,
    /// The number of active cells in the vertical list for this item.
    ///
    /// # Invariants
    ///
    /// - `len == 0` if and only if `first` and `last` are [`None`].
    /// - If `len == 1`, then `first == last`.
    len: usize,
}

impl Item {
    /// Creates an item whose rings have not been threaded yet and whose
    /// vertical list is empty.
    fn unlinked() -> Self {
        Self {
            left: MASTER,
            right: MASTER,
            first: None,
            last: None,
            len: 0,
        }
    }
}

/// The position of the special header in the `items` table that serves as
/// the head of the list of active primary items.
///
/// The list of active secondary items has its own header, namely the last
/// element of the table. Its position depends on the number of items in
/// the matrix, so this constant has no secondary counterpart.
const MASTER: ItemIndex = ItemIndex::new(0);

/// One `1` entry of the matrix: the instance of an item in an option.
#[derive(Debug, Copy, Clone)]
struct Cell {
    /// The item this cell is an instance of.
    ///
    /// This field corresponds to the `TOP` field in Knuth's data structure.
    item: ItemIndex,
    /// The option this cell belongs to.
    option: usize,
    /// The previous active cell in the vertical list for `item`, if any.
    ///
    /// This field corresponds to the `ULINK` pointer in Knuth's data
    /// structure, except that it equals [`None`] instead of `item` when the
    /// cell heads the vertical list.
    above: Option<CellIndex>,
    /// The next active cell in the vertical list for `item`, if any.
    ///
    /// This field corresponds to the `DLINK` pointer in Knuth's data
    /// structure, except that it equals [`None`] instead of `item` when the
    /// cell ends the vertical list.
    below: Option<CellIndex>,
}

/// The contiguous range of the `cells` arena that holds one option.
///
/// Contiguity replaces explicit sibling links: the cells of an option are
/// visited cyclically by index arithmetic within the span.
#[derive(Debug, Copy, Clone)]
struct Span {
    first: CellIndex,
    len: usize,
}

impl Span {
    /// The raw arena positions of the cells in this option.
    fn range(&self) -> std::ops::Range<usize> {
        self.first.get()..self.first.get() + self.len
    }
}

/// The way the resumable search is currently moving through the search tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Extending the partial solution with further choices.
    Down,
    /// Backtracking in order to try the next alternative.
    Up,
}

/// A sparse 0/1 matrix over primary and secondary items, searched for exact
/// covers with Knuth's dancing links technique.
///
/// Rows are *options*, identified by insertion order; columns are *items*,
/// identified by their index. Items below [`Self::nb_primary`] must be
/// covered exactly once by a solution, the remaining items at most once.
///
/// The matrix carries its own search session: a working stack of chosen
/// cells, a traversal [`Direction`] and a pinned prefix depth, so that
/// [`Self::search_iter`] can produce solutions one at a time and a [`Clone`]
/// taken between calls resumes from the identical position. All links are
/// arena indices, which is what makes the bulk copy faithful.
///
/// # Example
///
/// ```
/// use dlx_covers::Matrix;
///
/// let mut matrix = Matrix::new(3, 3);
/// matrix.add_option(&[0, 2])?;
/// matrix.add_option(&[1])?;
/// matrix.add_option(&[0, 1])?;
///
/// let solutions = matrix.search_rec(usize::MAX);
/// assert_eq!(solutions, [vec![0, 1]]);
/// # Ok::<(), dlx_covers::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    /// The number of primary items; these occupy the low-numbered slots.
    nb_primary: usize,
    /// The item headers: the master header for primary items at position 0,
    /// the item with index $j$ at position $j+1$, and the header for
    /// secondary items at the final position.
    items: Vec<Item>,
    /// The cell arena. Each option occupies a contiguous span.
    cells: Vec<Cell>,
    /// The span of each option, indexed by option id.
    options: Vec<Span>,
    /// The working stack of chosen cells; its length is the depth of the
    /// partial solution.
    work: Vec<CellIndex>,
    /// Which way [`Self::search_iter`] is currently moving.
    direction: Direction,
    /// The number of bottom entries of `work` that were committed through
    /// [`Self::choose`]; the resumable search never unwinds below them.
    pinned: usize,
    /// How many cells have been chosen since the session began.
    nb_choices: u64,
    /// How many cells have danced out of their vertical lists since the
    /// session began.
    nb_dances: u64,
}

impl Matrix {
    // Setup routines.

    /// Creates a matrix with `nb_items` items and no options.
    ///
    /// The first `nb_primary` items are primary; `nb_primary` is clamped
    /// to `nb_items`. Secondary items may only ever be covered through the
    /// options that contain them, never branched on.
    #[must_use]
    pub fn new(nb_items: usize, nb_primary: usize) -> Self {
        let nb_primary = nb_primary.min(nb_items);
        let mut items = vec![Item::unlinked(); nb_items + 2];
        let secondary_head = nb_items + 1;
        Self::thread_ring(&mut items, 0, 1..=nb_primary);
        Self::thread_ring(&mut items, secondary_head, nb_primary + 1..=nb_items);
        Self {
            nb_primary,
            items,
            cells: Vec::new(),
            options: Vec::new(),
            work: Vec::new(),
            direction: Direction::Down,
            pinned: 0,
            nb_choices: 0,
            nb_dances: 0,
        }
    }

    /// Creates a matrix and appends the given options to it.
    pub fn from_options(
        nb_items: usize,
        nb_primary: usize,
        options: &[Vec<usize>],
    ) -> Result<Self> {
        let mut matrix = Self::new(nb_items, nb_primary);
        for option in options {
            matrix.add_option(option)?;
        }
        Ok(matrix)
    }

    /// Threads the header at `head` and the table positions in `members`
    /// into one cyclic horizontal list.
    fn thread_ring(items: &mut [Item], head: usize, members: impl Iterator<Item = usize>) {
        let mut prev = head;
        for ix in members {
            items[prev].right = ItemIndex::new(ix);
            items[ix].left = ItemIndex::new(prev);
            prev = ix;
        }
        items[prev].right = ItemIndex::new(head);
        items[head].left = ItemIndex::new(prev);
    }

    /// Appends an option given as a list of item indices and returns its id.
    ///
    /// The items are kept in the order given; [`Self::option_sparse`]
    /// reproduces that order. Fails with [`Error::EmptyOption`] on an empty
    /// list and with [`Error::OutOfRange`] on an item index beyond
    /// [`Self::nb_items`]. All inputs are checked before the first mutation,
    /// so a failing call leaves the matrix unchanged.
    pub fn add_option(&mut self, option: &[usize]) -> Result<usize> {
        if option.is_empty() {
            return Err(Error::EmptyOption);
        }
        for &item in option {
            if item >= self.nb_items() {
                return Err(Error::OutOfRange {
                    what: "item index",
                    index: item,
                    bound: self.nb_items(),
                });
            }
        }
        let id = self.options.len();
        let first = CellIndex::new(self.cells.len());
        self.cells.reserve(option.len());
        for (k, &item) in option.iter().enumerate() {
            debug_assert!(
                !option[..k].contains(&item),
                "item {item} appears twice in the option"
            );
            self.append_cell(ItemIndex::new(item + 1), id);
        }
        self.options.push(Span {
            first,
            len: option.len(),
        });
        Ok(id)
    }

    /// Appends an option given as a dense row of booleans and returns its id.
    ///
    /// The row length must equal [`Self::nb_items`], and at least one entry
    /// must be set.
    pub fn add_option_dense(&mut self, row: &[bool]) -> Result<usize> {
        let sparse = self.row_to_sparse(row)?;
        self.add_option(&sparse)
    }

    /// Appends a new cell to the vertical list of the given item.
    fn append_cell(&mut self, item_ix: ItemIndex, option: usize) {
        let ix = CellIndex::new(self.cells.len());
        let item = self.item_mut(item_ix);
        item.len += 1;
        let above = if let Some(prev_last) = item.last.replace(ix) {
            self.cells[prev_last.get()].below = Some(ix);
            Some(prev_last)
        } else {
            item.first = Some(ix);
            None
        };
        self.cells.push(Cell {
            item: item_ix,
            option,
            above,
            below: None,
        });
    }

    // Accessors.

    /// The number of items (columns), primary and secondary together.
    #[must_use]
    pub fn nb_items(&self) -> usize {
        self.items.len() - 2
    }

    /// The number of options (rows) added so far.
    #[must_use]
    pub fn nb_options(&self) -> usize {
        self.options.len()
    }

    /// The number of primary items.
    #[must_use]
    pub fn nb_primary(&self) -> usize {
        self.nb_primary
    }

    /// The item indices of an option, in the order they were given when
    /// the option was added.
    pub fn option_sparse(&self, option: usize) -> Result<Vec<usize>> {
        let span = self.span(option)?;
        Ok(span
            .range()
            .map(|ix| self.item_id(self.cells[ix].item))
            .collect())
    }

    /// The item indices of an option, in increasing order.
    pub fn option_sparse_sorted(&self, option: usize) -> Result<Vec<usize>> {
        let mut row = self.option_sparse(option)?;
        row.sort_unstable();
        Ok(row)
    }

    /// An option as a dense row of booleans of length [`Self::nb_items`].
    pub fn option_dense(&self, option: usize) -> Result<Vec<bool>> {
        let sparse = self.option_sparse(option)?;
        self.row_to_dense(&sparse)
    }

    /// Converts a dense row into the increasing list of set item indices.
    ///
    /// Fails with [`Error::SizeMismatch`] unless the row has exactly
    /// [`Self::nb_items`] entries.
    pub fn row_to_sparse(&self, row: &[bool]) -> Result<Vec<usize>> {
        if row.len() != self.nb_items() {
            return Err(Error::SizeMismatch {
                what: "dense row",
                expected: self.nb_items(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .enumerate()
            .filter_map(|(j, &set)| set.then_some(j))
            .collect())
    }

    /// Converts a list of item indices into a dense row of booleans.
    pub fn row_to_dense(&self, row: &[usize]) -> Result<Vec<bool>> {
        let mut dense = vec![false; self.nb_items()];
        for &item in row {
            if item >= self.nb_items() {
                return Err(Error::OutOfRange {
                    what: "item index",
                    index: item,
                    bound: self.nb_items(),
                });
            }
            dense[item] = true;
        }
        Ok(dense)
    }

    /// The number of still-active options that contain the given item.
    ///
    /// At rest this is the number of options containing the item; during
    /// a search it shrinks and grows as options dance out of and back into
    /// the vertical lists.
    pub fn item_size(&self, item: usize) -> Result<usize> {
        if item >= self.nb_items() {
            return Err(Error::OutOfRange {
                what: "item index",
                index: item,
                bound: self.nb_items(),
            });
        }
        Ok(self.item(ItemIndex::new(item + 1)).len)
    }

    /// Whether the given item is still in its active list.
    pub fn is_item_active(&self, item: usize) -> Result<bool> {
        if item >= self.nb_items() {
            return Err(Error::OutOfRange {
                what: "item index",
                index: item,
                bound: self.nb_items(),
            });
        }
        let ix = ItemIndex::new(item + 1);
        Ok(self.item(self.item(ix).left).right == ix)
    }

    /// Whether the given option could still take part in a solution, that
    /// is, whether its leading cell is linked into its vertical list.
    pub fn is_option_active(&self, option: usize) -> Result<bool> {
        let span = self.span(option)?;
        Ok(self.is_cell_linked(span.first))
    }

    /// Walks the vertical list of every active item and verifies that its
    /// recorded length matches the number of reachable cells.
    ///
    /// Diagnostic; the matrix is not modified. A [`Error::SizeMismatch`]
    /// here means the caller broke an invariant through a mid-search
    /// mutation, or there is a bug in the cover primitives.
    pub fn check_sizes(&self) -> Result<()> {
        for head in [MASTER, self.secondary_head()] {
            let mut ix = self.item(head).right;
            while ix != head {
                let item = self.item(ix);
                let mut count = 0;
                let mut cur = item.first;
                while let Some(c) = cur {
                    count += 1;
                    cur = self.cells[c.get()].below;
                }
                if count != item.len {
                    return Err(Error::SizeMismatch {
                        what: "item vertical list",
                        expected: item.len,
                        actual: count,
                    });
                }
                ix = item.right;
            }
        }
        Ok(())
    }

    /// Whether the proposed set of options covers every primary item exactly
    /// once and every secondary item at most once.
    pub fn is_solution(&self, options: &[usize]) -> Result<bool> {
        let mut counts = vec![0usize; self.nb_items()];
        for &option in options {
            let span = self.span(option)?;
            for ix in span.range() {
                counts[self.item_id(self.cells[ix].item)] += 1;
            }
        }
        Ok(counts.iter().enumerate().all(|(item, &count)| {
            if item < self.nb_primary {
                count == 1
            } else {
                count <= 1
            }
        }))
    }

    // Session accessors.

    /// The current depth of the working stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.work.len()
    }

    /// The number of bottom entries of the working stack committed through
    /// [`Self::choose`].
    #[must_use]
    pub fn pinned_depth(&self) -> usize {
        self.pinned
    }

    /// Which way the resumable search is currently moving.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// How many cells have been chosen since the session began.
    #[must_use]
    pub fn nb_choices(&self) -> u64 {
        self.nb_choices
    }

    /// How many cells have been unlinked from their vertical lists since
    /// the session began.
    #[must_use]
    pub fn nb_dances(&self) -> u64 {
        self.nb_dances
    }

    /// The option ids of the working stack, bottom first, pins included.
    #[must_use]
    pub fn get_solution(&self) -> Vec<usize> {
        self.work
            .iter()
            .map(|&ix| self.cells[ix.get()].option)
            .collect()
    }

    /// The option ids of the working stack, in increasing order.
    #[must_use]
    pub fn get_solution_sorted(&self) -> Vec<usize> {
        let mut solution = self.get_solution();
        solution.sort_unstable();
        solution
    }

    /// Writes the option ids of the working stack into `out`, replacing its
    /// previous contents. The chief purpose of the reserved storage is to
    /// avoid heap allocations when reading back many solutions.
    pub fn get_solution_into(&self, out: &mut Vec<usize>) {
        out.clear();
        out.extend(self.work.iter().map(|&ix| self.cells[ix.get()].option));
    }

    // Dancing links primitives.

    /// Unlinks a cell from the vertical list of its item.
    fn unlink(&mut self, ix: CellIndex) {
        let Cell {
            item, above, below, ..
        } = self.cells[ix.get()];
        match above {
            Some(a) => self.cells[a.get()].below = below,
            None => self.item_mut(item).first = below,
        }
        match below {
            Some(b) => self.cells[b.get()].above = above,
            None => self.item_mut(item).last = above,
        }
        self.item_mut(item).len -= 1;
        self.nb_dances += 1;
    }

    /// Puts a cell back into the vertical list of its item, using the
    /// neighbour links the cell kept while it was out.
    fn relink(&mut self, ix: CellIndex) {
        let Cell {
            item, above, below, ..
        } = self.cells[ix.get()];
        match above {
            Some(a) => self.cells[a.get()].below = Some(ix),
            None => self.item_mut(item).first = Some(ix),
        }
        match below {
            Some(b) => self.cells[b.get()].above = Some(ix),
            None => self.item_mut(item).last = Some(ix),
        }
        self.item_mut(item).len += 1;
    }

    /// Removes every sibling of `ix` from its vertical list, visiting the
    /// cells of the option cyclically to the right of `ix`.
    fn hide(&mut self, ix: CellIndex) {
        let Span { first, len } = self.options[self.cells[ix.get()].option];
        let base = first.get();
        let offset = ix.get() - base;
        for k in 1..len {
            self.unlink(CellIndex::new(base + (offset + k) % len));
        }
    }

    /// Undoes [`Self::hide`], visiting the siblings in the opposite order.
    fn unhide(&mut self, ix: CellIndex) {
        let Span { first, len } = self.options[self.cells[ix.get()].option];
        let base = first.get();
        let offset = ix.get() - base;
        for k in (1..len).rev() {
            self.relink(CellIndex::new(base + (offset + k) % len));
        }
    }

    /// Marks an item as covered: deletes it from its horizontal list and
    /// hides every option that contains it, top to bottom.
    fn cover(&mut self, ix: ItemIndex) {
        let Item {
            left, right, first, ..
        } = *self.item(ix);
        self.item_mut(left).right = right;
        self.item_mut(right).left = left;
        let mut cur = first;
        while let Some(c) = cur {
            self.hide(c);
            cur = self.cells[c.get()].below;
        }
    }

    /// Undoes the last [`Self::cover`] of this item: unhides every option
    /// that contains it, bottom to top, and puts the item back into its
    /// horizontal list.
    fn uncover(&mut self, ix: ItemIndex) {
        let Item {
            left, right, last, ..
        } = *self.item(ix);
        let mut cur = last;
        while let Some(c) = cur {
            self.unhide(c);
            cur = self.cells[c.get()].above;
        }
        self.item_mut(left).right = ix;
        self.item_mut(right).left = ix;
    }

    /// Commits the option of `ix` to the working stack and covers the items
    /// of its sibling cells, left to right. The item of `ix` itself must
    /// already be covered by the caller.
    fn choose_cell(&mut self, ix: CellIndex) {
        self.nb_choices += 1;
        self.work.push(ix);
        let Span { first, len } = self.options[self.cells[ix.get()].option];
        let base = first.get();
        let offset = ix.get() - base;
        for k in 1..len {
            let sibling = base + (offset + k) % len;
            self.cover(self.cells[sibling].item);
        }
    }

    /// Undoes [`Self::choose_cell`]: uncovers the sibling items right to
    /// left and pops the working stack.
    fn unchoose_cell(&mut self, ix: CellIndex) {
        let Span { first, len } = self.options[self.cells[ix.get()].option];
        let base = first.get();
        let offset = ix.get() - base;
        for k in (1..len).rev() {
            let sibling = base + (offset + k) % len;
            self.uncover(self.cells[sibling].item);
        }
        self.work.pop();
    }

    /// Finds the active primary item with the fewest active cells, the
    /// minimum-remaining-values branching heuristic. In case of equality the
    /// item reached first in the horizontal list wins. An item of size 0 is
    /// surely the result, so the scan stops there early.
    ///
    /// Returns [`None`] if no primary item remains, in which case the
    /// working stack is a solution.
    fn choose_min(&self) -> Option<ItemIndex> {
        let mut min_len = usize::MAX;
        let mut min_ix = None;
        let mut cur = self.item(MASTER).right;
        while cur != MASTER {
            let item = self.item(cur);
            if item.len < min_len {
                if item.len == 0 {
                    return Some(cur);
                }
                min_len = item.len;
                min_ix = Some(cur);
            }
            cur = item.right;
        }
        min_ix
    }

    // Search drivers.

    /// Explores the whole search tree below the current position and returns
    /// up to `max_solutions` solutions, each as the option ids of the
    /// working stack at the moment the solution was found (pins included).
    ///
    /// Zeroes [`Self::nb_choices`] and [`Self::nb_dances`] on entry. The
    /// matrix is restored to its entry state before returning, so the call
    /// can be repeated and interleaved with [`Self::search_iter`].
    pub fn search_rec(&mut self, max_solutions: usize) -> Vec<Vec<usize>> {
        self.nb_choices = 0;
        self.nb_dances = 0;
        let mut solutions = Vec::new();
        if max_solutions > 0 {
            self.search_rec_inner(max_solutions, &mut solutions);
        }
        solutions
    }

    fn search_rec_inner(&mut self, max_solutions: usize, solutions: &mut Vec<Vec<usize>>) {
        let Some(choice) = self.choose_min() else {
            solutions.push(self.get_solution());
            return;
        };
        if self.item(choice).len == 0 {
            return;
        }
        self.cover(choice);
        let mut cur = self.item(choice).first;
        while let Some(c) = cur {
            self.choose_cell(c);
            self.search_rec_inner(max_solutions, solutions);
            self.unchoose_cell(c);
            if solutions.len() >= max_solutions {
                break;
            }
            cur = self.cells[c.get()].below;
        }
        self.uncover(choice);
    }

    /// Advances the resumable search to the next solution.
    ///
    /// Returns `true` when a new solution has been produced; it stays in the
    /// session for readback through [`Self::get_solution`] until the next
    /// call. Returns `false` once the space below the pinned prefix is
    /// exhausted, and keeps returning `false` until [`Self::reset`] or
    /// [`Self::reset_to`] rewinds the session.
    ///
    /// Interleaved enumeration by repeated calls visits the same solutions
    /// in the same order as [`Self::search_rec`].
    pub fn search_iter(&mut self) -> bool {
        loop {
            match self.direction {
                Direction::Down => match self.choose_min() {
                    None => {
                        self.direction = Direction::Up;
                        return true;
                    }
                    Some(choice) => {
                        if self.item(choice).len == 0 {
                            self.direction = Direction::Up;
                        } else {
                            self.cover(choice);
                            let first = self
                                .item(choice)
                                .first
                                .expect("a nonempty vertical list has a first cell");
                            self.choose_cell(first);
                        }
                    }
                },
                Direction::Up => {
                    if self.work.len() <= self.pinned {
                        return false;
                    }
                    let top = *self.work.last().expect("stack is deeper than the pins");
                    self.unchoose_cell(top);
                    match self.cells[top.get()].below {
                        Some(next) => {
                            self.choose_cell(next);
                            self.direction = Direction::Down;
                        }
                        None => self.uncover(self.cells[top.get()].item),
                    }
                }
            }
        }
    }

    /// Like [`Self::search_iter`], but on success also writes the solution
    /// into `out`, replacing its previous contents.
    pub fn search_iter_into(&mut self, out: &mut Vec<usize>) -> bool {
        let found = self.search_iter();
        if found {
            self.get_solution_into(out);
        }
        found
    }

    /// Commits an option to the solution by hand, as a solver front-end does
    /// with pre-filled cells, and pins the whole working stack so that the
    /// resumable search and [`Self::reset_to`] leave it alone.
    ///
    /// Covers the item of the option's leading cell, then chooses the cell,
    /// exactly as the search itself would. Returns the new stack depth.
    /// It is the caller's responsibility to pin only options whose items
    /// are still active.
    pub fn choose(&mut self, option: usize) -> Result<usize> {
        let span = self.span(option)?;
        self.cover(self.cells[span.first.get()].item);
        self.choose_cell(span.first);
        self.pinned = self.work.len();
        Ok(self.work.len())
    }

    /// Unwinds the whole session, pins included: unchooses every stack entry,
    /// uncovers its item, points the search down again and zeroes the
    /// counters. The matrix is afterwards indistinguishable from a freshly
    /// built one with the same options.
    pub fn reset(&mut self) {
        self.unwind_to(0);
        self.pinned = 0;
        self.direction = Direction::Down;
        self.nb_choices = 0;
        self.nb_dances = 0;
    }

    /// Unwinds the working stack to the given depth and restarts the search
    /// from there, zeroing the counters. Entries at or below `depth` stay
    /// committed; `reset_to(pinned_depth())` therefore rewinds the search
    /// while preserving every pin. Pins above `depth` are dropped.
    pub fn reset_to(&mut self, depth: usize) -> Result<()> {
        if depth > self.work.len() {
            return Err(Error::OutOfRange {
                what: "reset depth",
                index: depth,
                bound: self.work.len(),
            });
        }
        self.unwind_to(depth);
        self.pinned = self.pinned.min(depth);
        self.direction = Direction::Down;
        self.nb_choices = 0;
        self.nb_dances = 0;
        Ok(())
    }

    fn unwind_to(&mut self, depth: usize) {
        while self.work.len() > depth {
            let top = *self.work.last().expect("stack is nonempty");
            self.unchoose_cell(top);
            self.uncover(self.cells[top.get()].item);
        }
    }

    // Transforms.

    /// Returns a fresh matrix holding the same options with the items
    /// renamed, where `perm[new] = old`: old item `perm[j]` becomes new
    /// item `j`.
    ///
    /// The primary partition is propagated faithfully, so `perm` must map
    /// the primary prefix onto itself; a permutation that would move a
    /// secondary item into the primary prefix is rejected with
    /// [`Error::InvalidPermutation`]. The source matrix, including its
    /// session, is left untouched; the result has no session.
    pub fn permuted_columns(&self, perm: &[usize]) -> Result<Matrix> {
        self.check_column_perm(perm)?;
        self.apply_inv_columns(&inverse_perm(perm))
    }

    /// The inverse form of [`Self::permuted_columns`], where
    /// `inv[old] = new`: old item `j` becomes new item `inv[j]`.
    pub fn permuted_inv_columns(&self, inv: &[usize]) -> Result<Matrix> {
        self.check_column_perm(inv)?;
        self.apply_inv_columns(inv)
    }

    fn apply_inv_columns(&self, inv: &[usize]) -> Result<Matrix> {
        let mut result = Matrix::new(self.nb_items(), self.nb_primary);
        for span in &self.options {
            let row: Vec<usize> = span
                .range()
                .map(|ix| inv[self.item_id(self.cells[ix].item)])
                .collect();
            result.add_option(&row)?;
        }
        Ok(result)
    }

    /// Returns a fresh matrix whose option at new row `i` is the option at
    /// old row `perm[i]`. The source matrix is left untouched; the result
    /// has no session.
    pub fn permuted_rows(&self, perm: &[usize]) -> Result<Matrix> {
        check_perm(perm, self.nb_options(), "row permutation", "option index")?;
        let mut result = Matrix::new(self.nb_items(), self.nb_primary);
        for &old in perm {
            let row = self.option_sparse(old)?;
            result.add_option(&row)?;
        }
        Ok(result)
    }

    fn check_column_perm(&self, perm: &[usize]) -> Result<()> {
        check_perm(perm, self.nb_items(), "column permutation", "item index")?;
        // A column permutation relates primary prefixes of the same length,
        // so it preserves the partition exactly when the prefix maps onto
        // itself; for a bijection this reads the same in both directions.
        for (position, &entry) in perm.iter().enumerate().take(self.nb_primary) {
            if entry >= self.nb_primary {
                return Err(Error::InvalidPermutation {
                    what: "column permutation crossing the primary prefix",
                    position,
                });
            }
        }
        Ok(())
    }

    /// Looks for one solution in a uniformly shuffled rendition of the
    /// matrix: the option order and the order of the primary items are both
    /// randomized, the transformed instance is solved with the resumable
    /// search, and the solution's option ids are mapped back. On success the
    /// ids are written into `solution` and `true` is returned; an instance
    /// without solutions yields `false`.
    ///
    /// Each call draws fresh randomness, so consecutive calls on a matrix
    /// with several solutions may return different ones. The session of
    /// `self` is not touched; pins do not constrain the randomized search.
    pub fn search_random(&self, solution: &mut Vec<usize>) -> bool {
        let mut rng = rand::rng();
        let mut row_perm: Vec<usize> = (0..self.nb_options()).collect();
        row_perm.shuffle(&mut rng);
        let mut column_perm: Vec<usize> = (0..self.nb_items()).collect();
        column_perm[..self.nb_primary].shuffle(&mut rng);

        let mut shuffled = self
            .permuted_columns(&column_perm)
            .and_then(|m| m.permuted_rows(&row_perm))
            .expect("a shuffled identity permutation stays valid");
        if !shuffled.search_iter() {
            return false;
        }
        solution.clear();
        solution.extend(shuffled.get_solution().into_iter().map(|i| row_perm[i]));
        true
    }

    // Internal helpers.

    /// Returns a reference to the item header at the given table position.
    fn item(&self, ix: ItemIndex) -> &Item {
        &self.items[ix.get()]
    }

    /// Returns a mutable reference to the item header at the given table
    /// position.
    fn item_mut(&mut self, ix: ItemIndex) -> &mut Item {
        &mut self.items[ix.get()]
    }

    /// The table position of the header for secondary items.
    fn secondary_head(&self) -> ItemIndex {
        ItemIndex::new(self.items.len() - 1)
    }

    /// The public index of the item at the given table position.
    fn item_id(&self, ix: ItemIndex) -> usize {
        ix.get() - 1
    }

    /// The span of the given option, with bounds reported as errors.
    fn span(&self, option: usize) -> Result<Span> {
        self.options
            .get(option)
            .copied()
            .ok_or_else(|| Error::OutOfRange {
                what: "option index",
                index: option,
                bound: self.nb_options(),
            })
    }

    /// Whether a cell is reachable from its item's vertical list.
    fn is_cell_linked(&self, ix: CellIndex) -> bool {
        let cell = &self.cells[ix.get()];
        match cell.above {
            Some(a) => self.cells[a.get()].below == Some(ix),
            None => self.item(cell.item).first == Some(ix),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for option in 0..self.nb_options() {
            let dense = self
                .option_dense(option)
                .expect("option ids below nb_options are valid");
            let row = dense.iter().map(|&set| usize::from(set)).join(", ");
            writeln!(f, "[{row}]")?;
        }
        Ok(())
    }
}

/// Returns the inverse of a permutation of `0..p.len()`, the table `q` with
/// `q[p[i]] = i` for all `i`.
///
/// The input must be a permutation; this is only checked in debug builds.
#[must_use]
pub fn inverse_perm(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        debug_assert!(p < perm.len(), "entry {p} is out of range");
        inv[p] = i;
    }
    inv
}

/// Verifies that `perm` is a permutation of `0..expected`: right length,
/// entries in range, no entry repeated.
fn check_perm(perm: &[usize], expected: usize, what: &'static str, entry: &'static str) -> Result<()> {
    if perm.len() != expected {
        return Err(Error::SizeMismatch {
            what,
            expected,
            actual: perm.len(),
        });
    }
    let mut seen = vec![false; expected];
    for (position, &p) in perm.iter().enumerate() {
        if p >= expected {
            return Err(Error::OutOfRange {
                what: entry,
                index: p,
                bound: expected,
            });
        }
        if seen[p] {
            return Err(Error::InvalidPermutation { what, position });
        }
        seen[p] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The ten-option instance over six items used throughout; its five
    /// solutions are known by heart.
    fn m6_10() -> Matrix {
        Matrix::from_options(
            6,
            6,
            &[
                vec![0, 2],
                vec![0, 1],
                vec![1, 4],
                vec![3],
                vec![3, 4],
                vec![5],
                vec![1],
                vec![0, 1, 2],
                vec![2, 3, 4],
                vec![1, 4, 5],
            ],
        )
        .unwrap()
    }

    fn m5_2() -> Matrix {
        Matrix::from_options(5, 5, &[vec![0, 1], vec![2, 3, 4]]).unwrap()
    }

    fn m5_3() -> Matrix {
        Matrix::from_options(5, 5, &[vec![0, 1], vec![2, 3, 4], vec![1, 2, 4]]).unwrap()
    }

    /// The eleven-option instance over ten items whose tail items can be
    /// declared secondary.
    fn m10(nb_primary: usize) -> Matrix {
        Matrix::from_options(
            10,
            nb_primary,
            &[
                vec![0, 4],
                vec![0, 5],
                vec![0, 6],
                vec![1, 4],
                vec![1, 5],
                vec![1, 6],
                vec![2, 4, 9],
                vec![2, 5],
                vec![2, 6],
                vec![3, 7, 9],
                vec![1, 5, 8],
            ],
        )
        .unwrap()
    }

    fn normalized(mut solutions: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        for solution in &mut solutions {
            solution.sort_unstable();
        }
        solutions.sort();
        solutions
    }

    fn enumerate_iter(matrix: &mut Matrix) -> Vec<Vec<usize>> {
        let mut solutions = Vec::new();
        let mut buffer = Vec::new();
        while matrix.search_iter_into(&mut buffer) {
            solutions.push(buffer.clone());
        }
        solutions
    }

    #[test]
    fn construction() {
        let empty = Matrix::new(5, 5);
        assert_eq!(empty.nb_items(), 5);
        assert_eq!(empty.nb_options(), 0);
        assert_eq!(empty.nb_primary(), 5);

        let m = m6_10();
        assert_eq!(m.nb_items(), 6);
        assert_eq!(m.nb_options(), 10);

        // The primary count clamps to the item count.
        assert_eq!(Matrix::new(3, 7).nb_primary(), 3);
    }

    #[test]
    fn add_option_rejects_bad_rows() {
        let mut m = m5_2();
        assert_eq!(m.add_option(&[]), Err(Error::EmptyOption));
        assert_eq!(
            m.add_option(&[2, 5]),
            Err(Error::OutOfRange {
                what: "item index",
                index: 5,
                bound: 5,
            })
        );
        // A failing call leaves the matrix unchanged and usable.
        assert_eq!(m.nb_options(), 2);
        assert!(m.check_sizes().is_ok());
        assert_eq!(m.add_option(&[2, 3]), Ok(2));
        assert_eq!(m.option_sparse(2).unwrap(), [2, 3]);
    }

    #[test]
    fn dense_and_sparse_rows_agree() {
        let mut m = m5_3();
        let id = m
            .add_option_dense(&[false, true, false, false, true])
            .unwrap();
        assert_eq!(m.option_sparse(id).unwrap(), [1, 4]);
        assert_eq!(
            m.add_option_dense(&[true; 4]),
            Err(Error::SizeMismatch {
                what: "dense row",
                expected: 5,
                actual: 4,
            })
        );
        assert_eq!(m.add_option_dense(&[false; 5]), Err(Error::EmptyOption));

        for option in 0..m.nb_options() {
            let sparse = m.option_sparse(option).unwrap();
            let dense = m.option_dense(option).unwrap();
            for (item, &set) in dense.iter().enumerate() {
                assert_eq!(set, sparse.contains(&item));
            }
        }
    }

    #[test]
    fn option_sparse_keeps_insertion_order() {
        let mut m = Matrix::new(5, 5);
        m.add_option(&[4, 1]).unwrap();
        assert_eq!(m.option_sparse(0).unwrap(), [4, 1]);
        assert_eq!(m.option_sparse_sorted(0).unwrap(), [1, 4]);
        assert!(m.option_sparse(1).is_err());
    }

    #[test]
    fn row_conversion_round_trips() {
        let m = Matrix::new(6, 6);
        let sparse = vec![4, 1, 5];
        let dense = m.row_to_dense(&sparse).unwrap();
        assert_eq!(dense, [false, true, false, false, true, true]);
        assert_eq!(m.row_to_sparse(&dense).unwrap(), [1, 4, 5]);

        let rows = [
            vec![false; 6],
            vec![true, false, true, false, true, false],
            vec![true; 6],
        ];
        for row in &rows {
            assert_eq!(&m.row_to_dense(&m.row_to_sparse(row).unwrap()).unwrap(), row);
        }
        assert!(m.row_to_dense(&[6]).is_err());
    }

    #[test]
    fn is_solution_cases() {
        let empty0 = Matrix::new(0, 0);
        assert!(empty0.is_solution(&[]).unwrap());
        assert!(empty0.is_solution(&[0]).is_err());

        let empty5 = Matrix::new(5, 5);
        assert!(!empty5.is_solution(&[]).unwrap());
        assert!(empty5.is_solution(&[0]).is_err());

        let m = m5_2();
        assert!(!m.is_solution(&[]).unwrap());
        assert!(!m.is_solution(&[0]).unwrap());
        assert!(!m.is_solution(&[1]).unwrap());
        assert!(m.is_solution(&[0, 1]).unwrap());
        assert!(m.is_solution(&[1, 0]).unwrap());
        assert!(m.is_solution(&[2]).is_err());

        let m = m5_3();
        assert!(m.is_solution(&[0, 1]).unwrap());
        assert!(m.is_solution(&[1, 3]).is_err());
        for proposal in [
            vec![],
            vec![0],
            vec![1],
            vec![2],
            vec![0, 2],
            vec![1, 2],
            vec![0, 1, 2],
        ] {
            assert!(!m.is_solution(&proposal).unwrap(), "{proposal:?}");
        }

        let m = m6_10();
        assert!(m.is_solution(&[0, 4, 5, 6]).unwrap());
        assert!(m.is_solution(&[6, 0, 5, 4]).unwrap());
        assert!(!m.is_solution(&[0, 2, 4, 5, 6]).unwrap());
        assert!(!m.is_solution(&[0, 5, 6]).unwrap());
    }

    #[test]
    fn is_solution_with_secondary_items() {
        let m = m10(9);
        // Item 9 is secondary: covering it once is allowed.
        assert!(m.is_solution(&[0, 8, 9, 10]).unwrap());
        // A primary item covered twice disqualifies the set.
        assert!(!m.is_solution(&[0, 4, 8, 10]).unwrap());
        // So does covering secondary item 9 twice.
        assert!(!m.is_solution(&[1, 6, 8, 9, 10]).unwrap());
    }

    #[test]
    fn check_sizes_holds_at_rest_and_mid_search() {
        for mut m in [Matrix::new(0, 0), Matrix::new(5, 5), m5_2(), m5_3(), m6_10(), m10(8)] {
            assert!(m.check_sizes().is_ok());
            m.search_iter();
            assert!(m.check_sizes().is_ok());
        }
    }

    #[test]
    fn search_rec_on_trivial_instances() {
        // A matrix with no items has exactly one solution, the empty set.
        let mut empty0 = Matrix::new(0, 0);
        assert_eq!(empty0.search_rec(usize::MAX), [Vec::<usize>::new()]);

        // Five uncoverable primary items admit no solution.
        let mut empty5 = Matrix::new(5, 5);
        assert!(empty5.search_rec(usize::MAX).is_empty());

        assert_eq!(normalized(m5_2().search_rec(usize::MAX)), [vec![0, 1]]);
        assert_eq!(normalized(m5_3().search_rec(usize::MAX)), [vec![0, 1]]);
    }

    #[test]
    fn search_rec_enumerates_all_solutions() {
        let mut m = m6_10();
        let solutions = m.search_rec(usize::MAX);
        assert_eq!(
            normalized(solutions.clone()),
            [
                vec![0, 2, 3, 5],
                vec![0, 3, 9],
                vec![0, 4, 5, 6],
                vec![1, 5, 8],
                vec![4, 5, 7],
            ]
        );
        for solution in &solutions {
            assert!(m.is_solution(solution).unwrap());
        }
        // The search restores the matrix, so it can run again.
        assert_eq!(m.depth(), 0);
        assert!(m.check_sizes().is_ok());
        assert_eq!(m.search_rec(usize::MAX).len(), 5);
    }

    #[test]
    fn search_rec_honours_the_cap() {
        let mut m = m6_10();
        assert!(m.search_rec(0).is_empty());
        assert_eq!(m.search_rec(1).len(), 1);
        assert_eq!(m.search_rec(3).len(), 3);
        assert_eq!(m.search_rec(usize::MAX).len(), 5);
        assert!(m.check_sizes().is_ok());
    }

    #[test]
    fn secondary_items_relax_coverage() {
        // With item 9 secondary the instance has a unique solution.
        let mut m = m10(9);
        assert_eq!(normalized(m.search_rec(usize::MAX)), [vec![0, 8, 9, 10]]);

        // Making item 8 secondary as well admits four more.
        let mut m = m10(8);
        assert_eq!(
            normalized(m.search_rec(usize::MAX)),
            [
                vec![0, 4, 8, 9],
                vec![0, 5, 7, 9],
                vec![0, 8, 9, 10],
                vec![1, 3, 8, 9],
                vec![2, 3, 7, 9],
            ]
        );
    }

    #[test]
    fn search_iter_agrees_with_search_rec() {
        for mut m in [Matrix::new(0, 0), Matrix::new(5, 5), m5_2(), m5_3(), m6_10(), m10(9), m10(8)] {
            let recursive = m.search_rec(usize::MAX);
            let iterative = enumerate_iter(&mut m);
            assert_eq!(recursive, iterative);
            // The space is exhausted; further calls keep saying so.
            assert!(!m.search_iter());
            assert!(!m.search_iter());
        }
    }

    #[test]
    fn search_iter_leaves_the_solution_in_session() {
        let mut m = m6_10();
        assert!(m.search_iter());
        let solution = m.get_solution();
        assert!(m.is_solution(&solution).unwrap());
        assert_eq!(m.get_solution(), solution);
        assert_eq!(m.get_solution_sorted(), {
            let mut sorted = solution.clone();
            sorted.sort_unstable();
            sorted
        });
        assert_eq!(m.direction(), Direction::Up);
        assert_eq!(m.depth(), solution.len());
    }

    #[test]
    fn reset_restarts_the_enumeration() {
        let mut m = m6_10();
        let all = enumerate_iter(&mut m);
        assert_eq!(all.len(), 5);
        m.reset();
        assert_eq!(m.depth(), 0);
        assert_eq!(m.nb_choices(), 0);
        assert_eq!(m.nb_dances(), 0);
        assert_eq!(m.direction(), Direction::Down);
        assert_eq!(enumerate_iter(&mut m), all);
    }

    #[test]
    fn counters_accumulate_within_a_session() {
        let mut m = m6_10();
        assert!(m.search_iter());
        let after_first = (m.nb_choices(), m.nb_dances());
        assert!(after_first.0 > 0);
        assert!(after_first.1 > 0);
        assert!(m.search_iter());
        assert!(m.nb_choices() > after_first.0);
    }

    #[test]
    fn choose_pins_an_option() {
        let mut m = m6_10();
        assert!(m.choose(10).is_err());
        assert_eq!(m.choose(2), Ok(1));
        assert_eq!(m.pinned_depth(), 1);
        assert_eq!(m.depth(), 1);
        assert!(!m.is_item_active(1).unwrap());
        assert!(!m.is_item_active(4).unwrap());
        assert!(m.is_item_active(0).unwrap());
        assert!(m.check_sizes().is_ok());

        // Only the solutions extending the pinned option are reachable.
        assert_eq!(enumerate_iter(&mut m), [vec![2, 0, 3, 5]]);
        assert_eq!(m.depth(), 1);

        // Rewinding to the pinned depth restarts the same enumeration.
        m.reset_to(1).unwrap();
        assert_eq!(m.pinned_depth(), 1);
        assert_eq!(enumerate_iter(&mut m), [vec![2, 0, 3, 5]]);

        // A full reset drops the pin and restores the whole space.
        m.reset();
        assert_eq!(m.pinned_depth(), 0);
        assert_eq!(enumerate_iter(&mut m).len(), 5);
        assert!(m.check_sizes().is_ok());
    }

    #[test]
    fn pinned_prefix_survives_recursive_search() {
        let mut m = m6_10();
        m.choose(2).unwrap();
        let solutions = m.search_rec(usize::MAX);
        assert_eq!(solutions, [vec![2, 0, 3, 5]]);
        assert_eq!(m.depth(), 1);
    }

    #[test]
    fn reset_to_validates_the_depth() {
        let mut m = m6_10();
        assert!(m.reset_to(1).is_err());
        m.choose(3).unwrap();
        assert!(m.reset_to(2).is_err());
        assert!(m.reset_to(0).is_ok());
        assert_eq!(m.pinned_depth(), 0);
        assert_eq!(m.depth(), 0);
        assert!(m.check_sizes().is_ok());
    }

    #[test]
    fn item_sizes_count_containing_options() {
        let m = m6_10();
        for item in 0..6 {
            let containing = (0..m.nb_options())
                .filter(|&option| m.option_sparse(option).unwrap().contains(&item))
                .count();
            assert_eq!(m.item_size(item).unwrap(), containing);
        }
        assert!(m.item_size(6).is_err());

        // Covering an item through a pin shrinks its neighbours' lists.
        let mut m = m6_10();
        m.choose(2).unwrap();
        assert_eq!(m.item_size(0).unwrap(), 1);
        assert_eq!(m.item_size(3).unwrap(), 1);
        assert_eq!(m.item_size(5).unwrap(), 1);
        m.reset();
        assert_eq!(m.item_size(0).unwrap(), 3);
    }

    #[test]
    fn activity_queries_follow_the_cover_state() {
        let mut m = m6_10();
        for item in 0..6 {
            assert!(m.is_item_active(item).unwrap());
        }
        for option in 0..10 {
            assert!(m.is_option_active(option).unwrap());
        }
        assert!(m.is_item_active(6).is_err());
        assert!(m.is_option_active(10).is_err());

        m.choose(2).unwrap();
        assert!(!m.is_item_active(1).unwrap());
        assert!(!m.is_item_active(4).unwrap());
        for item in [0, 2, 3, 5] {
            assert!(m.is_item_active(item).unwrap());
        }
        for option in [1, 4, 8] {
            assert!(!m.is_option_active(option).unwrap(), "option {option}");
        }
        for option in [0, 3, 5] {
            assert!(m.is_option_active(option).unwrap(), "option {option}");
        }

        m.reset();
        for item in 0..6 {
            assert!(m.is_item_active(item).unwrap());
        }
    }

    #[test]
    fn clone_preserves_the_mid_search_position() {
        let mut m = m6_10();
        assert!(m.search_iter());
        assert!(m.search_iter());

        let mut copy = m.clone();
        assert_eq!(copy.get_solution(), m.get_solution());
        assert_eq!(copy.nb_choices(), m.nb_choices());
        assert_eq!(copy.nb_dances(), m.nb_dances());

        // Driven identically from here on, both produce the same solutions.
        let rest_original = enumerate_iter(&mut m);
        let rest_copy = enumerate_iter(&mut copy);
        assert_eq!(rest_original, rest_copy);
        assert_eq!(rest_original.len(), 3);
    }

    #[test]
    fn inverse_perm_tables() {
        assert_eq!(inverse_perm(&[]), []);
        assert_eq!(inverse_perm(&[0]), [0]);
        assert_eq!(inverse_perm(&[0, 1]), [0, 1]);
        assert_eq!(inverse_perm(&[1, 0]), [1, 0]);
        assert_eq!(inverse_perm(&[1, 0, 3, 2]), [1, 0, 3, 2]);
        assert_eq!(inverse_perm(&[1, 3, 0, 2]), [2, 0, 3, 1]);
        assert_eq!(
            inverse_perm(&[6, 1, 5, 3, 7, 0, 4, 2]),
            [5, 1, 7, 3, 6, 2, 0, 4]
        );
    }

    #[test]
    fn inverse_perm_is_an_involution() {
        let perm = vec![3, 1, 4, 0, 2, 5];
        assert_eq!(inverse_perm(&inverse_perm(&perm)), perm);
    }

    #[test]
    fn permuted_columns_renames_items() {
        let m = m6_10();
        let perm = vec![3, 2, 1, 4, 5, 0];
        let permuted = m.permuted_columns(&perm).unwrap();
        assert_eq!(permuted.nb_items(), 6);
        assert_eq!(permuted.nb_options(), 10);
        // Old item perm[j] becomes new item j, so each option is renamed
        // through the inverse table.
        let inv = inverse_perm(&perm);
        for option in 0..m.nb_options() {
            let renamed: Vec<usize> = m
                .option_sparse(option)
                .unwrap()
                .into_iter()
                .map(|item| inv[item])
                .collect();
            assert_eq!(permuted.option_sparse(option).unwrap(), renamed);
        }
        // Solutions are the same row sets.
        let mut lhs = m.clone();
        let mut rhs = permuted;
        assert_eq!(
            normalized(lhs.search_rec(usize::MAX)),
            normalized(rhs.search_rec(usize::MAX))
        );
    }

    #[test]
    fn permuted_column_forms_are_inverse_to_each_other() {
        let m = m6_10();
        let perm = vec![5, 0, 3, 1, 2, 4];
        let lhs = m.permuted_columns(&perm).unwrap();
        let rhs = m.permuted_inv_columns(&inverse_perm(&perm)).unwrap();
        for option in 0..m.nb_options() {
            assert_eq!(
                lhs.option_sparse(option).unwrap(),
                rhs.option_sparse(option).unwrap()
            );
        }
    }

    #[test]
    fn permuted_rows_reorders_options() {
        let m = m5_3();
        let permuted = m.permuted_rows(&[2, 0, 1]).unwrap();
        assert_eq!(permuted.option_sparse(0).unwrap(), [1, 2, 4]);
        assert_eq!(permuted.option_sparse(1).unwrap(), [0, 1]);
        assert_eq!(permuted.option_sparse(2).unwrap(), [2, 3, 4]);

        // The identity permutation reproduces the matrix.
        let identity: Vec<usize> = (0..m.nb_options()).collect();
        let same = m.permuted_rows(&identity).unwrap();
        assert_eq!(same.nb_primary(), m.nb_primary());
        for option in 0..m.nb_options() {
            assert_eq!(
                same.option_sparse(option).unwrap(),
                m.option_sparse(option).unwrap()
            );
        }
    }

    #[test]
    fn transforms_validate_their_input() {
        let m = m5_3();
        assert_eq!(
            m.permuted_rows(&[0, 1]).unwrap_err(),
            Error::SizeMismatch {
                what: "row permutation",
                expected: 3,
                actual: 2,
            }
        );
        assert!(matches!(
            m.permuted_rows(&[0, 1, 3]),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            m.permuted_rows(&[0, 1, 1]),
            Err(Error::InvalidPermutation { .. })
        ));
        assert!(matches!(
            m.permuted_columns(&[0, 1, 2]),
            Err(Error::SizeMismatch { .. })
        ));

        // A column permutation may not move a secondary item into the
        // primary prefix.
        let m = m10(9);
        let mut crossing: Vec<usize> = (0..10).collect();
        crossing.swap(0, 9);
        assert!(matches!(
            m.permuted_columns(&crossing),
            Err(Error::InvalidPermutation { .. })
        ));
        let mut inside: Vec<usize> = (0..10).collect();
        inside.swap(0, 8);
        let permuted = m.permuted_columns(&inside).unwrap();
        assert_eq!(permuted.nb_primary(), 9);
    }

    #[test]
    fn transforms_leave_the_source_untouched() {
        let mut m = m6_10();
        m.choose(2).unwrap();
        let depth = m.depth();
        let _ = m.permuted_rows(&inverse_perm(&(0..10).collect::<Vec<_>>()));
        let _ = m.permuted_columns(&(0..6).collect::<Vec<_>>());
        assert_eq!(m.depth(), depth);
        assert_eq!(m.pinned_depth(), 1);
        assert!(m.check_sizes().is_ok());

        // The permuted matrix starts a session of its own.
        let fresh = m.permuted_rows(&(0..10).collect::<Vec<_>>()).unwrap();
        assert_eq!(fresh.depth(), 0);
        assert_eq!(fresh.pinned_depth(), 0);
    }

    #[test]
    fn search_random_finds_certified_solutions() {
        let m = m6_10();
        let mut solution = Vec::new();
        for _ in 0..10 {
            assert!(m.search_random(&mut solution));
            assert!(m.is_solution(&solution).unwrap());
        }

        let empty5 = Matrix::new(5, 5);
        assert!(!empty5.search_random(&mut solution));

        let unique = m10(9);
        assert!(unique.search_random(&mut solution));
        solution.sort_unstable();
        assert_eq!(solution, [0, 8, 9, 10]);
    }

    #[test]
    fn display_prints_dense_rows() {
        let m = m5_3();
        let expected = "\
[1, 1, 0, 0, 0]
[0, 0, 1, 1, 1]
[0, 1, 1, 0, 1]
";
        assert_eq!(m.to_string(), expected);
        assert_eq!(Matrix::new(3, 3).to_string(), "");
    }
}
