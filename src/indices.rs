/// The position of an item header in the sequential `items` table of
/// a [`Matrix`].
///
/// Position 0 is the head of the active list of primary items, and the last
/// position is the head of the list of secondary items; the item with public
/// index $j$ sits at position $j+1$.
///
/// [`Matrix`]: `crate::Matrix`
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[repr(transparent)]
pub(crate) struct ItemIndex(usize);

impl ItemIndex {
    /// Creates a new index.
    #[must_use]
    pub const fn new(ix: usize) -> Self {
        Self(ix)
    }

    /// Returns the index value as a primitive type.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// The position of a cell in the `cells` arena of a [`Matrix`].
///
/// The cells of an option occupy consecutive positions in the arena, in the
/// order the items were given when the option was added; the option record
/// remembers where its span starts.
///
/// [`Matrix`]: `crate::Matrix`
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[repr(transparent)]
pub(crate) struct CellIndex(usize);

impl CellIndex {
    /// Creates a new index.
    #[must_use]
    pub const fn new(ix: usize) -> Self {
        Self(ix)
    }

    /// Returns the index value as a primitive type.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}
