use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// A [`Matrix`] addressed by caller-chosen identities instead of indices.
///
/// The wrapper keeps an ordered list of item identities with a hash map
/// from identity to column index, and an ordered list of option identifiers;
/// every operation translates to and from the core indices. Item identities
/// must hash; option identifiers only need equality, and are looked up by
/// a linear scan over the insertion order.
///
/// # Example
///
/// ```
/// use dlx_covers::Named;
///
/// let mut matrix = Named::new(vec!["a", "b", "c"], 3)?;
/// matrix.add_option("left", &["a", "c"])?;
/// matrix.add_option("middle", &["b"])?;
/// matrix.add_option("wide", &["a", "b"])?;
///
/// assert!(matrix.search_iter());
/// let mut solution = matrix.get_solution();
/// solution.sort_unstable();
/// assert_eq!(solution, ["left", "middle"]);
/// # Ok::<(), dlx_covers::Error>(())
/// ```
pub struct Named<I, O> {
    matrix: Matrix,
    items: Vec<I>,
    index_of: HashMap<I, usize>,
    option_ids: Vec<O>,
}

impl<I, O> Named<I, O>
where
    I: Eq + Hash + Clone + fmt::Debug,
    O: Eq + fmt::Debug,
{
    /// Creates a matrix over the given items, the first `nb_primary` of
    /// which are primary. Rejects a repeated identity with
    /// [`Error::DuplicateItem`].
    pub fn new(items: Vec<I>, nb_primary: usize) -> Result<Self> {
        let mut index_of = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if index_of.insert(item.clone(), index).is_some() {
                return Err(Error::DuplicateItem(format!("{item:?}")));
            }
        }
        Ok(Self {
            matrix: Matrix::new(items.len(), nb_primary),
            items,
            index_of,
            option_ids: Vec::new(),
        })
    }

    /// Creates a matrix and appends the given `(identifier, option)` pairs.
    pub fn with_options(
        items: Vec<I>,
        nb_primary: usize,
        options: Vec<(O, Vec<I>)>,
    ) -> Result<Self> {
        let mut named = Self::new(items, nb_primary)?;
        for (id, option) in options {
            named.add_option(id, &option)?;
        }
        Ok(named)
    }

    /// The number of items.
    #[must_use]
    pub fn nb_items(&self) -> usize {
        self.matrix.nb_items()
    }

    /// The number of options added so far.
    #[must_use]
    pub fn nb_options(&self) -> usize {
        self.matrix.nb_options()
    }

    /// The number of primary items.
    #[must_use]
    pub fn nb_primary(&self) -> usize {
        self.matrix.nb_primary()
    }

    /// Read access to the underlying index-addressed matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// The column index of an item identity.
    fn item_index(&self, item: &I) -> Result<usize> {
        self.index_of
            .get(item)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("{item:?}")))
    }

    /// The row index of an option identifier.
    pub fn option_index(&self, id: &O) -> Result<usize> {
        self.option_ids
            .iter()
            .position(|other| other == id)
            .ok_or_else(|| Error::NotFound(format!("{id:?}")))
    }

    /// Appends an option under the given identifier and returns its row
    /// index. Unknown item identities fail with [`Error::NotFound`] before
    /// anything is recorded.
    pub fn add_option(&mut self, id: O, option: &[I]) -> Result<usize> {
        let row: Vec<usize> = option
            .iter()
            .map(|item| self.item_index(item))
            .collect::<Result<_>>()?;
        let index = self.matrix.add_option(&row)?;
        self.option_ids.push(id);
        Ok(index)
    }

    /// The item identities of the option at the given row index, in the
    /// order they were given when the option was added.
    pub fn ith_option(&self, option: usize) -> Result<Vec<I>> {
        Ok(self
            .matrix
            .option_sparse(option)?
            .into_iter()
            .map(|item| self.items[item].clone())
            .collect())
    }

    /// Commits the option with the given identifier to the solution and
    /// pins it, as [`Matrix::choose`] does by index.
    pub fn choose(&mut self, id: &O) -> Result<usize> {
        let index = self.option_index(id)?;
        self.matrix.choose(index)
    }

    /// Whether the item with the given identity is still active.
    pub fn is_item_active(&self, item: &I) -> Result<bool> {
        self.matrix.is_item_active(self.item_index(item)?)
    }

    /// Whether the option with the given identifier is still active.
    pub fn is_option_active(&self, id: &O) -> Result<bool> {
        self.matrix.is_option_active(self.option_index(id)?)
    }

    /// Advances the resumable search to the next solution.
    pub fn search_iter(&mut self) -> bool {
        self.matrix.search_iter()
    }

    /// Unwinds the session, pins included.
    pub fn reset(&mut self) {
        self.matrix.reset()
    }

    /// How many cells have been chosen since the session began.
    #[must_use]
    pub fn nb_choices(&self) -> u64 {
        self.matrix.nb_choices()
    }

    /// How many cells have danced out of their vertical lists since the
    /// session began.
    #[must_use]
    pub fn nb_dances(&self) -> u64 {
        self.matrix.nb_dances()
    }

    /// Whether the proposed set of option identifiers is a solution.
    pub fn is_solution(&self, ids: &[O]) -> Result<bool> {
        let rows: Vec<usize> = ids
            .iter()
            .map(|id| self.option_index(id))
            .collect::<Result<_>>()?;
        self.matrix.is_solution(&rows)
    }
}

impl<I, O> Named<I, O>
where
    I: Eq + Hash + Clone + fmt::Debug,
    O: Eq + Clone + fmt::Debug,
{
    /// The option identifiers of the working stack, bottom first.
    #[must_use]
    pub fn get_solution(&self) -> Vec<O> {
        self.matrix
            .get_solution()
            .into_iter()
            .map(|index| self.option_ids[index].clone())
            .collect()
    }

    /// Explores the whole search tree below the current position and
    /// returns up to `max_solutions` solutions as option identifiers.
    pub fn search_rec(&mut self, max_solutions: usize) -> Vec<Vec<O>> {
        self.matrix
            .search_rec(max_solutions)
            .into_iter()
            .map(|solution| {
                solution
                    .into_iter()
                    .map(|index| self.option_ids[index].clone())
                    .collect()
            })
            .collect()
    }
}

/// The conventional string-labelled instantiation.
pub type NamedMatrix = Named<String, String>;
