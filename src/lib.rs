//! This crate solves instances of the **exact cover** problem with the
//! dancing links technique that D. E. Knuth described in the paper
//! "Dancing Links", [arXiv:cs/0011047][dl] \[cs.DS\] (2000), and revisited
//! in Section 7.2.2.1 of [_The Art of Computer Programming_ **4B** (2022)][taocp4b].
//!
//! Suppose we're given a collection of _options_, each of which is a set of
//! _items_; the exact cover problem is to find a subcollection of options
//! such that each item occurs in exactly one of them. Knuth's backtracking
//! scheme, Algorithm X, represents the instance as a sparse 0/1 matrix of
//! doubly linked lists and exploits a clever yet simple property of such
//! lists: a deleted node remembers its neighbours, so undoing a deletion is
//! two pointer writes. The "waltzing" of links that results lets the search
//! cover and uncover items in perfect lockstep while it explores all
//! solutions in a depth-first manner.
//!
//! A slight generalization splits the items into two categories: _primary_
//! items must be covered exactly once, while _secondary_ items may be
//! covered at most once. This crate implements that generalized problem with
//! a twist the classic run-to-completion solvers lack: the search session is
//! reified. A [`Matrix`] carries its working stack, its traversal direction
//! and a pinned prefix of user-committed options, so the same instance can
//! produce solutions one at a time through [`Matrix::search_iter`], be
//! cloned mid-search into an identical, independently resumable position,
//! or be rewound with [`Matrix::reset`] without losing its pins. On top of
//! this sit permutation transforms for relabelling items and reordering
//! options, a randomized search that samples a uniformly shuffled rendition
//! of the instance, and the [`Named`] façade, which translates between
//! caller-chosen identities and the internal indices.
//!
//! # Example
//!
//! Cover the items $\\{0,\dots,5\\}$ with ten candidate options:
//!
//! ```
//! use dlx_covers::Matrix;
//!
//! let mut matrix = Matrix::new(6, 6);
//! for option in [
//!     vec![0, 2],
//!     vec![0, 1],
//!     vec![1, 4],
//!     vec![3],
//!     vec![3, 4],
//!     vec![5],
//!     vec![1],
//!     vec![0, 1, 2],
//!     vec![2, 3, 4],
//!     vec![1, 4, 5],
//! ] {
//!     matrix.add_option(&option)?;
//! }
//!
//! // Enumerate solutions one at a time; each is a list of option ids.
//! let mut found = Vec::new();
//! while matrix.search_iter() {
//!     found.push(matrix.get_solution_sorted());
//! }
//! found.sort();
//! assert_eq!(
//!     found,
//!     [
//!         vec![0, 2, 3, 5],
//!         vec![0, 3, 9],
//!         vec![0, 4, 5, 6],
//!         vec![1, 5, 8],
//!         vec![4, 5, 7],
//!     ]
//! );
//!
//! // Commit option 2 by hand; only the compatible solution remains.
//! matrix.reset();
//! matrix.choose(2)?;
//! assert!(matrix.search_iter());
//! assert_eq!(matrix.get_solution_sorted(), [0, 2, 3, 5]);
//! # Ok::<(), dlx_covers::Error>(())
//! ```
//!
//! [dl]: https://arxiv.org/pdf/cs/0011047.pdf
//! [taocp4b]: https://www-cs-faculty.stanford.edu/~knuth/taocp.html#vol4

mod error;
mod indices;
mod matrix;
mod named;

pub use error::{Error, Result};
pub use matrix::{inverse_perm, Direction, Matrix};
pub use named::{Named, NamedMatrix};
