//! Changeset primitives.
//!
//! A [`ChangeSet`] describes one edit cycle as a sequence of retain, delete,
//! and insert operations over the document's char coordinate space. It is
//! the remap primitive everything position-based is carried across.

mod changeset;
mod types;


pub use changeset::ChangeSet;
pub use types::{Bias, Change, ChangedRange, Insertion, Operation, Tendril};
