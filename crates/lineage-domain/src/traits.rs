//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{FamilyTree, TreeId};

/// Trait for storing and retrieving family trees as whole documents
///
/// Implemented by the infrastructure layer (lineage-store). A tree is always
/// read and written in one piece so that both ends of every relation are
/// persisted together.
pub trait TreeStore {
    /// Error type for store operations
    type Error;

    /// All trees, oldest first
    fn list_trees(&self) -> Result<Vec<FamilyTree>, Self::Error>;

    /// Get a tree by ID
    fn get_tree(&self, id: &TreeId) -> Result<Option<FamilyTree>, Self::Error>;

    /// Store a new tree; fails if the ID is taken
    fn insert_tree(&mut self, tree: &FamilyTree) -> Result<(), Self::Error>;

    /// Replace an existing tree; fails if it does not exist
    fn save_tree(&mut self, tree: &FamilyTree) -> Result<(), Self::Error>;

    /// Delete a tree, returning whether it existed
    fn delete_tree(&mut self, id: &TreeId) -> Result<bool, Self::Error>;
}
