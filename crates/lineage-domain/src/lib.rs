//! Lineage Domain Layer
//!
//! Core model and business rules for family trees. No I/O happens here;
//! storage and transport live in other crates and talk to this one through
//! the traits in [`traits`].
//!
//! ## Key Concepts
//!
//! - **Member**: one person, carrying four relation lists
//! - **Relation**: a typed edge stored on both endpoints
//! - **FamilyTree**: the aggregate root, an arena of members keyed by id
//! - **RelationshipEditor**: applies add-parent/sibling/spouse/child commands
//!   while keeping every edge mirrored
//!
//! ## Invariants
//!
//! After every successful edit: relation targets exist, each entry has a
//! mirror of the same type on its target, no list repeats a target, and no
//! member has more than two blood parents.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod editor;
pub mod error;
pub mod member;
pub mod relation;
pub mod traits;
pub mod tree;

// Re-exports for convenience
pub use editor::{EdgeMutation, EditOutcome, RelatedMember, RelationCommand, RelationshipEditor};
pub use error::{EditError, TreeError};
pub use member::{Gender, Member, MemberId, MemberSeed, MemberUpdate};
pub use relation::{Relation, RelationField, RelationMode, RelationType};
pub use tree::{FamilyTree, IntegrityViolation, TreeDocument, TreeId};
