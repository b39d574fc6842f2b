//! Error types for domain operations

use crate::member::MemberId;
use crate::relation::{RelationMode, RelationType};
use crate::tree::IntegrityViolation;
use thiserror::Error;

/// Errors raised by the relationship editor
///
/// Every variant is raised before the edited tree is returned, so a failed
/// command never leaves a partially linked graph behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A referenced member does not exist (or is not related as required)
    #[error("Member not found: {0}")]
    NotFound(MemberId),

    /// The relation type is outside the mode's domain
    #[error("Relation type '{relation_type}' is not valid for mode '{mode}'")]
    InvalidRelationType {
        /// Mode of the rejected command
        mode: RelationMode,
        /// Type that was requested
        relation_type: RelationType,
    },

    /// The member already has the maximum number of blood parents
    #[error("Member {0} already has two blood parents")]
    RelationLimit(MemberId),

    /// A member cannot be related to itself
    #[error("Member {0} cannot be related to itself")]
    SelfRelation(MemberId),

    /// A new member would reuse an existing id
    #[error("Member already exists: {0}")]
    DuplicateMember(MemberId),
}

/// Errors raised by tree-level operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Tree or member name is missing
    #[error("Name is required")]
    MissingName,

    /// Member id is empty
    #[error("Member id is required")]
    MissingMemberId,

    /// Two members share one id
    #[error("Member already exists: {0}")]
    DuplicateMember(MemberId),

    /// Member does not exist
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// The supplied members break relation invariants
    #[error("Tree is inconsistent: {}", format_violations(.0))]
    Inconsistent(Vec<IntegrityViolation>),
}

fn format_violations(violations: &[IntegrityViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
