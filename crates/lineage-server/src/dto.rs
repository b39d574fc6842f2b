//! Request and response bodies for the REST API.
//!
//! Wire names are camelCase to match what the browser client sends.

use crate::error::AppError;
use lineage_domain::{
    EdgeMutation, Member, MemberId, MemberSeed, RelatedMember, RelationCommand, RelationMode,
    RelationType,
};
use serde::{Deserialize, Serialize};

/// Sentinel the browser client sends when no spouse is selected
const NO_SPOUSE: &str = "none";

/// POST /api/family-trees
#[derive(Debug, Deserialize)]
pub struct CreateTreeRequest {
    /// Tree name
    pub name: Option<String>,

    /// Initial members, possibly empty
    pub members: Option<Vec<Member>>,
}

/// POST /api/family-trees/:id/members/:member_id/relation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationRequest {
    /// Relation to add
    pub mode: RelationMode,

    /// Type of the primary relation
    #[serde(rename = "type")]
    pub relation_type: RelationType,

    /// Attributes for a newly created related member
    #[serde(default)]
    pub new_member: Option<MemberSeed>,

    /// Existing member to relate instead of creating one
    #[serde(default)]
    pub related_member_id: Option<MemberId>,

    /// Spouse mode: children who gain the new spouse as a parent
    #[serde(default)]
    pub children_for_spouse: Vec<MemberId>,

    /// Spouse mode: type of those parent links (default blood)
    #[serde(default)]
    pub child_relation_type: Option<RelationType>,

    /// Child mode: spouse who becomes the child's other parent
    #[serde(default)]
    pub spouse_id_for_child: Option<String>,
}

impl AddRelationRequest {
    /// Build the editor command for `subject`
    pub fn into_command(self, subject: MemberId) -> Result<RelationCommand, AppError> {
        let related = match (self.new_member, self.related_member_id) {
            (Some(_), Some(_)) => {
                return Err(AppError::BadRequest(
                    "Provide either newMember or relatedMemberId, not both".to_string(),
                ))
            }
            (_, Some(id)) => RelatedMember::Existing(id),
            (seed, None) => RelatedMember::New(seed.unwrap_or_default()),
        };

        let spouse_for_child = self
            .spouse_id_for_child
            .filter(|id| !id.is_empty() && id != NO_SPOUSE)
            .map(MemberId::from);

        Ok(RelationCommand {
            subject,
            mode: self.mode,
            relation_type: self.relation_type,
            related,
            children_for_spouse: self.children_for_spouse,
            child_relation_type: self.child_relation_type.unwrap_or(RelationType::Blood),
            spouse_for_child,
        })
    }
}

/// Result of a relationship command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationResponse {
    /// The related member after linking
    pub related_member: Member,

    /// Every relation appended by the command
    pub edge_mutations: Vec<EdgeMutation>,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "healthy" or "unhealthy"
    pub status: String,

    /// Number of stored trees
    pub tree_count: usize,
}
