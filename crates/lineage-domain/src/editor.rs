//! Relationship editor
//!
//! Applies one relationship command (add parent, sibling, spouse or child)
//! to a tree snapshot. All four modes run through the same paired-link
//! routine; what differs per mode is the [`ModeRule`] table entry.
//!
//! The input tree is only borrowed. Work happens on a draft copy that is
//! returned on success and dropped on error, so a failed command has no
//! observable effect.
//!
//! [`ModeRule`]: crate::relation::ModeRule

use crate::error::EditError;
use crate::member::{Gender, Member, MemberId, MemberSeed, MAX_BLOOD_PARENTS};
use crate::relation::{ExtraLink, Relation, RelationField, RelationMode, RelationType};
use crate::tree::FamilyTree;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The member on the other end of a new relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatedMember {
    /// Create a new member from a seed
    New(MemberSeed),

    /// Link a member already in the tree
    Existing(MemberId),
}

/// One relationship-mutation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationCommand {
    /// Member the command starts from
    pub subject: MemberId,

    /// What the related member becomes to the subject
    pub mode: RelationMode,

    /// Type of the primary relation
    pub relation_type: RelationType,

    /// New or existing member to relate
    pub related: RelatedMember,

    /// Spouse mode: children of the subject who also get the new spouse as a parent
    pub children_for_spouse: Vec<MemberId>,

    /// Spouse mode: type of the parent links created for `children_for_spouse`
    pub child_relation_type: RelationType,

    /// Child mode: spouse of the subject who becomes the child's other parent
    pub spouse_for_child: Option<MemberId>,
}

impl RelationCommand {
    /// Command relating a freshly created member with default attributes
    pub fn new(subject: MemberId, mode: RelationMode, relation_type: RelationType) -> Self {
        Self {
            subject,
            mode,
            relation_type,
            related: RelatedMember::New(MemberSeed::default()),
            children_for_spouse: Vec::new(),
            child_relation_type: RelationType::Blood,
            spouse_for_child: None,
        }
    }

    /// Create the related member from this seed
    pub fn with_seed(mut self, seed: MemberSeed) -> Self {
        self.related = RelatedMember::New(seed);
        self
    }

    /// Relate an existing member instead of creating one
    pub fn with_existing(mut self, id: MemberId) -> Self {
        self.related = RelatedMember::Existing(id);
        self
    }

    /// Children to re-parent under a new spouse
    pub fn with_children_for_spouse(mut self, children: Vec<MemberId>) -> Self {
        self.children_for_spouse = children;
        self
    }

    /// Type used when re-parenting children under a new spouse
    pub fn with_child_relation_type(mut self, kind: RelationType) -> Self {
        self.child_relation_type = kind;
        self
    }

    /// Spouse who becomes the new child's other parent
    pub fn with_spouse_for_child(mut self, spouse: MemberId) -> Self {
        self.spouse_for_child = Some(spouse);
        self
    }
}

/// One relation appended to one member's list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMutation {
    /// Member whose list changed
    pub member_id: MemberId,

    /// List that changed
    pub field: RelationField,

    /// Entry that was appended
    pub added_relation: Relation,
}

/// Result of a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// The edited tree
    pub tree: FamilyTree,

    /// Final state of the related member
    pub related_member: Member,

    /// Whether the related member was created by this command
    pub created: bool,

    /// Every relation appended, in application order
    pub edge_mutations: Vec<EdgeMutation>,
}

impl EditOutcome {
    /// Ids of members whose relation lists changed, in first-touched order
    pub fn touched_members(&self) -> Vec<MemberId> {
        let mut seen = HashSet::new();
        self.edge_mutations
            .iter()
            .filter(|m| seen.insert(&m.member_id))
            .map(|m| m.member_id.clone())
            .collect()
    }
}

/// Applies relationship commands to a tree snapshot
///
/// # Examples
///
/// ```
/// use lineage_domain::{FamilyTree, Gender, Member, MemberId};
/// use lineage_domain::editor::{RelationCommand, RelationshipEditor};
/// use lineage_domain::relation::{RelationMode, RelationType};
///
/// let ann = Member::new(MemberId::from("ann"), "Ann", Gender::Female);
/// let tree = FamilyTree::new("Smiths", vec![ann]).unwrap();
///
/// let command =
///     RelationCommand::new(MemberId::from("ann"), RelationMode::Parent, RelationType::Blood);
/// let outcome = RelationshipEditor::new(&tree).apply(&command).unwrap();
///
/// assert_eq!(outcome.related_member.name, "Ann's parent");
/// assert_eq!(outcome.edge_mutations.len(), 2);
/// assert!(outcome.tree.is_consistent());
/// ```
pub struct RelationshipEditor<'a> {
    tree: &'a FamilyTree,
}

impl<'a> RelationshipEditor<'a> {
    /// Create an editor over a tree snapshot
    pub fn new(tree: &'a FamilyTree) -> Self {
        Self { tree }
    }

    /// Apply a command, returning the edited tree
    ///
    /// # Errors
    ///
    /// - [`EditError::NotFound`] for an unknown subject, related member,
    ///   spouse or child, or a spouse/child that is not related to the subject
    /// - [`EditError::InvalidRelationType`] when a type is outside the mode's domain
    /// - [`EditError::RelationLimit`] when a third blood parent would be added
    /// - [`EditError::SelfRelation`] when a member would be related to itself
    /// - [`EditError::DuplicateMember`] when a seed reuses an existing id
    pub fn apply(&self, command: &RelationCommand) -> Result<EditOutcome, EditError> {
        let subject = self
            .tree
            .member(&command.subject)
            .ok_or_else(|| EditError::NotFound(command.subject.clone()))?;

        let rule = command.mode.rule();
        if !rule.allowed_types.contains(&command.relation_type) {
            return Err(EditError::InvalidRelationType {
                mode: command.mode,
                relation_type: command.relation_type,
            });
        }

        let mut draft = Draft::new(self.tree.clone());

        let (related_id, created) = match &command.related {
            RelatedMember::Existing(id) => {
                if !self.tree.contains(id) {
                    return Err(EditError::NotFound(id.clone()));
                }
                (id.clone(), false)
            }
            RelatedMember::New(seed) => {
                let member = self.seed_member(subject, command.mode, seed.clone());
                let id = member.id.clone();
                draft
                    .tree
                    .insert_member(member)
                    .map_err(|_| EditError::DuplicateMember(id.clone()))?;
                (id, true)
            }
        };

        draft.link(&subject.id, rule.field, &related_id, command.relation_type)?;

        match rule.extra {
            ExtraLink::None => {}
            ExtraLink::MarryFirstParent => {
                // A second parent is presumed married to the first one
                if let Some(first) = subject.parents().first() {
                    if first.id != related_id {
                        draft.link(
                            &first.id,
                            RelationField::Spouses,
                            &related_id,
                            RelationType::Married,
                        )?;
                    }
                }
            }
            ExtraLink::ReparentChildren => {
                let kind = command.child_relation_type;
                if !RelationField::Parents.allowed_types().contains(&kind) {
                    return Err(EditError::InvalidRelationType {
                        mode: command.mode,
                        relation_type: kind,
                    });
                }

                let mut seen = HashSet::new();
                for child in &command.children_for_spouse {
                    if !seen.insert(child) {
                        continue;
                    }
                    if subject.relation_to(RelationField::Children, child).is_none()
                        || !self.tree.contains(child)
                    {
                        return Err(EditError::NotFound(child.clone()));
                    }
                    draft.link(child, RelationField::Parents, &related_id, kind)?;
                }
            }
            ExtraLink::CoParentWithSpouse => {
                if let Some(spouse) = &command.spouse_for_child {
                    if subject.relation_to(RelationField::Spouses, spouse).is_none()
                        || !self.tree.contains(spouse)
                    {
                        return Err(EditError::NotFound(spouse.clone()));
                    }
                    draft.link(
                        spouse,
                        RelationField::Children,
                        &related_id,
                        command.relation_type,
                    )?;
                }
            }
        }

        draft.finish(related_id, created)
    }

    /// Build the related member, filling blanks the way the editor UI does
    fn seed_member(&self, subject: &Member, mode: RelationMode, seed: MemberSeed) -> Member {
        let default_gender = match mode {
            RelationMode::Parent => subject
                .parents()
                .first()
                .and_then(|rel| self.tree.member(&rel.id))
                .map(|parent| parent.gender.opposite())
                .unwrap_or(Gender::Male),
            RelationMode::Spouse => subject.gender.opposite(),
            RelationMode::Sibling | RelationMode::Child => Gender::Male,
        };

        let subject_name = &subject.name;
        seed.into_member(|| format!("{subject_name}'s {mode}"), default_gender)
    }
}

/// Working copy of the tree plus the mutations applied to it
struct Draft {
    tree: FamilyTree,
    mutations: Vec<EdgeMutation>,
}

impl Draft {
    fn new(tree: FamilyTree) -> Self {
        Self {
            tree,
            mutations: Vec::new(),
        }
    }

    /// Add `to` to `from.field` and the mirror entry on `to`
    ///
    /// An edge already present on both sides is left alone. An edge present
    /// on one side only gets its missing half, using the existing type.
    fn link(
        &mut self,
        from: &MemberId,
        field: RelationField,
        to: &MemberId,
        kind: RelationType,
    ) -> Result<(), EditError> {
        if from == to {
            return Err(EditError::SelfRelation(from.clone()));
        }

        let source = self
            .tree
            .member(from)
            .ok_or_else(|| EditError::NotFound(from.clone()))?;
        let target = self
            .tree
            .member(to)
            .ok_or_else(|| EditError::NotFound(to.clone()))?;

        let kind = source
            .relation_to(field, to)
            .or_else(|| target.relation_to(field.mirror(), from))
            .map_or(kind, |existing| existing.kind);

        self.append(from, field, to, kind)?;
        self.append(to, field.mirror(), from, kind)
    }

    fn append(
        &mut self,
        owner: &MemberId,
        field: RelationField,
        target: &MemberId,
        kind: RelationType,
    ) -> Result<(), EditError> {
        let member = self
            .tree
            .member_mut(owner)
            .ok_or_else(|| EditError::NotFound(owner.clone()))?;

        if member.relation_to(field, target).is_some() {
            return Ok(());
        }

        if field == RelationField::Parents
            && kind == RelationType::Blood
            && member.blood_parent_count() >= MAX_BLOOD_PARENTS
        {
            return Err(EditError::RelationLimit(owner.clone()));
        }

        let relation = Relation::new(target.clone(), kind);
        member.relations_mut(field).push(relation.clone());
        self.mutations.push(EdgeMutation {
            member_id: owner.clone(),
            field,
            added_relation: relation,
        });

        Ok(())
    }

    fn finish(self, related_id: MemberId, created: bool) -> Result<EditOutcome, EditError> {
        let related_member = self
            .tree
            .member(&related_id)
            .cloned()
            .ok_or(EditError::NotFound(related_id))?;

        Ok(EditOutcome {
            tree: self.tree,
            related_member,
            created,
            edge_mutations: self.mutations,
        })
    }
}
