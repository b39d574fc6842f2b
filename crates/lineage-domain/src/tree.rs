//! Family tree aggregate
//!
//! Members live in an arena keyed by id. Relation entries hold ids only, so
//! the cyclic parent/child and spouse graph needs no shared ownership and
//! serializes as a flat member list.

use crate::error::TreeError;
use crate::member::{Member, MemberId, MemberUpdate, MAX_BLOOD_PARENTS};
use crate::relation::{RelationField, RelationType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unique identifier for a family tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
    /// Generate a new UUIDv7-based TreeId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TreeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TreeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Serialized form of a tree: `{ id, name, members: [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    /// Tree id
    pub id: TreeId,

    /// Display name
    pub name: String,

    /// Members in display order
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A family tree: a named set of members with mirrored relations
///
/// Member order is preserved; the first member is what the browser client
/// uses as the initial root of the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeDocument", into = "TreeDocument")]
pub struct FamilyTree {
    /// Tree id
    pub id: TreeId,

    /// Display name
    pub name: String,

    members: Vec<Member>,
    index: HashMap<MemberId, usize>,
}

impl FamilyTree {
    /// Create a new tree with a fresh id
    ///
    /// # Errors
    ///
    /// Fails when the tree or a member has a blank name, a member has an
    /// empty id, two members share an id, or the members' relation lists
    /// break any tree invariant.
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Result<Self, TreeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TreeError::MissingName);
        }

        for member in &members {
            if member.id.is_empty() {
                return Err(TreeError::MissingMemberId);
            }
            if member.name.trim().is_empty() {
                return Err(TreeError::MissingName);
            }
        }

        let tree = Self::from_parts(TreeId::new(), name, members)?;
        let violations = tree.check_integrity();
        if !violations.is_empty() {
            return Err(TreeError::Inconsistent(violations));
        }

        Ok(tree)
    }

    /// Assemble a tree from stored parts, checking only id uniqueness
    pub fn from_parts(id: TreeId, name: String, members: Vec<Member>) -> Result<Self, TreeError> {
        let mut index = HashMap::with_capacity(members.len());
        for (pos, member) in members.iter().enumerate() {
            if index.insert(member.id.clone(), pos).is_some() {
                return Err(TreeError::DuplicateMember(member.id.clone()));
            }
        }

        Ok(Self {
            id,
            name,
            members,
            index,
        })
    }

    /// Members in display order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a member by id
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.index.get(id).map(|&pos| &self.members[pos])
    }

    pub(crate) fn member_mut(&mut self, id: &MemberId) -> Option<&mut Member> {
        match self.index.get(id) {
            Some(&pos) => self.members.get_mut(pos),
            None => None,
        }
    }

    /// Whether a member with this id exists
    pub fn contains(&self, id: &MemberId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the tree has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Append a member
    ///
    /// Only the member's own id is checked here; callers adding a member
    /// that already carries relations are responsible for mirroring them.
    pub fn insert_member(&mut self, member: Member) -> Result<&Member, TreeError> {
        if self.contains(&member.id) {
            return Err(TreeError::DuplicateMember(member.id));
        }

        let pos = self.members.len();
        self.index.insert(member.id.clone(), pos);
        self.members.push(member);
        Ok(&self.members[pos])
    }

    /// Replace the display fields of a member
    pub fn update_member(
        &mut self,
        id: &MemberId,
        update: MemberUpdate,
    ) -> Result<&Member, TreeError> {
        if update.name.trim().is_empty() {
            return Err(TreeError::MissingName);
        }

        let member = self
            .member_mut(id)
            .ok_or_else(|| TreeError::MemberNotFound(id.clone()))?;
        member.apply_update(update);
        Ok(member)
    }

    /// Check every relation invariant and report all violations
    ///
    /// An empty result means: all targets exist, every entry is mirrored
    /// with the same type, no list repeats a target or points at its owner,
    /// types fit their list, and nobody has more than two blood parents.
    pub fn check_integrity(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();

        for member in &self.members {
            for field in RelationField::ALL {
                let mut seen = HashSet::new();

                for rel in member.relations(field) {
                    let at = || (member.id.clone(), field, rel.id.clone());

                    if rel.id == member.id {
                        let (member, field, _) = at();
                        violations.push(IntegrityViolation::SelfRelation { member, field });
                        continue;
                    }

                    if !seen.insert(&rel.id) {
                        let (member, field, target) = at();
                        violations.push(IntegrityViolation::DuplicateRelation {
                            member,
                            field,
                            target,
                        });
                    }

                    if !field.allowed_types().contains(&rel.kind) {
                        let (member, field, target) = at();
                        violations.push(IntegrityViolation::InvalidType {
                            member,
                            field,
                            target,
                            kind: rel.kind,
                        });
                    }

                    match self.member(&rel.id) {
                        None => {
                            let (member, field, target) = at();
                            violations.push(IntegrityViolation::DanglingRelation {
                                member,
                                field,
                                target,
                            });
                        }
                        Some(other) => match other.relation_to(field.mirror(), &member.id) {
                            None => {
                                let (member, field, target) = at();
                                violations.push(IntegrityViolation::MissingMirror {
                                    member,
                                    field,
                                    target,
                                });
                            }
                            Some(mirror) if mirror.kind != rel.kind => {
                                let (member, field, target) = at();
                                violations.push(IntegrityViolation::MismatchedType {
                                    member,
                                    field,
                                    target,
                                });
                            }
                            Some(_) => {}
                        },
                    }
                }
            }

            let blood_parents = member.blood_parent_count();
            if blood_parents > MAX_BLOOD_PARENTS {
                violations.push(IntegrityViolation::BloodParentLimit {
                    member: member.id.clone(),
                    count: blood_parents,
                });
            }
        }

        violations
    }

    /// Shorthand for an empty [`check_integrity`](Self::check_integrity)
    pub fn is_consistent(&self) -> bool {
        self.check_integrity().is_empty()
    }
}

impl TryFrom<TreeDocument> for FamilyTree {
    type Error = TreeError;

    fn try_from(doc: TreeDocument) -> Result<Self, Self::Error> {
        Self::from_parts(doc.id, doc.name, doc.members)
    }
}

impl From<FamilyTree> for TreeDocument {
    fn from(tree: FamilyTree) -> Self {
        Self {
            id: tree.id,
            name: tree.name,
            members: tree.members,
        }
    }
}

/// One broken invariant found by [`FamilyTree::check_integrity`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Relation points at a member outside the tree
    DanglingRelation {
        /// Owner of the list
        member: MemberId,
        /// List containing the entry
        field: RelationField,
        /// Missing target
        target: MemberId,
    },

    /// Target has no entry pointing back
    MissingMirror {
        /// Owner of the list
        member: MemberId,
        /// List containing the entry
        field: RelationField,
        /// Target lacking the mirror
        target: MemberId,
    },

    /// Mirror entry exists with a different type
    MismatchedType {
        /// Owner of the list
        member: MemberId,
        /// List containing the entry
        field: RelationField,
        /// Target whose mirror differs
        target: MemberId,
    },

    /// Same target listed twice
    DuplicateRelation {
        /// Owner of the list
        member: MemberId,
        /// List containing the entries
        field: RelationField,
        /// Repeated target
        target: MemberId,
    },

    /// Type not allowed in this list
    InvalidType {
        /// Owner of the list
        member: MemberId,
        /// List containing the entry
        field: RelationField,
        /// Target of the entry
        target: MemberId,
        /// Offending type
        kind: RelationType,
    },

    /// Member lists itself
    SelfRelation {
        /// Offending member
        member: MemberId,
        /// List containing the entry
        field: RelationField,
    },

    /// More than two blood parents
    BloodParentLimit {
        /// Offending member
        member: MemberId,
        /// Number of blood parents found
        count: usize,
    },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::DanglingRelation { member, field, target } => {
                write!(f, "{member}.{field} references unknown member {target}")
            }
            IntegrityViolation::MissingMirror { member, field, target } => {
                write!(
                    f,
                    "{member}.{field} entry for {target} has no mirror on {target}.{}",
                    field.mirror()
                )
            }
            IntegrityViolation::MismatchedType { member, field, target } => {
                write!(f, "{member}.{field} entry for {target} disagrees with its mirror type")
            }
            IntegrityViolation::DuplicateRelation { member, field, target } => {
                write!(f, "{member}.{field} lists {target} more than once")
            }
            IntegrityViolation::InvalidType { member, field, target, kind } => {
                write!(
                    f,
                    "{member}.{field} entry for {target} has type '{kind}' not allowed in {field}"
                )
            }
            IntegrityViolation::SelfRelation { member, field } => {
                write!(f, "{member}.{field} references the member itself")
            }
            IntegrityViolation::BloodParentLimit { member, count } => {
                write!(f, "{member} has {count} blood parents")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Gender;

    fn tree_from_json(json: serde_json::Value) -> FamilyTree {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_new_tree_requires_name() {
        assert_eq!(FamilyTree::new("  ", vec![]), Err(TreeError::MissingName));
        let tree = FamilyTree::new("Smiths", vec![]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.id.as_str().len(), 36);
    }

    #[test]
    fn test_initial_members_need_id_and_name() {
        let unnamed = vec![Member::new(MemberId::from("a"), " ", Gender::Female)];
        assert_eq!(FamilyTree::new("Smiths", unnamed), Err(TreeError::MissingName));

        let anonymous = vec![Member::new(MemberId::from(""), "Ann", Gender::Female)];
        assert_eq!(FamilyTree::new("Smiths", anonymous), Err(TreeError::MissingMemberId));
    }

    #[test]
    fn test_duplicate_member_ids_rejected() {
        let members = vec![
            Member::new(MemberId::from("a"), "Ann", Gender::Female),
            Member::new(MemberId::from("a"), "Bob", Gender::Male),
        ];
        assert_eq!(
            FamilyTree::new("Smiths", members),
            Err(TreeError::DuplicateMember(MemberId::from("a")))
        );
    }

    #[test]
    fn test_document_round_trip_preserves_order() {
        let tree = tree_from_json(serde_json::json!({
            "id": "t1",
            "name": "Smiths",
            "members": [
                {"id": "b", "name": "Bob", "gender": "male",
                 "spouses": [{"id": "a", "type": "married"}]},
                {"id": "a", "name": "Ann", "gender": "female",
                 "spouses": [{"id": "b", "type": "married"}]}
            ]
        }));

        assert_eq!(tree.members()[0].id.as_str(), "b");
        assert_eq!(tree.member(&MemberId::from("a")).unwrap().name, "Ann");
        assert!(tree.is_consistent());

        let json = serde_json::to_string(&tree).unwrap();
        let back: FamilyTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_deserialize_rejects_duplicate_ids() {
        let result: Result<FamilyTree, _> = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "name": "Smiths",
            "members": [
                {"id": "a", "name": "Ann", "gender": "female"},
                {"id": "a", "name": "Ann", "gender": "female"}
            ]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_integrity_reports_each_violation() {
        let tree = tree_from_json(serde_json::json!({
            "id": "t1",
            "name": "Broken",
            "members": [
                {"id": "a", "name": "Ann", "gender": "female",
                 "parents": [
                    {"id": "b", "type": "blood"},
                    {"id": "ghost", "type": "blood"}
                 ],
                 "siblings": [{"id": "a", "type": "blood"}],
                 "spouses": [{"id": "c", "type": "married"}, {"id": "c", "type": "married"}]},
                {"id": "b", "name": "Bob", "gender": "male",
                 "children": [{"id": "a", "type": "adopted"}]},
                {"id": "c", "name": "Cid", "gender": "male",
                 "spouses": [{"id": "a", "type": "blood"}]}
            ]
        }));

        let violations = tree.check_integrity();
        let a = MemberId::from("a");
        let b = MemberId::from("b");
        let c = MemberId::from("c");

        assert!(violations.contains(&IntegrityViolation::DanglingRelation {
            member: a.clone(),
            field: RelationField::Parents,
            target: MemberId::from("ghost"),
        }));
        assert!(violations.contains(&IntegrityViolation::MismatchedType {
            member: a.clone(),
            field: RelationField::Parents,
            target: b.clone(),
        }));
        assert!(violations.contains(&IntegrityViolation::SelfRelation {
            member: a.clone(),
            field: RelationField::Siblings,
        }));
        assert!(violations.contains(&IntegrityViolation::DuplicateRelation {
            member: a.clone(),
            field: RelationField::Spouses,
            target: c.clone(),
        }));
        assert!(violations.contains(&IntegrityViolation::InvalidType {
            member: c.clone(),
            field: RelationField::Spouses,
            target: a.clone(),
            kind: RelationType::Blood,
        }));
        assert!(!tree.is_consistent());
    }

    #[test]
    fn test_integrity_missing_mirror_and_blood_limit() {
        let tree = tree_from_json(serde_json::json!({
            "id": "t1",
            "name": "Broken",
            "members": [
                {"id": "a", "name": "Ann", "gender": "female",
                 "parents": [
                    {"id": "p1", "type": "blood"},
                    {"id": "p2", "type": "blood"},
                    {"id": "p3", "type": "blood"}
                 ]},
                {"id": "p1", "name": "P1", "gender": "male",
                 "children": [{"id": "a", "type": "blood"}]},
                {"id": "p2", "name": "P2", "gender": "female",
                 "children": [{"id": "a", "type": "blood"}]},
                {"id": "p3", "name": "P3", "gender": "male"}
            ]
        }));

        let violations = tree.check_integrity();
        assert_eq!(violations.len(), 2, "{violations:?}");
        assert!(violations.contains(&IntegrityViolation::MissingMirror {
            member: MemberId::from("a"),
            field: RelationField::Parents,
            target: MemberId::from("p3"),
        }));
        assert!(violations.contains(&IntegrityViolation::BloodParentLimit {
            member: MemberId::from("a"),
            count: 3,
        }));
    }

    #[test]
    fn test_new_tree_rejects_inconsistent_members() {
        let doc: TreeDocument = serde_json::from_value(serde_json::json!({
            "id": "ignored",
            "name": "Half linked",
            "members": [
                {"id": "a", "name": "Ann", "gender": "female",
                 "siblings": [{"id": "b", "type": "half"}]},
                {"id": "b", "name": "Bob", "gender": "male"}
            ]
        }))
        .unwrap();

        match FamilyTree::new(doc.name, doc.members) {
            Err(TreeError::Inconsistent(violations)) => assert_eq!(violations.len(), 1),
            other => panic!("expected inconsistency, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_and_update_member() {
        let mut tree = FamilyTree::new("Smiths", vec![]).unwrap();
        let id = MemberId::from("a");
        tree.insert_member(Member::new(id.clone(), "Ann", Gender::Female))
            .unwrap();
        assert!(matches!(
            tree.insert_member(Member::new(id.clone(), "Again", Gender::Female)),
            Err(TreeError::DuplicateMember(_))
        ));

        let update = MemberUpdate {
            name: "Annie".to_string(),
            surname: "Smith".to_string(),
            gender: Gender::Female,
            date_of_birth: None,
            description: None,
        };
        assert_eq!(tree.update_member(&id, update.clone()).unwrap().name, "Annie");
        assert_eq!(
            tree.update_member(&MemberId::from("zzz"), update.clone()),
            Err(TreeError::MemberNotFound(MemberId::from("zzz")))
        );
        assert_eq!(
            tree.update_member(&id, MemberUpdate { name: String::new(), ..update }),
            Err(TreeError::MissingName)
        );
    }
}
