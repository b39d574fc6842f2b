//! Member module - people in a family tree

use crate::relation::{Relation, RelationField, RelationType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of `blood` entries in a member's parents list
pub const MAX_BLOOD_PARENTS: usize = 2;

/// Opaque member identifier
///
/// Ids minted here are UUIDv7 strings. Ids supplied by clients on tree
/// creation are kept verbatim, so any non-empty string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Generate a new UUIDv7-based MemberId
    ///
    /// # Examples
    ///
    /// ```
    /// use lineage_domain::MemberId;
    ///
    /// let id = MemberId::new();
    /// assert_eq!(id.as_str().len(), 36);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Gender of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,

    /// Female
    Female,
}

impl Gender {
    /// The other gender
    pub fn opposite(&self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    /// Get the gender name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person in a family tree
///
/// Display fields are freely editable. The four relation lists are only
/// changed by the relationship editor, which keeps both ends of every edge
/// in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Unique identifier within the tree
    pub id: MemberId,

    /// Given name
    pub name: String,

    /// Family name
    #[serde(default)]
    pub surname: String,

    /// Gender
    pub gender: Gender,

    /// Date of birth as entered by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    parents: Vec<Relation>,

    #[serde(default)]
    children: Vec<Relation>,

    #[serde(default)]
    siblings: Vec<Relation>,

    #[serde(default)]
    spouses: Vec<Relation>,
}

impl Member {
    /// Create a member with no relations
    pub fn new(id: MemberId, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            name: name.into(),
            surname: String::new(),
            gender,
            date_of_birth: None,
            description: None,
            parents: Vec::new(),
            children: Vec::new(),
            siblings: Vec::new(),
            spouses: Vec::new(),
        }
    }

    /// Parent relations
    pub fn parents(&self) -> &[Relation] {
        &self.parents
    }

    /// Child relations
    pub fn children(&self) -> &[Relation] {
        &self.children
    }

    /// Sibling relations
    pub fn siblings(&self) -> &[Relation] {
        &self.siblings
    }

    /// Spouse relations
    pub fn spouses(&self) -> &[Relation] {
        &self.spouses
    }

    /// Relation list selected by `field`
    pub fn relations(&self, field: RelationField) -> &[Relation] {
        match field {
            RelationField::Parents => &self.parents,
            RelationField::Children => &self.children,
            RelationField::Siblings => &self.siblings,
            RelationField::Spouses => &self.spouses,
        }
    }

    pub(crate) fn relations_mut(&mut self, field: RelationField) -> &mut Vec<Relation> {
        match field {
            RelationField::Parents => &mut self.parents,
            RelationField::Children => &mut self.children,
            RelationField::Siblings => &mut self.siblings,
            RelationField::Spouses => &mut self.spouses,
        }
    }

    /// Find the entry pointing at `target` in the given list
    pub fn relation_to(&self, field: RelationField, target: &MemberId) -> Option<&Relation> {
        self.relations(field).iter().find(|rel| &rel.id == target)
    }

    /// Number of `blood` parent relations
    pub fn blood_parent_count(&self) -> usize {
        self.parents
            .iter()
            .filter(|rel| rel.kind == RelationType::Blood)
            .count()
    }

    /// Apply an update to the display fields
    pub fn apply_update(&mut self, update: MemberUpdate) {
        self.name = update.name;
        self.surname = update.surname;
        self.gender = update.gender;
        self.date_of_birth = non_empty(update.date_of_birth);
        self.description = non_empty(update.description);
    }
}

/// Attributes for a member that does not exist yet
///
/// Every field is optional. Missing fields are filled in by whoever creates
/// the member (the editor derives a name and gender from the subject).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberSeed {
    /// Explicit id; a fresh UUIDv7 is minted when absent or empty
    pub id: Option<MemberId>,

    /// Given name
    pub name: Option<String>,

    /// Family name
    pub surname: Option<String>,

    /// Gender
    pub gender: Option<Gender>,

    /// Date of birth
    pub date_of_birth: Option<String>,

    /// Free-form notes
    pub description: Option<String>,
}

impl MemberSeed {
    /// Seed with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// The explicit id, if one was supplied
    pub fn requested_id(&self) -> Option<&MemberId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    /// Whether a usable name was supplied
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Build the member, using the given defaults for missing name and gender
    pub fn into_member(
        self,
        default_name: impl FnOnce() -> String,
        default_gender: Gender,
    ) -> Member {
        let id = self.requested_id().cloned().unwrap_or_default();
        let name = non_empty(self.name).unwrap_or_else(default_name);

        let mut member = Member::new(id, name, self.gender.unwrap_or(default_gender));
        member.surname = self.surname.unwrap_or_default();
        member.date_of_birth = non_empty(self.date_of_birth);
        member.description = non_empty(self.description);
        member
    }
}

/// Replacement display fields for an existing member
///
/// Relation lists sent alongside these fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    /// Given name (must not be empty)
    pub name: String,

    /// Family name
    #[serde(default)]
    pub surname: String,

    /// Gender
    pub gender: Gender,

    /// Date of birth
    #[serde(default)]
    pub date_of_birth: Option<String>,

    /// Free-form notes
    #[serde(default)]
    pub description: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
