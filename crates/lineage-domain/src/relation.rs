//! Relation module - typed edges between members
//!
//! Relations are stored on both endpoints. Each entry only carries the id of
//! the member on the other end, never a reference to it.

use crate::member::MemberId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a relation edge
///
/// Which kinds are legal depends on the relation list they live in:
/// - parents / children: `Blood`, `Adopted`
/// - siblings: `Blood`, `Half`
/// - spouses: `Married`, `Divorced`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Biological parent, child or full sibling
    Blood,

    /// Adoptive parent or child
    Adopted,

    /// Sibling sharing one parent
    Half,

    /// Current spouse
    Married,

    /// Former spouse
    Divorced,
}

impl RelationType {
    /// Get the relation type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Blood => "blood",
            RelationType::Adopted => "adopted",
            RelationType::Half => "half",
            RelationType::Married => "married",
            RelationType::Divorced => "divorced",
        }
    }

    /// Parse a relation type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "blood" => Some(RelationType::Blood),
            "adopted" => Some(RelationType::Adopted),
            "half" => Some(RelationType::Half),
            "married" => Some(RelationType::Married),
            "divorced" => Some(RelationType::Divorced),
            _ => None,
        }
    }
}

impl std::str::FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation type: {}", s))
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a member's relation list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Id of the member on the other end
    pub id: MemberId,

    /// Kind of the edge
    #[serde(rename = "type")]
    pub kind: RelationType,
}

impl Relation {
    /// Create a new relation entry
    pub fn new(id: MemberId, kind: RelationType) -> Self {
        Self { id, kind }
    }
}

/// The four relation lists carried by every member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationField {
    /// `parents` list
    Parents,

    /// `children` list
    Children,

    /// `siblings` list
    Siblings,

    /// `spouses` list
    Spouses,
}

impl RelationField {
    /// All fields, in storage order
    pub const ALL: [RelationField; 4] = [
        RelationField::Parents,
        RelationField::Children,
        RelationField::Siblings,
        RelationField::Spouses,
    ];

    /// The list on the target member that mirrors an entry in this list
    pub fn mirror(&self) -> Self {
        match self {
            RelationField::Parents => RelationField::Children,
            RelationField::Children => RelationField::Parents,
            RelationField::Siblings => RelationField::Siblings,
            RelationField::Spouses => RelationField::Spouses,
        }
    }

    /// Relation types that may appear in this list
    pub fn allowed_types(&self) -> &'static [RelationType] {
        match self {
            RelationField::Parents | RelationField::Children => {
                &[RelationType::Blood, RelationType::Adopted]
            }
            RelationField::Siblings => &[RelationType::Blood, RelationType::Half],
            RelationField::Spouses => &[RelationType::Married, RelationType::Divorced],
        }
    }

    /// Get the field name as it appears in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationField::Parents => "parents",
            RelationField::Children => "children",
            RelationField::Siblings => "siblings",
            RelationField::Spouses => "spouses",
        }
    }
}

impl fmt::Display for RelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra linking performed by a mode after the primary pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraLink {
    /// No extra links
    None,

    /// The new parent is married to the subject's first parent
    MarryFirstParent,

    /// Selected children of the subject gain the new spouse as a parent
    ReparentChildren,

    /// The selected spouse of the subject becomes a parent of the new child
    CoParentWithSpouse,
}

/// Static description of one relation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRule {
    /// Relation types accepted for the primary pair
    pub allowed_types: &'static [RelationType],

    /// List on the subject that receives the related member
    pub field: RelationField,

    /// Follow-up links specific to the mode
    pub extra: ExtraLink,
}

const PARENT_RULE: ModeRule = ModeRule {
    allowed_types: &[RelationType::Blood, RelationType::Adopted],
    field: RelationField::Parents,
    extra: ExtraLink::MarryFirstParent,
};

const SIBLING_RULE: ModeRule = ModeRule {
    allowed_types: &[RelationType::Blood, RelationType::Half],
    field: RelationField::Siblings,
    extra: ExtraLink::None,
};

const SPOUSE_RULE: ModeRule = ModeRule {
    allowed_types: &[RelationType::Married, RelationType::Divorced],
    field: RelationField::Spouses,
    extra: ExtraLink::ReparentChildren,
};

const CHILD_RULE: ModeRule = ModeRule {
    allowed_types: &[RelationType::Blood, RelationType::Adopted],
    field: RelationField::Children,
    extra: ExtraLink::CoParentWithSpouse,
};

/// Which relation a command adds to its subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationMode {
    /// Add a parent
    Parent,

    /// Add a sibling
    Sibling,

    /// Add a spouse
    Spouse,

    /// Add a child
    Child,
}

impl RelationMode {
    /// The rule table entry for this mode
    pub fn rule(&self) -> &'static ModeRule {
        match self {
            RelationMode::Parent => &PARENT_RULE,
            RelationMode::Sibling => &SIBLING_RULE,
            RelationMode::Spouse => &SPOUSE_RULE,
            RelationMode::Child => &CHILD_RULE,
        }
    }

    /// Whether `kind` may be used with this mode
    pub fn allows(&self, kind: RelationType) -> bool {
        self.rule().allowed_types.contains(&kind)
    }

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationMode::Parent => "parent",
            RelationMode::Sibling => "sibling",
            RelationMode::Spouse => "spouse",
            RelationMode::Child => "child",
        }
    }

    /// Parse a mode from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "parent" => Some(RelationMode::Parent),
            "sibling" => Some(RelationMode::Sibling),
            "spouse" => Some(RelationMode::Spouse),
            "child" => Some(RelationMode::Child),
            _ => None,
        }
    }
}

impl std::str::FromStr for RelationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation mode: {}", s))
    }
}

impl fmt::Display for RelationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_is_involution() {
        for field in RelationField::ALL {
            assert_eq!(field.mirror().mirror(), field);
        }
        assert_eq!(RelationField::Parents.mirror(), RelationField::Children);
        assert_eq!(RelationField::Spouses.mirror(), RelationField::Spouses);
    }

    #[test]
    fn test_mode_domains() {
        assert!(RelationMode::Parent.allows(RelationType::Blood));
        assert!(RelationMode::Parent.allows(RelationType::Adopted));
        assert!(!RelationMode::Parent.allows(RelationType::Half));
        assert!(RelationMode::Sibling.allows(RelationType::Half));
        assert!(!RelationMode::Sibling.allows(RelationType::Adopted));
        assert!(RelationMode::Spouse.allows(RelationType::Divorced));
        assert!(!RelationMode::Spouse.allows(RelationType::Blood));
        assert!(!RelationMode::Child.allows(RelationType::Married));
    }

    #[test]
    fn test_mode_domain_fits_both_lists() {
        // Whatever a mode accepts must be legal on both ends of the pair
        for mode in [
            RelationMode::Parent,
            RelationMode::Sibling,
            RelationMode::Spouse,
            RelationMode::Child,
        ] {
            let rule = mode.rule();
            for kind in rule.allowed_types {
                assert!(rule.field.allowed_types().contains(kind));
                assert!(rule.field.mirror().allowed_types().contains(kind));
            }
        }
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!("Blood".parse::<RelationType>(), Ok(RelationType::Blood));
        assert_eq!(RelationMode::parse("spouse"), Some(RelationMode::Spouse));
        assert!("cousin".parse::<RelationMode>().is_err());
        assert_eq!(RelationType::Divorced.to_string(), "divorced");
    }

    #[test]
    fn test_relation_wire_shape() {
        let rel = Relation::new(MemberId::from("abc"), RelationType::Half);
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json, serde_json::json!({"id": "abc", "type": "half"}));
    }
}
