use crate::citizenship::domain::RelationshipClass;

/// Validation routine applied to a guardian relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianValidator {
    /// Age gap plus registry-vs-form tribe/clan concordance.
    Grandparent,
    Sibling,
    UncleAunt,
    /// Accepted once the NIN usage check passes.
    FirstCousin,
}

pub struct RelationshipResolver;

impl RelationshipResolver {
    /// Parents have no guardian validator.
    pub fn resolve(class: RelationshipClass) -> Option<GuardianValidator> {
        match class {
            RelationshipClass::GrandfatherPaternal
            | RelationshipClass::GrandfatherMaternal
            | RelationshipClass::GrandmotherPaternal
            | RelationshipClass::GrandmotherMaternal => Some(GuardianValidator::Grandparent),
            RelationshipClass::Sibling => Some(GuardianValidator::Sibling),
            RelationshipClass::MaternalUncleAunt | RelationshipClass::PaternalUncleAunt => {
                Some(GuardianValidator::UncleAunt)
            }
            RelationshipClass::FirstCousin => Some(GuardianValidator::FirstCousin),
            RelationshipClass::Father | RelationshipClass::Mother => None,
        }
    }

    pub fn resolve_label(label: &str) -> Option<GuardianValidator> {
        RelationshipClass::from_label(label).and_then(Self::resolve)
    }
}
