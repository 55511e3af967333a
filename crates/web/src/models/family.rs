//! Family member profiles.

use chrono::NaiveDate;

use family_planner_core::{FamilyMemberId, RELATIONSHIPS};

use super::validation::{self, ValidationError};

#[derive(Debug, Clone)]
pub struct FamilyMember {
    pub id: FamilyMemberId,
    pub name: String,
    pub relationship: String,
    pub birth_date: Option<NaiveDate>,
}

/// Fields for adding or editing a family member.
#[derive(Debug, Clone)]
pub struct MemberInput {
    pub name: String,
    pub relationship: String,
    pub birth_date: Option<NaiveDate>,
}

impl MemberInput {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name or unknown relationship.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = validation::required_text("name", &self.name)?;
        self.relationship = validation::choice(&RELATIONSHIPS, &self.relationship)?.to_owned();
        Ok(self)
    }
}
