//! Validity rules for scheduled role assignments.

use chrono::NaiveDate;
use rostra_core::{GroupId, PersonId};
use serde::{Deserialize, Serialize};

use crate::assignment::RoleTypeTag;

/// One violated invariant of a scheduled assignment candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledRoleViolation {
    /// Person reference is absent.
    MissingPerson,
    /// Group reference is absent.
    MissingGroup,
    /// Effective date is absent or lies in the past.
    InvalidEffectiveDate,
    /// Target role type is absent or not assignable within the group.
    InvalidTargetType,
}

impl std::fmt::Display for ScheduledRoleViolation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::MissingPerson => "person reference must be present",
            Self::MissingGroup => "group reference must be present",
            Self::InvalidEffectiveDate => {
                "effective date must be present and must not lie in the past"
            }
            Self::InvalidTargetType => {
                "target role type must be assignable within the group"
            }
        };
        write!(formatter, "{message}")
    }
}

/// A candidate scheduled assignment as submitted by a caller.
///
/// All references are optional so that every violation can be collected
/// and reported in one round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduledRoleCandidate {
    /// Person the assignment would belong to.
    pub person_id: Option<PersonId>,
    /// Group the assignment would belong to.
    pub group_id: Option<GroupId>,
    /// Date on which the assignment should take effect.
    pub effective_date: Option<NaiveDate>,
    /// Role type the assignment should become.
    pub target_role_type: Option<RoleTypeTag>,
}

/// Checks a candidate against the presence, date, and type-membership
/// rules.
///
/// Returns every violated invariant, not just the first. The reference
/// date is injected so callers control the clock; `effective_date ==
/// as_of` is valid, yesterday is not. `assignable_types` is the group's
/// catalog snapshot at validation time; the membership check is skipped
/// entirely when the group reference is absent, since membership cannot
/// be evaluated without a group.
#[must_use]
pub fn validate_scheduled(
    candidate: &ScheduledRoleCandidate,
    assignable_types: Option<&[RoleTypeTag]>,
    as_of: NaiveDate,
) -> Vec<ScheduledRoleViolation> {
    let mut violations = Vec::new();

    if candidate.person_id.is_none() {
        violations.push(ScheduledRoleViolation::MissingPerson);
    }

    if candidate.group_id.is_none() {
        violations.push(ScheduledRoleViolation::MissingGroup);
    }

    match candidate.effective_date {
        Some(effective_date) if effective_date >= as_of => {}
        _ => violations.push(ScheduledRoleViolation::InvalidEffectiveDate),
    }

    if candidate.group_id.is_some() {
        let supported = candidate.target_role_type.as_ref().is_some_and(|target| {
            assignable_types
                .is_some_and(|types| types.contains(target))
        });
        if !supported {
            violations.push(ScheduledRoleViolation::InvalidTargetType);
        }
    }

    violations
}
