//! Role assignment entity and role-type tagging.

use chrono::{DateTime, NaiveDate, Utc};
use rostra_core::{AppError, AppResult, GroupId, PersonId, RoleAssignmentId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Catalog-defined role type tag.
///
/// Role capabilities are keyed by this tag rather than dispatched through
/// a closed set of implementation types; the legal tags for a group come
/// from the hierarchy catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleTypeTag(String);

impl RoleTypeTag {
    /// Creates a validated role type tag.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "role type tag must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying tag value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<RoleTypeTag> for String {
    fn from(value: RoleTypeTag) -> Self {
        value.0
    }
}

impl std::fmt::Display for RoleTypeTag {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Discriminator between assignments in effect and assignments pending
/// conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Assignment currently in effect, subject to lifecycle side effects.
    Active,
    /// Assignment pending conversion on a future date, exempt from
    /// active-lifecycle side effects.
    Scheduled,
}

impl RoleKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Scheduled => "scheduled",
        }
    }

    /// Parses a storage string into a role kind.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "scheduled" => Ok(Self::Scheduled),
            _ => Err(AppError::Validation(format!(
                "unknown role kind '{value}'"
            ))),
        }
    }
}

/// A person's membership in a group under a specific role type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Record identity.
    pub id: RoleAssignmentId,
    /// Person holding the assignment.
    pub person_id: PersonId,
    /// Group the assignment belongs to.
    pub group_id: GroupId,
    /// Role type currently carried by the record. For scheduled records
    /// this is a placeholder until conversion applies the target type.
    pub role_type: RoleTypeTag,
    /// Active or scheduled discriminator.
    pub kind: RoleKind,
    /// Optional free-text label, carried forward on conversion.
    #[serde(default)]
    pub label: Option<String>,
    /// Optional deletion schedule, carried forward on conversion.
    #[serde(default)]
    pub delete_on: Option<NaiveDate>,
    /// Creation timestamp; replaced with the conversion time on the
    /// converted record.
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; hard deletion removes the record entirely.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Date on which a scheduled assignment must convert; present
    /// exactly when `kind` is scheduled, never in the past at
    /// validation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    /// Role type the assignment becomes upon conversion; present
    /// exactly when `kind` is scheduled and must be in the group's
    /// currently assignable types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role_type: Option<RoleTypeTag>,
    /// Free-form extra attributes, carried forward on conversion.
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl RoleAssignment {
    /// Field names owned by the record itself. Because `attrs` is
    /// flattened, a free-form attribute with one of these names would
    /// shadow the real field when the record is encoded.
    pub const RESERVED_ATTRS: &'static [&'static str] = &[
        "id",
        "person_id",
        "group_id",
        "role_type",
        "kind",
        "label",
        "delete_on",
        "created_at",
        "deleted_at",
        "effective_date",
        "target_role_type",
    ];

    /// Drops free-form attributes whose names collide with the
    /// record's own fields.
    pub fn strip_reserved_attrs(&mut self) {
        for name in Self::RESERVED_ATTRS {
            self.attrs.remove(*name);
        }
    }

    /// Creates an active assignment record.
    #[must_use]
    pub fn new_active(
        person_id: PersonId,
        group_id: GroupId,
        role_type: RoleTypeTag,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RoleAssignmentId::new(),
            person_id,
            group_id,
            role_type,
            kind: RoleKind::Active,
            label: None,
            delete_on: None,
            created_at,
            deleted_at: None,
            effective_date: None,
            target_role_type: None,
            attrs: Map::new(),
        }
    }

    /// Creates a scheduled assignment record pending conversion.
    ///
    /// The record's own role type mirrors the target until conversion
    /// applies it for real.
    #[must_use]
    pub fn new_scheduled(
        person_id: PersonId,
        group_id: GroupId,
        target_role_type: RoleTypeTag,
        effective_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RoleAssignmentId::new(),
            person_id,
            group_id,
            role_type: target_role_type.clone(),
            kind: RoleKind::Scheduled,
            label: None,
            delete_on: None,
            created_at,
            deleted_at: None,
            effective_date: Some(effective_date),
            target_role_type: Some(target_role_type),
            attrs: Map::new(),
        }
    }

    /// Returns true when this record is pending conversion.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.kind == RoleKind::Scheduled
    }

    /// Returns true when this record carries a soft-delete marker.
    #[must_use]
    pub fn is_soft_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the conversion date and target type, or an error for
    /// active records.
    pub fn scheduled_fields(&self) -> AppResult<(NaiveDate, &RoleTypeTag)> {
        match (self.effective_date, self.target_role_type.as_ref()) {
            (Some(effective_date), Some(target_role_type)) => {
                Ok((effective_date, target_role_type))
            }
            _ => Err(AppError::Validation(format!(
                "role assignment '{}' carries no scheduled fields",
                self.id
            ))),
        }
    }

    /// Renders a descriptive label for the record.
    ///
    /// Scheduled records read as `"Leader (from 04.11.2023)"`, sourced
    /// from the target role type and the effective date.
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.effective_date, self.target_role_type.as_ref()) {
            (Some(effective_date), Some(target_role_type)) => format!(
                "{} (from {})",
                target_role_type,
                effective_date.format("%d.%m.%Y")
            ),
            _ => self.role_type.as_str().to_owned(),
        }
    }
}
