//! Attribute carry-forward policy for conversion.

use chrono::{DateTime, Utc};
use rostra_core::{AppError, AppResult, RoleAssignmentId};
use serde_json::Value;

use crate::assignment::{RoleAssignment, RoleKind};

/// Attribute names excluded from carry-forward by default: identity,
/// kind discriminator, the scheduled fields, and the original creation
/// timestamp.
pub const DEFAULT_EXCLUDED_ATTRS: &[&str] = &[
    "id",
    "kind",
    "effective_date",
    "target_role_type",
    "created_at",
];

/// Configurable exclusion set applied when a scheduled assignment is
/// exchanged for an active one.
///
/// The concrete set of carried-forward attributes is domain-specific and
/// may evolve, so the exclusions are data rather than code. The kind
/// discriminator and the scheduled fields are additionally enforced
/// structurally on the replacement, so no configuration can produce a
/// scheduled/active hybrid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryForwardPolicy {
    excluded: Vec<String>,
}

impl CarryForwardPolicy {
    /// Creates a policy with an explicit excluded attribute-name list.
    #[must_use]
    pub fn new(excluded: Vec<String>) -> Self {
        Self { excluded }
    }

    /// Returns the excluded attribute names.
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Computes the active replacement for a scheduled assignment.
    ///
    /// Every attribute is copied except the excluded set; the
    /// replacement gets a fresh identity, `kind = active`, the
    /// scheduled record's target role type, and `converted_at` as its
    /// creation timestamp.
    pub fn replacement_for(
        &self,
        scheduled: &RoleAssignment,
        converted_at: DateTime<Utc>,
    ) -> AppResult<RoleAssignment> {
        let (_, target_role_type) = scheduled.scheduled_fields()?;
        let target_role_type = target_role_type.clone();

        // A free-form attribute named after a structural field would
        // shadow the real value in the encoded object below.
        let mut sanitized = scheduled.clone();
        sanitized.strip_reserved_attrs();

        let encoded = serde_json::to_value(&sanitized).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode role assignment '{}' for carry-forward: {error}",
                scheduled.id
            ))
        })?;
        let Value::Object(mut attrs) = encoded else {
            return Err(AppError::Internal(format!(
                "role assignment '{}' did not encode as an object",
                scheduled.id
            )));
        };

        for name in &self.excluded {
            attrs.remove(name.as_str());
        }

        // The scheduled payload and discriminator never survive
        // conversion, whatever the configured exclusions say.
        attrs.remove("effective_date");
        attrs.remove("target_role_type");

        attrs.insert(
            "id".to_owned(),
            serde_json::to_value(RoleAssignmentId::new()).map_err(|error| {
                AppError::Internal(format!("failed to encode replacement id: {error}"))
            })?,
        );
        attrs.insert(
            "kind".to_owned(),
            Value::String(RoleKind::Active.as_str().to_owned()),
        );
        attrs.insert(
            "role_type".to_owned(),
            Value::String(target_role_type.as_str().to_owned()),
        );
        attrs.insert(
            "created_at".to_owned(),
            serde_json::to_value(converted_at).map_err(|error| {
                AppError::Internal(format!(
                    "failed to encode conversion timestamp: {error}"
                ))
            })?,
        );

        serde_json::from_value(Value::Object(attrs)).map_err(|error| {
            AppError::Internal(format!(
                "failed to build replacement for role assignment '{}': {error}",
                scheduled.id
            ))
        })
    }
}

impl Default for CarryForwardPolicy {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED_ATTRS
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }
}
