use async_trait::async_trait;
use tracing::info;

use rostra_application::LifecycleHooks;
use rostra_core::AppResult;
use rostra_domain::RoleAssignment;

/// Default lifecycle hooks adapter.
///
/// The group-wide effects themselves (primary-group propagation,
/// contact-visibility reset) are owned by the surrounding system; this
/// adapter records that they fired so the suppression policy stays
/// observable in logs.
pub struct TracingLifecycleHooks;

#[async_trait]
impl LifecycleHooks for TracingLifecycleHooks {
    async fn after_create_active(&self, record: &RoleAssignment) -> AppResult<()> {
        info!(
            role_assignment_id = %record.id,
            person_id = %record.person_id,
            group_id = %record.group_id,
            "propagating primary group for new active assignment"
        );
        Ok(())
    }

    async fn after_destroy_active(&self, record: &RoleAssignment) -> AppResult<()> {
        info!(
            role_assignment_id = %record.id,
            person_id = %record.person_id,
            group_id = %record.group_id,
            "resetting contact visibility for destroyed active assignment"
        );
        Ok(())
    }
}
