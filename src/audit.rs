use serde_json::Value;
use uuid::Uuid;

use crate::{models::AuditEntry, state::AppState};

/// Record an audit entry. Failures are logged and never fail the request.
pub async fn log_audit(
    state: &AppState,
    user_id: Option<Uuid>,
    action: &'static str,
    resource: Option<&'static str>,
    metadata: Option<Value>,
) {
    let entry = AuditEntry {
        user_id,
        action,
        resource,
        metadata,
    };
    if let Err(err) = state.store.record_audit(entry).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
