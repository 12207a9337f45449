//! Upsert of normalized rows into the catalog store.

use tracing::{debug, trace};

use anidex_core::{AnimeEntry, EntrySession, MergePolicy, ReconcileOutcome, Result};

/// Upsert `incoming` through `session`.
///
/// An unknown `system_id` is inserted verbatim. A known one is merged column
/// by column under `policy`.
pub async fn reconcile<S: EntrySession>(
    session: &mut S,
    incoming: &AnimeEntry,
    policy: &MergePolicy,
) -> Result<ReconcileOutcome> {
    match session.find(&incoming.system_id).await? {
        None => {
            session.insert(incoming).await?;
            debug!(system_id = %incoming.system_id, "Created record");
            Ok(ReconcileOutcome::Created)
        }
        Some(mut existing) => {
            policy.merge(&mut existing, incoming);
            session.update(&existing).await?;
            trace!(system_id = %incoming.system_id, "Updated record");
            Ok(ReconcileOutcome::Updated)
        }
    }
}
