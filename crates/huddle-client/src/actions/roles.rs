use std::collections::HashSet;

use huddle_shared::Role;
use huddle_store::{RequestOp, RoleAction, Store};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

pub async fn get_roles_by_names(client: &Client, store: &Store, names: &[String]) -> Result<Vec<Role>> {
    bind_request(
        client,
        store,
        RequestOp::GetRoles,
        client.get_roles_by_names(names),
        |roles| vec![RoleAction::ReceivedRoles(roles.clone()).into()],
    )
    .await
}

/// Mark `names` as being fetched and return the ones this call claimed.
/// A name already loaded or claimed by another caller is left out, and the
/// check and the claim happen in one dispatch.
fn claim_pending_roles(store: &Store, names: &[String]) -> Vec<String> {
    let wanted: HashSet<String> = names.iter().filter(|n| !n.is_empty()).cloned().collect();
    if wanted.is_empty() {
        return Vec::new();
    }

    let (before, _) = store.dispatch_with_previous(RoleAction::AddPendingRoles(wanted.clone()));
    let roles = &before.entities.roles;
    let mut claimed: Vec<String> = wanted
        .into_iter()
        .filter(|name| !roles.roles.contains_key(name) && !roles.pending.contains(name))
        .collect();
    claimed.sort();
    claimed
}

/// Fetch the roles among `names` that are neither cached nor already being
/// fetched by another caller.
pub async fn load_roles_if_needed(client: &Client, store: &Store, names: &[String]) -> Result<()> {
    let claimed = claim_pending_roles(store, names);
    if claimed.is_empty() {
        return Ok(());
    }

    tracing::debug!(roles = ?claimed, "loading roles");
    let result = get_roles_by_names(client, store, &claimed).await;
    store.dispatch(RoleAction::RemovePendingRoles(claimed.into_iter().collect()));

    result.map(|_| ())
}
