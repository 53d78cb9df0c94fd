use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use huddle_shared::Role;

use crate::action::{Action, RoleAction};
use crate::reducers::{cleared, with_entries, with_entry, without_entry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolesState {
    /// Role name to role.
    pub roles: Arc<HashMap<String, Role>>,
    /// Names currently being fetched, used to avoid duplicate loads.
    pub pending: Arc<HashSet<String>>,
}

impl RolesState {
    pub fn has_permission(&self, role_names: &[&str], permission: &str) -> bool {
        role_names.iter().any(|name| {
            self.roles
                .get(*name)
                .is_some_and(|role| role.permissions.iter().any(|p| p == permission))
        })
    }
}

pub fn reduce(state: &Arc<RolesState>, action: &Action) -> Arc<RolesState> {
    let action = match action {
        Action::LogoutSuccess => return cleared(state),
        Action::Roles(a) => a,
        _ => return Arc::clone(state),
    };

    let roles = match action {
        RoleAction::ReceivedRoles(list) => {
            with_entries(&state.roles, list.iter().cloned(), |r| r.name.clone())
        }
        RoleAction::ReceivedRole(role) => with_entry(&state.roles, role.name.clone(), role.clone()),
        RoleAction::RoleDeleted { name } => without_entry(&state.roles, name),
        RoleAction::SetPendingRoles(_)
        | RoleAction::AddPendingRoles(_)
        | RoleAction::RemovePendingRoles(_) => Arc::clone(&state.roles),
    };
    let pending = match action {
        RoleAction::SetPendingRoles(names) if *names != *state.pending => {
            Arc::new(names.clone())
        }
        RoleAction::AddPendingRoles(names) => {
            let added: Vec<&String> = names
                .iter()
                .filter(|n| !state.pending.contains(*n) && !roles.contains_key(*n))
                .collect();
            if added.is_empty() {
                Arc::clone(&state.pending)
            } else {
                let mut next = (*state.pending).clone();
                next.extend(added.into_iter().cloned());
                Arc::new(next)
            }
        }
        RoleAction::RemovePendingRoles(names) if names.iter().any(|n| state.pending.contains(n)) => {
            Arc::new(state.pending.difference(names).cloned().collect())
        }
        _ => Arc::clone(&state.pending),
    };

    if Arc::ptr_eq(&roles, &state.roles) && Arc::ptr_eq(&pending, &state.pending) {
        return Arc::clone(state);
    }

    Arc::new(RolesState { roles, pending })
}
