/// Authorization decision functions
///
/// Two rules cover the whole system:
///
/// 1. **Ownership** — a caller may read, modify, or delete a task if and
///    only if the caller's id equals the task's owning user id. Roles never
///    override this; an admin's tasks are as private as anyone else's.
/// 2. **Role** — designated administrative endpoints require the `Admin`
///    role.
///
/// Both are pure decision functions over already-loaded data. Handlers
/// resolve existence *before* calling into this module, so a missing task
/// surfaces as NotFound and never reaches an ownership check.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::authorization::authorize_task_access;
/// use taskhub_shared::auth::middleware::Principal;
/// use taskhub_shared::models::task::Task;
///
/// fn check(principal: &Principal, task: &Task) -> Result<(), Box<dyn std::error::Error>> {
///     authorize_task_access(principal, task)?;
///     Ok(())
/// }
/// ```

use super::middleware::Principal;
use crate::models::task::Task;
use crate::models::user::Role;

/// Error type for authorization checks
///
/// Both variants map to 403: the caller is authenticated, just not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not the owner of the task
    #[error("You can only access your own tasks")]
    NotOwner,

    /// Caller is missing a required role
    #[error("Requires the {0:?} role")]
    MissingRole(Role),
}

/// Checks that the caller owns the task
///
/// Applied uniformly to read-one, update, delete, add-labels, and
/// remove-labels. Listing never needs it: the list query is scoped to the
/// caller at the storage layer.
pub fn authorize_task_access(principal: &Principal, task: &Task) -> Result<(), AuthzError> {
    if principal.id != task.user_id {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

/// Checks that the caller holds the given role
pub fn require_role(principal: &Principal, role: Role) -> Result<(), AuthzError> {
    if !principal.has_role(role) {
        return Err(AuthzError::MissingRole(role));
    }

    Ok(())
}

/// Checks that the caller is an admin
pub fn require_admin(principal: &Principal) -> Result<(), AuthzError> {
    require_role(principal, Role::Admin)
}
