//! Recipient resolution: who gets told about an event.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, warn};

use dealerhub_core::types::UserId;
use dealerhub_database::store::{PermissionStore, PreferenceStore, UserDirectory};
use dealerhub_entity::notification::PreferenceLevel;
use dealerhub_entity::permission::PermissionLevel;
use dealerhub_entity::user::User;

use super::registry::EventDefinition;

/// Why a user was left out of a recipient set.
///
/// These are expected filtering outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// The user triggered the event.
    Actor,
    /// The account is deactivated.
    Inactive,
    /// The user's role is not allowed for this event.
    RoleNotAllowed,
    /// The user has an explicit `hidden` permission on the event's page.
    PermissionDenied,
    /// A preference switch is off.
    PreferenceExcluded(PreferenceLevel),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor => write!(f, "actor"),
            Self::Inactive => write!(f, "inactive"),
            Self::RoleNotAllowed => write!(f, "role_not_allowed"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::PreferenceExcluded(level) => write!(f, "preference_excluded:{level:?}"),
        }
    }
}

/// Outcome of resolving one event.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Users that should be notified, in directory order.
    pub recipients: Vec<UserId>,
    /// Users that were filtered out, with the reason.
    pub excluded: Vec<(UserId, Exclusion)>,
}

/// Applies an event's recipient criteria to the user directory.
pub struct RecipientResolver {
    users: Arc<dyn UserDirectory>,
    permissions: Arc<dyn PermissionStore>,
    preferences: Arc<dyn PreferenceStore>,
}

impl fmt::Debug for RecipientResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientResolver").finish_non_exhaustive()
    }
}

impl RecipientResolver {
    /// Creates a new resolver.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        permissions: Arc<dyn PermissionStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            users,
            permissions,
            preferences,
        }
    }

    /// Compute the eligible recipients of an event triggered by `triggered_by`.
    ///
    /// A failure to list users yields an empty resolution. A failure to read
    /// one user's permission or preferences is logged and that check passes.
    pub async fn resolve(&self, definition: &EventDefinition, triggered_by: UserId) -> Resolution {
        let users = match self.users.list_all().await {
            Ok(users) => users,
            Err(e) => {
                error!(
                    event_type = %definition.event_type,
                    error = %e,
                    "Failed to list users, no recipients resolved"
                );
                return Resolution::default();
            }
        };

        let verdicts = join_all(
            users
                .iter()
                .map(|user| self.check(definition, user, triggered_by)),
        )
        .await;

        let mut resolution = Resolution::default();
        for (user, verdict) in users.iter().zip(verdicts) {
            match verdict {
                None => resolution.recipients.push(user.id),
                Some(reason) => {
                    debug!(
                        event_type = %definition.event_type,
                        user_id = %user.id,
                        reason = %reason,
                        "Recipient excluded"
                    );
                    resolution.excluded.push((user.id, reason));
                }
            }
        }
        resolution
    }

    /// Run the ordered checks for one candidate; `None` means eligible.
    async fn check(
        &self,
        definition: &EventDefinition,
        user: &User,
        triggered_by: UserId,
    ) -> Option<Exclusion> {
        if user.id == triggered_by {
            return Some(Exclusion::Actor);
        }
        if !user.is_active {
            return Some(Exclusion::Inactive);
        }
        if !definition.criteria.allows_role(user.role) {
            return Some(Exclusion::RoleNotAllowed);
        }

        match self
            .permissions
            .find_level(user.id, &definition.criteria.page)
            .await
        {
            Ok(Some(PermissionLevel::Hidden)) => return Some(Exclusion::PermissionDenied),
            Ok(_) => {}
            Err(e) => warn!(
                user_id = %user.id,
                page = %definition.criteria.page,
                error = %e,
                "Permission lookup failed, treating as visible"
            ),
        }

        match self.preferences.find(user.id).await {
            Ok(Some(prefs)) => prefs
                .excluded_by(definition.criteria.preference_key, definition.category)
                .map(Exclusion::PreferenceExcluded),
            Ok(None) => None,
            Err(e) => {
                warn!(
                    user_id = %user.id,
                    error = %e,
                    "Preference lookup failed, treating as enabled"
                );
                None
            }
        }
    }
}
