//! Authorization policy
//!
//! Pure decision functions, no side effects: every mutating operation calls
//! these explicitly before touching the store, which keeps the rules
//! testable away from the transport and the database.

use crate::db::models::User;

/// May `actor` edit or delete a resource owned by `owner_id`?
///
/// The rule is the same for articles and comments: the owner may, and an
/// administrator may.
pub fn can_modify(actor: &User, owner_id: i64) -> bool {
    actor.id == owner_id || actor.is_admin
}

/// May `actor` manage user roles at all?
pub fn can_manage_roles(actor: &User) -> bool {
    actor.is_admin
}

/// Outcome of an admin-flag toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleToggle {
    /// The flag should flip to this value
    Apply { is_admin: bool },

    /// Actor targeted themselves: no change, surfaced as a warning
    SelfToggleRefused,
}

/// Decide a toggle-admin request. Self-targeting is refused as a warned
/// no-op regardless of the actor's current role; everything else flips the
/// target's flag.
pub fn toggle_admin_decision(actor: &User, target: &User) -> RoleToggle {
    if actor.id == target.id {
        RoleToggle::SelfToggleRefused
    } else {
        RoleToggle::Apply {
            is_admin: !target.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, is_admin: bool) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            password_hash: String::new(),
            bio: None,
            profile_picture: None,
            is_admin,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_owner_can_modify() {
        let alice = user(1, false);
        assert!(can_modify(&alice, 1));
    }

    #[test]
    fn test_non_owner_cannot_modify() {
        let bob = user(2, false);
        assert!(!can_modify(&bob, 1));
    }

    #[test]
    fn test_admin_can_modify_anything() {
        let admin = user(3, true);
        assert!(can_modify(&admin, 1));
        assert!(can_modify(&admin, 2));
        assert!(can_modify(&admin, 3));
    }

    #[test]
    fn test_only_admins_manage_roles() {
        assert!(can_manage_roles(&user(1, true)));
        assert!(!can_manage_roles(&user(2, false)));
    }

    #[test]
    fn test_toggle_admin_flips_target() {
        let admin = user(1, true);
        let target = user(2, false);
        assert_eq!(
            toggle_admin_decision(&admin, &target),
            RoleToggle::Apply { is_admin: true }
        );

        let demoted = user(3, true);
        assert_eq!(
            toggle_admin_decision(&admin, &demoted),
            RoleToggle::Apply { is_admin: false }
        );
    }

    #[test]
    fn test_self_toggle_refused_for_any_role() {
        let admin = user(1, true);
        assert_eq!(
            toggle_admin_decision(&admin, &admin),
            RoleToggle::SelfToggleRefused
        );

        let plain = user(2, false);
        assert_eq!(
            toggle_admin_decision(&plain, &plain),
            RoleToggle::SelfToggleRefused
        );
    }
}
