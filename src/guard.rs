//! Client-side route protection, the browser-facing twin of the
//! [`AuthUser`](crate::middleware::auth::AuthUser) extractor.

use crate::{client::session::Session, models::Role};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    pub require_admin: bool,
    pub required_role: Option<Role>,
    pub redirect_to: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            require_admin: false,
            required_role: None,
            redirect_to: LOGIN_PATH.to_string(),
        }
    }
}

impl RouteGuard {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn admin() -> Self {
        Self {
            require_admin: true,
            ..Self::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::default()
        }
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }

    pub fn check(&self, session: Option<&Session>) -> GuardDecision {
        let Some(user) = session.and_then(Session::authenticated_user) else {
            return GuardDecision::Redirect(self.redirect_to.clone());
        };

        if self.require_admin && !user.is_admin() {
            return GuardDecision::Redirect(HOME_PATH.to_string());
        }

        match self.required_role {
            Some(role) if user.role != role => GuardDecision::Redirect(HOME_PATH.to_string()),
            _ => GuardDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::Utc;
    use uuid::Uuid;

    fn session(role: Role) -> Session {
        Session {
            token: Some("token".to_string()),
            user: Some(User {
                id: Uuid::new_v4(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                role,
                created_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn anonymous_visitors_go_to_login() {
        assert_eq!(
            RouteGuard::authenticated().check(None),
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(
            RouteGuard::admin().check(Some(&Session::default())),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn token_without_user_is_not_authenticated() {
        let mut s = session(Role::Admin);
        s.user = None;
        assert_eq!(
            RouteGuard::authenticated().redirect_to("/signin").check(Some(&s)),
            GuardDecision::Redirect("/signin".to_string())
        );
    }

    #[test]
    fn admin_routes_send_others_home() {
        let guard = RouteGuard::admin();
        assert_eq!(guard.check(Some(&session(Role::Admin))), GuardDecision::Allow);
        assert_eq!(
            guard.check(Some(&session(Role::User))),
            GuardDecision::Redirect("/".to_string())
        );
        assert_eq!(
            guard.check(Some(&session(Role::Moderator))),
            GuardDecision::Redirect("/".to_string())
        );
    }

    #[test]
    fn role_must_match_exactly() {
        let guard = RouteGuard::role(Role::Moderator);
        assert_eq!(guard.check(Some(&session(Role::Moderator))), GuardDecision::Allow);
        assert_eq!(
            guard.check(Some(&session(Role::Admin))),
            GuardDecision::Redirect("/".to_string())
        );
    }

    #[test]
    fn plain_routes_allow_any_signed_in_user() {
        assert_eq!(
            RouteGuard::authenticated().check(Some(&session(Role::User))),
            GuardDecision::Allow
        );
    }
}
