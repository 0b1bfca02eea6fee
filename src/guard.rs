//! Route Guard
//!
//! Gates protected views on session presence. The check is an explicit
//! [`Access`] value; the routing layer decides what to do with a redirect.
//! Nothing is cached: every protected view runs its own check.

use crate::routes::Route;
use crate::session::Session;

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session present; carries the token for the view's requests
    Granted(String),
    /// Public route; no session needed
    Public,
    /// No session; navigate here instead of rendering
    Redirect(Route),
}

/// Lifecycle of a guarded view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// "Checking authentication…" placeholder is showing
    Checking,
    Ready,
    Redirected(Route),
}

impl GuardState {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            GuardState::Checking => Some("Checking authentication…"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn check(session: &Session) -> Access {
        match Self::require_token(session) {
            Ok(token) => Access::Granted(token),
            Err(route) => Access::Redirect(route),
        }
    }

    fn require_token(session: &Session) -> Result<String, Route> {
        session.get_token().ok_or_else(|| {
            tracing::debug!("No session token, redirecting to login");
            Route::Login
        })
    }

    /// Check access for `route`. Public routes never consult the session.
    pub fn check_route(session: &Session, route: Route) -> Access {
        if route.requires_auth() {
            Self::check(session)
        } else {
            Access::Public
        }
    }

    /// Run `render` only if the session is present.
    ///
    /// `on_state` observes the guard's transitions, starting with
    /// [`GuardState::Checking`].
    pub async fn protect<T, F, Fut>(
        session: &Session,
        mut on_state: impl FnMut(&GuardState),
        render: F,
    ) -> Result<T, Route>
    where
        F: FnOnce(String) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        on_state(&GuardState::Checking);
        match Self::require_token(session) {
            Ok(token) => {
                on_state(&GuardState::Ready);
                Ok(render(token).await)
            }
            Err(route) => {
                on_state(&GuardState::Redirected(route));
                Err(route)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_without_token() {
        let session = Session::in_memory();
        assert_eq!(RouteGuard::check(&session), Access::Redirect(Route::Login));
    }

    #[test]
    fn test_check_with_token() {
        let session = Session::in_memory();
        session.store_token("tok").unwrap();
        assert_eq!(RouteGuard::check(&session), Access::Granted("tok".into()));
    }

    #[test]
    fn test_every_protected_route_redirects() {
        let session = Session::in_memory();
        for route in Route::ALL {
            let access = RouteGuard::check_route(&session, route);
            if route.requires_auth() {
                assert_eq!(access, Access::Redirect(Route::Login), "{route}");
            } else {
                assert_eq!(access, Access::Public, "{route}");
            }
        }
    }

    #[test]
    fn test_public_route_ignores_session() {
        let session = Session::in_memory();
        session.store_token("tok").unwrap();
        assert_eq!(RouteGuard::check_route(&session, Route::Home), Access::Public);
        assert_eq!(
            RouteGuard::check_route(&session, Route::Reports),
            Access::Granted("tok".into())
        );
    }

    #[tokio::test]
    async fn test_protect_never_renders_without_session() {
        let session = Session::in_memory();
        let mut states = Vec::new();
        let rendered = std::cell::Cell::new(false);
        let flag = &rendered;

        let result = RouteGuard::protect(
            &session,
            |s| states.push(s.clone()),
            |_| async move { flag.set(true) },
        )
        .await;

        assert_eq!(result, Err(Route::Login));
        assert!(!rendered.get());
        assert_eq!(
            states,
            vec![GuardState::Checking, GuardState::Redirected(Route::Login)]
        );
    }

    #[tokio::test]
    async fn test_protect_renders_with_session() {
        let session = Session::in_memory();
        session.store_token("tok").unwrap();
        let mut states = Vec::new();

        let result = RouteGuard::protect(
            &session,
            |s| states.push(s.clone()),
            |token| async move { format!("content for {token}") },
        )
        .await;

        assert_eq!(result.unwrap(), "content for tok");
        assert_eq!(states, vec![GuardState::Checking, GuardState::Ready]);
        assert_eq!(states[0].message(), Some("Checking authentication…"));
    }
}
