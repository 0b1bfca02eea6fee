//! Route table and navigation menus

use std::fmt;

/// Every destination the application can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Contact,
    Login,
    Register,
    Dashboard,
    Patients,
    Upload,
    Reports,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Home,
        Route::Contact,
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::Patients,
        Route::Upload,
        Route::Reports,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Contact => "/contact",
            Route::Login => "/auth/login",
            Route::Register => "/auth/register",
            Route::Dashboard => "/dashboard",
            Route::Patients => "/patients",
            Route::Upload => "/upload",
            Route::Reports => "/reports",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Contact => "Contact",
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Dashboard => "Dashboard",
            Route::Patients => "Patients",
            Route::Upload => "Upload MRI",
            Route::Reports => "Reports",
        }
    }

    /// Whether the route sits behind the authentication guard
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Patients | Route::Upload | Route::Reports
        )
    }

    pub fn from_path(path: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.path() == path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Navigation entries for the current auth state
pub fn nav_items(authed: bool) -> &'static [Route] {
    const PUBLIC: &[Route] = &[Route::Home, Route::Contact, Route::Login, Route::Register];
    const PRIVATE: &[Route] = &[
        Route::Home,
        Route::Dashboard,
        Route::Patients,
        Route::Upload,
        Route::Reports,
        Route::Contact,
    ];

    if authed {
        PRIVATE
    } else {
        PUBLIC
    }
}
