//! Login and registration

use super::{AppContext, Prompt};
use crate::client::{Credentials, Registration};
use crate::routes::Route;

#[derive(Debug, Clone, Default)]
pub struct LoginView {
    pub email: String,
    pub password: String,
}

impl LoginView {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Log in and persist the token. Returns where to go next, or `None`
    /// after alerting the failure.
    pub async fn submit(&self, ctx: &AppContext, prompt: &dyn Prompt) -> Option<Route> {
        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        };

        let response = match ctx.client.login(&credentials).await {
            Ok(response) => response,
            Err(e) => {
                prompt.alert(&e.user_message());
                return None;
            }
        };

        if let Err(e) = ctx.session.store_token(&response.token) {
            prompt.alert(&e.to_string());
            return None;
        }

        match &response.doctor {
            Some(doctor) => tracing::info!(doctor_id = doctor.id, "Logged in as {}", doctor.full_name),
            None => tracing::info!("Logged in"),
        }
        prompt.alert("Logged in");
        Some(Route::Dashboard)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterView {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

impl RegisterView {
    pub fn new(
        email: impl Into<String>,
        full_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            full_name: full_name.into(),
            password: password.into(),
        }
    }

    pub async fn submit(&self, ctx: &AppContext, prompt: &dyn Prompt) -> Option<Route> {
        let registration = Registration {
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            password: self.password.clone(),
        };

        match ctx.client.register(&registration).await {
            Ok(()) => {
                prompt.alert("Registered! Please log in.");
                Some(Route::Login)
            }
            Err(e) => {
                prompt.alert(&e.user_message());
                None
            }
        }
    }
}
