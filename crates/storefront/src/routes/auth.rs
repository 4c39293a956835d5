//! Authentication route handlers.
//!
//! Sign-in stores the backend's tokens in local state; sign-up only creates
//! the account; logout clears local state.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use market_stall_core::Email;

use crate::api::auth::{self as auth_api, SignUp};
use crate::api::{ApiError, NETWORK_ERROR};
use crate::error::{AppError, SIGN_IN_PATH, clear_sentry_user, form_error};
use crate::middleware::PublicRoute;
use crate::middleware::guards::HOME_PATH;
use crate::session::LocalState;
use crate::state::AppState;
use crate::views::FormErrors;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `?registered=1` after sign-up.
#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    pub registered: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub username: String,
    pub registered: bool,
    pub errors: FormErrors,
    pub dialog: Option<String>,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub form: SignUpForm,
    pub errors: FormErrors,
    pub dialog: Option<String>,
}

/// Dialog text for a failed sign-in or sign-up.
///
/// There is no session to tear down yet, so every 4xx shows the backend's
/// message and everything else shows "Network error".
fn anonymous_failure(err: ApiError) -> String {
    match err {
        ApiError::Status { status, message } if status.is_client_error() => {
            tracing::warn!(%status, message = %message, "Request rejected");
            message
        }
        other => form_error(other).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Backend failed");
            NETWORK_ERROR.to_string()
        }),
    }
}

// =============================================================================
// Sign-in Routes
// =============================================================================

/// Display the sign-in page.
pub async fn sign_in_page(_guard: PublicRoute, Query(query): Query<SignInQuery>) -> impl IntoResponse {
    SignInTemplate {
        username: String::new(),
        registered: query.registered.is_some(),
        errors: FormErrors::new(),
        dialog: None,
    }
}

/// Handle sign-in form submission.
#[instrument(skip(_guard, state, local, form), fields(username = %form.username))]
pub async fn sign_in(
    _guard: PublicRoute,
    State(state): State<AppState>,
    local: LocalState,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let mut errors = FormErrors::new();
    errors.require("username", &form.username, "Username is required");
    errors.require("password", &form.password, "Password is required");

    let rerender = |errors, dialog| SignInTemplate {
        username: form.username.clone(),
        registered: false,
        errors,
        dialog,
    };

    if !errors.is_empty() {
        return Ok(rerender(errors, None).into_response());
    }

    match auth_api::sign_in(state.api(), form.username.trim(), &form.password).await {
        Ok(response) => {
            local
                .set_credentials(&response.data.token, &response.data.refresh_token)
                .await?;
            tracing::info!("Signed in");
            Ok(Redirect::to(HOME_PATH).into_response())
        }
        Err(e) => Ok(rerender(FormErrors::new(), Some(anonymous_failure(e))).into_response()),
    }
}

// =============================================================================
// Sign-up Routes
// =============================================================================

/// Display the sign-up page.
pub async fn sign_up_page(_guard: PublicRoute) -> impl IntoResponse {
    SignUpTemplate {
        form: SignUpForm::default(),
        errors: FormErrors::new(),
        dialog: None,
    }
}

/// Handle sign-up form submission.
#[instrument(skip(_guard, state, form), fields(username = %form.username))]
pub async fn sign_up(
    _guard: PublicRoute,
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let mut errors = FormErrors::new();
    errors.require("username", &form.username, "Username is required");
    errors.require("fullname", &form.fullname, "Full name is required");
    errors.require("password", &form.password, "Password is required");
    let email = Email::parse(&form.email)
        .map_err(|e| errors.add("email", e.to_string()))
        .ok();

    let Some(email) = email.filter(|_| errors.is_empty()) else {
        return Ok(SignUpTemplate {
            form,
            errors,
            dialog: None,
        }
        .into_response());
    };

    let payload = SignUp {
        username: form.username.trim().to_string(),
        fullname: form.fullname.trim().to_string(),
        email: email.into_inner(),
        password: form.password.clone(),
    };

    match auth_api::sign_up(state.api(), &payload).await {
        Ok(()) => {
            tracing::info!("Account registered");
            Ok(Redirect::to(&format!("{SIGN_IN_PATH}?registered=1")).into_response())
        }
        Err(e) => Ok(SignUpTemplate {
            form,
            errors: FormErrors::new(),
            dialog: Some(anonymous_failure(e)),
        }
        .into_response()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(local))]
pub async fn logout(local: LocalState) -> Result<Redirect, AppError> {
    local.logout().await?;
    clear_sentry_user();
    tracing::info!("Signed out");
    Ok(Redirect::to(SIGN_IN_PATH))
}
