//! Home and back-office landing pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::ProtectedRoute;
use crate::middleware::guards::HOME_PATH;
use crate::session::LocalState;
use crate::state::AppState;
use crate::views::{NavView, load_nav};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
}

/// Back-office landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "backoffice.html")]
pub struct BackofficeTemplate {
    pub nav: NavView,
}

/// Display the home page.
#[instrument(skip(state, credentials, local))]
pub async fn home(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<HomeTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    Ok(HomeTemplate { nav })
}

/// Display the back-office landing page; customers go back home.
#[instrument(skip(state, credentials, local))]
pub async fn backoffice(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<Response, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    if !nav.is_admin {
        tracing::debug!("Back-office requested by a non-admin");
        return Ok(Redirect::to(HOME_PATH).into_response());
    }
    Ok(BackofficeTemplate { nav }.into_response())
}
