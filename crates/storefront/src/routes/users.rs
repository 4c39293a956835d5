//! Back-office user management.
//!
//! Lists users with their role names and edits them through one shared form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use market_stall_core::{Email, RoleId, RoleInfo, UserForm, UserId, UserProfile, role_name};

use crate::api::{roles as roles_api, users as users_api};
use crate::error::{AppError, form_error};
use crate::middleware::ProtectedRoute;
use crate::session::{Credentials, LocalState};
use crate::state::AppState;
use crate::views::{FormErrors, NavView, PageQuery, PagerView, load_nav, non_blank};

const USER_MANAGEMENT_PATH: &str = "/user-management";

// =============================================================================
// View Types
// =============================================================================

/// User list row display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRowView {
    pub id: UserId,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub role: String,
    pub status: &'static str,
    pub edit_href: String,
}

impl UserRowView {
    fn new(user: &UserProfile, roles: &[RoleInfo]) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            role: role_name(roles, user.role_id).to_string(),
            status: if user.is_active { "Active" } else { "Inactive" },
            edit_href: format!("/user/{}/edit", user.id),
        }
    }
}

/// A role in the role select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

fn role_options(roles: &[RoleInfo], selected: &str) -> Vec<RoleOption> {
    roles
        .iter()
        .map(|role| {
            let id = role.id.to_string();
            RoleOption {
                selected: id == selected.trim(),
                id,
                name: role.name.clone(),
            }
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// User management page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub nav: NavView,
    pub users: Vec<UserRowView>,
    pub pager: PagerView,
}

/// Create/edit user page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub nav: NavView,
    pub title: &'static str,
    pub action: String,
    /// Password is required on create and optional on edit.
    pub creating: bool,
    pub form: UserFormInput,
    pub roles: Vec<RoleOption>,
    pub errors: FormErrors,
    pub dialog: Option<String>,
}

// =============================================================================
// Form Types
// =============================================================================

/// Create/edit user form data, as typed.
#[derive(Default, Deserialize)]
pub struct UserFormInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub role_id: String,
    /// Present only when the checkbox is ticked.
    #[serde(default)]
    pub is_active: Option<String>,
}

impl From<&UserProfile> for UserFormInput {
    fn from(user: &UserProfile) -> Self {
        Self {
            username: user.username.clone(),
            password: String::new(),
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role_id: user.role_id.map(|id| id.to_string()).unwrap_or_default(),
            is_active: user.is_active.then(|| "on".to_string()),
        }
    }
}

impl UserFormInput {
    #[must_use]
    pub const fn active(&self) -> bool {
        self.is_active.is_some()
    }

    /// Validate into a request body. A blank password on edit leaves the
    /// current one in place.
    fn validate(&self, creating: bool, errors: &mut FormErrors) -> Option<UserForm> {
        errors.require("username", &self.username, "Username is required");
        if creating {
            errors.require("password", &self.password, "Password is required");
        }
        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        let role_id = match self.role_id.trim().parse::<RoleId>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("role_id", "Select a role");
                None
            }
        };

        let (Some(email), Some(role_id)) = (email, role_id) else {
            return None;
        };
        if !errors.is_empty() {
            return None;
        }

        Some(UserForm {
            username: self.username.trim().to_string(),
            password: non_blank(Some(&self.password)),
            fullname: self.fullname.trim().to_string(),
            email: email.into_inner(),
            avatar: self.avatar.trim().to_string(),
            role_id,
            is_active: self.active(),
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display one page of users with their role names.
#[instrument(skip(state, credentials, local))]
pub async fn index(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Query(query): Query<PageQuery>,
) -> Result<UsersTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    let result = users_api::list(state.api(), &credentials, query.page()).await?;
    let roles = roles_api::list(state.api(), &credentials).await?.data;

    Ok(UsersTemplate {
        nav,
        users: result
            .data
            .iter()
            .map(|user| UserRowView::new(user, &roles))
            .collect(),
        pager: PagerView::new(USER_MANAGEMENT_PATH, &result),
    })
}

/// Display the create-user form.
#[instrument(skip(state, credentials, local))]
pub async fn new(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<Response, AppError> {
    let form = UserFormInput {
        is_active: Some("on".to_string()),
        ..UserFormInput::default()
    };
    render_form(&state, &credentials, &local, None, form, FormErrors::new(), None).await
}

/// Handle create-user submission.
#[instrument(skip(state, credentials, local, form), fields(username = %form.username))]
pub async fn create(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Form(form): Form<UserFormInput>,
) -> Result<Response, AppError> {
    let mut errors = FormErrors::new();
    let Some(body) = form.validate(true, &mut errors) else {
        return render_form(&state, &credentials, &local, None, form, errors, None).await;
    };

    match users_api::create(state.api(), &credentials, &body).await {
        Ok(()) => {
            tracing::info!("User created");
            Ok(Redirect::to(USER_MANAGEMENT_PATH).into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render_form(&state, &credentials, &local, None, form, FormErrors::new(), Some(message))
                .await
        }
    }
}

/// Display the edit-user form, filled from the backend record.
#[instrument(skip(state, credentials, local))]
pub async fn edit(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Path(user_id): Path<UserId>,
) -> Result<Response, AppError> {
    let user = users_api::get(state.api(), &credentials, user_id)
        .await?
        .data
        .user;
    let form = UserFormInput::from(&user);
    render_form(&state, &credentials, &local, Some(user_id), form, FormErrors::new(), None).await
}

/// Handle edit-user submission.
#[instrument(skip(state, credentials, local, form), fields(username = %form.username))]
pub async fn update(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Path(user_id): Path<UserId>,
    Form(form): Form<UserFormInput>,
) -> Result<Response, AppError> {
    let mut errors = FormErrors::new();
    let Some(body) = form.validate(false, &mut errors) else {
        return render_form(&state, &credentials, &local, Some(user_id), form, errors, None).await;
    };

    match users_api::update(state.api(), &credentials, user_id, &body).await {
        Ok(()) => {
            tracing::info!("User updated");
            Ok(Redirect::to(USER_MANAGEMENT_PATH).into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render_form(
                &state,
                &credentials,
                &local,
                Some(user_id),
                form,
                FormErrors::new(),
                Some(message),
            )
            .await
        }
    }
}

/// Render the shared user form; `editing` is the user being edited, if any.
async fn render_form(
    state: &AppState,
    credentials: &Credentials,
    local: &LocalState,
    editing: Option<UserId>,
    form: UserFormInput,
    errors: FormErrors,
    dialog: Option<String>,
) -> Result<Response, AppError> {
    let nav = load_nav(state.api(), credentials, local).await?;
    let roles = roles_api::list(state.api(), credentials).await?.data;

    let (title, action) = match editing {
        Some(user_id) => ("Edit user", format!("/user/{user_id}/edit")),
        None => ("Create user", "/user/create".to_string()),
    };

    Ok(UserFormTemplate {
        nav,
        title,
        action,
        creating: editing.is_none(),
        roles: role_options(&roles, &form.role_id),
        form,
        errors,
        dialog,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn roles() -> Vec<RoleInfo> {
        serde_json::from_str(
            r#"[{"id": 1, "name": "admin", "description": ""},
                {"id": 2, "name": "customer", "description": ""}]"#,
        )
        .unwrap()
    }

    fn input(password: &str) -> UserFormInput {
        UserFormInput {
            username: "sam".to_string(),
            password: password.to_string(),
            fullname: "Sam Doe".to_string(),
            email: "sam@example.com".to_string(),
            avatar: String::new(),
            role_id: " 2 ".to_string(),
            is_active: Some("on".to_string()),
        }
    }

    #[test]
    fn test_row_joins_role_name() {
        let user: UserProfile = serde_json::from_str(
            r#"{"id": 5, "username": "sam", "roleId": 2, "isActive": true}"#,
        )
        .unwrap();
        let row = UserRowView::new(&user, &roles());

        assert_eq!(row.role, "customer");
        assert_eq!(row.status, "Active");
        assert_eq!(row.edit_href, "/user/5/edit");
    }

    #[test]
    fn test_row_unknown_role_is_dash() {
        let user: UserProfile =
            serde_json::from_str(r#"{"id": 6, "username": "ghost", "roleId": 99}"#).unwrap();
        let row = UserRowView::new(&user, &roles());

        assert_eq!(row.role, "-");
        assert_eq!(row.status, "Inactive");
    }

    #[test]
    fn test_validate_coerces_role_and_checkbox() {
        let mut errors = FormErrors::new();
        let body = input("secret").validate(true, &mut errors).unwrap();

        assert_eq!(body.role_id, RoleId::new(2));
        assert!(body.is_active);
        assert_eq!(body.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_password_required_only_on_create() {
        let mut errors = FormErrors::new();
        assert!(input("").validate(true, &mut errors).is_none());
        assert_eq!(errors.get("password"), Some("Password is required"));

        let mut errors = FormErrors::new();
        let body = input("").validate(false, &mut errors).unwrap();
        assert_eq!(body.password, None);
    }

    #[test]
    fn test_validate_rejects_bad_email_and_role() {
        let mut form = input("secret");
        form.email = "not-an-email".to_string();
        form.role_id = String::new();

        let mut errors = FormErrors::new();
        assert!(form.validate(true, &mut errors).is_none());
        assert!(errors.get("email").is_some());
        assert_eq!(errors.get("role_id"), Some("Select a role"));
    }

    #[test]
    fn test_role_options_mark_selection() {
        let options = role_options(&roles(), "1");
        assert!(options[0].selected);
        assert!(!options[1].selected);
    }
}
