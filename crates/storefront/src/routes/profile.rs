//! Profile page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use market_stall_core::UserProfile;

use crate::api::users as users_api;
use crate::error::{AppError, set_sentry_user};
use crate::middleware::ProtectedRoute;
use crate::session::LocalState;
use crate::state::AppState;
use crate::views::{NavView, format_timestamp};

/// Profile fields as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

impl From<&UserProfile> for ProfileView {
    fn from(user: &UserProfile) -> Self {
        let role = if user.user_role.name.is_empty() {
            "-".to_string()
        } else {
            user.user_role.name.clone()
        };

        Self {
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            role,
            created_at: user
                .created_at
                .as_deref()
                .map_or_else(|| "-".to_string(), format_timestamp),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: NavView,
    pub profile: ProfileView,
}

/// Display the signed-in user's profile.
///
/// Always asks the backend, then refreshes the cached profile with the answer.
#[instrument(skip(state, credentials, local))]
pub async fn show(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<ProfileTemplate, AppError> {
    let user = users_api::info(state.api(), &credentials).await?.data;
    local.user_store().set(&user).await?;
    set_sentry_user(&user.id, Some(&user.username));

    let cart = local.get_cart().await?;
    Ok(ProfileTemplate {
        nav: NavView::new(&user, cart.line_count()),
        profile: ProfileView::from(&user),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_view_fallbacks() {
        let user: UserProfile =
            serde_json::from_str(r#"{"id": 1, "username": "sam", "email": "sam@example.com"}"#)
                .unwrap();
        let view = ProfileView::from(&user);

        assert_eq!(view.role, "-");
        assert_eq!(view.created_at, "-");
        assert_eq!(view.email, "sam@example.com");
    }

    #[test]
    fn test_profile_view_formats_created_at() {
        let user: UserProfile = serde_json::from_str(
            r#"{"id": 1, "username": "sam", "createdAt": "2024-12-31T23:59:00Z",
                "userRole": {"name": "customer", "description": "", "permissionInfos": []}}"#,
        )
        .unwrap();
        let view = ProfileView::from(&user);

        assert_eq!(view.role, "customer");
        assert_eq!(view.created_at, "2024-12-31 23:59");
    }
}
