//! Wallet list and wallet creation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use market_stall_core::{NewWallet, Price, UserId, WalletId, WalletInfo};

use crate::api::wallets as wallets_api;
use crate::error::{AppError, form_error};
use crate::middleware::ProtectedRoute;
use crate::session::LocalState;
use crate::state::AppState;
use crate::views::{FormErrors, NavView, load_nav};

const WALLET_PATH: &str = "/wallet";

/// Wallet display data.
#[derive(Debug, Clone)]
pub struct WalletView {
    pub id: WalletId,
    pub name: String,
    pub value: String,
    pub uuid: String,
}

impl From<&WalletInfo> for WalletView {
    fn from(wallet: &WalletInfo) -> Self {
        Self {
            id: wallet.id,
            name: wallet.name.clone(),
            value: wallet.value.to_string(),
            uuid: wallet.uuid.clone(),
        }
    }
}

/// Wallet list page template.
#[derive(Template, WebTemplate)]
#[template(path = "wallets/index.html")]
pub struct WalletsTemplate {
    pub nav: NavView,
    pub wallets: Vec<WalletView>,
}

/// Wallet creation page template.
#[derive(Template, WebTemplate)]
#[template(path = "wallets/new.html")]
pub struct NewWalletTemplate {
    pub nav: NavView,
    pub form: WalletForm,
    pub errors: FormErrors,
    pub dialog: Option<String>,
}

/// Wallet creation form data.
#[derive(Debug, Default, Deserialize)]
pub struct WalletForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl WalletForm {
    /// Build the request body; `uuid` and `token` are fresh random ids.
    fn validate(&self, user_id: UserId, errors: &mut FormErrors) -> Option<NewWallet> {
        errors.require("name", &self.name, "Name is required");
        let value = errors.non_negative_decimal("value", "Value", &self.value)?;
        if !errors.is_empty() {
            return None;
        }

        Some(NewWallet {
            name: self.name.trim().to_string(),
            value: Price::new(value),
            uuid: Uuid::now_v7().to_string(),
            token: Uuid::now_v7().to_string(),
            user_id,
        })
    }
}

/// Display the visitor's wallets.
#[instrument(skip(state, credentials, local))]
pub async fn index(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<WalletsTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    let result = wallets_api::list(state.api(), &credentials).await?;

    Ok(WalletsTemplate {
        nav,
        wallets: result.data.iter().map(WalletView::from).collect(),
    })
}

/// Display the wallet creation form.
#[instrument(skip(state, credentials, local))]
pub async fn new(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<NewWalletTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    Ok(NewWalletTemplate {
        nav,
        form: WalletForm::default(),
        errors: FormErrors::new(),
        dialog: None,
    })
}

/// Handle wallet creation.
#[instrument(skip(state, credentials, local, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Form(form): Form<WalletForm>,
) -> Result<Response, AppError> {
    let user_id = credentials.user_id()?;
    let mut errors = FormErrors::new();

    let dialog = match form.validate(user_id, &mut errors) {
        None => None,
        Some(wallet) => match wallets_api::create(state.api(), &credentials, &wallet).await {
            Ok(()) => {
                tracing::info!(%user_id, "Wallet created");
                return Ok(Redirect::to(WALLET_PATH).into_response());
            }
            Err(e) => Some(form_error(e)?),
        },
    };

    let nav = load_nav(state.api(), &credentials, &local).await?;
    Ok(NewWalletTemplate {
        nav,
        form,
        errors,
        dialog,
    }
    .into_response())
}
