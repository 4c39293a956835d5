//! Cart route handlers.
//!
//! The cart lives in local state; only checkout talks to the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use market_stall_core::{Cart, CartItem, CreateOrder, ProductId, WalletId, WalletInfo};

use crate::api::{orders as orders_api, wallets as wallets_api};
use crate::error::{AppError, add_breadcrumb, form_error};
use crate::middleware::ProtectedRoute;
use crate::middleware::guards::HOME_PATH;
use crate::session::{Credentials, LocalState};
use crate::state::AppState;
use crate::views::{NavView, load_nav, non_blank};

const CART_PATH: &str = "/cart";

/// Shown when checkout is submitted without a wallet.
pub const MISSING_WALLET: &str = "Please select a payment method";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub amount: u32,
    pub line_total: String,
    pub img_url: Option<String>,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price.to_string(),
            amount: item.amount,
            line_total: item.line_total().to_string(),
            img_url: item.img_url.clone(),
        }
    }
}

/// A wallet in the payment select.
#[derive(Debug, Clone)]
pub struct WalletOption {
    pub id: WalletId,
    pub label: String,
    pub selected: bool,
}

impl WalletOption {
    fn list(wallets: &[WalletInfo], selected: Option<WalletId>) -> Vec<Self> {
        wallets
            .iter()
            .map(|wallet| Self {
                id: wallet.id,
                label: format!("{} ({})", wallet.name, wallet.value),
                selected: selected == Some(wallet.id),
            })
            .collect()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub nav: NavView,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub wallets: Vec<WalletOption>,
    pub wallet_error: Option<&'static str>,
    pub dialog: Option<String>,
}

// =============================================================================
// Form Types
// =============================================================================

/// Remove-line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Checkout form data. The wallet select starts blank.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub wallet_id: Option<String>,
}

impl CheckoutForm {
    fn wallet(&self) -> Option<WalletId> {
        non_blank(self.wallet_id.as_deref()).and_then(|raw| raw.parse().ok())
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip(state, credentials, local))]
pub async fn show(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<Response, AppError> {
    let cart = local.get_cart().await?;
    render(&state, &credentials, &local, &cart, None, None, None).await
}

/// Remove one line from the cart.
#[instrument(skip(_guard, local, form), fields(product_id = %form.product_id))]
pub async fn remove(
    _guard: ProtectedRoute,
    local: LocalState,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect, AppError> {
    let mut cart = local.get_cart().await?;
    if cart.remove(form.product_id) {
        local.set_cart(&cart).await?;
        tracing::info!(lines = cart.line_count(), "Removed from cart");
    }
    Ok(Redirect::to(CART_PATH))
}

/// Place one order for the whole cart.
///
/// Without a wallet the cart is re-rendered with [`MISSING_WALLET`] and the
/// backend is not called. On success the cart is cleared.
#[instrument(skip(state, credentials, local, form))]
pub async fn checkout(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let cart = local.get_cart().await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    let Some(wallet_id) = form.wallet() else {
        return rerender_missing_wallet(&state, &credentials, &local, &cart).await;
    };

    let order = CreateOrder {
        orders: cart.order_lines(),
        wallet_id,
    };

    match orders_api::create(state.api(), &credentials, &order).await {
        Ok(()) => {
            local.clear_cart().await?;
            let wallet = wallet_id.to_string();
            add_breadcrumb("checkout", "Order placed", Some(&[("wallet_id", &wallet)]));
            tracing::info!(lines = order.orders.len(), "Order placed");
            Ok(Redirect::to(HOME_PATH).into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render(&state, &credentials, &local, &cart, Some(wallet_id), None, Some(message)).await
        }
    }
}

async fn render(
    state: &AppState,
    credentials: &Credentials,
    local: &LocalState,
    cart: &Cart,
    selected: Option<WalletId>,
    wallet_error: Option<&'static str>,
    dialog: Option<String>,
) -> Result<Response, AppError> {
    let nav = load_nav(state.api(), credentials, local).await?;
    let wallets = if cart.is_empty() {
        Vec::new()
    } else {
        let result = wallets_api::list(state.api(), credentials).await?;
        local.set_cached_wallets(&result.data).await?;
        WalletOption::list(&result.data, selected)
    };

    Ok(cart_page(nav, cart, wallets, wallet_error, dialog))
}

/// Re-render the cart with [`MISSING_WALLET`] from local state alone.
///
/// The profile and wallets cached by the last cart render are reused, so
/// nothing reaches the backend. Without them it falls back to [`render`].
async fn rerender_missing_wallet(
    state: &AppState,
    credentials: &Credentials,
    local: &LocalState,
    cart: &Cart,
) -> Result<Response, AppError> {
    let user = local.user_store().get().await?;
    let wallets = local.cached_wallets().await?;
    let (Some(user), Some(wallets)) = (user, wallets) else {
        tracing::debug!("No cached cart page; fetching again");
        return render(state, credentials, local, cart, None, Some(MISSING_WALLET), None).await;
    };

    let nav = NavView::new(&user, cart.line_count());
    let wallets = WalletOption::list(&wallets, None);
    Ok(cart_page(nav, cart, wallets, Some(MISSING_WALLET), None))
}

fn cart_page(
    nav: NavView,
    cart: &Cart,
    wallets: Vec<WalletOption>,
    wallet_error: Option<&'static str>,
    dialog: Option<String>,
) -> Response {
    CartTemplate {
        nav,
        lines: cart.items().iter().map(CartLineView::from).collect(),
        total: cart.total().to_string(),
        wallets,
        wallet_error,
        dialog,
    }
    .into_response()
}
