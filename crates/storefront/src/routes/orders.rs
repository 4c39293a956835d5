//! Order history and order detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use market_stall_core::{OrderDetailItem, OrderId, OrderSummary, order_total};

use crate::api::orders as orders_api;
use crate::error::AppError;
use crate::middleware::ProtectedRoute;
use crate::session::LocalState;
use crate::state::AppState;
use crate::views::{NavView, PageQuery, PagerView, format_timestamp, load_nav};

/// History row display data.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: OrderId,
    pub href: String,
    pub total_amount: i64,
    pub total_price: String,
    pub updated_at: String,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id,
            href: format!("/order-detail/{}", order.id),
            total_amount: order.total_amount,
            total_price: order.total_price.to_string(),
            updated_at: format_timestamp(&order.updated_at),
        }
    }
}

/// Order detail line display data.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_name: String,
    pub amount: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&OrderDetailItem> for OrderItemView {
    fn from(item: &OrderDetailItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            amount: item.amount,
            price: item.price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/history.html")]
pub struct HistoryTemplate {
    pub nav: NavView,
    pub orders: Vec<OrderRowView>,
    pub pager: PagerView,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub nav: NavView,
    pub order_id: OrderId,
    pub items: Vec<OrderItemView>,
    pub total: String,
}

/// Display one page of the visitor's orders.
#[instrument(skip(state, credentials, local))]
pub async fn history(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Query(query): Query<PageQuery>,
) -> Result<HistoryTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    let result = orders_api::history(state.api(), &credentials, query.page()).await?;

    Ok(HistoryTemplate {
        nav,
        orders: result.data.iter().map(OrderRowView::from).collect(),
        pager: PagerView::new("/history", &result),
    })
}

/// Display the lines of one order.
#[instrument(skip(state, credentials, local))]
pub async fn detail(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Path(order_id): Path<OrderId>,
) -> Result<OrderDetailTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    let items = orders_api::detail(state.api(), &credentials, order_id)
        .await?
        .data;

    Ok(OrderDetailTemplate {
        nav,
        order_id,
        total: order_total(&items).to_string(),
        items: items.iter().map(OrderItemView::from).collect(),
    })
}
