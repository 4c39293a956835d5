//! Product listing, add-to-cart and the add-product form.
//!
//! The add-product form carries an infinite-scroll category picker. Its
//! options arrive as HTMX fragments from `GET /add-product/categories`, one
//! backend page per request, with the loader state kept in local state.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use market_stall_core::{
    CategoryId, CategoryPicker, NewProduct, Price, Product, ProductCategory, ProductId,
};

use crate::api::products as products_api;
use crate::error::{AppError, add_breadcrumb, form_error};
use crate::middleware::ProtectedRoute;
use crate::middleware::guards::HOME_PATH;
use crate::session::{Credentials, LocalState};
use crate::state::AppState;
use crate::views::{FormErrors, NavView, PageQuery, PagerView, format_timestamp, load_nav, non_blank};

// =============================================================================
// View Types
// =============================================================================

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub amount: i64,
    pub img_url: Option<String>,
    pub sale_window: Option<String>,
    /// Whether the "Add to Cart" button is shown.
    pub can_add: bool,
}

impl ProductView {
    fn new(product: &Product, is_admin: bool) -> Self {
        let sale_window = match (&product.sale_open_date, &product.sale_close_date) {
            (None, None) => None,
            (open, close) => Some(format!(
                "{} to {}",
                open.as_deref().map_or_else(|| "-".to_string(), format_timestamp),
                close.as_deref().map_or_else(|| "-".to_string(), format_timestamp),
            )),
        };

        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            amount: product.amount,
            img_url: product.img_url.clone(),
            sale_window,
            can_add: !is_admin && product.in_stock(),
        }
    }
}

/// One category in the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOptionView {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

impl CategoryOptionView {
    fn list(categories: &[ProductCategory], selected: Option<&str>) -> Vec<Self> {
        categories
            .iter()
            .map(|category| {
                let id = category.id.to_string();
                Self {
                    selected: selected == Some(id.as_str()),
                    id,
                    name: category.name.clone(),
                }
            })
            .collect()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub nav: NavView,
    pub products: Vec<ProductView>,
    pub pager: PagerView,
    pub page: u32,
}

/// Add-product page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/new.html")]
pub struct NewProductTemplate {
    pub nav: NavView,
    pub form: NewProductForm,
    pub errors: FormErrors,
    pub dialog: Option<String>,
    pub options: Vec<CategoryOptionView>,
    pub has_more: bool,
}

/// Category picker fragment: newly loaded options plus, while pages remain,
/// the sentinel that loads the next one.
#[derive(Template, WebTemplate)]
#[template(path = "products/category_options.html")]
pub struct CategoryOptionsTemplate {
    pub options: Vec<CategoryOptionView>,
    pub has_more: bool,
}

// =============================================================================
// Form Types
// =============================================================================

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Listing page the button was on, for the redirect back.
    pub page: Option<u32>,
}

/// Add-product form data, kept as typed so it can be re-rendered.
#[derive(Debug, Default, Deserialize)]
pub struct NewProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub product_category_id: Option<String>,
    #[serde(default)]
    pub sale_open_date: String,
    #[serde(default)]
    pub sale_close_date: String,
}

impl NewProductForm {
    /// Validate the form into a request body, recording field errors.
    fn validate(&self, errors: &mut FormErrors) -> Option<NewProduct> {
        errors.require("name", &self.name, "Name is required");
        let price = errors.non_negative_decimal("price", "Price", &self.price);
        let amount = errors.non_negative_integer("amount", "Amount", &self.amount);

        let product_category_id = non_blank(self.product_category_id.as_deref()).and_then(|raw| {
            raw.parse::<CategoryId>()
                .map_err(|_| errors.add("product_category_id", "Pick a category from the list"))
                .ok()
        });
        let sale_open_date = parse_date_field(errors, "sale_open_date", &self.sale_open_date);
        let sale_close_date = parse_date_field(errors, "sale_close_date", &self.sale_close_date);
        if let (Some(open), Some(close)) = (sale_open_date, sale_close_date)
            && close < open
        {
            errors.add("sale_close_date", "Sale must close after it opens");
        }

        let (Some(price), Some(amount)) = (price, amount) else {
            return None;
        };
        if !errors.is_empty() {
            return None;
        }

        Some(NewProduct {
            name: self.name.trim().to_string(),
            description: non_blank(Some(&self.description)),
            img_url: non_blank(Some(&self.img_url)),
            price: Price::new(price),
            amount,
            product_category_id,
            sale_open_date,
            sale_close_date,
        })
    }
}

/// Parse a `datetime-local` input value as UTC.
fn parse_datetime_local(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
}

fn parse_date_field(
    errors: &mut FormErrors,
    field: &'static str,
    raw: &str,
) -> Option<DateTime<Utc>> {
    let raw = non_blank(Some(raw))?;
    parse_datetime_local(&raw)
        .map_err(|_| errors.add(field, "Enter a valid date and time"))
        .ok()
}

// =============================================================================
// Listing
// =============================================================================

/// Display one page of products.
#[instrument(skip(state, credentials, local))]
pub async fn index(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Query(query): Query<PageQuery>,
) -> Result<ProductsIndexTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    let result = products_api::list(state.api(), &credentials, query.page()).await?;

    let products = result
        .data
        .iter()
        .map(|product| ProductView::new(product, nav.is_admin))
        .collect();

    Ok(ProductsIndexTemplate {
        pager: PagerView::new("/product", &result),
        page: result.page,
        products,
        nav,
    })
}

/// Put one unit of a product in the cart.
///
/// The product is looked up on the listing page it was shown on, so the
/// cart line carries the same name and price the visitor saw.
#[instrument(skip(state, credentials, local, form), fields(product_id = %form.product_id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let page = form.page.unwrap_or(1).max(1);
    let result = products_api::list(state.api(), &credentials, page).await?;

    let product = result
        .data
        .iter()
        .find(|product| product.id == form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("Product {}", form.product_id)))?;

    if !product.in_stock() {
        return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
    }

    let mut cart = local.get_cart().await?;
    cart.add(product);
    local.set_cart(&cart).await?;

    let product_id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product_id)]));
    tracing::info!(lines = cart.line_count(), "Added to cart");

    Ok(Redirect::to(&format!("/product?page={page}")))
}

// =============================================================================
// Add Product
// =============================================================================

/// Display the add-product form with a fresh category picker.
#[instrument(skip(state, credentials, local))]
pub async fn new(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Result<NewProductTemplate, AppError> {
    let nav = load_nav(state.api(), &credentials, &local).await?;
    local.set_category_picker(&CategoryPicker::default()).await?;

    Ok(NewProductTemplate {
        nav,
        form: NewProductForm::default(),
        errors: FormErrors::new(),
        dialog: None,
        options: Vec::new(),
        has_more: true,
    })
}

/// Handle add-product form submission.
#[instrument(skip(state, credentials, local, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
    Form(form): Form<NewProductForm>,
) -> Result<Response, AppError> {
    let mut errors = FormErrors::new();
    let Some(product) = form.validate(&mut errors) else {
        return rerender(&state, &credentials, &local, form, errors, None).await;
    };

    match products_api::create(state.api(), &credentials, &product).await {
        Ok(()) => {
            tracing::info!("Product created");
            Ok(Redirect::to(HOME_PATH).into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            rerender(&state, &credentials, &local, form, FormErrors::new(), Some(message)).await
        }
    }
}

/// Re-render the add-product form, keeping the options already loaded.
async fn rerender(
    state: &AppState,
    credentials: &Credentials,
    local: &LocalState,
    form: NewProductForm,
    errors: FormErrors,
    dialog: Option<String>,
) -> Result<Response, AppError> {
    let nav = load_nav(state.api(), credentials, local).await?;
    let mut picker = local.category_picker().await?;
    // A fetch that never finished would block the sentinel forever.
    if picker.is_in_flight() {
        picker.fail();
        local.set_category_picker(&picker).await?;
    }

    Ok(NewProductTemplate {
        nav,
        options: CategoryOptionView::list(picker.options(), form.product_category_id.as_deref()),
        has_more: !picker.is_exhausted(),
        form,
        errors,
        dialog,
    }
    .into_response())
}

/// Load the next page of category options as an HTMX fragment.
///
/// A request that arrives while another fetch is running, or after the last
/// page, gets an empty fragment and no backend call is made.
#[instrument(skip(state, credentials, local))]
pub async fn categories(
    State(state): State<AppState>,
    ProtectedRoute(credentials): ProtectedRoute,
    local: LocalState,
) -> Response {
    match load_categories(&state, &credentials, &local).await {
        Ok(fragment) => fragment.into_response(),
        Err(e) => e.into_fragment_response(),
    }
}

async fn load_categories(
    state: &AppState,
    credentials: &Credentials,
    local: &LocalState,
) -> Result<CategoryOptionsTemplate, AppError> {
    // Held until the page is merged; an overlapping request finds it taken.
    let claim = local
        .session_id()
        .and_then(|id| state.category_fetches().claim(id));
    let mut picker = local.category_picker().await?;
    let page = if claim.is_some() { picker.begin() } else { None };
    let Some(page) = page else {
        tracing::debug!(
            claimed = claim.is_some(),
            exhausted = picker.is_exhausted(),
            "Category fetch refused"
        );
        return Ok(CategoryOptionsTemplate {
            options: Vec::new(),
            has_more: false,
        });
    };
    local.set_category_picker(&picker).await?;

    match products_api::categories(state.api(), credentials, page, picker.page_size()).await {
        Ok(response) => {
            let added = picker.complete(page, response);
            local.set_category_picker(&picker).await?;
            tracing::debug!(page, added = added.len(), "Categories loaded");
            Ok(CategoryOptionsTemplate {
                options: CategoryOptionView::list(&added, None),
                has_more: !picker.is_exhausted(),
            })
        }
        Err(e) => {
            picker.fail();
            local.set_category_picker(&picker).await?;
            Err(e.into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn product(amount: i64) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Mango".to_string(),
            description: None,
            price: Price::new(Decimal::new(125, 2)),
            amount,
            img_url: None,
            sale_open_date: Some("2025-03-01T10:00:00Z".to_string()),
            sale_close_date: None,
        }
    }

    fn form(name: &str, price: &str, amount: &str) -> NewProductForm {
        NewProductForm {
            name: name.to_string(),
            price: price.to_string(),
            amount: amount.to_string(),
            ..NewProductForm::default()
        }
    }

    #[test]
    fn test_add_button_only_for_customers_with_stock() {
        assert!(ProductView::new(&product(3), false).can_add);
        assert!(!ProductView::new(&product(0), false).can_add);
        assert!(!ProductView::new(&product(3), true).can_add);
    }

    #[test]
    fn test_product_view_formats() {
        let view = ProductView::new(&product(3), false);
        assert_eq!(view.price, "$1.25");
        assert_eq!(view.sale_window.as_deref(), Some("2025-03-01 10:00 to -"));
    }

    #[test]
    fn test_parse_datetime_local() {
        assert_eq!(
            parse_datetime_local("2025-06-01T09:30").unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_datetime_local("2025-06-01T09:30:15").unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 15).unwrap()
        );
        assert!(parse_datetime_local("June 1st").is_err());
    }

    #[test]
    fn test_validate_builds_product() {
        let mut input = form(" Mango ", "2.50", "10");
        input.product_category_id = Some("4".to_string());
        input.sale_open_date = "2025-06-01T09:30".to_string();

        let mut errors = FormErrors::new();
        let product = input.validate(&mut errors).unwrap();

        assert!(errors.is_empty());
        assert_eq!(product.name, "Mango");
        assert_eq!(product.price, Price::new(Decimal::new(250, 2)));
        assert_eq!(product.product_category_id, Some(CategoryId::new(4)));
        assert_eq!(product.description, None);
        assert!(product.sale_open_date.is_some());
    }

    #[test]
    fn test_validate_reports_each_field() {
        let mut errors = FormErrors::new();
        assert!(form("", "-1", "x").validate(&mut errors).is_none());

        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("price"), Some("Price must be 0 or more"));
        assert_eq!(errors.get("amount"), Some("Amount must be a whole number"));
    }

    #[test]
    fn test_validate_rejects_inverted_sale_window() {
        let mut input = form("Mango", "1", "1");
        input.sale_open_date = "2025-06-02T00:00".to_string();
        input.sale_close_date = "2025-06-01T00:00".to_string();

        let mut errors = FormErrors::new();
        assert!(input.validate(&mut errors).is_none());
        assert_eq!(errors.get("sale_close_date"), Some("Sale must close after it opens"));
    }

    #[test]
    fn test_category_options_mark_selection() {
        let categories = vec![
            ProductCategory {
                id: CategoryId::new(1),
                name: "Fruit".to_string(),
                description: String::new(),
            },
            ProductCategory {
                id: CategoryId::new(2),
                name: "Veg".to_string(),
                description: String::new(),
            },
        ];
        let options = CategoryOptionView::list(&categories, Some("2"));

        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(options[1].name, "Veg");
    }
}
