//! View models shared by every page.
//!
//! Formatting happens here, in Rust, so templates only print strings.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use market_stall_core::{Paginated, UserProfile};

use crate::api::{ApiClient, users};
use crate::error::{AppError, set_sentry_user};
use crate::session::{Credentials, LocalState};

/// One navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const HOME: NavLink = NavLink {
    label: "Home",
    href: "/home",
};
const PRODUCT: NavLink = NavLink {
    label: "Product",
    href: "/product",
};
const HISTORY: NavLink = NavLink {
    label: "History",
    href: "/history",
};
const BACKOFFICE: NavLink = NavLink {
    label: "Back-office",
    href: "/backoffice",
};
const WALLET: NavLink = NavLink {
    label: "Wallet",
    href: "/wallet",
};
const PROFILE: NavLink = NavLink {
    label: "Profile",
    href: "/profile",
};

/// Menu entries for a user. Logout is rendered separately as a form.
#[must_use]
pub fn menu(is_admin: bool) -> Vec<NavLink> {
    if is_admin {
        vec![HOME, PRODUCT, BACKOFFICE, WALLET, PROFILE]
    } else {
        vec![HOME, PRODUCT, HISTORY, WALLET, PROFILE]
    }
}

/// Navigation bar shown on every protected page.
#[derive(Debug, Clone)]
pub struct NavView {
    pub username: String,
    pub is_admin: bool,
    pub links: Vec<NavLink>,
    /// Distinct cart lines; only shown to customers.
    pub cart_count: usize,
}

impl NavView {
    #[must_use]
    pub fn new(user: &UserProfile, cart_count: usize) -> Self {
        let is_admin = user.is_admin();
        Self {
            username: user.username.clone(),
            is_admin,
            links: menu(is_admin),
            cart_count,
        }
    }

    #[must_use]
    pub const fn show_cart_badge(&self) -> bool {
        !self.is_admin
    }
}

/// The signed-in user, from the user store or else from `users/info`.
///
/// # Errors
///
/// Returns `AppError` if the store fails or the backend call fails.
pub async fn current_user(
    api: &ApiClient,
    credentials: &Credentials,
    local: &LocalState,
) -> Result<UserProfile, AppError> {
    let store = local.user_store();
    if let Some(user) = store.get().await? {
        return Ok(user);
    }

    let user = users::info(api, credentials).await?.data;
    store.set(&user).await?;
    set_sentry_user(&user.id, Some(&user.username));
    Ok(user)
}

/// Build the navigation bar for the current visitor.
///
/// # Errors
///
/// Returns `AppError` if the user cannot be resolved or the cart cannot be read.
pub async fn load_nav(
    api: &ApiClient,
    credentials: &Credentials,
    local: &LocalState,
) -> Result<NavView, AppError> {
    let user = current_user(api, credentials, local).await?;
    let cart = local.get_cart().await?;
    Ok(NavView::new(&user, cart.line_count()))
}

/// `?page=N` on paginated pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    /// Requested page, never below 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Previous/next links for a paginated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerView {
    pub page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl PagerView {
    #[must_use]
    pub fn new<T>(base_path: &str, result: &Paginated<T>) -> Self {
        let total_pages = result.total_page.max(1);
        Self {
            page: result.page,
            total_pages,
            prev_href: result
                .has_previous()
                .then(|| format!("{base_path}?page={}", result.page - 1)),
            next_href: result
                .has_next()
                .then(|| format!("{base_path}?page={}", result.page + 1)),
        }
    }
}

/// Format an ISO-8601 timestamp for display; unparseable input is shown as is.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Field-level validation messages for a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if it failed validation.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record `message` unless `value` has non-blank content.
    pub fn require(&mut self, field: &'static str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    /// Parse a non-negative decimal, recording `label` errors.
    pub fn non_negative_decimal(&mut self, field: &'static str, label: &str, raw: &str) -> Option<Decimal> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.add(field, format!("{label} is required"));
            return None;
        }
        match Decimal::from_str(raw) {
            Ok(value) if value.is_sign_negative() && !value.is_zero() => {
                self.add(field, format!("{label} must be 0 or more"));
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                self.add(field, format!("{label} must be a number"));
                None
            }
        }
    }

    /// Parse a non-negative whole number, recording `label` errors.
    pub fn non_negative_integer(&mut self, field: &'static str, label: &str, raw: &str) -> Option<i64> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.add(field, format!("{label} is required"));
            return None;
        }
        match raw.parse::<i64>() {
            Ok(value) if value < 0 => {
                self.add(field, format!("{label} must be 0 or more"));
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                self.add(field, format!("{label} must be a whole number"));
                None
            }
        }
    }
}

/// Blank form fields count as absent.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(permissions: &str) -> UserProfile {
        serde_json::from_str(&format!(
            r#"{{"id": 1, "username": "sam", "userRole": {{"name": "r", "description": "", "permissionInfos": {permissions}}}}}"#
        ))
        .unwrap()
    }

    fn labels(links: &[NavLink]) -> Vec<&'static str> {
        links.iter().map(|l| l.label).collect()
    }

    #[test]
    fn test_admin_menu() {
        let nav = NavView::new(&user(r#"[{"id": 1, "name": "all"}]"#), 3);
        assert_eq!(
            labels(&nav.links),
            vec!["Home", "Product", "Back-office", "Wallet", "Profile"]
        );
        assert!(!nav.show_cart_badge());
    }

    #[test]
    fn test_customer_menu() {
        let nav = NavView::new(&user("[]"), 2);
        assert_eq!(
            labels(&nav.links),
            vec!["Home", "Product", "History", "Wallet", "Profile"]
        );
        assert!(nav.show_cart_badge());
        assert_eq!(nav.cart_count, 2);
    }

    #[test]
    fn test_page_query_floor() {
        assert_eq!(PageQuery { page: None }.page(), 1);
        assert_eq!(PageQuery { page: Some(0) }.page(), 1);
        assert_eq!(PageQuery { page: Some(4) }.page(), 4);
    }

    #[test]
    fn test_pager_links() {
        let result: Paginated<Vec<u8>> = serde_json::from_str(
            r#"{"data": [], "page": 2, "pageSize": 10, "total": 30, "totalPage": 3}"#,
        )
        .unwrap();
        let pager = PagerView::new("/product", &result);

        assert_eq!(pager.prev_href.as_deref(), Some("/product?page=1"));
        assert_eq!(pager.next_href.as_deref(), Some("/product?page=3"));
    }

    #[test]
    fn test_form_errors_numbers() {
        let mut errors = FormErrors::new();

        assert_eq!(
            errors.non_negative_decimal("price", "Price", " 12.50 "),
            Some(Decimal::new(1250, 2))
        );
        assert_eq!(errors.non_negative_decimal("price", "Price", "-1"), None);
        assert_eq!(errors.get("price"), Some("Price must be 0 or more"));

        assert_eq!(errors.non_negative_integer("amount", "Amount", "abc"), None);
        assert_eq!(errors.get("amount"), Some("Amount must be a whole number"));
        assert_eq!(errors.non_negative_integer("stock", "Stock", "0"), Some(0));
    }

    #[test]
    fn test_form_errors_keep_first_message() {
        let mut errors = FormErrors::new();
        errors.require("name", "  ", "Name is required");
        errors.add("name", "second");

        assert_eq!(errors.get("name"), Some("Name is required"));
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" x ")).as_deref(), Some("x"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2025-03-01T10:05:00Z"), "2025-03-01 10:05");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
