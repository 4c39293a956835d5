//! Keys of the per-visitor store.
//!
//! Every value the storefront keeps for a visitor lives in their session
//! under one of these keys.

/// Session keys for visitor state.
pub mod keys {
    /// Bearer token issued by `auth/login`.
    pub const TOKEN: &str = "token";

    /// Refresh token issued alongside the bearer token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// The cart, stored as a JSON array of lines.
    pub const CART: &str = "cart";

    /// Cached profile of the signed-in user.
    pub const USER_PROFILE: &str = "user_profile";

    /// Loader state of the add-product category picker.
    pub const CATEGORY_PICKER: &str = "category_picker";

    /// Wallets last shown in the cart's payment select.
    pub const WALLETS: &str = "wallets";

    /// Every key removed on logout.
    pub const ALL: [&str; 6] = [
        TOKEN,
        REFRESH_TOKEN,
        CART,
        USER_PROFILE,
        CATEGORY_PICKER,
        WALLETS,
    ];
}
