//! Core types for Market Stall.
//!
//! Records are plain mirrors of backend responses; the client owns none of
//! them except the cart.

pub mod cart;
pub mod catalog;
pub mod email;
pub mod envelope;
pub mod id;
pub mod order;
pub mod pager;
pub mod price;
pub mod user;
pub mod wallet;

pub use cart::{Cart, CartItem};
pub use catalog::{NewProduct, Product, ProductCategory};
pub use email::{Email, EmailError};
pub use envelope::{ApiResponse, Paginated, total_pages};
pub use id::*;
pub use order::{CreateOrder, OrderDetailItem, OrderLine, OrderSummary, order_total};
pub use pager::CategoryPicker;
pub use price::Price;
pub use user::{PermissionInfo, RoleInfo, UserForm, UserProfile, UserRole, role_name};
pub use wallet::{NewWallet, WalletInfo};
