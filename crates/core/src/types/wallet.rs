//! Wallets, the visitor's payment methods.

use serde::{Deserialize, Serialize};

use super::id::{UserId, WalletId};
use super::price::Price;

/// A wallet as listed by `GET wallets`. Snake case on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub id: WalletId,
    pub name: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub uuid: String,
    pub user_id: UserId,
    pub value: Price,
}

/// Body of `POST wallets`.
///
/// `uuid` and `token` are generated by the client; `user_id` is the owner
/// taken from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWallet {
    pub name: String,
    pub value: Price,
    pub uuid: String,
    pub token: String,
    pub user_id: UserId,
}
