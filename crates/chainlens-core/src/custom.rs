//! Custom (application-defined) transaction payloads and their decoding.
//!
//! A custom transaction stores token balances as raw `{balance, token}`
//! pairs whose nesting depends on the transaction type. Decoding resolves
//! every token id through `gettoken` and rewrites each pair into a
//! `"<balance>@<symbol>"` string, leaving the rest of the payload intact.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rpc::NodeRpc;

type Fields = serde_json::Map<String, serde_json::Value>;

/// Account address to the balances moved for it.
pub type Balances<L> = BTreeMap<String, Vec<L>>;

// ==============================================================================
// Transaction Types
// ==============================================================================

/// Custom transaction types with a decodable balance payload, keyed by the
/// single-character code the daemon uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    MintToken,
    AddPoolLiquidity,
    UtxosToAccount,
    AccountToUtxos,
    AccountToAccount,
    AnyAccountsToAccounts,
}

impl TxType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::MintToken),
            "l" => Some(Self::AddPoolLiquidity),
            "U" => Some(Self::UtxosToAccount),
            "b" => Some(Self::AccountToUtxos),
            "B" => Some(Self::AccountToAccount),
            "a" => Some(Self::AnyAccountsToAccounts),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::MintToken => "M",
            Self::AddPoolLiquidity => "l",
            Self::UtxosToAccount => "U",
            Self::AccountToUtxos => "b",
            Self::AccountToAccount => "B",
            Self::AnyAccountsToAccounts => "a",
        }
    }
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MintToken => "mint_token",
            Self::AddPoolLiquidity => "add_pool_liquidity",
            Self::UtxosToAccount => "utxos_to_account",
            Self::AccountToUtxos => "account_to_utxos",
            Self::AccountToAccount => "account_to_account",
            Self::AnyAccountsToAccounts => "any_accounts_to_accounts",
        };
        f.write_str(name)
    }
}

// ==============================================================================
// Payloads
// ==============================================================================

/// A raw balance reference: an amount of the token with id `token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub balance: serde_json::Number,
    pub token: u32,
}

/// A custom transaction payload, generic over its balance leaf: raw
/// payloads hold [`TokenBalance`], decoded payloads hold `String`.
///
/// `rest` keeps every field the variant does not traverse.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomTx<L> {
    MintToken {
        minted: Vec<L>,
        rest: Fields,
    },
    AddPoolLiquidity {
        from: Balances<L>,
        rest: Fields,
    },
    UtxosToAccount {
        to: Balances<L>,
        rest: Fields,
    },
    AccountToUtxos {
        balances: Vec<L>,
        rest: Fields,
    },
    AccountToAccount {
        to: Balances<L>,
        rest: Fields,
    },
    AnyAccountsToAccounts {
        from: Vec<Balances<L>>,
        to: Vec<Balances<L>>,
        rest: Fields,
    },
}

impl<L> CustomTx<L> {
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::MintToken { .. } => TxType::MintToken,
            Self::AddPoolLiquidity { .. } => TxType::AddPoolLiquidity,
            Self::UtxosToAccount { .. } => TxType::UtxosToAccount,
            Self::AccountToUtxos { .. } => TxType::AccountToUtxos,
            Self::AccountToAccount { .. } => TxType::AccountToAccount,
            Self::AnyAccountsToAccounts { .. } => TxType::AnyAccountsToAccounts,
        }
    }
}

impl<L: DeserializeOwned> CustomTx<L> {
    /// Split a stored payload into the traversal structure of `tx_type`.
    pub fn parse(tx_type: TxType, payload: &serde_json::Value) -> Result<Self, CoreError> {
        let mut rest = payload.as_object().cloned().ok_or_else(|| {
            CoreError::InvalidData(format!("{tx_type} payload is not an object"))
        })?;

        let parsed = match tx_type {
            TxType::MintToken => Self::MintToken {
                minted: take_field(&mut rest, tx_type, "minted")?,
                rest,
            },
            TxType::AddPoolLiquidity => Self::AddPoolLiquidity {
                from: take_field(&mut rest, tx_type, "from")?,
                rest,
            },
            TxType::UtxosToAccount => Self::UtxosToAccount {
                to: take_field(&mut rest, tx_type, "to")?,
                rest,
            },
            TxType::AccountToUtxos => Self::AccountToUtxos {
                balances: take_field(&mut rest, tx_type, "balances")?,
                rest,
            },
            TxType::AccountToAccount => Self::AccountToAccount {
                to: take_field(&mut rest, tx_type, "to")?,
                rest,
            },
            TxType::AnyAccountsToAccounts => Self::AnyAccountsToAccounts {
                from: take_field(&mut rest, tx_type, "from")?,
                to: take_field(&mut rest, tx_type, "to")?,
                rest,
            },
        };
        Ok(parsed)
    }
}

impl<L: Serialize> CustomTx<L> {
    /// Reassemble the payload into a single JSON object.
    pub fn into_value(self) -> Result<serde_json::Value, CoreError> {
        let (mut rest, traversed) = match self {
            Self::MintToken { minted, rest } => (rest, vec![("minted", to_json(minted)?)]),
            Self::AddPoolLiquidity { from, rest } => (rest, vec![("from", to_json(from)?)]),
            Self::UtxosToAccount { to, rest } => (rest, vec![("to", to_json(to)?)]),
            Self::AccountToUtxos { balances, rest } => {
                (rest, vec![("balances", to_json(balances)?)])
            }
            Self::AccountToAccount { to, rest } => (rest, vec![("to", to_json(to)?)]),
            Self::AnyAccountsToAccounts { from, to, rest } => (
                rest,
                vec![("from", to_json(from)?), ("to", to_json(to)?)],
            ),
        };
        for (field, value) in traversed {
            rest.insert(field.to_owned(), value);
        }
        Ok(serde_json::Value::Object(rest))
    }
}

fn take_field<T: DeserializeOwned>(
    fields: &mut Fields,
    tx_type: TxType,
    name: &str,
) -> Result<T, CoreError> {
    let raw = fields
        .remove(name)
        .ok_or_else(|| CoreError::InvalidData(format!("{tx_type} payload is missing `{name}`")))?;
    serde_json::from_value(raw)
        .map_err(|e| CoreError::InvalidData(format!("{tx_type} payload has invalid `{name}`: {e}")))
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(value)
        .map_err(|e| CoreError::InvalidData(format!("serialize decoded payload: {e}")))
}

// ==============================================================================
// Decoding
// ==============================================================================

/// Rewrite every balance leaf of `payload` into `"<balance>@<symbol>"`.
///
/// Lookups within one list run concurrently; lists and mapping keys are
/// processed one after another. Any failed or incomplete token lookup fails
/// the whole decode.
pub async fn decode_custom_tx<R>(
    rpc: &R,
    txid: &str,
    payload: CustomTx<TokenBalance>,
) -> Result<CustomTx<String>, CoreError>
where
    R: NodeRpc + ?Sized,
{
    let decoded = match payload {
        CustomTx::MintToken { minted, rest } => CustomTx::MintToken {
            minted: format_list(rpc, txid, minted).await?,
            rest,
        },
        CustomTx::AddPoolLiquidity { from, rest } => CustomTx::AddPoolLiquidity {
            from: format_keyed(rpc, txid, from).await?,
            rest,
        },
        CustomTx::UtxosToAccount { to, rest } => CustomTx::UtxosToAccount {
            to: format_keyed(rpc, txid, to).await?,
            rest,
        },
        CustomTx::AccountToUtxos { balances, rest } => CustomTx::AccountToUtxos {
            balances: format_list(rpc, txid, balances).await?,
            rest,
        },
        CustomTx::AccountToAccount { to, rest } => CustomTx::AccountToAccount {
            to: format_keyed(rpc, txid, to).await?,
            rest,
        },
        CustomTx::AnyAccountsToAccounts { from, to, rest } => {
            let mut decoded_from = Vec::with_capacity(from.len());
            for entry in from {
                decoded_from.push(format_keyed(rpc, txid, entry).await?);
            }
            let mut decoded_to = Vec::with_capacity(to.len());
            for entry in to {
                decoded_to.push(format_keyed(rpc, txid, entry).await?);
            }
            CustomTx::AnyAccountsToAccounts {
                from: decoded_from,
                to: decoded_to,
                rest,
            }
        }
    };
    Ok(decoded)
}

async fn format_keyed<R>(
    rpc: &R,
    txid: &str,
    balances: Balances<TokenBalance>,
) -> Result<Balances<String>, CoreError>
where
    R: NodeRpc + ?Sized,
{
    let mut decoded = Balances::new();
    for (account, list) in balances {
        let formatted = format_list(rpc, txid, list).await?;
        decoded.insert(account, formatted);
    }
    Ok(decoded)
}

async fn format_list<R>(
    rpc: &R,
    txid: &str,
    list: Vec<TokenBalance>,
) -> Result<Vec<String>, CoreError>
where
    R: NodeRpc + ?Sized,
{
    // One lookup per distinct token; each leaf remembers which lookup it
    // reads so the output keeps input order.
    let mut token_ids: Vec<u32> = Vec::new();
    let slots: Vec<usize> = list
        .iter()
        .map(|leaf| match token_ids.iter().position(|id| *id == leaf.token) {
            Some(slot) => slot,
            None => {
                token_ids.push(leaf.token);
                token_ids.len() - 1
            }
        })
        .collect();

    let symbols = try_join_all(
        token_ids
            .iter()
            .map(|token| resolve_symbol(rpc, txid, *token)),
    )
    .await?;

    Ok(list
        .iter()
        .zip(slots)
        .map(|(leaf, slot)| format!("{}@{}", format_amount(&leaf.balance), symbols[slot]))
        .collect())
}

/// Plain decimal text for an amount. Fractional numbers go through `f64`
/// so small and large values never print with an exponent.
fn format_amount(amount: &serde_json::Number) -> String {
    match amount.as_f64() {
        Some(value) if amount.is_f64() => value.to_string(),
        _ => amount.to_string(),
    }
}

async fn resolve_symbol<R>(rpc: &R, txid: &str, token: u32) -> Result<String, CoreError>
where
    R: NodeRpc + ?Sized,
{
    let decode_error = |message: String| CoreError::Decode {
        txid: txid.to_owned(),
        message,
    };

    let mut reply = rpc
        .get_token(token)
        .await
        .map_err(|e| decode_error(format!("token {token} lookup failed: {e}")))?;
    let info = reply
        .remove(&token.to_string())
        .ok_or_else(|| decode_error(format!("token {token} missing from gettoken reply")))?;
    if info.symbol.is_empty() {
        return Err(decode_error(format!("token {token} has no symbol")));
    }
    Ok(info.symbol)
}
