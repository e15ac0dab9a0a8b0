use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned transaction ids are positive; ids of optimistic rows that
/// have not been confirmed yet are negative placeholders.
pub type TransactionId = i64;

pub type CategoryId = i64;

/// Currency the server converts everything into before storing `amount`.
pub const BASE_CURRENCY: &str = "USD";

/// A single income or expense record as the server reports it.
///
/// `amount` is always expressed in the base currency. `original_amount` and
/// `currency` are present only when the entry was made in a foreign currency;
/// `amount` is then the converted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: f64,
    #[serde(default)]
    pub original_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Display name of the category, possibly prefixed with an emoji.
    pub category: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Server-normalized, UTC-anchored timestamp.
    pub date: DateTime<Utc>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub note: Option<String>,
}

impl Transaction {
    /// Amount with the sign the balance sees: positive for income, negative
    /// for expense.
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// Calendar day this transaction belongs to, for list grouping.
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Legacy rows predate foreign-currency support: the server reports them
    /// with `currency = "USD"` and `original_amount = amount`. Treat those as
    /// plain base-currency entries so the UI never shows a redundant
    /// "converted from" line.
    pub fn normalize_legacy(&mut self) {
        let is_base = self.currency.as_deref().map(|c| c == BASE_CURRENCY).unwrap_or(true);
        let same_value = self
            .original_amount
            .map(|o| (o - self.amount).abs() < f64::EPSILON)
            .unwrap_or(true);
        if is_base && same_value {
            self.currency = None;
            self.original_amount = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

/// Read-only category lookup record. Categories the user created carry their
/// owner id; built-in defaults do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub category_id: CategoryId,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// `YYYY-MM-DD` as picked in the form; the server anchors it to UTC.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

/// Splits a leading emoji off a category display name, if there is one.
/// Category names are stored as e.g. "🍔 Food"; the icon and the text render
/// in different places.
pub fn split_category_icon(full_name: &str) -> (Option<&str>, &str) {
    let trimmed = full_name.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) if !first.chars().any(|c| c.is_ascii_alphanumeric()) && !first.is_empty() => {
            (Some(first), rest.trim())
        }
        _ => (None, trimmed),
    }
}

/// Compact money formatting used everywhere amounts are shown: `$0`,
/// `$0.50`, `$220`, `$1.3K`, `$25K`, `$2.5M`.
pub fn format_money(symbol: &str, amount: f64) -> String {
    let abs = amount.abs();
    let magnitude = if abs >= 1_000_000.0 {
        format!("{:.1}M", abs / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.0}K", abs / 1_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}K", abs / 1_000.0)
    } else if abs > 0.0 && abs < 1.0 {
        format!("{:.2}", abs)
    } else {
        format!("{:.0}", abs)
    };
    format!("{}{}", symbol, magnitude)
}

/// Like [`format_money`] but with an explicit `+`/`-` prefix for nonzero
/// amounts, as the balance header and calendar markers show it.
pub fn format_signed_money(symbol: &str, amount: f64) -> String {
    if amount == 0.0 {
        return format!("{}0", symbol);
    }
    let sign = if amount < 0.0 { "-" } else { "+" };
    format!("{}{}", sign, format_money(symbol, amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(amount: f64, transaction_type: TransactionType) -> Transaction {
        Transaction {
            id: 1,
            amount,
            original_amount: None,
            currency: None,
            category: "🍔 Food".to_string(),
            transaction_type,
            date: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
            category_id: 3,
            note: None,
        }
    }

    #[test]
    fn signed_amount_follows_type() {
        assert_eq!(tx(25.0, TransactionType::Income).signed_amount(), 25.0);
        assert_eq!(tx(25.0, TransactionType::Expense).signed_amount(), -25.0);
    }

    #[test]
    fn deserializes_server_shape() {
        let json = r#"{
            "id": 42,
            "amount": 12.5,
            "original_amount": 1000.0,
            "currency": "RUB",
            "category": "🚌 Transport",
            "type": "expense",
            "date": "2024-05-10T09:30:00Z",
            "category_id": 2,
            "note": "metro card"
        }"#;
        let parsed: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, 42);
        assert_eq!(parsed.transaction_type, TransactionType::Expense);
        assert_eq!(parsed.currency.as_deref(), Some("RUB"));
        assert_eq!(parsed.note.as_deref(), Some("metro card"));
    }

    #[test]
    fn normalize_legacy_clears_redundant_currency() {
        let mut legacy = tx(30.0, TransactionType::Expense);
        legacy.currency = Some(BASE_CURRENCY.to_string());
        legacy.original_amount = Some(30.0);
        legacy.normalize_legacy();
        assert_eq!(legacy.currency, None);
        assert_eq!(legacy.original_amount, None);

        let mut foreign = tx(12.5, TransactionType::Expense);
        foreign.currency = Some("RUB".to_string());
        foreign.original_amount = Some(1000.0);
        foreign.normalize_legacy();
        assert_eq!(foreign.currency.as_deref(), Some("RUB"));
    }

    #[test]
    fn create_request_omits_empty_fields() {
        let req = CreateTransactionRequest {
            category_id: 3,
            amount: 9.99,
            currency: None,
            date: "2024-05-10".to_string(),
            note: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("currency"));
        assert!(!json.contains("note"));
    }

    #[test]
    fn splits_category_icon() {
        assert_eq!(split_category_icon("🍔 Food"), (Some("🍔"), "Food"));
        assert_eq!(split_category_icon("Groceries"), (None, "Groceries"));
    }

    #[test]
    fn formats_money_tiers() {
        assert_eq!(format_money("$", 0.0), "$0");
        assert_eq!(format_money("$", 0.5), "$0.50");
        assert_eq!(format_money("$", 220.0), "$220");
        assert_eq!(format_money("$", 1_300.0), "$1.3K");
        assert_eq!(format_money("$", 25_000.0), "$25K");
        assert_eq!(format_money("$", 2_500_000.0), "$2.5M");
        assert_eq!(format_signed_money("$", -1_300.0), "-$1.3K");
        assert_eq!(format_signed_money("$", 556.0), "+$556");
        assert_eq!(format_signed_money("$", 0.0), "$0");
    }
}
