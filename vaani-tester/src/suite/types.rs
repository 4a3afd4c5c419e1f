use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SuiteError;

/// Transaction category a test utterance belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Expense,
    SaleInvoice,
    PaymentIn,
    PaymentOut,
    Other,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Expense,
        TransactionType::SaleInvoice,
        TransactionType::PaymentIn,
        TransactionType::PaymentOut,
        TransactionType::Other,
    ];

    /// Wire name, as sent to the extraction endpoint and written to CSV
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::SaleInvoice => "sale_invoice",
            TransactionType::PaymentIn => "payment_in",
            TransactionType::PaymentOut => "payment_out",
            TransactionType::Other => "other",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| SuiteError::UnknownType(s.to_string()))
    }
}

/// A single simulated user utterance with its expectations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: u32,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub input: String,
    pub expected_intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<serde_json::Value>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl TestCase {
    pub fn new(id: u32, transaction_type: TransactionType, input: &str, category: &str) -> Self {
        Self {
            id,
            transaction_type,
            input: input.to_string(),
            expected_intent: transaction_type.as_str().to_string(),
            expected_output: None,
            category: category.to_string(),
            context: None,
        }
    }

    pub fn with_expected_output(mut self, value: serde_json::Value) -> Self {
        self.expected_output = normalize_expected(Some(value));
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }
}

/// JSON `null` carries no expectation, so it is stored as absent.
pub fn normalize_expected(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    value.filter(|v| !v.is_null())
}

/// Selects a subset of a suite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseFilter {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
}

impl CaseFilter {
    pub fn by_type(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type: Some(transaction_type),
            category: None,
        }
    }

    pub fn matches(&self, case: &TestCase) -> bool {
        let type_ok = self
            .transaction_type
            .map_or(true, |t| t == case.transaction_type);
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case(&case.category));
        type_ok && category_ok
    }
}
