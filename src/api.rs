// 🌐 API Layer - Data-Loading Boundary
// Envelope parsing, typed fetch errors, and the backend transport seam

use crate::snapshot::{Debt, DomainSnapshot, Goal, Statistics, Transaction, TxKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Every backend response: `{ success: bool, data | message }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T, FetchError> {
        if !self.success {
            return Err(FetchError::Backend(
                self.message.unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| FetchError::Malformed("success response without data".to_string()))
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failures at the data-loading boundary. None of these propagate into the
/// render pipeline: the controller converts them to empty-state rendering
/// plus a user notification.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("backend error: {0}")]
    Backend(String),
}

// ============================================================================
// WIRE MODELS
// ============================================================================

/// Payload of `GET /api/user/tariff/{id}`. The limits object is advisory:
/// unrecognized or mistyped fields are treated as absent (fail closed).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TariffInfo {
    pub tariff: String,
    #[serde(default)]
    pub limits: HashMap<String, serde_json::Value>,
}

impl TariffInfo {
    pub fn limit_bool(&self, key: &str) -> Option<bool> {
        self.limits.get(key).and_then(|v| v.as_bool())
    }

    pub fn limit_int(&self, key: &str) -> Option<i64> {
        self.limits.get(key).and_then(|v| v.as_i64())
    }
}

/// Body of `POST /api/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub kind: TxKind,
    pub amount: i64,
}

// ============================================================================
// BACKEND SEAM
// ============================================================================

/// Transport seam between the engine and the REST backend. The engine only
/// ever sees assembled snapshots; how they are fetched is the
/// implementation's business.
pub trait FinanceBackend {
    /// Fetch everything the client renders, as one consistent snapshot.
    fn fetch_snapshot(&self, user_id: i64) -> Result<DomainSnapshot, FetchError>;

    fn add_transaction(&mut self, tx: &NewTransaction) -> Result<(), FetchError>;

    fn delete_transaction(&mut self, tx_id: i64) -> Result<(), FetchError>;

    /// `POST /api/user/upgrade` - switch the user's tariff.
    fn request_upgrade(&mut self, user_id: i64, tariff: &str) -> Result<(), FetchError>;

    /// `GET /api/ai/advice` - one piece of assistant advice text.
    fn fetch_advice(&self, user_id: i64) -> Result<String, FetchError>;
}

// ============================================================================
// FIXTURE BACKEND
// ============================================================================

/// In-memory backend fed from a canned JSON document whose sections mirror
/// the real endpoints, envelope and all. Used by the demo binary and tests.
pub struct FixtureBackend {
    tariff: TariffInfo,
    statistics: Statistics,
    transactions: Vec<Transaction>,
    debts: Vec<Debt>,
    goals: Vec<Goal>,
    next_tx_id: i64,
}

#[derive(Deserialize)]
struct FixtureDocument {
    tariff: ApiEnvelope<TariffInfo>,
    statistics: ApiEnvelope<Statistics>,
    transactions: ApiEnvelope<Vec<Transaction>>,
    debts: ApiEnvelope<Vec<Debt>>,
    goals: ApiEnvelope<Vec<Goal>>,
}

impl FixtureBackend {
    pub fn from_json(raw: &str) -> Result<Self, FetchError> {
        let doc: FixtureDocument = serde_json::from_str(raw)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let transactions = doc.transactions.into_result()?;
        let next_tx_id = transactions.iter().map(|tx| tx.id).max().unwrap_or(0) + 1;

        Ok(FixtureBackend {
            tariff: doc.tariff.into_result()?,
            statistics: doc.statistics.into_result()?,
            transactions,
            debts: doc.debts.into_result()?,
            goals: doc.goals.into_result()?,
            next_tx_id,
        })
    }
}

impl FinanceBackend for FixtureBackend {
    fn fetch_snapshot(&self, _user_id: i64) -> Result<DomainSnapshot, FetchError> {
        Ok(DomainSnapshot {
            tariff_raw: self.tariff.tariff.clone(),
            statistics: self.statistics.clone(),
            transactions: self.transactions.clone(),
            debts: self.debts.clone(),
            goals: self.goals.clone(),
        })
    }

    fn add_transaction(&mut self, tx: &NewTransaction) -> Result<(), FetchError> {
        self.transactions.push(Transaction {
            id: self.next_tx_id,
            date: tx.date,
            description: tx.description.clone(),
            category: tx.category.clone(),
            kind: tx.kind,
            amount: tx.amount,
        });
        self.next_tx_id += 1;
        Ok(())
    }

    fn delete_transaction(&mut self, tx_id: i64) -> Result<(), FetchError> {
        let before = self.transactions.len();
        self.transactions.retain(|tx| tx.id != tx_id);
        if self.transactions.len() == before {
            return Err(FetchError::Backend(format!("transaction {tx_id} not found")));
        }
        Ok(())
    }

    fn request_upgrade(&mut self, _user_id: i64, tariff: &str) -> Result<(), FetchError> {
        self.tariff.tariff = tariff.to_string();
        Ok(())
    }

    fn fetch_advice(&self, _user_id: i64) -> Result<String, FetchError> {
        Ok("Spending on subscriptions grew 12% this month - review the three largest.".to_string())
    }
}

// ============================================================================
// HTTP BACKEND
// ============================================================================

#[cfg(feature = "http")]
pub use http_backend::HttpBackend;

#[cfg(feature = "http")]
mod http_backend {
    use super::*;
    use serde::de::DeserializeOwned;

    /// Blocking REST transport against a live backend.
    pub struct HttpBackend {
        client: reqwest::blocking::Client,
        base_url: String,
    }

    impl HttpBackend {
        pub fn new(base_url: impl Into<String>) -> Self {
            HttpBackend {
                client: reqwest::blocking::Client::new(),
                base_url: base_url.into(),
            }
        }

        fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
            let url = format!("{}{}", self.base_url, path);
            let resp = self
                .client
                .get(&url)
                .send()
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let envelope: ApiEnvelope<T> = resp
                .json()
                .map_err(|e| FetchError::Malformed(e.to_string()))?;
            envelope.into_result()
        }

        fn check(&self, resp: reqwest::blocking::Response) -> Result<(), FetchError> {
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let envelope: ApiEnvelope<serde_json::Value> = resp
                .json()
                .map_err(|e| FetchError::Malformed(e.to_string()))?;
            envelope.into_result().map(|_| ())
        }
    }

    impl FinanceBackend for HttpBackend {
        fn fetch_snapshot(&self, user_id: i64) -> Result<DomainSnapshot, FetchError> {
            let tariff: TariffInfo = self.get(&format!("/api/user/tariff/{user_id}"))?;
            let statistics: Statistics = self.get(&format!("/api/statistics/{user_id}"))?;
            let transactions: Vec<Transaction> =
                self.get(&format!("/api/transactions/{user_id}"))?;
            let debts: Vec<Debt> = self.get(&format!("/api/debts/{user_id}"))?;
            let goals: Vec<Goal> = self.get(&format!("/api/goals/{user_id}"))?;

            Ok(DomainSnapshot {
                tariff_raw: tariff.tariff,
                statistics,
                transactions,
                debts,
                goals,
            })
        }

        fn add_transaction(&mut self, tx: &NewTransaction) -> Result<(), FetchError> {
            let url = format!("{}/api/transactions", self.base_url);
            let resp = self
                .client
                .post(&url)
                .json(tx)
                .send()
                .map_err(|e| FetchError::Network(e.to_string()))?;
            self.check(resp)
        }

        fn delete_transaction(&mut self, tx_id: i64) -> Result<(), FetchError> {
            let url = format!("{}/api/transactions/{tx_id}", self.base_url);
            let resp = self
                .client
                .delete(&url)
                .send()
                .map_err(|e| FetchError::Network(e.to_string()))?;
            self.check(resp)
        }

        fn request_upgrade(&mut self, user_id: i64, tariff: &str) -> Result<(), FetchError> {
            let url = format!("{}/api/user/upgrade", self.base_url);
            let body = serde_json::json!({ "user_id": user_id, "tariff": tariff });
            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .map_err(|e| FetchError::Network(e.to_string()))?;
            self.check(resp)
        }

        fn fetch_advice(&self, user_id: i64) -> Result<String, FetchError> {
            self.get(&format!("/api/ai/advice?user_id={user_id}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_with_data() {
        let env: ApiEnvelope<i32> =
            serde_json::from_str(r#"{"success": true, "data": 7}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), 7);
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let env: ApiEnvelope<i32> =
            serde_json::from_str(r#"{"success": false, "message": "no such user"}"#).unwrap();
        match env.into_result() {
            Err(FetchError::Backend(msg)) => assert_eq!(msg, "no such user"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_success_without_data_is_malformed() {
        let env: ApiEnvelope<i32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(env.into_result(), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_tariff_limits_fail_closed() {
        let info: TariffInfo = serde_json::from_str(
            r#"{"tariff": "Plus", "limits": {"advanced_analytics": true, "charts_count": 5, "weird": "yes"}}"#,
        )
        .unwrap();

        assert_eq!(info.limit_bool("advanced_analytics"), Some(true));
        assert_eq!(info.limit_int("charts_count"), Some(5));
        // Wrong type and missing key are both absent
        assert_eq!(info.limit_bool("weird"), None);
        assert_eq!(info.limit_int("unknown_feature"), None);

        let bare: TariffInfo = serde_json::from_str(r#"{"tariff": "Free"}"#).unwrap();
        assert!(bare.limits.is_empty());
    }

    fn fixture_json() -> String {
        r#"{
            "tariff": {"success": true, "data": {"tariff": "Plus", "limits": {"charts_count": 5}}},
            "statistics": {"success": true, "data": {
                "balance": 5200, "total_income": 9000, "total_expense": 3800,
                "monthly": [{"month": "2026-07", "income": 9000, "expense": 3800}],
                "by_category": [{"category": "Food", "total": 1200}]
            }},
            "transactions": {"success": true, "data": [
                {"id": 1, "date": "2026-07-03", "description": "Salary", "category": "Work", "kind": "income", "amount": 9000},
                {"id": 2, "date": "2026-07-08", "description": "Groceries", "category": "Food", "kind": "expense", "amount": 1200}
            ]},
            "debts": {"success": true, "data": []},
            "goals": {"success": true, "data": []}
        }"#
        .to_string()
    }

    #[test]
    fn test_fixture_backend_round_trip() {
        let backend = FixtureBackend::from_json(&fixture_json()).unwrap();
        let snap = backend.fetch_snapshot(1).unwrap();

        assert_eq!(snap.tariff_raw, "Plus");
        assert_eq!(snap.transactions.len(), 2);
        assert_eq!(snap.statistics.balance, 5200);
        assert!(snap.debts.is_empty());
    }

    #[test]
    fn test_fixture_backend_mutations() {
        let mut backend = FixtureBackend::from_json(&fixture_json()).unwrap();

        backend
            .add_transaction(&NewTransaction {
                user_id: 1,
                date: NaiveDate::from_ymd_opt(2026, 7, 20).unwrap(),
                description: "Taxi".into(),
                category: "Transport".into(),
                kind: TxKind::Expense,
                amount: 40,
            })
            .unwrap();
        assert_eq!(backend.fetch_snapshot(1).unwrap().transactions.len(), 3);

        backend.delete_transaction(2).unwrap();
        assert_eq!(backend.fetch_snapshot(1).unwrap().transactions.len(), 2);
        assert!(backend.delete_transaction(99).is_err());

        backend.request_upgrade(1, "Max").unwrap();
        assert_eq!(backend.fetch_snapshot(1).unwrap().tariff_raw, "Max");
    }
}
