// 📊 Domain Snapshot - Fetched Financial State
// One immutable view of the user's data per refresh cycle

use crate::tariff::ChartId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// DOMAIN MODELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
    Debt,
}

impl TxKind {
    pub fn label(&self) -> &'static str {
        match self {
            TxKind::Income => "Income",
            TxKind::Expense => "Expense",
            TxKind::Debt => "Debt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub kind: TxKind,
    /// Amount in minor currency units
    pub amount: i64,
}

/// Direction of a debt from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtDirection {
    Owed,
    Owing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub counterparty: String,
    pub direction: DebtDirection,
    pub amount: i64,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: i64,
    pub saved_amount: i64,
    pub deadline: Option<NaiveDate>,
}

impl Goal {
    /// Completion ratio clamped to [0, 1]
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0 {
            return 0.0;
        }
        (self.saved_amount as f64 / self.target_amount as f64).clamp(0.0, 1.0)
    }
}

/// One month's aggregate in the statistics series, e.g. `month = "2026-07"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    pub month: String,
    pub income: i64,
    pub expense: i64,
    #[serde(default)]
    pub debt: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub balance: i64,
    pub total_income: i64,
    pub total_expense: i64,
    #[serde(default)]
    pub monthly: Vec<MonthPoint>,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>,
}

// ============================================================================
// TRANSACTION FILTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxFilter {
    #[default]
    All,
    Income,
    Expense,
    Debt,
}

impl TxFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            TxFilter::All => true,
            TxFilter::Income => tx.kind == TxKind::Income,
            TxFilter::Expense => tx.kind == TxKind::Expense,
            TxFilter::Debt => tx.kind == TxKind::Debt,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxFilter::All => "All",
            TxFilter::Income => "Income",
            TxFilter::Expense => "Expense",
            TxFilter::Debt => "Debt",
        }
    }
}

// ============================================================================
// CHART DATA
// ============================================================================

/// Series data handed to a chart backend when a region goes live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<f64>,
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// The complete fetched state for one user, replaced wholesale on every
/// reload - never patched incrementally. Owned by the view-state controller
/// for the duration of one render cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    /// Raw tariff string as the backend sent it; canonicalized on apply
    pub tariff_raw: String,
    pub statistics: Statistics,
    pub transactions: Vec<Transaction>,
    pub debts: Vec<Debt>,
    pub goals: Vec<Goal>,
}

impl DomainSnapshot {
    pub fn filtered_transactions(&self, filter: TxFilter) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .collect()
    }

    /// Whether a chart has anything to draw. A visible chart without
    /// backing data renders the explicit empty-state, never a chart with
    /// zero-length series.
    pub fn has_chart_data(&self, id: ChartId) -> bool {
        match id {
            ChartId::MonthlyTrend | ChartId::YearlyOverview => {
                !self.statistics.monthly.is_empty()
            }
            // Forecasting needs at least two observed months to extrapolate
            ChartId::CashflowForecast => self.statistics.monthly.len() >= 2,
            ChartId::CategoryBreakdown => !self.statistics.by_category.is_empty(),
            ChartId::DebtBreakdown => !self.debts.is_empty(),
            ChartId::GoalProgress => !self.goals.is_empty(),
        }
    }

    /// Build the series for one chart, or `None` when there is no data.
    pub fn chart_data(&self, id: ChartId) -> Option<ChartData> {
        if !self.has_chart_data(id) {
            return None;
        }

        let data = match id {
            ChartId::MonthlyTrend => ChartData {
                labels: self.statistics.monthly.iter().map(|m| m.month.clone()).collect(),
                series: vec![
                    Series {
                        name: "Income".to_string(),
                        points: self.statistics.monthly.iter().map(|m| m.income as f64).collect(),
                    },
                    Series {
                        name: "Expense".to_string(),
                        points: self.statistics.monthly.iter().map(|m| m.expense as f64).collect(),
                    },
                ],
            },
            ChartId::YearlyOverview => ChartData {
                labels: self.statistics.monthly.iter().map(|m| m.month.clone()).collect(),
                series: vec![
                    Series {
                        name: "Income".to_string(),
                        points: self.statistics.monthly.iter().map(|m| m.income as f64).collect(),
                    },
                    Series {
                        name: "Expense".to_string(),
                        points: self.statistics.monthly.iter().map(|m| m.expense as f64).collect(),
                    },
                    Series {
                        name: "Debt".to_string(),
                        points: self.statistics.monthly.iter().map(|m| m.debt as f64).collect(),
                    },
                ],
            },
            ChartId::CategoryBreakdown => {
                // Top five categories by absolute total
                let mut cats = self.statistics.by_category.clone();
                cats.sort_by(|a, b| b.total.cmp(&a.total));
                cats.truncate(5);
                ChartData {
                    labels: cats.iter().map(|c| c.category.clone()).collect(),
                    series: vec![Series {
                        name: "Total".to_string(),
                        points: cats.iter().map(|c| c.total as f64).collect(),
                    }],
                }
            }
            ChartId::DebtBreakdown => ChartData {
                labels: self.debts.iter().map(|d| d.counterparty.clone()).collect(),
                series: vec![Series {
                    name: "Amount".to_string(),
                    points: self
                        .debts
                        .iter()
                        .map(|d| match d.direction {
                            DebtDirection::Owed => d.amount as f64,
                            DebtDirection::Owing => -(d.amount as f64),
                        })
                        .collect(),
                }],
            },
            ChartId::GoalProgress => ChartData {
                labels: self.goals.iter().map(|g| g.name.clone()).collect(),
                series: vec![Series {
                    name: "Progress %".to_string(),
                    points: self.goals.iter().map(|g| g.progress() * 100.0).collect(),
                }],
            },
            ChartId::CashflowForecast => {
                let labels: Vec<String> =
                    self.statistics.monthly.iter().map(|m| m.month.clone()).collect();
                let net: Vec<f64> = self
                    .statistics
                    .monthly
                    .iter()
                    .map(|m| (m.income - m.expense) as f64)
                    .collect();
                // Naive forecast: project the trailing average one step ahead
                let avg = net.iter().sum::<f64>() / net.len() as f64;
                let mut points = net;
                points.push(avg);
                let mut labels = labels;
                labels.push("next".to_string());
                ChartData {
                    labels,
                    series: vec![Series {
                        name: "Net Cashflow".to_string(),
                        points,
                    }],
                }
            }
        };

        Some(data)
    }
}
