// 💳 Tariff Layer - Entitlement Resolution
// Maps subscription tiers to the feature set they unlock

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// TARIFF TIERS
// ============================================================================

/// Canonical subscription tiers.
///
/// The backend has shipped several naming schemes over time (`Bepul`,
/// `Biznes`, `Oila`, `PRO`, ...); all of them are folded into this enum at
/// the data-loading boundary by [`TariffTier::canonicalize`]. Exactly one
/// tier is active per user at any time, and it always comes from the
/// backend - never computed client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TariffTier {
    Free,
    Plus,
    Business,
    Family,
    Max,
    /// Business bundled with Max features
    BusinessMax,
    /// Family bundled with Max features
    FamilyMax,
}

impl TariffTier {
    /// Every known tier, for exhaustive checks
    pub const ALL: [TariffTier; 7] = [
        TariffTier::Free,
        TariffTier::Plus,
        TariffTier::Business,
        TariffTier::Family,
        TariffTier::Max,
        TariffTier::BusinessMax,
        TariffTier::FamilyMax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TariffTier::Free => "Free",
            TariffTier::Plus => "Plus",
            TariffTier::Business => "Business",
            TariffTier::Family => "Family",
            TariffTier::Max => "Max",
            TariffTier::BusinessMax => "Business+Max",
            TariffTier::FamilyMax => "Family+Max",
        }
    }

    /// Normalize a backend tariff string to a canonical tier.
    ///
    /// Case-insensitive and alias-aware. Returns `None` for anything
    /// unrecognized; callers decide how to fail closed.
    pub fn canonicalize(raw: &str) -> Option<TariffTier> {
        let key = raw.trim().to_lowercase();
        match key.as_str() {
            "free" | "bepul" => Some(TariffTier::Free),
            "plus" => Some(TariffTier::Plus),
            "business" | "biznes" => Some(TariffTier::Business),
            "family" | "oila" => Some(TariffTier::Family),
            "max" | "pro" | "premium" => Some(TariffTier::Max),
            "business+max" | "business_max" | "biznes+max" => Some(TariffTier::BusinessMax),
            "family+max" | "family_max" | "oila+max" => Some(TariffTier::FamilyMax),
            _ => None,
        }
    }

    /// Privilege rank: 0 = Free, 1 = mid tiers, 2 = Max-level
    pub fn privilege_rank(&self) -> u8 {
        match self {
            TariffTier::Free => 0,
            TariffTier::Plus | TariffTier::Business | TariffTier::Family => 1,
            TariffTier::Max | TariffTier::BusinessMax | TariffTier::FamilyMax => 2,
        }
    }

    /// Partial privilege order. Mid tiers (Plus/Business/Family) are
    /// mutually incomparable; Max-level tiers are privilege-equivalent.
    pub fn le(self, other: TariffTier) -> bool {
        if self == other {
            return true;
        }
        match (self.privilege_rank(), other.privilege_rank()) {
            // Sibling mid tiers: neither outranks the other
            (1, 1) => false,
            (a, b) => a <= b,
        }
    }
}

impl std::fmt::Display for TariffTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CHART CATALOG
// ============================================================================

/// Every chart region the client can render. The catalog is closed: each
/// tier's entitlement partitions it into visible and locked sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChartId {
    MonthlyTrend,
    CategoryBreakdown,
    YearlyOverview,
    DebtBreakdown,
    GoalProgress,
    CashflowForecast,
}

impl ChartId {
    pub const CATALOG: [ChartId; 6] = [
        ChartId::MonthlyTrend,
        ChartId::CategoryBreakdown,
        ChartId::YearlyOverview,
        ChartId::DebtBreakdown,
        ChartId::GoalProgress,
        ChartId::CashflowForecast,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartId::MonthlyTrend => "Monthly Trend",
            ChartId::CategoryBreakdown => "Category Breakdown",
            ChartId::YearlyOverview => "Yearly Overview",
            ChartId::DebtBreakdown => "Debt Breakdown",
            ChartId::GoalProgress => "Goal Progress",
            ChartId::CashflowForecast => "Cashflow Forecast",
        }
    }
}

// ============================================================================
// LIMITS
// ============================================================================

/// A numeric quota that may be uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    Limited(u32),
    Unlimited,
}

impl Limit {
    pub fn allows(&self, used: u32) -> bool {
        match self {
            Limit::Limited(cap) => used < *cap,
            Limit::Unlimited => true,
        }
    }
}

impl PartialOrd for Limit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        use std::cmp::Ordering;
        match (self, other) {
            (Limit::Limited(a), Limit::Limited(b)) => a.partial_cmp(b),
            (Limit::Limited(_), Limit::Unlimited) => Some(Ordering::Less),
            (Limit::Unlimited, Limit::Limited(_)) => Some(Ordering::Greater),
            (Limit::Unlimited, Limit::Unlimited) => Some(Ordering::Equal),
        }
    }
}

// ============================================================================
// ENTITLEMENT
// ============================================================================

/// Resolved feature set for one tier. Immutable value object: recomputed
/// from the tariff on every snapshot refresh, never cached across a tariff
/// change.
///
/// Invariant: `visible_charts` and `locked_charts` partition
/// [`ChartId::CATALOG`] - no chart in both, none omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub tier: TariffTier,
    pub visible_charts: BTreeSet<ChartId>,
    pub locked_charts: BTreeSet<ChartId>,
    pub ai_chat_enabled: bool,
    pub advanced_analytics: bool,
    pub transactions_per_month: Limit,
    pub ai_requests_per_day: Limit,
}

/// Resolve a canonical tier to its entitlement. Pure table lookup: no I/O,
/// no DOM, same tier always yields the same entitlement.
pub fn resolve(tier: TariffTier) -> Entitlement {
    let visible: &[ChartId] = match tier {
        TariffTier::Free => &[ChartId::MonthlyTrend],
        TariffTier::Plus => &[
            ChartId::MonthlyTrend,
            ChartId::CategoryBreakdown,
            ChartId::YearlyOverview,
        ],
        TariffTier::Business => &[
            ChartId::MonthlyTrend,
            ChartId::CategoryBreakdown,
            ChartId::YearlyOverview,
            ChartId::CashflowForecast,
        ],
        TariffTier::Family => &[
            ChartId::MonthlyTrend,
            ChartId::CategoryBreakdown,
            ChartId::GoalProgress,
        ],
        TariffTier::Max | TariffTier::BusinessMax | TariffTier::FamilyMax => &ChartId::CATALOG,
    };

    let visible_charts: BTreeSet<ChartId> = visible.iter().copied().collect();
    let locked_charts: BTreeSet<ChartId> = ChartId::CATALOG
        .iter()
        .copied()
        .filter(|id| !visible_charts.contains(id))
        .collect();

    let rank = tier.privilege_rank();

    Entitlement {
        tier,
        visible_charts,
        locked_charts,
        ai_chat_enabled: rank >= 2,
        advanced_analytics: rank >= 1,
        transactions_per_month: if rank == 0 {
            Limit::Limited(50)
        } else {
            Limit::Unlimited
        },
        ai_requests_per_day: if rank >= 2 {
            Limit::Unlimited
        } else {
            Limit::Limited(0)
        },
    }
}

/// Resolve a raw backend tariff string, failing closed on unknown input.
///
/// An unrecognized tariff is never surfaced to the user as an error: it
/// degrades to the Free entitlement and leaves a diagnostic for operators,
/// since it usually means a backend misconfiguration rather than a user
/// problem.
pub fn resolve_raw(raw: &str) -> Entitlement {
    match TariffTier::canonicalize(raw) {
        Some(tier) => resolve(tier),
        None => {
            tracing::warn!(tariff = raw, "unknown tariff, failing closed to Free");
            resolve(TariffTier::Free)
        }
    }
}
