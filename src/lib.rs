// Fingate - Tariff-Gated Finance Client Engine
// Exposes all modules for use in the terminal client and tests

pub mod api;
pub mod controller;
pub mod notify;
pub mod region;
pub mod snapshot;
pub mod tariff;
pub mod voice;

// Re-export commonly used types
pub use api::{ApiEnvelope, FetchError, FinanceBackend, FixtureBackend, NewTransaction, TariffInfo};
pub use controller::{Tab, ViewStateController};
pub use notify::{Level, LogNotifier, Notifier, NullNotifier};
pub use region::{ChartBackend, ChartInstance, RegionMap, RegionMode, RegionState};
pub use snapshot::{
    CategoryTotal, ChartData, Debt, DebtDirection, DomainSnapshot, Goal, MonthPoint, Series,
    Statistics, Transaction, TxFilter, TxKind,
};
pub use tariff::{resolve, resolve_raw, ChartId, Entitlement, Limit, TariffTier};
pub use voice::{VoiceMachine, VoicePhase};

#[cfg(feature = "http")]
pub use api::HttpBackend;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
