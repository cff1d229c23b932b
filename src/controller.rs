// 🧭 View-State Controller - Entitlement-Driven Render Reconciliation
// Owns tab/filter state, the region map, and the refresh cycle

use crate::api::FetchError;
use crate::notify::{Level, Notifier};
use crate::region::{ChartBackend, RegionMap, RegionMode, RegionState};
use crate::snapshot::{DomainSnapshot, Transaction, TxFilter};
use crate::tariff::{self, ChartId, Entitlement, TariffTier};
use crate::voice::VoiceMachine;

// ============================================================================
// TABS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Transactions,
    Debts,
    Analytics,
    Goals,
    Assistant,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Transactions,
        Tab::Debts,
        Tab::Analytics,
        Tab::Goals,
        Tab::Assistant,
    ];

    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Transactions,
            Tab::Transactions => Tab::Debts,
            Tab::Debts => Tab::Analytics,
            Tab::Analytics => Tab::Goals,
            Tab::Goals => Tab::Assistant,
            Tab::Assistant => Tab::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Assistant,
            Tab::Transactions => Tab::Dashboard,
            Tab::Debts => Tab::Transactions,
            Tab::Analytics => Tab::Debts,
            Tab::Goals => Tab::Analytics,
            Tab::Assistant => Tab::Goals,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Transactions => "Transactions",
            Tab::Debts => "Debts",
            Tab::Analytics => "Analytics",
            Tab::Goals => "Goals",
            Tab::Assistant => "Assistant",
        }
    }

    /// Chart slots drawn on this tab. The region map itself is global;
    /// tabs only select what gets painted.
    pub fn chart_regions(&self) -> &'static [ChartId] {
        match self {
            Tab::Dashboard => &[ChartId::MonthlyTrend, ChartId::CategoryBreakdown],
            Tab::Transactions => &[],
            Tab::Debts => &[ChartId::DebtBreakdown],
            Tab::Analytics => &[ChartId::YearlyOverview, ChartId::CashflowForecast],
            Tab::Goals => &[ChartId::GoalProgress],
            Tab::Assistant => &[],
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Reconciles {tab, filter, entitlement, snapshot} into concrete region
/// states and owns chart-instance lifecycles. All mutation happens on
/// re-entrant calls from the single UI event loop; the only concurrency
/// concern is overlapping refreshes, handled by a sequence-number guard.
pub struct ViewStateController<B: ChartBackend, N: Notifier> {
    backend: B,
    notifier: N,
    tab: Tab,
    filter: TxFilter,
    entitlement: Entitlement,
    snapshot: Option<DomainSnapshot>,
    regions: RegionMap,
    voice: VoiceMachine,
    next_seq: u64,
    applied_seq: u64,
}

impl<B: ChartBackend, N: Notifier> ViewStateController<B, N> {
    pub fn new(backend: B, notifier: N) -> Self {
        ViewStateController {
            backend,
            notifier,
            tab: Tab::Dashboard,
            filter: TxFilter::All,
            // Fail closed until the first snapshot arrives
            entitlement: tariff::resolve(TariffTier::Free),
            snapshot: None,
            regions: RegionMap::new(),
            voice: VoiceMachine::new(),
            next_seq: 0,
            applied_seq: 0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn filter(&self) -> TxFilter {
        self.filter
    }

    pub fn entitlement(&self) -> &Entitlement {
        &self.entitlement
    }

    pub fn snapshot(&self) -> Option<&DomainSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn region_state(&self, id: ChartId) -> RegionState {
        self.regions.state(id)
    }

    pub fn live_chart_count(&self) -> usize {
        self.regions.live_count()
    }

    pub fn ai_chat_enabled(&self) -> bool {
        self.entitlement.ai_chat_enabled
    }

    pub fn visible_transactions(&self) -> Vec<&Transaction> {
        match &self.snapshot {
            Some(snap) => snap.filtered_transactions(self.filter),
            None => Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn voice(&self) -> &VoiceMachine {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut VoiceMachine {
        &mut self.voice
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Switch the active top-level view. Idempotent: switching to the tab
    /// that is already active changes nothing.
    pub fn set_tab(&mut self, tab: Tab) {
        if self.tab == tab {
            return;
        }
        // An in-flight voice exchange does not survive leaving the tab
        if self.tab == Tab::Assistant {
            self.voice.cancel();
        }
        self.tab = tab;
    }

    /// Restrict the transaction list. Touches only the transaction region;
    /// chart slots are left alone.
    pub fn set_filter(&mut self, filter: TxFilter) {
        self.filter = filter;
    }

    /// Apply an entitlement to every chart slot in the catalog. Locked
    /// charts never receive data; visible charts without data render the
    /// explicit empty-state. Re-applying the current entitlement performs
    /// no chart construction or teardown.
    pub fn apply_entitlement(&mut self, entitlement: Entitlement) {
        self.entitlement = entitlement;
        self.reconcile(false);
    }

    /// Start a refresh cycle and get its sequence number. The matching
    /// `complete_refresh` call hands back the fetched result.
    pub fn begin_refresh(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Single re-entry point after any data fetch. Stale completions - a
    /// response arriving after a later refresh has already been applied -
    /// are discarded wholesale. A failed fetch degrades data-bearing slots
    /// to empty-state and raises a non-blocking notification; the current
    /// entitlement stays fully applied, never half of one.
    pub fn complete_refresh(&mut self, seq: u64, result: Result<DomainSnapshot, FetchError>) {
        if seq <= self.applied_seq {
            tracing::debug!(seq, applied = self.applied_seq, "discarding stale refresh");
            return;
        }
        self.applied_seq = seq;

        match result {
            Ok(snapshot) => {
                // Entitlement is re-derived and applied in the same pass
                // that builds charts, so no chart ever reads a snapshot
                // whose entitlement has not been applied yet
                self.entitlement = tariff::resolve_raw(&snapshot.tariff_raw);
                self.snapshot = Some(snapshot);
                self.reconcile(true);
            }
            Err(err) => {
                tracing::warn!(error = %err, "snapshot fetch failed, degrading to empty-state");
                self.snapshot = None;
                self.reconcile(true);
                self.notifier
                    .notify("Could not load your data. Pull to retry.", Level::Warn);
            }
        }
    }

    /// Drive every slot to the state the current entitlement and snapshot
    /// call for. `rebuild` forces live charts to be reconstructed from the
    /// (new) snapshot instead of being kept as-is.
    fn reconcile(&mut self, rebuild: bool) {
        for id in ChartId::CATALOG {
            let target = if self.entitlement.locked_charts.contains(&id) {
                RegionMode::Locked
            } else {
                // Falls back to Empty inside the transition when no data
                RegionMode::Live
            };
            let data = self.snapshot.as_ref().and_then(|s| s.chart_data(id));
            self.regions
                .transition(&mut self.backend, id, target, data.as_ref(), rebuild);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        CategoryTotal, ChartData, Debt, DebtDirection, Goal, MonthPoint, Statistics, TxKind,
    };
    use crate::region::ChartInstance;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[derive(Default)]
    struct CountingBackend {
        next: u64,
        created: usize,
        destroyed: usize,
        alive: HashSet<ChartInstance>,
    }

    impl ChartBackend for CountingBackend {
        fn create_chart(&mut self, _id: ChartId, _data: &ChartData) -> ChartInstance {
            self.next += 1;
            let instance = ChartInstance(self.next);
            self.created += 1;
            self.alive.insert(instance);
            instance
        }

        fn destroy_chart(&mut self, instance: ChartInstance) {
            assert!(self.alive.remove(&instance), "double destroy of {instance:?}");
            self.destroyed += 1;
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Vec<(String, Level)>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, message: &str, level: Level) {
            self.messages.push((message.to_string(), level));
        }

        fn confirm(&mut self, _message: &str) -> bool {
            true
        }
    }

    type TestController = ViewStateController<CountingBackend, RecordingNotifier>;

    fn controller() -> TestController {
        ViewStateController::new(CountingBackend::default(), RecordingNotifier::default())
    }

    fn tx(id: i64, kind: TxKind) -> crate::snapshot::Transaction {
        crate::snapshot::Transaction {
            id,
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            description: format!("tx {id}"),
            category: "General".to_string(),
            kind,
            amount: 100,
        }
    }

    /// Snapshot with data behind every chart in the catalog.
    fn full_snapshot(tariff: &str) -> DomainSnapshot {
        DomainSnapshot {
            tariff_raw: tariff.to_string(),
            statistics: Statistics {
                balance: 4200,
                total_income: 9000,
                total_expense: 4800,
                monthly: vec![
                    MonthPoint { month: "2026-07".into(), income: 4000, expense: 2500, debt: 0 },
                    MonthPoint { month: "2026-08".into(), income: 5000, expense: 2300, debt: 200 },
                ],
                by_category: vec![
                    CategoryTotal { category: "Food".into(), total: 1200 },
                    CategoryTotal { category: "Transport".into(), total: 600 },
                ],
            },
            transactions: (1..=10)
                .map(|i| tx(i, if i % 2 == 0 { TxKind::Expense } else { TxKind::Income }))
                .collect(),
            debts: vec![Debt {
                id: 1,
                counterparty: "Aziz".into(),
                direction: DebtDirection::Owed,
                amount: 300,
                due_date: None,
            }],
            goals: vec![Goal {
                id: 1,
                name: "Laptop".into(),
                target_amount: 2000,
                saved_amount: 600,
                deadline: None,
            }],
        }
    }

    fn empty_snapshot(tariff: &str) -> DomainSnapshot {
        DomainSnapshot {
            tariff_raw: tariff.to_string(),
            statistics: Statistics::default(),
            transactions: Vec::new(),
            debts: Vec::new(),
            goals: Vec::new(),
        }
    }

    fn refresh_with(ctrl: &mut TestController, result: Result<DomainSnapshot, FetchError>) {
        let seq = ctrl.begin_refresh();
        ctrl.complete_refresh(seq, result);
    }

    #[test]
    fn test_set_tab_is_idempotent_and_cancels_voice() {
        let mut ctrl = controller();
        ctrl.set_tab(Tab::Assistant);
        ctrl.set_tab(Tab::Assistant);
        assert_eq!(ctrl.tab(), Tab::Assistant);

        ctrl.voice_mut().start_listening();
        // Re-selecting the active tab must not cancel the voice flow
        ctrl.set_tab(Tab::Assistant);
        assert!(!ctrl.voice().is_idle());

        ctrl.set_tab(Tab::Dashboard);
        assert!(ctrl.voice().is_idle());
    }

    #[test]
    fn test_filter_never_touches_chart_slots() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("Max")));
        let created = ctrl.backend().created;

        ctrl.set_filter(TxFilter::Expense);
        ctrl.set_filter(TxFilter::Income);
        ctrl.set_filter(TxFilter::All);

        assert_eq!(ctrl.backend().created, created);
        assert_eq!(ctrl.backend().destroyed, 0);
        assert_eq!(ctrl.visible_transactions().len(), 10);
        ctrl.set_filter(TxFilter::Expense);
        assert_eq!(ctrl.visible_transactions().len(), 5);
    }

    #[test]
    fn test_apply_entitlement_is_idempotent() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("Plus")));

        let created = ctrl.backend().created;
        let destroyed = ctrl.backend().destroyed;

        let ent = ctrl.entitlement().clone();
        ctrl.apply_entitlement(ent.clone());
        ctrl.apply_entitlement(ent);

        assert_eq!(ctrl.backend().created, created, "idempotent re-apply created charts");
        assert_eq!(ctrl.backend().destroyed, destroyed, "idempotent re-apply destroyed charts");
    }

    #[test]
    fn test_empty_data_renders_empty_state_not_blank_charts() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(empty_snapshot("Max")));

        // Max makes everything visible, but nothing has data
        for id in ChartId::CATALOG {
            assert_eq!(
                ctrl.region_state(id),
                RegionState::Empty,
                "{id:?} should be empty-state"
            );
        }
        assert_eq!(ctrl.backend().created, 0);
    }

    #[test]
    fn test_free_tier_locks_premium_regions() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("FREE")));

        assert!(ctrl.region_state(ChartId::MonthlyTrend).is_live());
        for id in [
            ChartId::CategoryBreakdown,
            ChartId::YearlyOverview,
            ChartId::DebtBreakdown,
            ChartId::GoalProgress,
            ChartId::CashflowForecast,
        ] {
            assert_eq!(ctrl.region_state(id), RegionState::Locked, "{id:?} should be locked");
        }
        assert!(!ctrl.ai_chat_enabled());
        assert_eq!(ctrl.live_chart_count(), 1);
    }

    #[test]
    fn test_upgrade_to_max_unlocks_everything_without_leaks() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("FREE")));
        assert_eq!(ctrl.live_chart_count(), 1);

        // Same data, new tariff
        refresh_with(&mut ctrl, Ok(full_snapshot("Max")));

        for id in ChartId::CATALOG {
            assert!(ctrl.region_state(id).is_live(), "{id:?} should be live after upgrade");
        }
        assert!(ctrl.ai_chat_enabled());
        // Exactly one instance per slot, nothing leaked
        assert_eq!(ctrl.live_chart_count(), ChartId::CATALOG.len());
        assert_eq!(ctrl.backend().alive.len(), ChartId::CATALOG.len());
        assert_eq!(
            ctrl.backend().created - ctrl.backend().destroyed,
            ChartId::CATALOG.len()
        );
    }

    #[test]
    fn test_downgrade_tears_down_before_locking() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("Max")));
        assert_eq!(ctrl.live_chart_count(), 6);

        refresh_with(&mut ctrl, Ok(full_snapshot("Free")));
        assert_eq!(ctrl.live_chart_count(), 1);
        assert_eq!(ctrl.backend().alive.len(), 1);
        assert_eq!(ctrl.region_state(ChartId::CashflowForecast), RegionState::Locked);
    }

    #[test]
    fn test_unknown_tariff_fails_closed_to_free() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("platinum-deluxe")));

        assert_eq!(ctrl.entitlement().tier, TariffTier::Free);
        assert_eq!(ctrl.live_chart_count(), 1);
        // Degraded entitlement, not an error: no user notification
        assert!(ctrl.notifier_mut().messages.is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut ctrl = controller();

        let seq1 = ctrl.begin_refresh();
        let seq2 = ctrl.begin_refresh();

        // Response 2 lands first and wins
        ctrl.complete_refresh(seq2, Ok(full_snapshot("Max")));
        let created = ctrl.backend().created;

        // Response 1 arrives late: must be a complete no-op
        ctrl.complete_refresh(seq1, Ok(full_snapshot("Free")));

        assert_eq!(ctrl.entitlement().tier, TariffTier::Max);
        assert_eq!(ctrl.snapshot().unwrap().tariff_raw, "Max");
        assert_eq!(ctrl.backend().created, created);
        assert_eq!(ctrl.live_chart_count(), 6);
    }

    #[test]
    fn test_failed_fetch_degrades_to_empty_with_notification() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("Plus")));
        assert!(ctrl.live_chart_count() > 0);

        refresh_with(
            &mut ctrl,
            Err(FetchError::Network("connection reset".into())),
        );

        // Entitlement stays fully applied: locked slots stay locked,
        // data-bearing slots degrade to empty-state
        assert_eq!(ctrl.entitlement().tier, TariffTier::Plus);
        assert_eq!(ctrl.live_chart_count(), 0);
        assert!(ctrl.backend().alive.is_empty());
        for id in ChartId::CATALOG {
            let state = ctrl.region_state(id);
            assert!(
                state == RegionState::Empty || state == RegionState::Locked,
                "{id:?} in unexpected state {state:?}"
            );
        }
        assert_eq!(ctrl.region_state(ChartId::GoalProgress), RegionState::Locked);
        assert_eq!(ctrl.notifier_mut().messages.len(), 1);
        assert_eq!(ctrl.notifier_mut().messages[0].1, Level::Warn);
        assert!(ctrl.visible_transactions().is_empty());
    }

    #[test]
    fn test_refresh_rebuilds_live_charts_from_new_snapshot() {
        let mut ctrl = controller();
        refresh_with(&mut ctrl, Ok(full_snapshot("Free")));
        let first = match ctrl.region_state(ChartId::MonthlyTrend) {
            RegionState::Live(i) => i,
            other => panic!("expected live, got {other:?}"),
        };

        refresh_with(&mut ctrl, Ok(full_snapshot("Free")));
        let second = match ctrl.region_state(ChartId::MonthlyTrend) {
            RegionState::Live(i) => i,
            other => panic!("expected live, got {other:?}"),
        };

        // New snapshot, new instance; the old one was released
        assert_ne!(first, second);
        assert_eq!(ctrl.backend().alive.len(), 1);
    }
}
