// 🖼️ Render Regions - Chart Slot Lifecycle
// One slot per chart, destroy-before-create, no duplicate instances

use crate::snapshot::ChartData;
use crate::tariff::ChartId;
use std::collections::BTreeMap;

// ============================================================================
// CHART BACKEND SEAM
// ============================================================================

/// Opaque handle to a chart resource issued by a backend. Handles are
/// compared only for identity; the backend owns the real resource behind
/// them (canvas context, widget buffer, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartInstance(pub u64);

/// The rendering stack's chart factory. Implementations hold whatever the
/// chart library needs; the engine only promises to pair every `create`
/// with exactly one `destroy`.
pub trait ChartBackend {
    fn create_chart(&mut self, id: ChartId, data: &ChartData) -> ChartInstance;
    fn destroy_chart(&mut self, instance: ChartInstance);
}

// ============================================================================
// REGION STATES
// ============================================================================

/// Lifecycle state of one chart slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Nothing mounted yet
    Absent,
    /// Tier does not include this chart; placeholder only, no data bound
    Locked,
    /// Tier includes the chart but there is nothing to draw
    Empty,
    /// A live chart instance is bound to this slot
    Live(ChartInstance),
}

impl RegionState {
    pub fn is_live(&self) -> bool {
        matches!(self, RegionState::Live(_))
    }
}

/// Target state for a reconcile pass. `Live` only materializes when chart
/// data is actually supplied; the slot falls back to `Empty` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    Locked,
    Empty,
    Live,
}

// ============================================================================
// REGION MAP
// ============================================================================

/// All chart slots, keyed by catalog id. Invariant: at most one live
/// instance per slot, and any prior occupant (instance or placeholder) is
/// torn down before a new one is mounted in the same slot.
pub struct RegionMap {
    slots: BTreeMap<ChartId, RegionState>,
}

impl Default for RegionMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionMap {
    pub fn new() -> Self {
        let slots = ChartId::CATALOG
            .iter()
            .map(|id| (*id, RegionState::Absent))
            .collect();
        RegionMap { slots }
    }

    pub fn state(&self, id: ChartId) -> RegionState {
        // Every catalog id is seeded in new(), so the lookup cannot miss
        self.slots[&id]
    }

    /// Count of live instances across all slots.
    pub fn live_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_live()).count()
    }

    /// Drive one slot to `target`, creating/destroying chart instances as
    /// needed. Re-applying the current state is a no-op; in particular a
    /// live slot is only rebuilt when `rebuild` is set (fresh snapshot).
    pub fn transition<B: ChartBackend>(
        &mut self,
        backend: &mut B,
        id: ChartId,
        target: RegionMode,
        data: Option<&ChartData>,
        rebuild: bool,
    ) {
        let current = self.state(id);

        let next = match (current, target) {
            // Already matching and nothing new to draw from
            (RegionState::Locked, RegionMode::Locked)
            | (RegionState::Empty, RegionMode::Empty) => return,
            (RegionState::Live(_), RegionMode::Live) if !rebuild => return,

            (RegionState::Live(instance), RegionMode::Live) => {
                // Fresh snapshot: tear down before the replacement mounts
                backend.destroy_chart(instance);
                match data {
                    Some(data) => RegionState::Live(backend.create_chart(id, data)),
                    None => RegionState::Empty,
                }
            }
            (RegionState::Live(instance), RegionMode::Locked) => {
                backend.destroy_chart(instance);
                RegionState::Locked
            }
            (RegionState::Live(instance), RegionMode::Empty) => {
                backend.destroy_chart(instance);
                RegionState::Empty
            }
            (_, RegionMode::Live) => match data {
                Some(data) => RegionState::Live(backend.create_chart(id, data)),
                None => RegionState::Empty,
            },
            (_, RegionMode::Locked) => RegionState::Locked,
            (_, RegionMode::Empty) => RegionState::Empty,
        };

        self.slots.insert(id, next);
    }

    /// Tear down every live instance, leaving all slots Absent.
    pub fn clear<B: ChartBackend>(&mut self, backend: &mut B) {
        for state in self.slots.values_mut() {
            if let RegionState::Live(instance) = *state {
                backend.destroy_chart(instance);
            }
            *state = RegionState::Absent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Series;

    #[derive(Default)]
    struct CountingBackend {
        next: u64,
        created: usize,
        destroyed: usize,
        alive: std::collections::HashSet<ChartInstance>,
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

    fn sample_data() -> ChartData {
        ChartData {
            labels: vec!["a".into(), "b".into()],
            series: vec![Series { name: "s".into(), points: vec![1.0, 2.0] }],
        }
    }

    #[test]
    fn test_slots_start_absent() {
        let map = RegionMap::new();
        for id in ChartId::CATALOG {
            assert_eq!(map.state(id), RegionState::Absent);
        }
        assert_eq!(map.live_count(), 0);
    }

    #[test]
    fn test_live_then_locked_destroys_instance() {
        let mut map = RegionMap::new();
        let mut backend = CountingBackend::default();
        let data = sample_data();

        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, Some(&data), false);
        assert!(map.state(ChartId::MonthlyTrend).is_live());
        assert_eq!(backend.created, 1);

        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Locked, None, false);
        assert_eq!(map.state(ChartId::MonthlyTrend), RegionState::Locked);
        assert_eq!(backend.destroyed, 1);
        assert!(backend.alive.is_empty());
    }

    #[test]
    fn test_reapply_same_state_is_noop() {
        let mut map = RegionMap::new();
        let mut backend = CountingBackend::default();
        let data = sample_data();

        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, Some(&data), false);
        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, Some(&data), false);
        assert_eq!(backend.created, 1);
        assert_eq!(backend.destroyed, 0);

        map.transition(&mut backend, ChartId::GoalProgress, RegionMode::Locked, None, false);
        map.transition(&mut backend, ChartId::GoalProgress, RegionMode::Locked, None, false);
        assert_eq!(backend.created, 1);
    }

    #[test]
    fn test_rebuild_destroys_before_creating() {
        let mut map = RegionMap::new();
        let mut backend = CountingBackend::default();
        let data = sample_data();

        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, Some(&data), false);
        let first = match map.state(ChartId::MonthlyTrend) {
            RegionState::Live(i) => i,
            other => panic!("expected live, got {other:?}"),
        };

        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, Some(&data), true);
        let second = match map.state(ChartId::MonthlyTrend) {
            RegionState::Live(i) => i,
            other => panic!("expected live, got {other:?}"),
        };

        assert_ne!(first, second);
        assert_eq!(backend.created, 2);
        assert_eq!(backend.destroyed, 1);
        // The CountingBackend asserts no slot ever held two live instances
        assert_eq!(backend.alive.len(), 1);
    }

    #[test]
    fn test_live_without_data_falls_back_to_empty() {
        let mut map = RegionMap::new();
        let mut backend = CountingBackend::default();

        map.transition(&mut backend, ChartId::CategoryBreakdown, RegionMode::Live, None, false);
        assert_eq!(map.state(ChartId::CategoryBreakdown), RegionState::Empty);
        assert_eq!(backend.created, 0);

        // A live slot refreshed against a snapshot with no data degrades too
        let data = sample_data();
        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, Some(&data), false);
        map.transition(&mut backend, ChartId::MonthlyTrend, RegionMode::Live, None, true);
        assert_eq!(map.state(ChartId::MonthlyTrend), RegionState::Empty);
        assert!(backend.alive.is_empty());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut map = RegionMap::new();
        let mut backend = CountingBackend::default();
        let data = sample_data();

        for id in [ChartId::MonthlyTrend, ChartId::YearlyOverview] {
            map.transition(&mut backend, id, RegionMode::Live, Some(&data), false);
        }
        map.clear(&mut backend);

        assert_eq!(map.live_count(), 0);
        assert!(backend.alive.is_empty());
        for id in ChartId::CATALOG {
            assert_eq!(map.state(id), RegionState::Absent);
        }
    }
}
