// ==========================================
// 重算引擎测试
// ==========================================
// 测试目标: 有界不动点收敛、幂等重算、路径回填
// ==========================================

use supply_scheduler::config::SchedulerConfig;
use supply_scheduler::domain::calendar::{enumerate_range, parse_week};
use supply_scheduler::domain::{
    CalendarWeek, DistanceEdge, DistanceSet, Event, EventKind, HopDistance, Supplier,
    UNASSIGNED_LANE_ID,
};
use supply_scheduler::engine::{IdentityRouteSequencer, RecalcEngine};

// ==========================================
// 测试辅助函数
// ==========================================

fn week_range() -> Vec<CalendarWeek> {
    enumerate_range(
        &parse_week("2025-W01").unwrap(),
        &parse_week("2025-W52").unwrap(),
    )
}

fn event_on(id: &str, kind: EventKind, lane: &str, amount: f64, start: &str) -> Event {
    Event::with_start(id, id, kind, amount, start, start, lane).unwrap()
}

fn positions(events: &[Event]) -> Vec<(String, f64, f64, f64)> {
    events
        .iter()
        .map(|e| (e.id.clone(), e.left_offset, e.top_offset, e.stack_offset))
        .collect()
}

fn sample_state() -> (Vec<Event>, Vec<Supplier>, Vec<CalendarWeek>) {
    let suppliers = vec![
        Supplier::unassigned(),
        Supplier::new("B001", "一号", 300.0),
        Supplier::new("B002", "二号", 450.0),
    ];
    let events = vec![
        event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10"),
        event_on("F2", EventKind::Primary, "B001", 250.0, "2025-W10"),
        event_on("G1", EventKind::Group, "B002", 120.0, "2025-W12"),
        event_on("G2", EventKind::Group, UNASSIGNED_LANE_ID, 80.0, "2025-W12"),
    ];
    (events, suppliers, week_range())
}

// ==========================================
// 测试用例 1: 上限内收敛
// ==========================================

#[test]
fn test_recompute_converges_within_bound() {
    let config = SchedulerConfig::default();
    let engine = RecalcEngine::new(config.clone());
    let (mut events, mut suppliers, mut weeks) = sample_state();

    let result = engine.recompute(
        &mut events,
        &mut suppliers,
        &mut weeks,
        &DistanceSet::default(),
        &IdentityRouteSequencer,
    );

    assert!(result.converged, "应在 {} 轮内收敛", config.max_recalc_iterations);
    assert!(result.iterations <= config.max_recalc_iterations);
}

// ==========================================
// 测试用例 2: 幂等重算 (不动点逐位一致)
// ==========================================

#[test]
fn test_recompute_is_idempotent_fixed_point() {
    let engine = RecalcEngine::new(SchedulerConfig::default());
    let (mut events, mut suppliers, mut weeks) = sample_state();
    let distances = DistanceSet::default();

    let first = engine.recompute(
        &mut events,
        &mut suppliers,
        &mut weeks,
        &distances,
        &IdentityRouteSequencer,
    );
    let positions_first = positions(&events);
    let peaks_first: Vec<f64> = suppliers.iter().map(|s| s.peak_capacity).collect();

    let second = engine.recompute(
        &mut events,
        &mut suppliers,
        &mut weeks,
        &distances,
        &IdentityRouteSequencer,
    );
    let positions_second = positions(&events);
    let peaks_second: Vec<f64> = suppliers.iter().map(|s| s.peak_capacity).collect();

    assert!(first.converged && second.converged);
    assert_eq!(positions_first, positions_second);
    assert_eq!(peaks_first, peaks_second);
}

// ==========================================
// 测试用例 3: 峰值抬升车道行高后仍然收敛
// ==========================================

#[test]
fn test_recompute_with_peak_exceeding_declared() {
    let engine = RecalcEngine::new(SchedulerConfig::default());
    let mut suppliers = vec![
        Supplier::new("B001", "一号", 100.0),
        Supplier::new("B002", "二号", 450.0),
    ];
    // B001 周聚合 450 >> 申报 100, 峰值会抬高行高并影响 B002 基准
    let mut events = vec![
        event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10"),
        event_on("F2", EventKind::Primary, "B001", 250.0, "2025-W10"),
        event_on("G1", EventKind::Group, "B002", 120.0, "2025-W12"),
    ];
    let mut weeks = week_range();

    let result = engine.recompute(
        &mut events,
        &mut suppliers,
        &mut weeks,
        &DistanceSet::default(),
        &IdentityRouteSequencer,
    );

    assert!(result.converged);
    assert_eq!(suppliers[0].peak_capacity, 450.0);
    // B002 基准 = B001 有效产能行高 = 450 x 0.02
    let g1 = events.iter().find(|e| e.id == "G1").unwrap();
    assert_eq!(g1.top_offset, 450.0 * 0.02);
}

// ==========================================
// 测试用例 4: 路径回填 (同道同跨度成组)
// ==========================================

#[test]
fn test_recompute_assigns_route_order_and_distance() {
    let engine = RecalcEngine::new(SchedulerConfig::default());
    let mut suppliers = vec![Supplier::new("B001", "一号", 1000.0)];
    let mut events = vec![
        event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10"),
        event_on("F2", EventKind::Primary, "B001", 250.0, "2025-W10"),
    ];
    let mut weeks = week_range();

    let distances = DistanceSet::new(vec![
        DistanceEdge::LaneToEntity {
            lane_id: "B001".to_string(),
            entity_id: "F1".to_string(),
            distance: HopDistance { km: 10.0, minutes: 15.0 },
        },
        DistanceEdge::LaneToEntity {
            lane_id: "B001".to_string(),
            entity_id: "F2".to_string(),
            distance: HopDistance { km: 99.0, minutes: 99.0 },
        },
        DistanceEdge::EntityToEntity {
            from_id: "F1".to_string(),
            to_id: "F2".to_string(),
            distance: HopDistance { km: 5.0, minutes: 8.0 },
        },
    ]);

    let result = engine.recompute(
        &mut events,
        &mut suppliers,
        &mut weeks,
        &distances,
        &IdentityRouteSequencer,
    );

    // 恒等求解器按给定顺序访问: F1 -> F2
    let f1 = events.iter().find(|e| e.id == "F1").unwrap();
    let f2 = events.iter().find(|e| e.id == "F2").unwrap();
    assert_eq!(f1.route_order, 0);
    assert_eq!(f2.route_order, 1);
    // 首跳取 车道->需求方, 后继取 前一跳->本跳
    assert_eq!(f1.distance.unwrap().km, 10.0);
    assert_eq!(f2.distance.unwrap().km, 5.0);
    assert_eq!(result.route_total.km, 15.0);
    assert_eq!(result.route_total.minutes, 23.0);
}
