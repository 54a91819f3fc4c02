// ==========================================
// 指标与惩罚计算引擎测试
// ==========================================
// 测试目标: 峰值产能、超限检测、位移惩罚门控、待分配积压
// ==========================================

use supply_scheduler::domain::calendar::{enumerate_range, format_week, parse_week};
use supply_scheduler::domain::{CalendarWeek, Event, EventKind, Supplier, UNASSIGNED_LANE_ID};
use supply_scheduler::engine::MetricsEngine;

// ==========================================
// 测试辅助函数
// ==========================================

fn weeks(from: &str, to: &str) -> Vec<CalendarWeek> {
    enumerate_range(&parse_week(from).unwrap(), &parse_week(to).unwrap())
}

fn event_on(
    id: &str,
    kind: EventKind,
    lane: &str,
    amount: f64,
    requested: &str,
    start: &str,
) -> Event {
    Event::with_start(id, id, kind, amount, requested, start, lane).unwrap()
}

// ==========================================
// 测试用例 1: 超限检测 (300 产能, 两个 200)
// ==========================================

#[test]
fn test_overflow_detection() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![Supplier::new("B001", "一号", 300.0)];
    let mut week_range = weeks("2025-W10", "2025-W40");

    // 两个主事件同周上道, 周聚合 400 > 300
    let events = vec![
        event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10", "2025-W10"),
        event_on("F2", EventKind::Primary, "B001", 200.0, "2025-W10", "2025-W10"),
    ];

    let report = engine.compute(&mut suppliers, &events, &mut week_range);

    // 峰值 400, over = 400 - 300 = 100
    assert_eq!(suppliers[0].peak_capacity, 400.0);
    assert_eq!(report.production.over, 100.0);
    assert_eq!(report.production.under, 0.0);
    assert_eq!(report.overflow_messages.len(), 1);

    // 跨度内的周被打上超限标记, 跨度外不打
    let w10 = week_range
        .iter()
        .find(|w| format_week(w) == "2025-W10")
        .unwrap();
    assert!(w10.overflow);
    let w30 = week_range
        .iter()
        .find(|w| format_week(w) == "2025-W30")
        .unwrap();
    assert!(!w30.overflow);
}

// ==========================================
// 测试用例 2: 不足量累计 under
// ==========================================

#[test]
fn test_under_capacity_accumulates() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![Supplier::new("B001", "一号", 300.0)];
    let mut week_range = weeks("2025-W10", "2025-W40");

    let events = vec![event_on(
        "F1",
        EventKind::Primary,
        "B001",
        120.0,
        "2025-W10",
        "2025-W10",
    )];

    let report = engine.compute(&mut suppliers, &events, &mut week_range);
    assert_eq!(suppliers[0].peak_capacity, 120.0);
    assert_eq!(report.production.under, 180.0);
    assert_eq!(report.production.over, 0.0);
    assert!(report.overflow_messages.is_empty());
}

// ==========================================
// 测试用例 3: 位移惩罚门控 (仅已上道主事件计罚)
// ==========================================

#[test]
fn test_shift_penalty_gating() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![Supplier::new("B001", "一号", 1000.0)];
    let mut week_range = weeks("2025-W01", "2025-W52");

    // 已上道主事件: 延后 2 周, 允许 0 => 罚 200 x 2
    let assigned_primary =
        event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10", "2025-W12");
    // 待分配主事件: 同样位移, 不计罚但记消息
    let unassigned_primary = event_on(
        "F2",
        EventKind::Primary,
        UNASSIGNED_LANE_ID,
        300.0,
        "2025-W10",
        "2025-W12",
    );
    // 已上道组事件: 不计罚
    let assigned_group =
        event_on("G1", EventKind::Group, "B001", 150.0, "2025-W20", "2025-W23");

    let events = vec![assigned_primary, unassigned_primary, assigned_group];
    let report = engine.compute(&mut suppliers, &events, &mut week_range);

    assert_eq!(report.shift_penalty, 400.0);
    // 三个事件都超出允许位移, 消息各记一条
    assert_eq!(report.shift_messages.len(), 3);
}

// ==========================================
// 测试用例 4: 允许位移内不计罚不记消息
// ==========================================

#[test]
fn test_shift_within_allowance() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![Supplier::new("B001", "一号", 1000.0)];
    let mut week_range = weeks("2025-W01", "2025-W52");

    let mut event = event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10", "2025-W08");
    event.max_shift_early = 2;

    let report = engine.compute(&mut suppliers, &[event], &mut week_range);
    assert_eq!(report.shift_penalty, 0.0);
    assert!(report.shift_messages.is_empty());
}

// ==========================================
// 测试用例 5: 提前位移超限按超出部分计罚
// ==========================================

#[test]
fn test_early_shift_excess() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![Supplier::new("B001", "一号", 1000.0)];
    let mut week_range = weeks("2025-W01", "2025-W52");

    // 提前 3 周, 允许 1 => 超出 2 周, 罚 100 x 2
    let mut event = event_on("F1", EventKind::Primary, "B001", 100.0, "2025-W10", "2025-W07");
    event.max_shift_early = 1;

    let report = engine.compute(&mut suppliers, &[event], &mut week_range);
    assert_eq!(report.shift_penalty, 200.0);
    assert_eq!(report.shift_messages.len(), 1);
}

// ==========================================
// 测试用例 6: 待分配积压
// ==========================================

#[test]
fn test_unassigned_backlog() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![
        Supplier::unassigned(),
        Supplier::new("B001", "一号", 300.0),
    ];
    let mut week_range = weeks("2025-W10", "2025-W40");

    let events = vec![
        event_on("G1", EventKind::Group, UNASSIGNED_LANE_ID, 350.0, "2025-W10", "2025-W10"),
        event_on("G2", EventKind::Group, UNASSIGNED_LANE_ID, 150.0, "2025-W12", "2025-W12"),
        event_on("F1", EventKind::Primary, "B001", 200.0, "2025-W10", "2025-W10"),
    ];

    let report = engine.compute(&mut suppliers, &events, &mut week_range);
    assert_eq!(report.unassigned.amount, 500.0);
    assert_eq!(report.unassigned.count, 2);
}

// ==========================================
// 测试用例 7: 未知车道被排除出聚合
// ==========================================

#[test]
fn test_unknown_lane_excluded() {
    let engine = MetricsEngine::new();
    let mut suppliers = vec![Supplier::new("B001", "一号", 300.0)];
    let mut week_range = weeks("2025-W10", "2025-W40");

    let events = vec![
        event_on("F1", EventKind::Primary, "B001", 100.0, "2025-W10", "2025-W10"),
        event_on("F2", EventKind::Primary, "B404", 999.0, "2025-W10", "2025-W10"),
    ];

    let report = engine.compute(&mut suppliers, &events, &mut week_range);
    assert_eq!(suppliers[0].peak_capacity, 100.0);
    assert_eq!(report.production.over, 0.0);
}
