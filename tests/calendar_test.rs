// ==========================================
// 周历计算单元测试
// ==========================================
// 测试目标: 解析/格式化往返、跨年枚举、宽松归一化
// 覆盖范围: 52/53 周年份、区间对称性、非法输入降级
// ==========================================

use supply_scheduler::domain::calendar::{
    add_weeks, enumerate_range, format_week, normalize_loose_format, parse_week, range_length,
    weeks_in_year, CalendarError, CalendarWeek,
};

// ==========================================
// 测试用例 1: 解析与格式化往返
// ==========================================

#[test]
fn test_parse_format_round_trip() {
    for (year, week_number) in [(2024, 1), (2024, 52), (2025, 7), (2020, 53)] {
        let week = CalendarWeek::new(year, week_number).unwrap();
        let formatted = format_week(&week);
        let parsed = parse_week(&formatted).unwrap();
        assert_eq!(parsed, week, "往返失败: {}", formatted);
    }
}

#[test]
fn test_format_pads_week_number() {
    let week = CalendarWeek::new(2025, 7).unwrap();
    assert_eq!(format_week(&week), "2025-W07");
    assert_eq!(week.label, "W07");
}

#[test]
fn test_parse_accepts_unpadded_week() {
    let parsed = parse_week("2025-W7").unwrap();
    assert_eq!(parsed.year, 2025);
    assert_eq!(parsed.week_number, 7);
}

// ==========================================
// 测试用例 2: 非法输入
// ==========================================

#[test]
fn test_parse_rejects_malformed_input() {
    for input in ["", "2025", "2025-07", "W07-2025", "abcd-Wxy", "2025-W100"] {
        assert!(
            matches!(
                parse_week(input),
                Err(CalendarError::MalformedWeekIdentifier(_))
            ),
            "应当拒绝: {}",
            input
        );
    }
}

#[test]
fn test_parse_rejects_week53_of_52_week_year() {
    // 2024 为 52 周年份, W53 不存在
    assert!(parse_week("2024-W53").is_err());
    // 2020 为 53 周年份, W53 合法
    assert!(parse_week("2020-W53").is_ok());
}

// ==========================================
// 测试用例 3: 周加减与区间计数
// ==========================================

#[test]
fn test_add_weeks_crosses_year_boundary() {
    let week = parse_week("2024-W52").unwrap();
    assert_eq!(format_week(&add_weeks(&week, 2)), "2025-W02");
    assert_eq!(format_week(&add_weeks(&week, -2)), "2024-W50");
}

#[test]
fn test_range_length_inclusive_and_symmetric() {
    let a = parse_week("2024-W50").unwrap();
    let b = parse_week("2025-W02").unwrap();
    assert_eq!(range_length(&a, &b), 5);
    assert_eq!(range_length(&b, &a), 5);
    assert_eq!(range_length(&a, &a), 1);
}

// ==========================================
// 测试用例 4: 跨年枚举 (真实 ISO 周数)
// ==========================================

#[test]
fn test_enumerate_range_year_boundary() {
    // 2024 只有 52 周
    let a = parse_week("2024-W52").unwrap();
    let b = parse_week("2025-W02").unwrap();
    let labels: Vec<String> = enumerate_range(&a, &b).iter().map(format_week).collect();
    assert_eq!(labels, vec!["2024-W52", "2025-W01", "2025-W02"]);
}

#[test]
fn test_enumerate_range_53_week_year() {
    // 2020 有 53 周, W53 必须如实出现
    let a = parse_week("2020-W52").unwrap();
    let b = parse_week("2021-W01").unwrap();
    let labels: Vec<String> = enumerate_range(&a, &b).iter().map(format_week).collect();
    assert_eq!(labels, vec!["2020-W52", "2020-W53", "2021-W01"]);
}

#[test]
fn test_weeks_in_year() {
    assert_eq!(weeks_in_year(2024), 52);
    assert_eq!(weeks_in_year(2020), 53);
    assert_eq!(weeks_in_year(2026), 53);
    assert_eq!(weeks_in_year(2025), 52);
}

// ==========================================
// 测试用例 5: 宽松格式归一化
// ==========================================

#[test]
fn test_normalize_loose_format_variants() {
    assert_eq!(
        normalize_loose_format("2025-W07").as_deref(),
        Some("2025-W07")
    );
    assert_eq!(
        normalize_loose_format("2025 W7").as_deref(),
        Some("2025-W07")
    );
    assert_eq!(
        normalize_loose_format("2025_w7").as_deref(),
        Some("2025-W07")
    );
    assert_eq!(
        normalize_loose_format("  2025-w40  ").as_deref(),
        Some("2025-W40")
    );
}

#[test]
fn test_normalize_loose_format_rejects_out_of_range() {
    assert_eq!(normalize_loose_format("2025-W54"), None);
    assert_eq!(normalize_loose_format("2025-W0"), None);
    assert_eq!(normalize_loose_format("2025-07"), None);
    assert_eq!(normalize_loose_format("not-a-week"), None);
}
