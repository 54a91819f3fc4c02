// ==========================================
// 供应排程系统 - 周历计算
// ==========================================
// 依据: ISO 8601 周历规则 (每年 52 或 53 周)
// ==========================================
// 职责: 周标识解析/格式化、加减周、区间计数与枚举
// 红线: 解析失败返回错误信号,不得中断整条流水线
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 宽松周标识: `YYYY-Wnn` / `YYYY Wnn` / `YYYY_Wnn`,w 大小写均可
static LOOSE_WEEK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4})\s*[-_ ]?\s*[Ww]\s*(\d{1,2})\s*$").unwrap());

// ==========================================
// 错误类型
// ==========================================

/// 周历计算错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("周标识格式非法: {0}")]
    MalformedWeekIdentifier(String),
}

/// Result 类型别名
pub type CalendarResult<T> = Result<T, CalendarError>;

// ==========================================
// CalendarWeek - 周历实体
// ==========================================
// 用途: 可见周区间的列单元; overflow 由指标引擎派生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub year: i32,        // ISO 周年
    pub week_number: u32, // 周序号 (1..=53)
    pub label: String,    // 展示标签, 如 "W07"
    pub overflow: bool,   // 超限周标记 (派生,非输入)
}

impl CalendarWeek {
    /// 构造指定年周的实体
    ///
    /// 周序号对该 ISO 年非法时返回 `MalformedWeekIdentifier`
    pub fn new(year: i32, week_number: u32) -> CalendarResult<Self> {
        if NaiveDate::from_isoywd_opt(year, week_number, Weekday::Mon).is_none() {
            return Err(CalendarError::MalformedWeekIdentifier(format!(
                "{}-W{:02}",
                year, week_number
            )));
        }
        Ok(Self {
            year,
            week_number,
            label: format!("W{:02}", week_number),
            overflow: false,
        })
    }

    /// 该周的周一日期
    pub fn monday(&self) -> NaiveDate {
        // new()/from_date() 已保证年周组合合法
        NaiveDate::from_isoywd_opt(self.year, self.week_number, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// 由任意日期取其所在 ISO 周
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week_number: iso.week(),
            label: format!("W{:02}", iso.week()),
            overflow: false,
        }
    }
}

// ==========================================
// 核心操作 (全部为纯函数)
// ==========================================

/// 解析严格格式 `YYYY-Wnn`
///
/// # 返回
/// - `Ok(CalendarWeek)`: 解析成功
/// - `Err(MalformedWeekIdentifier)`: 格式或年周组合非法 (调用方按"跳过该记录"处理)
pub fn parse_week(input: &str) -> CalendarResult<CalendarWeek> {
    let malformed = || CalendarError::MalformedWeekIdentifier(input.to_string());

    let (year_str, week_str) = input.split_once("-W").ok_or_else(malformed)?;
    if year_str.len() != 4 || week_str.is_empty() || week_str.len() > 2 {
        return Err(malformed());
    }
    let year: i32 = year_str.parse().map_err(|_| malformed())?;
    let week_number: u32 = week_str.parse().map_err(|_| malformed())?;

    CalendarWeek::new(year, week_number).map_err(|_| malformed())
}

/// 格式化为规范形式 `YYYY-Wnn` (周序号补零)
pub fn format_week(week: &CalendarWeek) -> String {
    format!("{}-W{:02}", week.year, week.week_number)
}

/// 周加减: `n` 可为负
pub fn add_weeks(week: &CalendarWeek, n: i64) -> CalendarWeek {
    CalendarWeek::from_date(week.monday() + Duration::weeks(n))
}

/// 区间周数 (含首尾): 对称操作,若 `a` 在 `b` 之后先交换再计数
pub fn range_length(a: &CalendarWeek, b: &CalendarWeek) -> i64 {
    let diff = (b.monday() - a.monday()).num_weeks();
    diff.abs() + 1
}

/// 枚举区间内全部周 (含首尾),按 ISO 规则正确跨年
///
/// 53 周年份 (如 2020) 会如实产出 W53; 区间颠倒时先交换
pub fn enumerate_range(a: &CalendarWeek, b: &CalendarWeek) -> Vec<CalendarWeek> {
    let (mut current, end) = if a.monday() <= b.monday() {
        (a.monday(), b.monday())
    } else {
        (b.monday(), a.monday())
    };

    let mut weeks = Vec::new();
    while current <= end {
        weeks.push(CalendarWeek::from_date(current));
        current = current + Duration::weeks(1);
    }
    weeks
}

/// 该 ISO 年的周数 (52 或 53)
pub fn weeks_in_year(year: i32) -> u32 {
    if NaiveDate::from_isoywd_opt(year, 53, Weekday::Mon).is_some() {
        53
    } else {
        52
    }
}

/// 宽松格式归一化
///
/// 接受 `YYYY-Wnn` / `YYYY Wnn` / `YYYY_Wnn` (w 不区分大小写,允许空白),
/// 周序号超出 1..=53 时返回 `None`; 成功时返回规范形式
pub fn normalize_loose_format(input: &str) -> Option<String> {
    let caps = LOOSE_WEEK_RE.captures(input)?;
    let year: i32 = caps[1].parse().ok()?;
    let week: u32 = caps[2].parse().ok()?;
    if !(1..=53).contains(&week) {
        return None;
    }
    Some(format!("{}-W{:02}", year, week))
}

/// 解析并规范化: 先宽松归一,再严格解析
///
/// 导入层使用: 外部记录周字段容错入口
pub fn parse_loose(input: &str) -> CalendarResult<CalendarWeek> {
    let normalized = normalize_loose_format(input)
        .ok_or_else(|| CalendarError::MalformedWeekIdentifier(input.to_string()))?;
    parse_week(&normalized)
}
