// ==========================================
// 供应排程系统 - 事件领域模型
// ==========================================
// 主事件(F): 需求单元, 固定跨度 18 周
// 组事件(M): 按起始周聚合的派生事件, 固定跨度 10 周
// ==========================================
// 红线: end_week 始终由 start_week + 跨度 - 1 派生
// 红线: 布局派生字段每次布局重算, 不作为权威状态
// ==========================================

use crate::domain::calendar::{self, CalendarResult};
use crate::domain::distance::HopDistance;
use crate::domain::types::EventKind;
use serde::{Deserialize, Serialize};

// ==========================================
// 常量
// ==========================================

/// 待分配池的保留车道标识
pub const UNASSIGNED_LANE_ID: &str = "unassigned";

/// 主事件固定跨度 (周, 含首尾)
pub const PRIMARY_SPAN_WEEKS: i64 = 18;

/// 组事件固定跨度 (周, 含首尾)
pub const GROUP_SPAN_WEEKS: i64 = 10;

// ==========================================
// Event - 排程事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    // ===== 标识 =====
    pub id: String,   // 全局唯一标识
    pub name: String, // 业务名称 (主事件为需求方标识)
    pub kind: EventKind,

    // ===== 量与周跨度 =====
    pub amount: f64,            // 数量 (>= 0)
    pub requested_week: String, // 原始请求起始周 (位移惩罚基准)
    pub start_week: String,     // 当前起始周 (规范形式 YYYY-Wnn)
    pub end_week: String,       // 当前结束周 (派生: start + 跨度 - 1)

    // ===== 分配 =====
    pub lane_id: String, // 所在车道; "unassigned" 为待分配池

    // ===== 路径排序 (由外部路径求解器回填) =====
    #[serde(default)]
    pub route_order: i32,
    #[serde(default)]
    pub distance: Option<HopDistance>,

    // ===== 位移约束 =====
    #[serde(default)]
    pub max_shift_early: i64, // 允许提前的最大周数
    #[serde(default)]
    pub max_shift_late: i64, // 允许延后的最大周数

    // ===== 布局派生字段 (视图专用, 每次布局重算) =====
    #[serde(default)]
    pub left_offset: f64,
    #[serde(default)]
    pub top_offset: f64,
    #[serde(default)]
    pub stack_offset: f64,
}

impl Event {
    /// 构造事件: 起始周即请求周, 结束周按种类跨度派生
    ///
    /// # 返回
    /// 请求周标识非法时返回 `MalformedWeekIdentifier`
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EventKind,
        amount: f64,
        requested_week: &str,
        lane_id: impl Into<String>,
    ) -> CalendarResult<Self> {
        Self::with_start(id, name, kind, amount, requested_week, requested_week, lane_id)
    }

    /// 构造事件: 起始周与请求周分离 (重载历史排程时使用)
    pub fn with_start(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EventKind,
        amount: f64,
        requested_week: &str,
        start_week: &str,
        lane_id: impl Into<String>,
    ) -> CalendarResult<Self> {
        let requested = calendar::parse_week(requested_week)?;
        let start = calendar::parse_week(start_week)?;
        let end = calendar::add_weeks(&start, kind.span_weeks() - 1);

        Ok(Self {
            id: id.into(),
            name: name.into(),
            kind,
            amount,
            requested_week: calendar::format_week(&requested),
            start_week: calendar::format_week(&start),
            end_week: calendar::format_week(&end),
            lane_id: lane_id.into(),
            route_order: 0,
            distance: None,
            max_shift_early: 0,
            max_shift_late: 0,
            left_offset: 0.0,
            top_offset: 0.0,
            stack_offset: 0.0,
        })
    }

    /// 迁移起始周, 结束周随种类跨度派生
    ///
    /// 种类级移动权限由重定位校验器把关; 本方法只维护跨度不变量
    pub fn shift_to(&mut self, new_start_week: &str) -> CalendarResult<()> {
        let start = calendar::parse_week(new_start_week)?;
        let end = calendar::add_weeks(&start, self.kind.span_weeks() - 1);
        self.start_week = calendar::format_week(&start);
        self.end_week = calendar::format_week(&end);
        Ok(())
    }

    /// 是否在待分配池
    pub fn is_unassigned(&self) -> bool {
        self.lane_id == UNASSIGNED_LANE_ID
    }

    /// 周跨度 (含首尾)
    pub fn span_weeks(&self) -> i64 {
        self.kind.span_weeks()
    }

    /// 重置布局派生字段 (每轮布局前调用)
    pub fn reset_layout(&mut self) {
        self.left_offset = 0.0;
        self.top_offset = 0.0;
        self.stack_offset = 0.0;
        self.route_order = 0;
    }
}

// ==========================================
// EventIdGenerator - 确定性标识生成器
// ==========================================
// 单调计数器替代时间戳+随机数: 测试可断言精确标识,
// 合并/拆分结果可复现
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventIdGenerator {
    counter: u64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// 为组事件/拆分碎片生成 `{起始周}-M{序号}` 形式的标识
    pub fn next_group_id(&mut self, start_week: &str) -> String {
        self.counter += 1;
        format!("{}-M{:04}", start_week, self.counter)
    }
}
