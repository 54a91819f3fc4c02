// ==========================================
// 供应排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 重定位违规只回退不破坏状态; 周标识非法按"跳过"降级
// ==========================================

use crate::domain::calendar::CalendarError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 实体解析错误 =====
    #[error("事件不存在: {0}")]
    EventNotFound(String),

    #[error("车道不存在: {0}")]
    LaneNotFound(String),

    // ===== 周历错误 =====
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    // ===== 拖拽状态机错误 =====
    #[error("拖拽状态非法: {0}")]
    InvalidDragState(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

// ==========================================
// RelocationError - 重定位业务规则违规
// ==========================================
// 不是致命错误: 处理方式为回退到拖拽前位置并向用户提示
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelocationError {
    /// 组事件(M)的周跨度被锁定, 不允许横向移动
    #[error("组事件周跨度锁定: {event_id}")]
    GroupWeekLocked { event_id: String },

    /// 主事件移周时, 被腾出周缺少足量待分配组事件承接
    #[error("周 {week} 缺少足量待分配组事件 (需 {amount})")]
    MissingUnassignedGroup { week: String, amount: f64 },

    /// 目标车道上存在部分(非完全)周跨度重叠的事件
    #[error("目标车道 {lane_id} 存在部分周跨度重叠")]
    PartialOverlap { lane_id: String },

    /// 主事件落入待分配池时只能停在请求周, 已回弹
    #[error("主事件在待分配池只能停在请求周: {requested_week}")]
    RequestedWeekSnapBack { requested_week: String },
}
