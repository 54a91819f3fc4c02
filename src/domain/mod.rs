// ==========================================
// 供应排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与不变量
// 红线: 不含引擎逻辑, 不含外部数据访问
// ==========================================

pub mod calendar;
pub mod distance;
pub mod event;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use calendar::{CalendarError, CalendarResult, CalendarWeek};
pub use distance::{DistanceEdge, DistanceSet, HopDistance};
pub use event::{
    Event, EventIdGenerator, GROUP_SPAN_WEEKS, PRIMARY_SPAN_WEEKS, UNASSIGNED_LANE_ID,
};
pub use supplier::Supplier;
pub use types::{EventKind, ShiftDirection};
