// ==========================================
// 供应排程系统 - 核心库
// ==========================================
// 周历绑定、产能受限的事件摆放与分配引擎:
// 派生组合成 -> 产能分配 -> 车道堆叠布局 -> 指标惩罚
// 重定位经校验器裁决后重入同一条重算流水线
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CalendarError, CalendarWeek, DistanceEdge, DistanceSet, Event, EventIdGenerator,
    EventKind, HopDistance, ShiftDirection, Supplier, GROUP_SPAN_WEEKS, PRIMARY_SPAN_WEEKS,
    UNASSIGNED_LANE_ID,
};

// 引擎
pub use engine::{
    BoardCommand, BoardSnapshot, CapacityAllocator, GroupSynthesizer, LayoutEngine,
    MetricsEngine, MetricsReport, PlacementRequest, RecalcEngine, RelocationValidator,
    SchedulerBoard,
};

// 配置
pub use config::SchedulerConfig;

// 导入
pub use importer::{ScenarioBundle, ScenarioDataSource, ScenarioLoader, ScenarioMapper};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应排程系统";

// ==========================================
// 预编译检查
// ==========================================
