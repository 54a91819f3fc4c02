// ==========================================
// 供应排程系统 - 引擎层
// ==========================================
// 职责: 实现排程业务规则引擎
// 红线: 所有拒绝必须给出可提示的 reason; 规则降级不中断流水线
// ==========================================

pub mod allocator;
pub mod board;
pub mod error;
pub mod events;
pub mod layout;
pub mod metrics;
pub mod recalc;
pub mod relocation;
pub mod route;
pub mod synthesizer;

// 重导出核心引擎
pub use allocator::{AllocationSummary, CapacityAllocator, PlacementRequest};
pub use board::{BoardCommand, BoardSnapshot, EventEdit, SchedulerBoard};
pub use error::{EngineError, EngineResult, RelocationError};
pub use events::{
    BufferedNotificationPublisher, NoOpNotificationPublisher, Notification,
    NotificationPublisher, TracingNotificationPublisher,
};
pub use layout::LayoutEngine;
pub use metrics::{MetricsEngine, MetricsReport, ProductionPenalty, UnassignedPenalty};
pub use recalc::{RecalcEngine, RecalcResult};
pub use relocation::{
    DragState, DropPreview, PointerPosition, RelocationOutcome, RelocationValidator,
};
pub use route::{
    IdentityRouteSequencer, RouteAssigner, RoutePlan, RouteSequencer, RouteTotal,
};
pub use synthesizer::GroupSynthesizer;
