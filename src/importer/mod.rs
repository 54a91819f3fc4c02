// ==========================================
// 供应排程系统 - 导入层
// ==========================================
// 职责: 入站数据契约、批量加载合流、记录到工作集映射
// 红线: 不含引擎逻辑; 映射失败按记录粒度降级
// ==========================================

pub mod error;
pub mod loader;
pub mod mapper;
pub mod records;

// 重导出核心类型
pub use error::{LoadError, LoadResult};
pub use loader::{LoadedGeneration, ScenarioDataSource, ScenarioLoader};
pub use mapper::{LoadedWorkingSet, ScenarioMapper};
pub use records::{
    AssignmentRecord, BreederProducerDistanceRecord, BreederRecord,
    ProducerProducerDistanceRecord, ProducerRecord, ScenarioBundle, ScheduleRecord,
};
