// ==========================================
// 供应排程系统 - 导入层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 六类数据集全有或全无; 任一失败整体中止且不动既有状态
// ==========================================

use thiserror::Error;

/// 导入层错误类型
#[derive(Error, Debug)]
pub enum LoadError {
    // ===== 数据源错误 =====
    #[error("数据集 {collection} 获取失败 (场景 {set_id}): {message}")]
    FetchFailed {
        collection: &'static str,
        set_id: u64,
        message: String,
    },

    #[error("数据源返回失败标记: {collection}")]
    SourceRejected { collection: &'static str },

    // ===== 过期竞争 =====
    #[error("加载结果已过期 (代际 {generation}, 当前 {current})")]
    StaleGeneration { generation: u64, current: u64 },

    // ===== 映射错误 =====
    #[error("场景 {set_id} 无可用事件记录")]
    EmptyScenario { set_id: u64 },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type LoadResult<T> = Result<T, LoadError>;
