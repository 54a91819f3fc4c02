// ==========================================
// 供应排程系统 - 供应商(车道)领域模型
// ==========================================
// 每个供应商占据一条时间车道, 带申报产能;
// 峰值产能由指标引擎按周聚合派生
// ==========================================

use crate::domain::event::UNASSIGNED_LANE_ID;
use serde::{Deserialize, Serialize};

// ==========================================
// Supplier - 供应商车道
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,   // 车道标识; "unassigned" 为保留哨兵
    pub name: String, // 展示名称

    /// 申报产能 (每周数量上限)
    pub declared_capacity: f64,

    /// 峰值产能 (派生: 可见区间内周聚合量的最大值)
    #[serde(default)]
    pub peak_capacity: f64,
}

impl Supplier {
    pub fn new(id: impl Into<String>, name: impl Into<String>, declared_capacity: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            declared_capacity,
            peak_capacity: 0.0,
        }
    }

    /// 待分配池哨兵车道
    ///
    /// 申报产能从 0 起步, 随观测到的最大单笔待分配量自动增长 (从不自行收缩)
    pub fn unassigned() -> Self {
        Self::new(UNASSIGNED_LANE_ID, "Unassigned", 0.0)
    }

    /// 是否为待分配池哨兵
    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_LANE_ID
    }

    /// 有效产能: 峰值超过申报时取峰值 (车道行高以此为准)
    pub fn effective_capacity(&self) -> f64 {
        if self.peak_capacity > self.declared_capacity {
            self.peak_capacity
        } else {
            self.declared_capacity
        }
    }
}
