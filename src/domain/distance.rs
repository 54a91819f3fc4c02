// ==========================================
// 供应排程系统 - 距离领域模型
// ==========================================
// 两类边: 车道->需求方 / 需求方->需求方
// 由外部路径求解器消费, 本核心只做查找与回填
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// HopDistance - 单跳距离
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HopDistance {
    pub km: f64,      // 公里
    pub minutes: f64, // 行驶分钟
}

// ==========================================
// DistanceEdge - 距离边 (带标签变体)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "edge_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceEdge {
    /// 车道(供应商) -> 需求方
    LaneToEntity {
        lane_id: String,
        entity_id: String,
        distance: HopDistance,
    },
    /// 需求方 -> 需求方
    EntityToEntity {
        from_id: String,
        to_id: String,
        distance: HopDistance,
    },
}

// ==========================================
// DistanceSet - 距离边集合
// ==========================================
// 规模为数十至数百条边, 线性查找即可
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistanceSet {
    pub edges: Vec<DistanceEdge>,
}

impl DistanceSet {
    pub fn new(edges: Vec<DistanceEdge>) -> Self {
        Self { edges }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// 是否同时具备两类边 (路径回填的前置条件)
    pub fn has_both_families(&self) -> bool {
        let mut has_lane = false;
        let mut has_entity = false;
        for edge in &self.edges {
            match edge {
                DistanceEdge::LaneToEntity { .. } => has_lane = true,
                DistanceEdge::EntityToEntity { .. } => has_entity = true,
            }
        }
        has_lane && has_entity
    }

    /// 查找车道->需求方距离
    pub fn lane_hop(&self, lane: &str, entity: &str) -> Option<HopDistance> {
        self.edges.iter().find_map(|edge| match edge {
            DistanceEdge::LaneToEntity {
                lane_id,
                entity_id,
                distance,
            } if lane_id == lane && entity_id == entity => Some(*distance),
            _ => None,
        })
    }

    /// 查找需求方->需求方距离
    pub fn entity_hop(&self, from: &str, to: &str) -> Option<HopDistance> {
        self.edges.iter().find_map(|edge| match edge {
            DistanceEdge::EntityToEntity {
                from_id,
                to_id,
                distance,
            } if from_id == from && to_id == to => Some(*distance),
            _ => None,
        })
    }
}
