// ==========================================
// 供应排程系统 - 入站数据契约
// ==========================================
// 六类逻辑数据集, 按数字场景号检索;
// 远端数据源被视为不透明提供方, 这里只定义类型
// ==========================================

use serde::{Deserialize, Serialize};

/// 排程覆写记录: 覆盖需求方的入栏周
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub producer: String,
    pub week_in: String,
}

/// 供应方记录 -> 供应商车道
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreederRecord {
    pub external_id: String,
    pub name: String,
    pub capacity: f64,
}

/// 需求方记录 -> 主事件种子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerRecord {
    pub external_id: String,
    pub name: String,
    pub week_in: String,
    pub capacity: f64,
}

/// 供应方<->需求方距离记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreederProducerDistanceRecord {
    pub breeder: String,
    pub producer: String,
    pub distance_km: f64,
    pub distance_min: f64,
}

/// 需求方<->需求方距离记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerProducerDistanceRecord {
    pub producer_from: String,
    pub producer_to: String,
    pub distance_km: f64,
    pub distance_min: f64,
}

/// 已提交放置对账记录 (重载时还原历史排程)
///
/// producer_id 非空 => 主事件(F); 否则以 id 标识组事件(M)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(default)]
    pub producer_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub breeder_id: Option<String>,
    pub date: String,
    pub amount: f64,
}

/// 一个场景的六类数据集合 (全有或全无)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioBundle {
    pub schedules: Vec<ScheduleRecord>,
    pub breeders: Vec<BreederRecord>,
    pub producers: Vec<ProducerRecord>,
    pub breeder_producer_distances: Vec<BreederProducerDistanceRecord>,
    pub producer_producer_distances: Vec<ProducerProducerDistanceRecord>,
    pub assignments: Vec<AssignmentRecord>,
}
