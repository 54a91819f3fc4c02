// ==========================================
// 供应排程系统 - 领域类型定义
// ==========================================
// 事件种类: 主事件(F) / 派生组事件(M)
// 序列化格式: 单字母代码 (与外部数据源一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 事件种类 (Event Kind)
// ==========================================
// 红线: 种类不变量在构造/迁移时强制,不散落在调用点
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// 主事件 (F): 原始需求单元,固定名义跨度
    #[serde(rename = "F")]
    Primary,
    /// 派生组事件 (M): 按起始周聚合的次级事件,跨度更短
    #[serde(rename = "M")]
    Group,
}

impl EventKind {
    /// 该种类事件的固定跨度 (含首尾周)
    pub fn span_weeks(&self) -> i64 {
        match self {
            EventKind::Primary => crate::domain::event::PRIMARY_SPAN_WEEKS,
            EventKind::Group => crate::domain::event::GROUP_SPAN_WEEKS,
        }
    }

    /// 是否允许横向(周方向)移动
    ///
    /// 只有主事件可以改变起始周; 组事件的周跨度被锁定
    pub fn movable_horizontally(&self) -> bool {
        matches!(self, EventKind::Primary)
    }

    /// 转换为单字母代码
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Primary => "F",
            EventKind::Group => "M",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 位移方向 (Shift Direction)
// ==========================================
// 用途: 位移惩罚计算,区分提前/延后
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftDirection {
    Early, // 提前 (早于请求周)
    Late,  // 延后 (晚于请求周)
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftDirection::Early => write!(f, "EARLY"),
            ShiftDirection::Late => write!(f, "LATE"),
        }
    }
}
