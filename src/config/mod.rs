// ==========================================
// 供应排程系统 - 配置层
// ==========================================
// 职责: 引擎运行参数 (布局几何、重算上限、默认约束)
// 说明: 纯内存配置对象, 由调用方构造或走默认值
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// SchedulerConfig - 引擎配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 周列宽 (布局单位)
    #[serde(default = "default_week_column_width")]
    pub week_column_width: f64,

    /// 单位数量行高 (布局单位/数量)
    #[serde(default = "default_amount_unit_height")]
    pub amount_unit_height: f64,

    /// 布局/峰值不动点迭代上限
    #[serde(default = "default_max_recalc_iterations")]
    pub max_recalc_iterations: u32,

    /// 用户通知默认展示时长 (毫秒)
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,

    /// 新建事件默认允许提前周数
    #[serde(default)]
    pub default_max_shift_early: i64,

    /// 新建事件默认允许延后周数
    #[serde(default)]
    pub default_max_shift_late: i64,
}

fn default_week_column_width() -> f64 {
    30.0
}

fn default_amount_unit_height() -> f64 {
    0.02
}

fn default_max_recalc_iterations() -> u32 {
    4
}

fn default_notification_duration_ms() -> u64 {
    3000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            week_column_width: default_week_column_width(),
            amount_unit_height: default_amount_unit_height(),
            max_recalc_iterations: default_max_recalc_iterations(),
            notification_duration_ms: default_notification_duration_ms(),
            default_max_shift_early: 0,
            default_max_shift_late: 0,
        }
    }
}

impl SchedulerConfig {
    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), String> {
        if self.week_column_width <= 0.0 {
            return Err(format!("周列宽必须为正: {}", self.week_column_width));
        }
        if self.amount_unit_height <= 0.0 {
            return Err(format!("单位行高必须为正: {}", self.amount_unit_height));
        }
        if self.max_recalc_iterations == 0 {
            return Err("不动点迭代上限必须 >= 1".to_string());
        }
        Ok(())
    }
}
