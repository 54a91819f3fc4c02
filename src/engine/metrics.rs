// ==========================================
// 供应排程系统 - 指标与惩罚计算引擎
// ==========================================
// 职责: 周聚合/峰值产能、超限检测、位移惩罚、待分配积压
// 输入: 供应商车道 + 工作集事件 + 可见周区间
// 输出: 回填车道峰值与周超限标记, 产出指标报告
// ==========================================
// 红线: 纯派生计算, 不创建/销毁事件
// 红线: 未知车道不参与产能聚合, 只记诊断不中断
// ==========================================

use crate::domain::calendar::{self, CalendarWeek};
use crate::domain::event::Event;
use crate::domain::supplier::Supplier;
use crate::domain::types::{EventKind, ShiftDirection};
use crate::i18n;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

// ==========================================
// 指标报告结构
// ==========================================

/// 产能偏差惩罚: 各车道峰值相对申报产能的超出/不足合计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionPenalty {
    pub over: f64,
    pub under: f64,
}

/// 待分配积压惩罚
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnassignedPenalty {
    pub amount: f64,  // 待分配总量
    pub count: usize, // 待分配事件数
}

/// 指标报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsReport {
    pub production: ProductionPenalty,
    pub shift_penalty: f64,
    pub unassigned: UnassignedPenalty,
    pub overflow_messages: Vec<String>,
    pub shift_messages: Vec<String>,
}

// ==========================================
// MetricsEngine - 指标引擎
// ==========================================
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// 全量指标计算
    ///
    /// 1) 对每个真实车道逐周累加其事件量 (事件周跨度含首尾)
    /// 2) peak_capacity = 周聚合量最大值; 峰值超申报的周打超限标记
    /// 3) over/under = 峰值相对申报的逐车道偏差合计
    /// 4) 位移惩罚 = 超出允许位移的周数 x 量 (仅已上道主事件计罚)
    /// 5) 待分配积压 = 待分配池事件的总量与个数
    #[instrument(skip(self, suppliers, events, weeks), fields(
        lane_count = suppliers.len(),
        event_count = events.len()
    ))]
    pub fn compute(
        &self,
        suppliers: &mut [Supplier],
        events: &[Event],
        weeks: &mut [CalendarWeek],
    ) -> MetricsReport {
        let mut report = MetricsReport::default();

        // ===== 周聚合 =====
        let mut weekly: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for supplier in suppliers.iter_mut() {
            if !supplier.is_unassigned() {
                weekly.insert(supplier.id.clone(), HashMap::new());
                supplier.peak_capacity = 0.0;
            }
        }

        for event in events {
            let Some(lane_weekly) = weekly.get_mut(&event.lane_id) else {
                if !event.is_unassigned() {
                    // 未知车道: 排除出产能聚合, 只记诊断
                    tracing::warn!(
                        event_id = %event.id,
                        lane_id = %event.lane_id,
                        "事件引用未知车道, 不参与产能聚合"
                    );
                }
                continue;
            };
            let (Ok(start), Ok(end)) = (
                calendar::parse_week(&event.start_week),
                calendar::parse_week(&event.end_week),
            ) else {
                tracing::warn!(event_id = %event.id, "事件周标识非法, 跳过聚合");
                continue;
            };
            for week in calendar::enumerate_range(&start, &end) {
                *lane_weekly.entry(calendar::format_week(&week)).or_insert(0.0) += event.amount;
            }
        }

        // ===== 峰值 / 超限 / 偏差 =====
        for week in weeks.iter_mut() {
            week.overflow = false;
        }

        for supplier in suppliers.iter_mut() {
            let Some(lane_weekly) = weekly.get(&supplier.id) else {
                continue;
            };
            let peak = lane_weekly.values().fold(0.0_f64, |acc, &v| acc.max(v));
            supplier.peak_capacity = peak;

            if supplier.declared_capacity > peak {
                report.production.under += supplier.declared_capacity - peak;
            }
            if supplier.declared_capacity < peak {
                report.production.over += peak - supplier.declared_capacity;
            }

            if peak > supplier.declared_capacity {
                let mut overflow_weeks: Vec<String> = lane_weekly
                    .iter()
                    .filter(|(_, &total)| total > supplier.declared_capacity)
                    .map(|(key, _)| key.clone())
                    .collect();
                overflow_weeks.sort();

                for week in weeks.iter_mut() {
                    if overflow_weeks.contains(&calendar::format_week(week)) {
                        week.overflow = true;
                    }
                }
                report.overflow_messages.push(i18n::t_with_args(
                    "metrics.overflow",
                    &[("name", &supplier.name), ("weeks", &overflow_weeks.join(", "))],
                ));
            }
        }

        // ===== 位移惩罚 / 待分配积压 =====
        for event in events {
            self.accrue_shift(event, &mut report);

            if event.is_unassigned() {
                report.unassigned.amount += event.amount;
                report.unassigned.count += 1;
            }
        }
        report.shift_messages = dedup_preserving_order(report.shift_messages);

        tracing::debug!(
            over = report.production.over,
            under = report.production.under,
            shift_penalty = report.shift_penalty,
            unassigned_amount = report.unassigned.amount,
            "指标计算完成"
        );
        report
    }

    /// 单事件位移惩罚累计
    ///
    /// 位移 = 请求周与当前起始周的带符号周差;
    /// 超出 max_shift_early/late 的部分按 周数 x 量 计罚,
    /// 仅对已上道的主事件累计罚分, 消息对全部事件记录
    fn accrue_shift(&self, event: &Event, report: &mut MetricsReport) {
        let (Ok(requested), Ok(start)) = (
            calendar::parse_week(&event.requested_week),
            calendar::parse_week(&event.start_week),
        ) else {
            return;
        };

        let (direction, allowed) = if start.monday() <= requested.monday() {
            (ShiftDirection::Early, event.max_shift_early)
        } else {
            (ShiftDirection::Late, event.max_shift_late)
        };
        let shifted = calendar::range_length(&requested, &start) - 1;
        if shifted <= allowed {
            return;
        }

        let excess = shifted - allowed;
        if !event.is_unassigned() && event.kind == EventKind::Primary {
            report.shift_penalty += event.amount * excess as f64;
        }

        let key = match direction {
            ShiftDirection::Early => "metrics.shift_early",
            ShiftDirection::Late => "metrics.shift_late",
        };
        report.shift_messages.push(i18n::t_with_args(
            key,
            &[
                ("name", &event.name),
                ("kind", event.kind.as_str()),
                ("weeks", &excess.to_string()),
            ],
        ));
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 去重并保持首次出现顺序
fn dedup_preserving_order(messages: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|message| seen.insert(message.clone()))
        .collect()
}
