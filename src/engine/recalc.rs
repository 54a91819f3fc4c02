// ==========================================
// 供应排程系统 - 重算引擎
// ==========================================
// 职责: 一次完整重算 = 路径回填 + {布局; 峰值} 有界不动点迭代
// 输入: 工作集 (事件/车道/周区间/距离) + 路径求解器
// 输出: 收敛信息 + 指标报告 + 距离合计
// ==========================================
// 说明: 车道行高依赖峰值产能, 峰值又依赖布局聚合的同一份数据,
//       故迭代 {布局; 峰值} 至逐位稳定; 达上限未稳定记诊断
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::calendar::CalendarWeek;
use crate::domain::distance::DistanceSet;
use crate::domain::event::Event;
use crate::domain::supplier::Supplier;
use crate::engine::layout::LayoutEngine;
use crate::engine::metrics::{MetricsEngine, MetricsReport};
use crate::engine::route::{RouteAssigner, RouteSequencer, RouteTotal};
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// RecalcResult - 重算结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalcResult {
    pub iterations: u32,      // 实际迭代轮数
    pub converged: bool,      // 是否在上限内逐位稳定
    pub metrics: MetricsReport,
    pub route_total: RouteTotal,
}

// ==========================================
// 位置指纹 (逐位比较用)
// ==========================================
type Fingerprint = (Vec<(String, u64, u64, u64)>, Vec<(String, u64)>);

fn fingerprint(events: &[Event], suppliers: &[Supplier]) -> Fingerprint {
    let positions = events
        .iter()
        .map(|e| {
            (
                e.id.clone(),
                e.left_offset.to_bits(),
                e.top_offset.to_bits(),
                e.stack_offset.to_bits(),
            )
        })
        .collect();
    let peaks = suppliers
        .iter()
        .map(|s| (s.id.clone(), s.peak_capacity.to_bits()))
        .collect();
    (positions, peaks)
}

// ==========================================
// RecalcEngine - 重算引擎
// ==========================================
pub struct RecalcEngine {
    config: SchedulerConfig,
    layout: LayoutEngine,
    metrics: MetricsEngine,
    route: RouteAssigner,
}

impl RecalcEngine {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            layout: LayoutEngine::new(config.clone()),
            metrics: MetricsEngine::new(),
            route: RouteAssigner::new(),
            config,
        }
    }

    /// 全量重算
    ///
    /// 1) 重置布局派生字段 (含路径序)
    /// 2) 路径回填 (外部求解器)
    /// 3) 迭代 {布局; 峰值/指标} 直至位置与峰值逐位稳定,
    ///    或达到 max_recalc_iterations (未收敛记 warn 诊断)
    ///
    /// 已收敛状态上再次调用是不动点: 产出逐位相同
    #[instrument(skip_all, fields(
        event_count = events.len(),
        lane_count = suppliers.len(),
        week_count = weeks.len()
    ))]
    pub fn recompute(
        &self,
        events: &mut Vec<Event>,
        suppliers: &mut [Supplier],
        weeks: &mut [CalendarWeek],
        distances: &DistanceSet,
        sequencer: &dyn RouteSequencer,
    ) -> RecalcResult {
        for event in events.iter_mut() {
            event.reset_layout();
        }
        let route_total = self.route.assign(events, distances, sequencer);

        let mut previous: Option<Fingerprint> = None;
        let mut report = MetricsReport::default();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_recalc_iterations {
            iterations += 1;
            self.layout.layout_all(events, suppliers, weeks);
            report = self.metrics.compute(suppliers, events, weeks);

            let current = fingerprint(events, suppliers);
            if previous.as_ref() == Some(&current) {
                converged = true;
                break;
            }
            previous = Some(current);
        }

        if !converged {
            tracing::warn!(
                iterations,
                max = self.config.max_recalc_iterations,
                "布局/峰值迭代未在上限内收敛"
            );
        } else {
            tracing::debug!(iterations, "重算收敛");
        }

        RecalcResult {
            iterations,
            converged,
            metrics: report,
            route_total,
        }
    }
}
