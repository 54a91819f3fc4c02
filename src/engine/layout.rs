// ==========================================
// 供应排程系统 - 车道堆叠布局引擎
// ==========================================
// 职责: 逐车道消解事件视觉重叠 (天际线算法)
// 输入: 工作集事件 + 供应商车道 + 可见周区间
// 输出: 回填每个事件的 left/top/stack 布局偏移
// ==========================================
// 红线: 同车道内周跨度横向重叠的事件, 纵向区间不得重叠
// 红线: 排序为全序, 同输入必得同输出
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::calendar::{self, CalendarWeek};
use crate::domain::event::Event;
use crate::domain::supplier::Supplier;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

// ==========================================
// 已放置矩形 (天际线状态)
// ==========================================
#[derive(Debug, Clone, Copy)]
struct PlacedRect {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

// ==========================================
// LayoutEngine - 布局引擎
// ==========================================
pub struct LayoutEngine {
    config: SchedulerConfig,
}

impl LayoutEngine {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// 事件块宽度: 待分配池内一律一列宽, 其余按周跨度
    pub fn block_width(&self, event: &Event) -> f64 {
        if event.is_unassigned() {
            return self.config.week_column_width;
        }
        let span = match (
            calendar::parse_week(&event.start_week),
            calendar::parse_week(&event.end_week),
        ) {
            (Ok(start), Ok(end)) => calendar::range_length(&start, &end),
            _ => event.span_weeks(),
        };
        span as f64 * self.config.week_column_width
    }

    /// 事件块高度: 数量 x 单位行高
    pub fn block_height(&self, event: &Event) -> f64 {
        event.amount * self.config.amount_unit_height
    }

    /// 车道基准纵坐标: 前序车道有效产能行高之和
    ///
    /// 车道不在供应商集合时返回 None (调用方按 0 降级)
    pub fn lane_base_top(&self, lane_id: &str, suppliers: &[Supplier]) -> Option<f64> {
        let index = suppliers.iter().position(|s| s.id == lane_id)?;
        let top = suppliers[..index]
            .iter()
            .map(|s| s.effective_capacity() * self.config.amount_unit_height)
            .sum();
        Some(top)
    }

    /// 车道行高 (有效产能 x 单位行高)
    pub fn lane_row_height(&self, supplier: &Supplier) -> f64 {
        supplier.effective_capacity() * self.config.amount_unit_height
    }

    /// 全量布局: 重置布局偏移, 计算基准位置, 再逐车道堆叠
    #[instrument(skip(self, events, suppliers, weeks), fields(
        event_count = events.len(),
        lane_count = suppliers.len(),
        week_count = weeks.len()
    ))]
    pub fn layout_all(
        &self,
        events: &mut [Event],
        suppliers: &[Supplier],
        weeks: &[CalendarWeek],
    ) {
        let week_index: HashMap<String, usize> = weeks
            .iter()
            .enumerate()
            .map(|(idx, week)| (calendar::format_week(week), idx))
            .collect();

        // 1. 基准位置 (堆叠偏移清零)
        for event in events.iter_mut() {
            event.stack_offset = 0.0;
            event.left_offset = match week_index.get(&event.start_week) {
                Some(&idx) => idx as f64 * self.config.week_column_width,
                None => {
                    tracing::warn!(
                        event_id = %event.id,
                        start_week = %event.start_week,
                        "起始周不在可见区间, 左移至 0"
                    );
                    0.0
                }
            };
            event.top_offset = match self.lane_base_top(&event.lane_id, suppliers) {
                Some(top) => top,
                None => {
                    tracing::warn!(
                        event_id = %event.id,
                        lane_id = %event.lane_id,
                        "事件引用未知车道, 置顶降级"
                    );
                    0.0
                }
            };
        }

        // 2. 逐车道堆叠 (车道序取事件首次出现序, 保证确定性)
        let mut seen = HashSet::new();
        let mut lane_order = Vec::new();
        for event in events.iter() {
            if seen.insert(event.lane_id.clone()) {
                lane_order.push(event.lane_id.clone());
            }
        }
        for lane_id in lane_order {
            self.stack_lane(&lane_id, events, suppliers);
        }
    }

    /// 单车道天际线堆叠
    ///
    /// 排序全序: 起始周升序 -> 基准纵坐标升序 -> 跨度降序 -> 路径序升序;
    /// 每个事件的堆叠偏移 = 与其横向重叠的已放置矩形的最大下边缘
    fn stack_lane(&self, lane_id: &str, events: &mut [Event], suppliers: &[Supplier]) {
        let base_top = self.lane_base_top(lane_id, suppliers).unwrap_or(0.0);

        let mut lane_indices: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.lane_id == lane_id)
            .map(|(idx, _)| idx)
            .collect();

        lane_indices.sort_by(|&a, &b| {
            let ea = &events[a];
            let eb = &events[b];
            let start_a = calendar::parse_week(&ea.start_week).map(|w| w.monday());
            let start_b = calendar::parse_week(&eb.start_week).map(|w| w.monday());
            if let (Ok(da), Ok(db)) = (start_a, start_b) {
                if da != db {
                    return da.cmp(&db);
                }
            }
            let top_cmp = ea.top_offset.total_cmp(&eb.top_offset);
            if top_cmp != std::cmp::Ordering::Equal {
                return top_cmp;
            }
            let span_cmp = eb.span_weeks().cmp(&ea.span_weeks());
            if span_cmp != std::cmp::Ordering::Equal {
                return span_cmp;
            }
            ea.route_order.cmp(&eb.route_order)
        });

        let mut placed: Vec<PlacedRect> = Vec::with_capacity(lane_indices.len());
        for idx in lane_indices {
            let left = events[idx].left_offset;
            let width = self.block_width(&events[idx]);
            let height = self.block_height(&events[idx]);

            let mut max_overlapping_bottom: f64 = 0.0;
            for rect in &placed {
                let x_overlap =
                    (left + width).min(rect.left + rect.width) - left.max(rect.left);
                if x_overlap > 0.0 {
                    max_overlapping_bottom = max_overlapping_bottom.max(rect.top + rect.height);
                }
            }

            let stack = if max_overlapping_bottom > 0.0 {
                (max_overlapping_bottom - base_top).max(0.0)
            } else {
                0.0
            };

            events[idx].stack_offset = stack;
            events[idx].top_offset = base_top + stack;

            placed.push(PlacedRect {
                left,
                top: events[idx].top_offset,
                width,
                height,
            });
        }
    }
}
