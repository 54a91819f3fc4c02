// ==========================================
// 供应排程系统 - 产能分配引擎
// ==========================================
// 红线: 产能约束优先; 放不下的量一律回到待分配池
// 红线: 任意拆分/合并序列前后总量守恒
// ==========================================
// 职责: 把待分配组事件(M)按放置愿望清单分配到目标车道,
//       超出申报产能的部分拆分回待分配池
// 输入: 工作集事件 + 供应商车道 + 放置请求列表
// 输出: 更新后的工作集 + 分配统计
// ==========================================

use crate::domain::event::{Event, EventIdGenerator, UNASSIGNED_LANE_ID};
use crate::domain::supplier::Supplier;
use crate::domain::types::EventKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::instrument;

// ==========================================
// PlacementRequest - 放置请求
// ==========================================
// 一条愿望: 把某周的待分配组事件放到目标车道
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub start_week: String,
    pub target_lane_id: String,
}

// ==========================================
// AllocationSummary - 分配统计
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub placed: usize,  // 成功上道的请求数
    pub dropped: usize, // 该周无待分配事件, 请求被丢弃
    pub refused: usize, // 车道无剩余产能或车道非法, 事件退回池
    pub split: usize,   // 产生的新待分配碎片数
    pub merged: usize,  // 余量并入既有待分配事件的次数
}

// ==========================================
// CapacityAllocator - 产能分配引擎
// ==========================================
pub struct CapacityAllocator;

impl CapacityAllocator {
    pub fn new() -> Self {
        Self
    }

    /// 批量应用放置愿望清单 (贪心、确定性、单遍)
    ///
    /// 算法 (对每条请求):
    /// 1) 从该周待分配池头部弹出一个组事件; 池空则丢弃请求
    /// 2) placeable = min(事件量, max(0, 申报产能 - 该周该车道已放量))
    /// 3) placeable <= 0 时事件原样退回池头 (放置被拒)
    /// 4) 否则把 placeable 上道, 余量并入该周既有待分配事件,
    ///    无则克隆为新碎片 (确定性新标识)
    ///
    /// # 保证
    /// 所有车道 + 待分配池的总量在调用前后不变
    #[instrument(skip(self, events, suppliers, requests, ids), fields(
        event_count = events.len(),
        request_count = requests.len()
    ))]
    pub fn apply_placements(
        &self,
        mut events: Vec<Event>,
        suppliers: &[Supplier],
        requests: &[PlacementRequest],
        ids: &mut EventIdGenerator,
    ) -> (Vec<Event>, AllocationSummary) {
        let mut summary = AllocationSummary::default();

        // 该周待分配组事件索引 (插入序即池序)
        let mut pool: HashMap<String, VecDeque<usize>> = HashMap::new();
        for (idx, event) in events.iter().enumerate() {
            if event.kind == EventKind::Group && event.is_unassigned() {
                pool.entry(event.start_week.clone()).or_default().push_back(idx);
            }
        }

        // 已放量聚合: (起始周, 车道) -> 量
        let mut placed_totals: HashMap<(String, String), f64> = HashMap::new();
        for event in &events {
            if event.kind == EventKind::Group && !event.is_unassigned() {
                *placed_totals
                    .entry((event.start_week.clone(), event.lane_id.clone()))
                    .or_insert(0.0) += event.amount;
            }
        }

        for request in requests {
            // 目标即待分配池: 无车道变化
            if request.target_lane_id == UNASSIGNED_LANE_ID {
                continue;
            }

            let Some(week_pool) = pool.get_mut(&request.start_week) else {
                summary.dropped += 1;
                tracing::debug!("周 {} 无待分配事件, 丢弃放置请求", request.start_week);
                continue;
            };
            let Some(event_idx) = week_pool.pop_front() else {
                summary.dropped += 1;
                tracing::debug!("周 {} 待分配池已空, 丢弃放置请求", request.start_week);
                continue;
            };

            // 车道不在供应商集合: 视为非法, 不参与产能聚合
            let Some(lane) = suppliers.iter().find(|s| s.id == request.target_lane_id) else {
                tracing::warn!(
                    lane_id = %request.target_lane_id,
                    "放置请求指向未知车道, 事件退回待分配池"
                );
                week_pool.push_front(event_idx);
                summary.refused += 1;
                continue;
            };

            let amount = events[event_idx].amount;
            let key = (request.start_week.clone(), lane.id.clone());
            let current = placed_totals.get(&key).copied().unwrap_or(0.0);
            let placeable = amount.min((lane.declared_capacity - current).max(0.0));

            if placeable <= 0.0 {
                // 车道已满: 事件退回池头
                week_pool.push_front(event_idx);
                summary.refused += 1;
                continue;
            }

            let leftover = amount - placeable;

            // 上道 (组事件周跨度保持不变)
            events[event_idx].lane_id = lane.id.clone();
            events[event_idx].amount = placeable;
            *placed_totals.entry(key).or_insert(0.0) += placeable;
            summary.placed += 1;

            if leftover > 0.0 {
                // 余量回池: 并入该周首个剩余待分配事件, 无则克隆碎片
                if let Some(&merge_idx) = week_pool.front() {
                    events[merge_idx].amount += leftover;
                    summary.merged += 1;
                } else {
                    let fragment =
                        make_unassigned_fragment(&events[event_idx], leftover, ids);
                    events.push(fragment);
                    week_pool.push_back(events.len() - 1);
                    summary.split += 1;
                }
            }
        }

        tracing::debug!(
            placed = summary.placed,
            dropped = summary.dropped,
            refused = summary.refused,
            split = summary.split,
            merged = summary.merged,
            "批量放置完成"
        );
        (events, summary)
    }

    /// 把超限量溢出到待分配池 (重定位/编辑接受后的拆分)
    ///
    /// 规则与批量放置一致: 该周已有待分配组事件则并入,
    /// 否则以 `template` 为模板克隆一个组事件碎片
    ///
    /// # 返回
    /// `true` 表示并入既有事件, `false` 表示新建碎片
    pub fn spill_excess(
        &self,
        events: &mut Vec<Event>,
        template: &Event,
        week: &str,
        excess: f64,
        ids: &mut EventIdGenerator,
    ) -> bool {
        if excess <= 0.0 {
            return true;
        }
        if let Some(idx) = find_unassigned_group(events, week, Some(&template.id)) {
            events[idx].amount += excess;
            true
        } else {
            let mut fragment = make_unassigned_fragment(template, excess, ids);
            if fragment.start_week != week {
                // 模板来自其他周时把碎片落到目标周
                if let Err(err) = fragment.shift_to(week) {
                    tracing::warn!("溢出碎片落周失败, 保留模板周: {}", err);
                }
            }
            events.push(fragment);
            false
        }
    }
}

impl Default for CapacityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 池查询辅助
// ==========================================

/// 找到某周首个待分配组事件 (可排除指定标识)
pub fn find_unassigned_group(
    events: &[Event],
    week: &str,
    exclude_id: Option<&str>,
) -> Option<usize> {
    events.iter().position(|e| {
        e.kind == EventKind::Group
            && e.is_unassigned()
            && e.start_week == week
            && exclude_id.map_or(true, |id| e.id != id)
    })
}

/// 某周待分配组事件总量 (可排除指定标识)
pub fn unassigned_group_total(events: &[Event], week: &str, exclude_id: Option<&str>) -> f64 {
    events
        .iter()
        .filter(|e| {
            e.kind == EventKind::Group
                && e.is_unassigned()
                && e.start_week == week
                && exclude_id.map_or(true, |id| e.id != id)
        })
        .map(|e| e.amount)
        .sum()
}

/// 以模板克隆一个待分配组事件碎片
fn make_unassigned_fragment(template: &Event, amount: f64, ids: &mut EventIdGenerator) -> Event {
    let mut fragment = template.clone();
    fragment.id = ids.next_group_id(&template.start_week);
    fragment.kind = EventKind::Group;
    fragment.lane_id = UNASSIGNED_LANE_ID.to_string();
    fragment.amount = amount;
    fragment.distance = None;
    fragment.reset_layout();
    // 模板可能是主事件, 结束周按组跨度重新派生
    let start = fragment.start_week.clone();
    if let Err(err) = fragment.shift_to(&start) {
        tracing::warn!("碎片跨度派生失败, 保留模板跨度: {}", err);
    }
    fragment
}
