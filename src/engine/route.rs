// ==========================================
// 供应排程系统 - 路径排序协作接口
// ==========================================
// 职责: 定义外部路径求解器的固定契约 (本核心只消费不实现),
//       并把求解结果回填到事件 (访问序 + 逐跳距离)
// 说明: Engine 层定义 trait, 求解器侧实现适配器
// ==========================================

use crate::domain::distance::DistanceSet;
use crate::domain::event::Event;
use crate::domain::types::EventKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// RoutePlan - 求解器返回的访问计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// 最优访问顺序 (需求方名称序列)
    pub route: Vec<String>,
}

// ==========================================
// 路径求解 Trait (外部协作者契约)
// ==========================================

/// 路径求解器: 给定车道与停靠点集合, 返回最优访问顺序
///
/// 由外部最短路径优化器实现; 返回 None 表示无可行路径,
/// 此时事件保持车道->需求方的单跳距离
pub trait RouteSequencer: Send + Sync {
    fn find_shortest_route(
        &self,
        lane_id: &str,
        stops: &[String],
        distances: &DistanceSet,
    ) -> Option<RoutePlan>;
}

/// 恒等路径求解器: 按给定顺序访问 (测试与演示用)
#[derive(Debug, Default)]
pub struct IdentityRouteSequencer;

impl RouteSequencer for IdentityRouteSequencer {
    fn find_shortest_route(
        &self,
        _lane_id: &str,
        stops: &[String],
        _distances: &DistanceSet,
    ) -> Option<RoutePlan> {
        Some(RoutePlan {
            route: stops.to_vec(),
        })
    }
}

// ==========================================
// RouteTotal - 距离合计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTotal {
    pub km: f64,
    pub minutes: f64,
}

// ==========================================
// RouteAssigner - 距离回填
// ==========================================
pub struct RouteAssigner;

impl RouteAssigner {
    pub fn new() -> Self {
        Self
    }

    /// 距离回填与合计
    ///
    /// 1) 每个已上道主事件取 车道->需求方 单跳距离
    /// 2) 同 (车道, 起始周, 结束周) 的 >=2 个主事件交由求解器排序:
    ///    route_order = 访问序; 非首位事件改用 前一跳->本跳 距离
    /// 3) 合计全部已上道主事件的 km / 分钟
    ///
    /// 两类距离边缺一时跳过回填, 返回零合计
    #[instrument(skip(self, events, distances, sequencer), fields(event_count = events.len()))]
    pub fn assign(
        &self,
        events: &mut [Event],
        distances: &DistanceSet,
        sequencer: &dyn RouteSequencer,
    ) -> RouteTotal {
        if events.is_empty() || !distances.has_both_families() {
            return RouteTotal::default();
        }

        // 1. 车道->需求方 单跳距离
        for event in events.iter_mut() {
            if event.kind == EventKind::Primary && !event.is_unassigned() {
                if let Some(hop) = distances.lane_hop(&event.lane_id, &event.name) {
                    event.distance = Some(hop);
                }
            }
        }

        // 2. 同车道同跨度成组排序 (BTreeMap 保证分组遍历确定性)
        let mut groups: BTreeMap<(String, String, String), Vec<usize>> = BTreeMap::new();
        for (idx, event) in events.iter().enumerate() {
            if event.kind == EventKind::Primary && !event.is_unassigned() {
                groups
                    .entry((
                        event.lane_id.clone(),
                        event.start_week.clone(),
                        event.end_week.clone(),
                    ))
                    .or_default()
                    .push(idx);
            }
        }

        for ((lane_id, _, _), member_indices) in groups {
            if member_indices.len() < 2 {
                continue;
            }
            let stops: Vec<String> = member_indices
                .iter()
                .map(|&idx| events[idx].name.clone())
                .collect();
            let Some(plan) = sequencer.find_shortest_route(&lane_id, &stops, distances) else {
                tracing::debug!(lane_id = %lane_id, "求解器未返回路径, 保持单跳距离");
                continue;
            };

            for (order, stop_name) in plan.route.iter().enumerate() {
                let Some(&event_idx) = member_indices
                    .iter()
                    .find(|&&idx| events[idx].name == *stop_name)
                else {
                    continue;
                };
                events[event_idx].route_order = order as i32;
                if order > 0 {
                    if let Some(hop) =
                        distances.entity_hop(&plan.route[order - 1], stop_name)
                    {
                        events[event_idx].distance = Some(hop);
                    }
                }
            }
        }

        // 3. 合计
        let mut total = RouteTotal::default();
        for event in events.iter() {
            if event.kind == EventKind::Primary && !event.is_unassigned() {
                if let Some(hop) = event.distance {
                    total.km += hop.km;
                    total.minutes += hop.minutes;
                }
            }
        }
        total
    }
}

impl Default for RouteAssigner {
    fn default() -> Self {
        Self::new()
    }
}
