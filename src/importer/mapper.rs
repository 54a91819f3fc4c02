// ==========================================
// 供应排程系统 - 入站记录映射
// ==========================================
// 职责: 六类记录集合 -> 工作集 (供应商/主事件/放置愿望/距离)
// 红线: 周标识非法的记录按"跳过"降级并记诊断, 不中止映射
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::calendar;
use crate::domain::distance::{DistanceEdge, DistanceSet, HopDistance};
use crate::domain::event::{Event, PRIMARY_SPAN_WEEKS, UNASSIGNED_LANE_ID};
use crate::domain::supplier::Supplier;
use crate::domain::types::EventKind;
use crate::engine::allocator::PlacementRequest;
use crate::importer::error::{LoadError, LoadResult};
use crate::importer::records::{AssignmentRecord, ScenarioBundle};
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// LoadedWorkingSet - 映射产物
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct LoadedWorkingSet {
    pub suppliers: Vec<Supplier>,
    /// 主事件 (种子与已提交记录按 (name, kind) 对账后的结果)
    pub primary_events: Vec<Event>,
    /// 已提交组事件放置 -> 分配引擎愿望清单
    pub group_placements: Vec<PlacementRequest>,
    pub distances: DistanceSet,
}

// ==========================================
// ScenarioMapper - 场景映射器
// ==========================================
pub struct ScenarioMapper {
    config: SchedulerConfig,
}

impl ScenarioMapper {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// 场景数据集合 -> 工作集
    ///
    /// 1) breeders -> 供应商车道
    /// 2) producers (+ schedules 覆写) -> 主事件种子;
    ///    覆写时种子起始周 = 入栏周 - (主跨度 - 1), 使跨度恰好止于入栏周
    /// 3) assignments -> 已提交放置: F 记录按 (name, kind) 对账替换种子,
    ///    M 记录进入分配愿望清单
    /// 4) 两类距离记录 -> 距离边集合
    #[instrument(skip(self, bundle), fields(
        producer_count = bundle.producers.len(),
        assignment_count = bundle.assignments.len()
    ))]
    pub fn map_bundle(&self, set_id: u64, bundle: &ScenarioBundle) -> LoadResult<LoadedWorkingSet> {
        // ===== 供应商 =====
        let suppliers: Vec<Supplier> = bundle
            .breeders
            .iter()
            .map(|record| Supplier::new(&record.external_id, &record.name, record.capacity))
            .collect();

        // ===== 主事件种子 =====
        // BTreeMap 按 (name, kind) 对账: 后写覆盖, 已提交记录胜出
        let mut reconciled: BTreeMap<(String, EventKind), Event> = BTreeMap::new();
        for producer in &bundle.producers {
            let schedule = bundle
                .schedules
                .iter()
                .find(|s| s.producer == producer.external_id);

            let requested_week = match schedule {
                Some(schedule) => match calendar::parse_loose(&schedule.week_in) {
                    Ok(week_in) => {
                        // 覆写: 起始周回退到入栏周前 (跨度止于入栏周)
                        let start = calendar::add_weeks(&week_in, -(PRIMARY_SPAN_WEEKS - 1));
                        calendar::format_week(&start)
                    }
                    Err(err) => {
                        tracing::warn!(
                            producer = %producer.external_id,
                            "排程覆写周标识非法, 回退到需求方自报周: {}",
                            err
                        );
                        match calendar::parse_loose(&producer.week_in) {
                            Ok(week) => calendar::format_week(&week),
                            Err(_) => continue,
                        }
                    }
                },
                None => match calendar::parse_loose(&producer.week_in) {
                    Ok(week) => calendar::format_week(&week),
                    Err(err) => {
                        tracing::warn!(
                            producer = %producer.external_id,
                            "需求方周标识非法, 跳过记录: {}",
                            err
                        );
                        continue;
                    }
                },
            };

            match Event::new(
                format!("{}_{}", producer.external_id, producer.week_in),
                &producer.name,
                EventKind::Primary,
                producer.capacity,
                &requested_week,
                UNASSIGNED_LANE_ID,
            ) {
                Ok(mut event) => {
                    event.max_shift_early = self.config.default_max_shift_early;
                    event.max_shift_late = self.config.default_max_shift_late;
                    reconciled.insert((event.name.clone(), EventKind::Primary), event);
                }
                Err(err) => {
                    tracing::warn!(producer = %producer.external_id, "主事件构造失败, 跳过: {}", err);
                }
            }
        }

        // ===== 已提交放置对账 =====
        let mut group_placements = Vec::new();
        for assignment in &bundle.assignments {
            match &assignment.producer_id {
                Some(producer_id) => {
                    self.reconcile_primary(assignment, producer_id, &mut reconciled)
                }
                None => {
                    // 组事件放置愿望: 周 + 目标车道
                    let Ok(week) = calendar::parse_loose(&assignment.date) else {
                        tracing::warn!(date = %assignment.date, "对账记录周标识非法, 跳过");
                        continue;
                    };
                    let Some(breeder_id) = assignment.breeder_id.as_deref() else {
                        continue;
                    };
                    if breeder_id == UNASSIGNED_LANE_ID {
                        continue;
                    }
                    group_placements.push(PlacementRequest {
                        start_week: calendar::format_week(&week),
                        target_lane_id: breeder_id.to_string(),
                    });
                }
            }
        }

        // ===== 距离边 =====
        let mut edges = Vec::with_capacity(
            bundle.breeder_producer_distances.len() + bundle.producer_producer_distances.len(),
        );
        for record in &bundle.breeder_producer_distances {
            edges.push(DistanceEdge::LaneToEntity {
                lane_id: record.breeder.clone(),
                entity_id: record.producer.clone(),
                distance: HopDistance {
                    km: record.distance_km,
                    minutes: record.distance_min,
                },
            });
        }
        for record in &bundle.producer_producer_distances {
            edges.push(DistanceEdge::EntityToEntity {
                from_id: record.producer_from.clone(),
                to_id: record.producer_to.clone(),
                distance: HopDistance {
                    km: record.distance_km,
                    minutes: record.distance_min,
                },
            });
        }

        let primary_events: Vec<Event> = reconciled.into_values().collect();
        if primary_events.is_empty() && group_placements.is_empty() {
            return Err(LoadError::EmptyScenario { set_id });
        }

        Ok(LoadedWorkingSet {
            suppliers,
            primary_events,
            group_placements,
            distances: DistanceSet::new(edges),
        })
    }

    /// 已提交主事件对账: 起始周/车道/量取已提交记录,
    /// 请求周与位移约束保留种子值 (惩罚基准不随历史排程漂移)
    fn reconcile_primary(
        &self,
        assignment: &AssignmentRecord,
        producer_id: &str,
        reconciled: &mut BTreeMap<(String, EventKind), Event>,
    ) {
        let Ok(start) = calendar::parse_loose(&assignment.date) else {
            tracing::warn!(date = %assignment.date, "已提交主事件周标识非法, 跳过");
            return;
        };
        let start_week = calendar::format_week(&start);
        let lane_id = assignment
            .breeder_id
            .clone()
            .unwrap_or_else(|| UNASSIGNED_LANE_ID.to_string());

        let key = (producer_id.to_string(), EventKind::Primary);
        let (requested_week, max_shift_early, max_shift_late) = match reconciled.get(&key) {
            Some(seed) => (
                seed.requested_week.clone(),
                seed.max_shift_early,
                seed.max_shift_late,
            ),
            None => (
                start_week.clone(),
                self.config.default_max_shift_early,
                self.config.default_max_shift_late,
            ),
        };

        match Event::with_start(
            format!("{}_{}", producer_id, assignment.date),
            producer_id,
            EventKind::Primary,
            assignment.amount,
            &requested_week,
            &start_week,
            lane_id,
        ) {
            Ok(mut event) => {
                event.max_shift_early = max_shift_early;
                event.max_shift_late = max_shift_late;
                reconciled.insert(key, event);
            }
            Err(err) => {
                tracing::warn!(producer = %producer_id, "已提交主事件构造失败, 跳过: {}", err);
            }
        }
    }
}
