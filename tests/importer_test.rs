// ==========================================
// 导入层测试
// ==========================================
// 测试目标: 全有或全无合流、代际号防过期覆盖、记录映射与对账
// ==========================================

use async_trait::async_trait;
use supply_scheduler::config::SchedulerConfig;
use supply_scheduler::domain::{EventKind, UNASSIGNED_LANE_ID};
use supply_scheduler::importer::{
    AssignmentRecord, BreederProducerDistanceRecord, BreederRecord, LoadError, LoadResult,
    ProducerProducerDistanceRecord, ProducerRecord, ScenarioBundle, ScenarioDataSource,
    ScenarioLoader, ScenarioMapper, ScheduleRecord,
};

// ==========================================
// 测试辅助: 固定数据源
// ==========================================

struct StaticSource {
    fail_producers: bool,
}

#[async_trait]
impl ScenarioDataSource for StaticSource {
    async fn fetch_schedules(&self, _set_id: u64) -> LoadResult<Vec<ScheduleRecord>> {
        Ok(vec![ScheduleRecord {
            producer: "P002".to_string(),
            week_in: "2025-W40".to_string(),
        }])
    }

    async fn fetch_breeders(&self, _set_id: u64) -> LoadResult<Vec<BreederRecord>> {
        Ok(vec![BreederRecord {
            external_id: "B001".to_string(),
            name: "一号".to_string(),
            capacity: 300.0,
        }])
    }

    async fn fetch_producers(&self, set_id: u64) -> LoadResult<Vec<ProducerRecord>> {
        if self.fail_producers {
            return Err(LoadError::FetchFailed {
                collection: "producers",
                set_id,
                message: "连接超时".to_string(),
            });
        }
        Ok(vec![
            ProducerRecord {
                external_id: "P001".to_string(),
                name: "P001".to_string(),
                week_in: "2025-W10".to_string(),
                capacity: 200.0,
            },
            ProducerRecord {
                external_id: "P002".to_string(),
                name: "P002".to_string(),
                week_in: "2025-W12".to_string(),
                capacity: 350.0,
            },
        ])
    }

    async fn fetch_breeder_producer_distances(
        &self,
        _set_id: u64,
    ) -> LoadResult<Vec<BreederProducerDistanceRecord>> {
        Ok(Vec::new())
    }

    async fn fetch_producer_producer_distances(
        &self,
        _set_id: u64,
    ) -> LoadResult<Vec<ProducerProducerDistanceRecord>> {
        Ok(Vec::new())
    }

    async fn fetch_assignments(&self, _set_id: u64) -> LoadResult<Vec<AssignmentRecord>> {
        Ok(Vec::new())
    }
}

// ==========================================
// 测试用例 1: 六类数据集全有或全无
// ==========================================

#[tokio::test]
async fn test_load_all_or_nothing() {
    let loader = ScenarioLoader::new();

    let ok = loader.load(&StaticSource { fail_producers: false }, 1).await;
    assert!(ok.is_ok());

    let err = loader.load(&StaticSource { fail_producers: true }, 1).await;
    assert!(matches!(err, Err(LoadError::FetchFailed { collection: "producers", .. })));
}

// ==========================================
// 测试用例 2: 代际号丢弃过期结果
// ==========================================

#[tokio::test]
async fn test_generation_token_discards_stale_load() {
    let loader = ScenarioLoader::new();
    let source = StaticSource { fail_producers: false };

    let first = loader.load(&source, 1).await.unwrap();
    let second = loader.load(&source, 2).await.unwrap();

    // 后到的第二次加载把第一次判为过期
    assert!(loader.is_latest(second.generation));
    assert!(!loader.is_latest(first.generation));
    assert!(matches!(
        loader.ensure_latest(first.generation),
        Err(LoadError::StaleGeneration { .. })
    ));
    assert!(loader.ensure_latest(second.generation).is_ok());
}

// ==========================================
// 测试用例 3: 排程覆写 (跨度止于入栏周)
// ==========================================

#[test]
fn test_mapper_schedule_override() {
    let mapper = ScenarioMapper::new(SchedulerConfig::default());
    let bundle = ScenarioBundle {
        schedules: vec![ScheduleRecord {
            producer: "P002".to_string(),
            week_in: "2025-W40".to_string(),
        }],
        producers: vec![
            ProducerRecord {
                external_id: "P001".to_string(),
                name: "P001".to_string(),
                week_in: "2025-W10".to_string(),
                capacity: 200.0,
            },
            ProducerRecord {
                external_id: "P002".to_string(),
                name: "P002".to_string(),
                week_in: "2025-W12".to_string(),
                capacity: 350.0,
            },
        ],
        ..ScenarioBundle::default()
    };

    let set = mapper.map_bundle(1, &bundle).unwrap();
    assert_eq!(set.primary_events.len(), 2);

    // P001 无覆写: 起始周 = 自报入栏周
    let p1 = set.primary_events.iter().find(|e| e.name == "P001").unwrap();
    assert_eq!(p1.start_week, "2025-W10");
    assert_eq!(p1.lane_id, UNASSIGNED_LANE_ID);

    // P002 覆写: 起始周 = W40 - 17 = W23, 跨度恰好止于 W40
    let p2 = set.primary_events.iter().find(|e| e.name == "P002").unwrap();
    assert_eq!(p2.start_week, "2025-W23");
    assert_eq!(p2.end_week, "2025-W40");
}

// ==========================================
// 测试用例 4: 周标识非法的记录被跳过
// ==========================================

#[test]
fn test_mapper_skips_malformed_week() {
    let mapper = ScenarioMapper::new(SchedulerConfig::default());
    let bundle = ScenarioBundle {
        producers: vec![
            ProducerRecord {
                external_id: "P001".to_string(),
                name: "P001".to_string(),
                week_in: "not-a-week".to_string(),
                capacity: 200.0,
            },
            ProducerRecord {
                external_id: "P002".to_string(),
                name: "P002".to_string(),
                week_in: "2025 w12".to_string(),
                capacity: 350.0,
            },
        ],
        ..ScenarioBundle::default()
    };

    let set = mapper.map_bundle(1, &bundle).unwrap();
    // 非法周被跳过, 宽松格式被归一化
    assert_eq!(set.primary_events.len(), 1);
    assert_eq!(set.primary_events[0].name, "P002");
    assert_eq!(set.primary_events[0].start_week, "2025-W12");
}

// ==========================================
// 测试用例 5: 已提交记录按 (name, kind) 对账
// ==========================================

#[test]
fn test_mapper_reconciles_committed_primary() {
    let mapper = ScenarioMapper::new(SchedulerConfig::default());
    let bundle = ScenarioBundle {
        producers: vec![ProducerRecord {
            external_id: "P001".to_string(),
            name: "P001".to_string(),
            week_in: "2025-W10".to_string(),
            capacity: 200.0,
        }],
        assignments: vec![AssignmentRecord {
            producer_id: Some("P001".to_string()),
            id: None,
            breeder_id: Some("B001".to_string()),
            date: "2025-W14".to_string(),
            amount: 180.0,
        }],
        ..ScenarioBundle::default()
    };

    let set = mapper.map_bundle(1, &bundle).unwrap();
    assert_eq!(set.primary_events.len(), 1);

    let p1 = &set.primary_events[0];
    // 已提交记录胜出: 起始周/车道/量来自记录
    assert_eq!(p1.start_week, "2025-W14");
    assert_eq!(p1.lane_id, "B001");
    assert_eq!(p1.amount, 180.0);
    assert_eq!(p1.kind, EventKind::Primary);
    // 请求周保留种子值 (位移惩罚基准)
    assert_eq!(p1.requested_week, "2025-W10");
}

// ==========================================
// 测试用例 6: 组事件对账进入放置愿望清单
// ==========================================

#[test]
fn test_mapper_group_assignments_become_placements() {
    let mapper = ScenarioMapper::new(SchedulerConfig::default());
    let bundle = ScenarioBundle {
        producers: vec![ProducerRecord {
            external_id: "P001".to_string(),
            name: "P001".to_string(),
            week_in: "2025-W10".to_string(),
            capacity: 200.0,
        }],
        assignments: vec![
            AssignmentRecord {
                producer_id: None,
                id: Some("G-1".to_string()),
                breeder_id: Some("B001".to_string()),
                date: "2025-W10".to_string(),
                amount: 350.0,
            },
            // 目标为待分配池的记录不产生愿望
            AssignmentRecord {
                producer_id: None,
                id: Some("G-2".to_string()),
                breeder_id: Some(UNASSIGNED_LANE_ID.to_string()),
                date: "2025-W12".to_string(),
                amount: 100.0,
            },
        ],
        ..ScenarioBundle::default()
    };

    let set = mapper.map_bundle(1, &bundle).unwrap();
    assert_eq!(set.group_placements.len(), 1);
    assert_eq!(set.group_placements[0].start_week, "2025-W10");
    assert_eq!(set.group_placements[0].target_lane_id, "B001");
}

// ==========================================
// 测试用例 7: 空场景报错
// ==========================================

#[test]
fn test_mapper_empty_scenario() {
    let mapper = ScenarioMapper::new(SchedulerConfig::default());
    let bundle = ScenarioBundle::default();
    assert!(matches!(
        mapper.map_bundle(7, &bundle),
        Err(LoadError::EmptyScenario { set_id: 7 })
    ));
}
