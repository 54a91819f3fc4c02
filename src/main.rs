// ==========================================
// 供应排程系统 - 演示入口
// ==========================================
// 以内置示例场景跑通完整流水线:
// 批量加载 -> 映射 -> 换入看板 -> 重算 -> 输出指标
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use supply_scheduler::engine::{IdentityRouteSequencer, TracingNotificationPublisher};
use supply_scheduler::importer::{
    AssignmentRecord, BreederProducerDistanceRecord, BreederRecord, LoadResult,
    ProducerProducerDistanceRecord, ProducerRecord, ScenarioDataSource, ScenarioLoader,
    ScenarioMapper, ScheduleRecord,
};
use supply_scheduler::{logging, BoardCommand, SchedulerBoard, SchedulerConfig};

/// 内置示例数据源 (演示用, 远端数据源的替身)
struct SampleDataSource;

#[async_trait]
impl ScenarioDataSource for SampleDataSource {
    async fn fetch_schedules(&self, _set_id: u64) -> LoadResult<Vec<ScheduleRecord>> {
        Ok(vec![ScheduleRecord {
            producer: "P002".to_string(),
            week_in: "2025-W40".to_string(),
        }])
    }

    async fn fetch_breeders(&self, _set_id: u64) -> LoadResult<Vec<BreederRecord>> {
        Ok(vec![
            BreederRecord {
                external_id: "B001".to_string(),
                name: "供应商一号".to_string(),
                capacity: 300.0,
            },
            BreederRecord {
                external_id: "B002".to_string(),
                name: "供应商二号".to_string(),
                capacity: 450.0,
            },
        ])
    }

    async fn fetch_producers(&self, _set_id: u64) -> LoadResult<Vec<ProducerRecord>> {
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
            ProducerRecord {
                external_id: "P003".to_string(),
                name: "P003".to_string(),
                week_in: "2025-W10".to_string(),
                capacity: 150.0,
            },
        ])
    }

    async fn fetch_breeder_producer_distances(
        &self,
        _set_id: u64,
    ) -> LoadResult<Vec<BreederProducerDistanceRecord>> {
        Ok(vec![
            BreederProducerDistanceRecord {
                breeder: "B001".to_string(),
                producer: "P001".to_string(),
                distance_km: 12.5,
                distance_min: 18.0,
            },
            BreederProducerDistanceRecord {
                breeder: "B002".to_string(),
                producer: "P002".to_string(),
                distance_km: 30.0,
                distance_min: 40.0,
            },
        ])
    }

    async fn fetch_producer_producer_distances(
        &self,
        _set_id: u64,
    ) -> LoadResult<Vec<ProducerProducerDistanceRecord>> {
        Ok(vec![ProducerProducerDistanceRecord {
            producer_from: "P001".to_string(),
            producer_to: "P003".to_string(),
            distance_km: 8.0,
            distance_min: 11.0,
        }])
    }

    async fn fetch_assignments(&self, _set_id: u64) -> LoadResult<Vec<AssignmentRecord>> {
        Ok(vec![AssignmentRecord {
            producer_id: None,
            id: Some("G-2025-W10".to_string()),
            breeder_id: Some("B001".to_string()),
            date: "2025-W10".to_string(),
            amount: 350.0,
        }])
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", supply_scheduler::APP_NAME, supply_scheduler::VERSION);
    tracing::info!("==================================================");

    let config = SchedulerConfig::default();
    let loader = ScenarioLoader::new();
    let mapper = ScenarioMapper::new(config.clone());

    // 批量加载 (六类数据集全有或全无)
    let loaded = loader.load(&SampleDataSource, 1).await?;
    loader.ensure_latest(loaded.generation)?;
    let working_set = mapper.map_bundle(loaded.set_id, &loaded.bundle)?;

    // 换入看板并重算
    let mut board = SchedulerBoard::new(
        config,
        Arc::new(TracingNotificationPublisher),
        Arc::new(IdentityRouteSequencer),
    )?;
    let snapshot = board.apply(BoardCommand::Ingest(working_set))?;

    tracing::info!(
        lanes = snapshot.suppliers.len(),
        events = snapshot.events.len(),
        weeks = snapshot.weeks.len(),
        converged = snapshot.converged,
        "看板换入完成"
    );
    tracing::info!(
        over = snapshot.metrics.production.over,
        under = snapshot.metrics.production.under,
        shift_penalty = snapshot.metrics.shift_penalty,
        unassigned_amount = snapshot.metrics.unassigned.amount,
        route_km = snapshot.route_total.km,
        "指标汇总"
    );
    for message in &snapshot.metrics.overflow_messages {
        tracing::info!("超限: {}", message);
    }

    println!("{}", serde_json::to_string_pretty(&snapshot.metrics)?);
    Ok(())
}
