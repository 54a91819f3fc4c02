// ==========================================
// 供应排程系统 - 批量加载器
// ==========================================
// 职责: 并发拉取六类数据集并整体合流 (全有或全无);
//       以单调代际号丢弃被更新请求超越的过期结果
// ==========================================
// 红线: 任一数据集失败则整次加载失败, 不产生部分变更
// ==========================================

use crate::importer::error::{LoadError, LoadResult};
use crate::importer::records::{
    AssignmentRecord, BreederProducerDistanceRecord, BreederRecord,
    ProducerProducerDistanceRecord, ProducerRecord, ScenarioBundle, ScheduleRecord,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::instrument;

// ==========================================
// 数据源 Trait (不透明远端提供方)
// ==========================================
#[async_trait]
pub trait ScenarioDataSource: Send + Sync {
    async fn fetch_schedules(&self, set_id: u64) -> LoadResult<Vec<ScheduleRecord>>;
    async fn fetch_breeders(&self, set_id: u64) -> LoadResult<Vec<BreederRecord>>;
    async fn fetch_producers(&self, set_id: u64) -> LoadResult<Vec<ProducerRecord>>;
    async fn fetch_breeder_producer_distances(
        &self,
        set_id: u64,
    ) -> LoadResult<Vec<BreederProducerDistanceRecord>>;
    async fn fetch_producer_producer_distances(
        &self,
        set_id: u64,
    ) -> LoadResult<Vec<ProducerProducerDistanceRecord>>;
    async fn fetch_assignments(&self, set_id: u64) -> LoadResult<Vec<AssignmentRecord>>;
}

// ==========================================
// LoadedGeneration - 带代际号的加载结果
// ==========================================
#[derive(Debug, Clone)]
pub struct LoadedGeneration {
    pub generation: u64,
    pub set_id: u64,
    pub bundle: ScenarioBundle,
}

// ==========================================
// ScenarioLoader - 场景加载器
// ==========================================
// 每次 load 领取一个单调递增代际号; 提交前用
// ensure_latest 把关, 被超越的结果直接丢弃
#[derive(Debug, Default)]
pub struct ScenarioLoader {
    current_generation: AtomicU64,
}

impl ScenarioLoader {
    pub fn new() -> Self {
        Self {
            current_generation: AtomicU64::new(0),
        }
    }

    /// 并发拉取六类数据集, 整体合流
    ///
    /// 任一拉取失败即整体失败; 成功时返回带代际号的完整集合
    #[instrument(skip(self, source))]
    pub async fn load(
        &self,
        source: &dyn ScenarioDataSource,
        set_id: u64,
    ) -> LoadResult<LoadedGeneration> {
        let generation = self.current_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(generation, set_id, "开始批量加载");

        let (
            schedules,
            breeders,
            producers,
            breeder_producer_distances,
            producer_producer_distances,
            assignments,
        ) = futures::try_join!(
            source.fetch_schedules(set_id),
            source.fetch_breeders(set_id),
            source.fetch_producers(set_id),
            source.fetch_breeder_producer_distances(set_id),
            source.fetch_producer_producer_distances(set_id),
            source.fetch_assignments(set_id),
        )?;

        tracing::info!(
            generation,
            producers = producers.len(),
            breeders = breeders.len(),
            assignments = assignments.len(),
            "批量加载完成"
        );
        Ok(LoadedGeneration {
            generation,
            set_id,
            bundle: ScenarioBundle {
                schedules,
                breeders,
                producers,
                breeder_producer_distances,
                producer_producer_distances,
                assignments,
            },
        })
    }

    /// 该代际号是否仍是最新一次加载
    pub fn is_latest(&self, generation: u64) -> bool {
        generation == self.current_generation.load(Ordering::SeqCst)
    }

    /// 提交前把关: 结果过期返回 `StaleGeneration`
    pub fn ensure_latest(&self, generation: u64) -> LoadResult<()> {
        let current = self.current_generation.load(Ordering::SeqCst);
        if generation != current {
            tracing::warn!(generation, current, "丢弃过期加载结果");
            return Err(LoadError::StaleGeneration {
                generation,
                current,
            });
        }
        Ok(())
    }
}
