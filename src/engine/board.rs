// ==========================================
// 供应排程系统 - 排程看板引擎 (拥有型门面)
// ==========================================
// 职责: 独占持有工作集 (事件/车道/距离/周区间),
//       以命令驱动状态迁移, 每次迁移后发布不可变快照
// ==========================================
// 红线: 单线程同步; 重算运行至完成才交还控制权
// 红线: 调用方只拿快照, 修改一律走命令
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::calendar::{self, CalendarWeek};
use crate::domain::distance::{DistanceEdge, DistanceSet};
use crate::domain::event::{Event, EventIdGenerator};
use crate::domain::supplier::Supplier;
use crate::engine::allocator::{CapacityAllocator, PlacementRequest};
use crate::engine::error::EngineError;
use crate::engine::events::{Notification, NotificationPublisher};
use crate::engine::metrics::MetricsReport;
use crate::engine::recalc::RecalcEngine;
use crate::engine::relocation::{
    DropPreview, PointerPosition, RelocationOutcome, RelocationValidator,
};
use crate::engine::route::{RouteSequencer, RouteTotal};
use crate::engine::synthesizer::GroupSynthesizer;
use crate::importer::mapper::LoadedWorkingSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// BoardCommand - 看板命令
// ==========================================
#[derive(Debug, Clone)]
pub enum BoardCommand {
    /// 整体换入新工作集 (批量加载成功后)
    Ingest(LoadedWorkingSet),
    /// 批量应用放置愿望清单
    ApplyPlacements(Vec<PlacementRequest>),
    /// 开始拖拽
    BeginDrag { event_id: String },
    /// 拖拽采样 (只更新预览, 不触碰已提交状态)
    DragMove { pointer: PointerPosition },
    /// 拖拽落点 (提交采样)
    EndDrag { anchor: PointerPosition },
    /// 表单编辑事件属性
    EditEvent(EventEdit),
    /// 可见周区间前插/后延一周
    ExtendRange { prepend: bool },
    /// 显式全量重算
    Recompute,
}

/// 表单编辑载荷 (None 字段保持原值)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventEdit {
    pub event_id: String,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub max_shift_early: Option<i64>,
    pub max_shift_late: Option<i64>,
}

// ==========================================
// BoardSnapshot - 已提交状态快照
// ==========================================
// 旁路界面 (导出/指标展示) 消费的发布物
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub suppliers: Vec<Supplier>,
    pub events: Vec<Event>,
    pub distance_edges: Vec<DistanceEdge>,
    pub weeks: Vec<CalendarWeek>,
    pub metrics: MetricsReport,
    pub route_total: RouteTotal,
    pub preview: DropPreview,
    pub converged: bool,
}

// ==========================================
// SchedulerBoard - 看板引擎
// ==========================================
pub struct SchedulerBoard {
    config: SchedulerConfig,
    suppliers: Vec<Supplier>,
    events: Vec<Event>,
    distances: DistanceSet,
    weeks: Vec<CalendarWeek>,
    ids: EventIdGenerator,

    synthesizer: GroupSynthesizer,
    allocator: CapacityAllocator,
    validator: RelocationValidator,
    recalc: RecalcEngine,

    notifier: Arc<dyn NotificationPublisher>,
    sequencer: Arc<dyn RouteSequencer>,

    last_metrics: MetricsReport,
    last_route_total: RouteTotal,
    last_converged: bool,
    preview: DropPreview,
}

impl SchedulerBoard {
    pub fn new(
        config: SchedulerConfig,
        notifier: Arc<dyn NotificationPublisher>,
        sequencer: Arc<dyn RouteSequencer>,
    ) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(Self {
            synthesizer: GroupSynthesizer::new(),
            allocator: CapacityAllocator::new(),
            validator: RelocationValidator::new(config.clone()),
            recalc: RecalcEngine::new(config.clone()),
            config,
            suppliers: Vec::new(),
            events: Vec::new(),
            distances: DistanceSet::default(),
            weeks: Vec::new(),
            ids: EventIdGenerator::new(),
            notifier,
            sequencer,
            last_metrics: MetricsReport::default(),
            last_route_total: RouteTotal::default(),
            last_converged: true,
            preview: DropPreview::hidden(),
        })
    }

    /// 命令入口: 同步执行到完成, 返回新快照
    #[instrument(skip(self, command))]
    pub fn apply(&mut self, command: BoardCommand) -> anyhow::Result<BoardSnapshot> {
        match command {
            BoardCommand::Ingest(set) => self.ingest(set),
            BoardCommand::ApplyPlacements(requests) => self.apply_placements(requests),
            BoardCommand::BeginDrag { event_id } => self.begin_drag(&event_id)?,
            BoardCommand::DragMove { pointer } => self.drag_move(pointer),
            BoardCommand::EndDrag { anchor } => self.end_drag(anchor)?,
            BoardCommand::EditEvent(edit) => self.edit_event(edit)?,
            BoardCommand::ExtendRange { prepend } => self.extend_range(prepend),
            BoardCommand::Recompute => self.recompute(),
        }
        Ok(self.snapshot())
    }

    /// 当前快照 (不执行任何迁移)
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            suppliers: self.suppliers.clone(),
            events: self.events.clone(),
            distance_edges: self.distances.edges.clone(),
            weeks: self.weeks.clone(),
            metrics: self.last_metrics.clone(),
            route_total: self.last_route_total,
            preview: self.preview.clone(),
            converged: self.last_converged,
        }
    }

    /// 工作集总量 (车道上 + 待分配池); 守恒性检查入口
    pub fn total_amount(&self) -> f64 {
        self.events.iter().map(|e| e.amount).sum()
    }

    // ==========================================
    // 命令处理
    // ==========================================

    /// 整体换入: 合成组事件 -> 应用已提交放置 -> 重算
    fn ingest(&mut self, set: LoadedWorkingSet) {
        self.suppliers = set.suppliers;
        self.distances = set.distances;
        self.ids = EventIdGenerator::new();
        self.preview = DropPreview::hidden();

        let primaries = set.primary_events;
        let groups = self.synthesizer.synthesize(&primaries, &mut self.ids);

        let mut events = primaries;
        events.extend(groups);
        self.events = events;

        self.ensure_unassigned_lane();
        let (events, summary) = self.allocator.apply_placements(
            std::mem::take(&mut self.events),
            &self.suppliers,
            &set.group_placements,
            &mut self.ids,
        );
        self.events = events;
        tracing::info!(
            placed = summary.placed,
            dropped = summary.dropped,
            refused = summary.refused,
            "已提交放置应用完成"
        );

        self.ensure_unassigned_lane();
        self.derive_week_range();
        self.recompute();
    }

    fn apply_placements(&mut self, requests: Vec<PlacementRequest>) {
        let (events, _summary) = self.allocator.apply_placements(
            std::mem::take(&mut self.events),
            &self.suppliers,
            &requests,
            &mut self.ids,
        );
        self.events = events;
        self.ensure_unassigned_lane();
        self.recompute();
    }

    fn begin_drag(&mut self, event_id: &str) -> anyhow::Result<()> {
        let event = self
            .events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| EngineError::EventNotFound(event_id.to_string()))?
            .clone();
        self.validator.begin_drag(&event)?;
        // 初始预览停在事件当前位置
        self.preview = self.validator.preview_at(
            PointerPosition {
                x: event.left_offset,
                y: event.top_offset,
            },
            &self.suppliers,
            &self.weeks,
        );
        Ok(())
    }

    /// 拖拽采样: 只刷新预览结构, 已提交事件集不动
    fn drag_move(&mut self, pointer: PointerPosition) {
        if matches!(self.validator.state(), crate::engine::relocation::DragState::Idle) {
            return;
        }
        self.preview = self
            .validator
            .preview_at(pointer, &self.suppliers, &self.weeks);
    }

    fn end_drag(&mut self, anchor: PointerPosition) -> anyhow::Result<()> {
        self.preview = DropPreview::hidden();
        let outcome = self.validator.end_drag(
            &mut self.events,
            &self.suppliers,
            &self.weeks,
            anchor,
            &mut self.ids,
        )?;

        match outcome {
            RelocationOutcome::Rejected { event_id, reason } => {
                tracing::info!(event_id = %event_id, "重定位被拒绝: {}", reason);
                self.notify(reason.user_message());
            }
            RelocationOutcome::Accepted { snap_back, .. } => {
                if let Some(notice) = snap_back {
                    self.notify(notice.user_message());
                }
                self.ensure_unassigned_lane();
                self.recompute();
            }
        }
        Ok(())
    }

    /// 表单编辑: 更新属性后按周产能溢出拆分, 再全量重算
    fn edit_event(&mut self, edit: EventEdit) -> anyhow::Result<()> {
        let idx = self
            .events
            .iter()
            .position(|e| e.id == edit.event_id)
            .ok_or_else(|| EngineError::EventNotFound(edit.event_id.clone()))?;

        if let Some(name) = edit.name {
            self.events[idx].name = name;
        }
        if let Some(amount) = edit.amount {
            self.events[idx].amount = amount;
        }
        if let Some(early) = edit.max_shift_early {
            self.events[idx].max_shift_early = early;
        }
        if let Some(late) = edit.max_shift_late {
            self.events[idx].max_shift_late = late;
        }

        self.spill_edit_excess(idx);
        self.ensure_unassigned_lane();
        self.recompute();
        Ok(())
    }

    /// 编辑后的产能溢出: 同周同车道合计超申报的部分回待分配池
    fn spill_edit_excess(&mut self, idx: usize) {
        let lane_id = self.events[idx].lane_id.clone();
        let Some(lane) = self.suppliers.iter().find(|s| s.id == lane_id) else {
            return;
        };
        if lane.is_unassigned() || lane.declared_capacity <= 0.0 {
            return;
        }
        let declared = lane.declared_capacity;

        let week = self.events[idx].start_week.clone();
        let event_id = self.events[idx].id.clone();
        let others: f64 = self
            .events
            .iter()
            .filter(|e| e.lane_id == lane_id && e.start_week == week && e.id != event_id)
            .map(|e| e.amount)
            .sum();
        let total = others + self.events[idx].amount;
        if total <= declared {
            return;
        }

        let excess = (total - declared).min(self.events[idx].amount);
        self.events[idx].amount -= excess;
        let template = self.events[idx].clone();
        self.allocator
            .spill_excess(&mut self.events, &template, &week, excess, &mut self.ids);
    }

    /// 周区间前插/后延一周
    fn extend_range(&mut self, prepend: bool) {
        if self.weeks.is_empty() {
            return;
        }
        if prepend {
            let first = self.weeks[0].clone();
            self.weeks.insert(0, calendar::add_weeks(&first, -1));
        } else {
            let last = self.weeks[self.weeks.len() - 1].clone();
            self.weeks.push(calendar::add_weeks(&last, 1));
        }
        self.recompute();
    }

    /// 全量重算: 分配后 -> 布局 -> 指标 (有界不动点)
    fn recompute(&mut self) {
        let result = self.recalc.recompute(
            &mut self.events,
            &mut self.suppliers,
            &mut self.weeks,
            &self.distances,
            self.sequencer.as_ref(),
        );
        self.last_metrics = result.metrics;
        self.last_route_total = result.route_total;
        self.last_converged = result.converged;
    }

    // ==========================================
    // 内部维护
    // ==========================================

    /// 待分配哨兵车道维护
    ///
    /// 有事件指向待分配池时保证哨兵存在且位于首位;
    /// 申报产能自动增长到观测过的最大单笔待分配量 (从不收缩)
    fn ensure_unassigned_lane(&mut self) {
        let max_unassigned = self
            .events
            .iter()
            .filter(|e| e.is_unassigned())
            .map(|e| e.amount)
            .fold(None::<f64>, |acc, amount| {
                Some(acc.map_or(amount, |a| a.max(amount)))
            });
        let Some(max_unassigned) = max_unassigned else {
            return;
        };

        if !self.suppliers.first().map_or(false, |s| s.is_unassigned()) {
            if let Some(pos) = self.suppliers.iter().position(|s| s.is_unassigned()) {
                let sentinel = self.suppliers.remove(pos);
                self.suppliers.insert(0, sentinel);
            } else {
                self.suppliers.insert(0, Supplier::unassigned());
            }
        }

        let sentinel = &mut self.suppliers[0];
        if max_unassigned > sentinel.declared_capacity {
            sentinel.declared_capacity = max_unassigned;
            sentinel.peak_capacity = max_unassigned;
        }
    }

    /// 可见周区间 = 全部事件的最早起始周 .. 最晚结束周
    fn derive_week_range(&mut self) {
        let mut earliest: Option<CalendarWeek> = None;
        let mut latest: Option<CalendarWeek> = None;
        for event in &self.events {
            if let Ok(start) = calendar::parse_week(&event.start_week) {
                earliest = Some(match earliest {
                    Some(current) if current.monday() <= start.monday() => current,
                    _ => start,
                });
            }
            if let Ok(end) = calendar::parse_week(&event.end_week) {
                latest = Some(match latest {
                    Some(current) if current.monday() >= end.monday() => current,
                    _ => end,
                });
            }
        }
        self.weeks = match (earliest, latest) {
            (Some(a), Some(b)) => calendar::enumerate_range(&a, &b),
            _ => Vec::new(),
        };
    }

    fn notify(&self, message: String) {
        self.notifier.publish(Notification::new(
            message,
            self.config.notification_duration_ms,
        ));
    }
}
