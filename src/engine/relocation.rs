// ==========================================
// 供应排程系统 - 重定位校验引擎 (状态机)
// ==========================================
// 状态: Idle -> Dragging -> (Accepted | Rejected) -> Idle
// 职责: 拖拽吸附、车道解析、业务规则校验、接受/拒绝裁决
// ==========================================
// 红线: 拒绝即回退, 不得破坏已提交状态
// 红线: 拖拽过程中的位置采样只产生预览, 终点采样才提交
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::calendar::{self, CalendarWeek};
use crate::domain::event::{Event, EventIdGenerator, UNASSIGNED_LANE_ID};
use crate::domain::supplier::Supplier;
use crate::domain::types::EventKind;
use crate::engine::allocator::{unassigned_group_total, CapacityAllocator};
use crate::engine::error::{EngineError, EngineResult, RelocationError};
use crate::i18n;
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// 拖拽状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragState {
    Idle,
    Dragging { event_id: String, kind: EventKind },
}

// ==========================================
// PointerPosition - 拖拽锚点 (网格内容坐标系)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

// ==========================================
// DropPreview - 落点预览 (瞬态视觉结构)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPreview {
    pub show: bool,
    pub col_left: f64,
    pub row_top: f64,
    pub row_height: f64,
    pub ghost_left: f64,
    pub ghost_width: f64,
    pub valid: bool,
}

impl DropPreview {
    pub fn hidden() -> Self {
        Self {
            show: false,
            col_left: 0.0,
            row_top: 0.0,
            row_height: 0.0,
            ghost_left: 0.0,
            ghost_width: 0.0,
            valid: true,
        }
    }
}

// ==========================================
// RelocationOutcome - 裁决结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum RelocationOutcome {
    /// 接受; snap_back 非空表示周被回弹到请求周并需提示
    Accepted {
        event_id: String,
        snap_back: Option<RelocationError>,
    },
    /// 拒绝: 回退到拖拽前位置并提示
    Rejected {
        event_id: String,
        reason: RelocationError,
    },
}

impl RelocationError {
    /// 用户可见提示文案
    pub fn user_message(&self) -> String {
        match self {
            RelocationError::GroupWeekLocked { .. } => i18n::t("relocation.group_week_locked"),
            RelocationError::MissingUnassignedGroup { amount, .. } => i18n::t_with_args(
                "relocation.missing_unassigned_group",
                &[("amount", &format!("{}", amount))],
            ),
            RelocationError::PartialOverlap { .. } => i18n::t("relocation.partial_overlap"),
            RelocationError::RequestedWeekSnapBack { .. } => {
                i18n::t("relocation.requested_week_snap_back")
            }
        }
    }
}

// ==========================================
// RelocationValidator - 重定位校验引擎
// ==========================================
pub struct RelocationValidator {
    config: SchedulerConfig,
    state: DragState,
    allocator: CapacityAllocator,
}

impl RelocationValidator {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
            allocator: CapacityAllocator::new(),
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// 进入 Dragging 状态
    pub fn begin_drag(&mut self, event: &Event) -> EngineResult<()> {
        if let DragState::Dragging { event_id, .. } = &self.state {
            return Err(EngineError::InvalidDragState(format!(
                "已有事件处于拖拽中: {}",
                event_id
            )));
        }
        self.state = DragState::Dragging {
            event_id: event.id.clone(),
            kind: event.kind,
        };
        Ok(())
    }

    /// 取消拖拽, 回到 Idle
    pub fn cancel_drag(&mut self) {
        self.state = DragState::Idle;
    }

    /// 拖拽过程采样 -> 落点预览 (廉价计算, 不触碰已提交状态)
    ///
    /// 列吸附取指针所在列 (floor), 车道按累计行高带查找;
    /// 指针落在全部车道带之外时退回最后一条车道带
    pub fn preview_at(
        &self,
        pointer: PointerPosition,
        suppliers: &[Supplier],
        weeks: &[CalendarWeek],
    ) -> DropPreview {
        if weeks.is_empty() || suppliers.is_empty() {
            return DropPreview::hidden();
        }

        let col_count = weeks.len() as i64;
        let mut col_idx = (pointer.x / self.config.week_column_width).floor() as i64;
        col_idx = col_idx.clamp(0, col_count - 1);
        let col_left = col_idx as f64 * self.config.week_column_width;

        let mut row_top = 0.0;
        let mut row_height = 0.0;
        let mut acc_top = 0.0;
        for supplier in suppliers {
            let height = supplier.effective_capacity() * self.config.amount_unit_height;
            if pointer.y >= acc_top && pointer.y < acc_top + height {
                row_top = acc_top;
                row_height = height;
                break;
            }
            acc_top += height;
        }
        if row_height == 0.0 {
            if let Some(last) = suppliers.last() {
                row_height = last.effective_capacity() * self.config.amount_unit_height;
                row_top = acc_top - row_height;
            }
        }

        DropPreview {
            show: true,
            col_left,
            row_top,
            row_height,
            ghost_left: col_left,
            ghost_width: self.config.week_column_width,
            valid: true,
        }
    }

    /// 拖拽终点裁决并应用
    ///
    /// `anchor` 为被拖块左上角的内容坐标 (周列吸附取 round)
    ///
    /// # 裁决规则
    /// 1) 组事件(M)改周 -> 拒绝
    /// 2) 主事件(F)落待分配池且周 != 请求周 -> 周回弹到请求周并提示
    /// 3) 主事件改周 -> 原周待分配组事件必须足量承接改签
    /// 4) 真实目标车道上存在部分(非完全)周重叠 -> 拒绝
    /// 5) 组事件上道超产能 -> 超限量按分配规则溢出回待分配池
    /// 6) 组事件回池 -> 该周既有待分配组事件并入被拖块
    #[instrument(skip(self, events, suppliers, weeks, anchor, ids), fields(anchor_x = anchor.x, anchor_y = anchor.y))]
    pub fn end_drag(
        &mut self,
        events: &mut Vec<Event>,
        suppliers: &[Supplier],
        weeks: &[CalendarWeek],
        anchor: PointerPosition,
        ids: &mut EventIdGenerator,
    ) -> EngineResult<RelocationOutcome> {
        let DragState::Dragging { event_id, .. } = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return Err(EngineError::InvalidDragState("当前无拖拽事件".to_string()));
        };

        let event_idx = events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or_else(|| EngineError::EventNotFound(event_id.clone()))?;
        let original = events[event_idx].clone();

        // ===== 周列吸附 (round, 截断到可见区间) =====
        let mut new_start_week = original.start_week.clone();
        if !weeks.is_empty() {
            let col_idx = (anchor.x / self.config.week_column_width).round() as i64;
            let col_idx = col_idx.clamp(0, weeks.len() as i64 - 1) as usize;
            new_start_week = calendar::format_week(&weeks[col_idx]);
        }

        // ===== 车道带解析 (无命中保持原车道) =====
        let mut new_lane_id = original.lane_id.clone();
        let mut acc_top = 0.0;
        for supplier in suppliers {
            let height = supplier.effective_capacity() * self.config.amount_unit_height;
            if anchor.y >= acc_top && anchor.y < acc_top + height {
                new_lane_id = supplier.id.clone();
                break;
            }
            acc_top += height;
        }

        // ===== 规则 1: 组事件周跨度锁定 =====
        if original.kind == EventKind::Group && new_start_week != original.start_week {
            return Ok(RelocationOutcome::Rejected {
                event_id,
                reason: RelocationError::GroupWeekLocked {
                    event_id: original.id.clone(),
                },
            });
        }

        // ===== 规则 2: 主事件落待分配池只停请求周 =====
        let mut snap_back = None;
        if original.kind == EventKind::Primary
            && new_lane_id == UNASSIGNED_LANE_ID
            && new_start_week != original.requested_week
        {
            new_start_week = original.requested_week.clone();
            snap_back = Some(RelocationError::RequestedWeekSnapBack {
                requested_week: original.requested_week.clone(),
            });
        }

        // ===== 规则 3: 主事件改周需原周待分配组事件足量改签 =====
        let week_changed = new_start_week != original.start_week;
        if original.kind == EventKind::Primary
            && new_lane_id != UNASSIGNED_LANE_ID
            && week_changed
        {
            let donor_total = unassigned_group_total(events, &original.start_week, Some(&original.id));
            if donor_total < original.amount {
                return Ok(RelocationOutcome::Rejected {
                    event_id,
                    reason: RelocationError::MissingUnassignedGroup {
                        week: original.start_week.clone(),
                        amount: original.amount,
                    },
                });
            }
        }

        // ===== 规则 4: 真实车道部分重叠禁止 (完全同跨度视为同排) =====
        if new_lane_id != UNASSIGNED_LANE_ID {
            let new_end_week = projected_end_week(&original, &new_start_week)?;
            if has_partial_overlap(events, &original.id, &new_lane_id, &new_start_week, &new_end_week) {
                return Ok(RelocationOutcome::Rejected {
                    event_id,
                    reason: RelocationError::PartialOverlap {
                        lane_id: new_lane_id,
                    },
                });
            }
        }

        // ===== 接受: 先做改签/合并/拆分, 再落位 =====
        if original.kind == EventKind::Primary
            && new_lane_id != UNASSIGNED_LANE_ID
            && week_changed
        {
            self.rebook_group_demand(events, &original, &new_start_week, ids);
        }

        match original.kind {
            EventKind::Group if new_lane_id != UNASSIGNED_LANE_ID => {
                self.split_group_capacity_excess(
                    events,
                    event_idx,
                    &new_lane_id,
                    suppliers,
                    ids,
                );
            }
            EventKind::Group => {
                self.merge_pool_into_dragged(events, event_idx, &new_start_week);
            }
            EventKind::Primary => {}
        }

        // 合并可能移除元素, 下标需按标识重取
        let event_idx = events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or_else(|| EngineError::EventNotFound(event_id.clone()))?;
        let event = &mut events[event_idx];
        event.lane_id = new_lane_id;
        event.shift_to(&new_start_week)?;
        event.stack_offset = 0.0;

        tracing::info!(
            event_id = %event_id,
            start_week = %event.start_week,
            lane_id = %event.lane_id,
            "重定位已接受"
        );
        Ok(RelocationOutcome::Accepted { event_id, snap_back })
    }

    /// 主事件改周: 原周待分配组事件把等量需求改签到新周
    ///
    /// 原周池按序扣减, 新周池并入或新建碎片 (量守恒)
    fn rebook_group_demand(
        &self,
        events: &mut Vec<Event>,
        moved: &Event,
        new_start_week: &str,
        ids: &mut EventIdGenerator,
    ) {
        // 新周侧: 并入既有待分配组事件, 无则以被移事件为模板新建
        let mut template = moved.clone();
        template.kind = EventKind::Group;
        if template.shift_to(new_start_week).is_err() {
            return;
        }
        self.allocator
            .spill_excess(events, &template, new_start_week, moved.amount, ids);

        // 原周侧: 按序扣减
        let mut remaining = moved.amount;
        for event in events.iter_mut() {
            if remaining <= 0.0 {
                break;
            }
            if event.kind == EventKind::Group
                && event.is_unassigned()
                && event.start_week == moved.start_week
                && event.id != moved.id
            {
                let take = event.amount.min(remaining);
                event.amount -= take;
                remaining -= take;
            }
        }
    }

    /// 组事件上道: 同周同车道合计超申报产能的部分溢出回待分配池
    fn split_group_capacity_excess(
        &self,
        events: &mut Vec<Event>,
        event_idx: usize,
        lane_id: &str,
        suppliers: &[Supplier],
        ids: &mut EventIdGenerator,
    ) {
        let Some(lane) = suppliers.iter().find(|s| s.id == lane_id) else {
            return;
        };
        if lane.declared_capacity <= 0.0 {
            return;
        }

        let week = events[event_idx].start_week.clone();
        let moved_id = events[event_idx].id.clone();
        let others: f64 = events
            .iter()
            .filter(|e| e.lane_id == lane_id && e.start_week == week && e.id != moved_id)
            .map(|e| e.amount)
            .sum();
        let total = others + events[event_idx].amount;
        if total <= lane.declared_capacity {
            return;
        }

        let excess = (total - lane.declared_capacity).min(events[event_idx].amount);
        events[event_idx].amount -= excess;
        let template = events[event_idx].clone();
        self.allocator.spill_excess(events, &template, &week, excess, ids);
    }

    /// 组事件回池: 该周既有待分配组事件全部并入被拖块
    fn merge_pool_into_dragged(&self, events: &mut Vec<Event>, event_idx: usize, week: &str) {
        let dragged_id = events[event_idx].id.clone();
        let mut absorbed = 0.0;
        let mut survivors = Vec::with_capacity(events.len());
        for (idx, event) in events.iter().enumerate() {
            let is_pool_sibling = event.kind == EventKind::Group
                && event.is_unassigned()
                && event.start_week == week
                && event.id != dragged_id;
            if is_pool_sibling {
                absorbed += event.amount;
            } else {
                survivors.push(idx);
            }
        }
        if absorbed == 0.0 && survivors.len() == events.len() {
            return;
        }

        let mut kept: Vec<Event> = Vec::with_capacity(survivors.len());
        for idx in survivors {
            kept.push(events[idx].clone());
        }
        *events = kept;
        if let Some(event) = events.iter_mut().find(|e| e.id == dragged_id) {
            event.amount += absorbed;
        }
    }
}

// ==========================================
// 跨度辅助
// ==========================================

/// 以事件种类跨度投影新结束周
fn projected_end_week(event: &Event, new_start_week: &str) -> EngineResult<String> {
    let start = calendar::parse_week(new_start_week)?;
    let end = calendar::add_weeks(&start, event.span_weeks() - 1);
    Ok(calendar::format_week(&end))
}

/// 目标车道是否存在部分(非完全)周跨度重叠
fn has_partial_overlap(
    events: &[Event],
    moved_id: &str,
    lane_id: &str,
    new_start: &str,
    new_end: &str,
) -> bool {
    let (Ok(start), Ok(end)) = (calendar::parse_week(new_start), calendar::parse_week(new_end))
    else {
        return false;
    };
    let (start_day, end_day) = (start.monday(), end.monday());

    events.iter().any(|other| {
        if other.lane_id != lane_id || other.id == moved_id {
            return false;
        }
        let (Ok(o_start), Ok(o_end)) = (
            calendar::parse_week(&other.start_week),
            calendar::parse_week(&other.end_week),
        ) else {
            return false;
        };
        let overlaps = o_start.monday() <= end_day && start_day <= o_end.monday();
        let identical = other.start_week == new_start && other.end_week == new_end;
        overlaps && !identical
    })
}
