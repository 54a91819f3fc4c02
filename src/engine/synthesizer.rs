// ==========================================
// 供应排程系统 - 派生组合成引擎
// ==========================================
// 职责: 由主事件(F)按起始周聚合, 合成待分配组事件(M)
// 输入: 全部主事件
// 输出: 每个不同起始周一个组事件 (量为该组主事件量之和)
// ==========================================
// 红线: 纯函数且幂等; 标识跨两次合成不保证稳定,
//       调用方按 (name, kind) 对账, 不按 id
// ==========================================

use crate::domain::event::{Event, EventIdGenerator, UNASSIGNED_LANE_ID};
use crate::domain::types::EventKind;
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// GroupSynthesizer - 派生组合成引擎
// ==========================================
pub struct GroupSynthesizer;

impl GroupSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// 合成组事件
    ///
    /// 每个不同 start_week 产出一个组事件:
    /// - amount = 该组主事件量之和
    /// - lane_id = "unassigned"
    /// - end_week = start_week + 组跨度 - 1 (构造时派生)
    /// - name/请求周 继承组内首个主事件
    ///
    /// # 参数
    /// - `primaries`: 主事件列表 (非 F 种类被忽略)
    /// - `ids`: 确定性标识生成器
    #[instrument(skip(self, primaries, ids), fields(primary_count = primaries.len()))]
    pub fn synthesize(&self, primaries: &[Event], ids: &mut EventIdGenerator) -> Vec<Event> {
        // BTreeMap 保证按周有序分组, 两次合成产出同序
        let mut groups: BTreeMap<String, Vec<&Event>> = BTreeMap::new();
        for event in primaries {
            if event.kind != EventKind::Primary {
                continue;
            }
            groups.entry(event.start_week.clone()).or_default().push(event);
        }

        let mut synthesized = Vec::with_capacity(groups.len());
        for (start_week, members) in groups {
            let total_amount: f64 = members.iter().map(|e| e.amount).sum();
            let head = members[0];

            match Event::with_start(
                ids.next_group_id(&start_week),
                head.name.clone(),
                EventKind::Group,
                total_amount,
                &head.requested_week,
                &start_week,
                UNASSIGNED_LANE_ID,
            ) {
                Ok(group_event) => synthesized.push(group_event),
                Err(err) => {
                    // 主事件构造时周已规范化, 正常不可达; 按跳过降级
                    tracing::warn!("组事件合成失败, 跳过 {}: {}", start_week, err);
                }
            }
        }

        tracing::debug!(
            group_count = synthesized.len(),
            "组事件合成完成"
        );
        synthesized
    }
}

impl Default for GroupSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
