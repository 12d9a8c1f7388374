//! K 线包含关系处理。
//!
//! 负责：
//! - 丢弃高低价不是有限数的坏 K 线并记录诊断；
//! - 逐根比较相邻 K 线，合并包含关系，被吞并后回溯与更早的 K 线重新比较；
//! - 在一条连续合并链上维护高低点约束，防止合并结果越过链起点之前的 K 线。
//!
//! 已处理的前缀保存在 `rows` 中，新 K 线只与栈顶比较，
//! 删除即弹栈，因此任何时刻看到的都是已经压实的序列。

use tracing::{debug, warn};

use crate::bar::{Bar, MalformedBar};
use crate::constant::ContainmentPolicy;

/// 连续合并链上的高低点约束，链断开时清空。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarryBounds {
    pub max_high: Option<f64>,
    pub min_low: Option<f64>,
}

impl CarryBounds {
    fn tighten(&mut self, high: f64, low: f64) {
        self.max_high = Some(self.max_high.map_or(high, |x| x.min(high)));
        self.min_low = Some(self.min_low.map_or(low, |x| x.max(low)));
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.max_high.is_some() || self.min_low.is_some()
    }

    /// 合并后的 K 线向上越过 `anchor` 时抬高低点，向下越过时压低高点。
    fn clamp(&self, bar: &mut Bar, anchor: &Bar) {
        if bar.high_price > anchor.high_price {
            if let Some(min_low) = self.min_low {
                bar.low_price = bar.low_price.max(min_low);
            }
        } else if bar.low_price < anchor.low_price {
            if let Some(max_high) = self.max_high {
                bar.high_price = bar.high_price.min(max_high);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub bars: Vec<Bar>,
    pub diagnostics: Vec<MalformedBar>,
}

impl MergeReport {
    /// 输出中所有 K 线吞并的原始 K 线数量之和。
    pub fn merged_total(&self) -> u64 {
        self.bars.iter().map(|x| u64::from(x.merged_count)).sum()
    }
}

pub struct InclusionMerger {
    policy: ContainmentPolicy,
    rows: Vec<Bar>,
    carry: CarryBounds,
    diagnostics: Vec<MalformedBar>,
    position: usize,
}

impl InclusionMerger {
    pub fn new(policy: ContainmentPolicy) -> Self {
        Self::with_capacity(policy, 0)
    }

    pub fn with_capacity(policy: ContainmentPolicy, capacity: usize) -> Self {
        Self {
            policy,
            rows: Vec::with_capacity(capacity),
            carry: CarryBounds::default(),
            diagnostics: Vec::new(),
            position: 0,
        }
    }

    pub fn push(&mut self, bar: Bar) {
        let position = self.position;
        self.position += 1;

        if !bar.has_finite_range() {
            self.record(malformed(position, &bar));
            return;
        }

        let mut current = bar;
        loop {
            let Some(previous) = self.rows.last() else {
                break;
            };

            if current.contains(previous, self.policy) {
                let Some(previous) = self.rows.pop() else {
                    break;
                };
                self.carry.tighten(previous.high_price, previous.low_price);
                if let Some(anchor) = self.rows.last() {
                    self.carry.clamp(&mut current, anchor);
                }
                current.merged_count += previous.merged_count;
                continue;
            }

            if previous.contains(&current, self.policy) {
                self.carry.tighten(current.high_price, current.low_price);
                self.absorb_into_last(&current);
                return;
            }

            self.carry.reset();
            break;
        }

        self.rows.push(current);
    }

    /// 记录一条在构造 `Bar` 之前就被拒绝的输入，保持位置计数连续。
    pub fn reject(&mut self, diagnostic: MalformedBar) {
        self.position += 1;
        self.record(diagnostic);
    }

    pub fn rows(&self) -> &[Bar] {
        &self.rows
    }

    pub fn carry(&self) -> CarryBounds {
        self.carry
    }

    pub fn diagnostics(&self) -> &[MalformedBar] {
        &self.diagnostics
    }

    pub fn finish(self) -> MergeReport {
        debug!(
            input = self.position,
            output = self.rows.len(),
            dropped = self.diagnostics.len(),
            "inclusion merge finished"
        );
        MergeReport {
            bars: self.rows,
            diagnostics: self.diagnostics,
        }
    }

    fn absorb_into_last(&mut self, current: &Bar) {
        let split = self.rows.len().saturating_sub(1);
        let (head, tail) = self.rows.split_at_mut(split);
        if let Some(previous) = tail.last_mut() {
            if let Some(anchor) = head.last() {
                self.carry.clamp(previous, anchor);
            }
            previous.merged_count += current.merged_count;
        }
    }

    fn record(&mut self, diagnostic: MalformedBar) {
        warn!(
            position = diagnostic.position,
            field = diagnostic.field,
            timestamp = %diagnostic.timestamp,
            high = %diagnostic.high,
            low = %diagnostic.low,
            "dropping malformed bar"
        );
        self.diagnostics.push(diagnostic);
    }
}

/// 批量处理包含关系。
pub fn merge_inclusive(bars: Vec<Bar>, policy: ContainmentPolicy) -> MergeReport {
    let mut merger = InclusionMerger::with_capacity(policy, bars.len());
    for bar in bars {
        merger.push(bar);
    }
    merger.finish()
}

fn malformed(position: usize, bar: &Bar) -> MalformedBar {
    MalformedBar {
        position,
        field: if bar.high_price.is_finite() { "low" } else { "high" },
        timestamp: bar.timestamp.clone(),
        open: bar.open_price.to_string(),
        high: bar.high_price.to_string(),
        low: bar.low_price.to_string(),
        close: bar.close_price.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_bar(high: f64, low: f64) -> Bar {
        Bar::new("t", (high + low) / 2.0, high, low, (high + low) / 2.0)
    }

    fn ranges(report: &MergeReport) -> Vec<(f64, f64, u32)> {
        report
            .bars
            .iter()
            .map(|x| (x.high_price, x.low_price, x.merged_count))
            .collect()
    }

    #[test]
    fn test_multiple_inclusive_merge() {
        let mut mgr = InclusionMerger::new(ContainmentPolicy::Inclusive);

        // s1 包含 s2，随后 s3 包含合并后的 K 线 -> 最终只有一根
        mgr.push(mk_bar(10.0, 1.0));
        assert_eq!(mgr.rows().len(), 1);

        mgr.push(mk_bar(9.0, 2.0));
        assert_eq!(mgr.rows().len(), 1);
        assert_eq!(mgr.rows()[0].high_price, 10.0);
        assert_eq!(mgr.rows()[0].low_price, 1.0);
        assert_eq!(mgr.rows()[0].merged_count, 2);

        mgr.push(mk_bar(12.0, 0.0));
        let report = mgr.finish();
        assert_eq!(ranges(&report), vec![(12.0, 0.0, 3)]);
    }

    #[test]
    fn contained_bar_is_absorbed_by_previous() {
        let report = merge_inclusive(
            vec![mk_bar(10.0, 8.0), mk_bar(9.0, 8.5), mk_bar(11.0, 9.0)],
            ContainmentPolicy::Inclusive,
        );
        assert_eq!(ranges(&report), vec![(10.0, 8.0, 2), (11.0, 9.0, 1)]);
    }

    #[test]
    fn upward_merge_lifts_low_to_carry_bound() {
        let report = merge_inclusive(
            vec![mk_bar(10.0, 5.0), mk_bar(12.0, 8.0), mk_bar(14.0, 7.0)],
            ContainmentPolicy::Inclusive,
        );
        assert_eq!(ranges(&report), vec![(10.0, 5.0, 1), (14.0, 8.0, 2)]);
    }

    #[test]
    fn downward_merge_lowers_high_to_carry_bound() {
        let report = merge_inclusive(
            vec![mk_bar(10.0, 5.0), mk_bar(8.0, 3.0), mk_bar(9.0, 1.0)],
            ContainmentPolicy::Inclusive,
        );
        assert_eq!(ranges(&report), vec![(10.0, 5.0, 1), (8.0, 1.0, 2)]);
    }

    #[test]
    fn chain_of_absorbed_bars_tightens_low() {
        let report = merge_inclusive(
            vec![
                mk_bar(10.0, 5.0),
                mk_bar(14.0, 8.0),
                mk_bar(13.0, 9.0),
                mk_bar(13.5, 9.5),
            ],
            ContainmentPolicy::Inclusive,
        );
        assert_eq!(ranges(&report), vec![(10.0, 5.0, 1), (14.0, 9.5, 3)]);
    }

    #[test]
    fn carry_bounds_reset_after_non_inclusive_pair() {
        let mut mgr = InclusionMerger::new(ContainmentPolicy::Inclusive);
        mgr.push(mk_bar(10.0, 8.0));
        mgr.push(mk_bar(9.0, 8.5));
        assert!(mgr.carry().is_active());
        mgr.push(mk_bar(11.0, 9.0));
        assert_eq!(mgr.carry(), CarryBounds::default());
    }

    #[test]
    fn strict_policy_keeps_equal_highs_apart() {
        let bars = vec![mk_bar(10.0, 8.0), mk_bar(10.0, 9.0)];
        let strict = merge_inclusive(bars.clone(), ContainmentPolicy::Strict);
        assert_eq!(strict.bars.len(), 2);
        let inclusive = merge_inclusive(bars, ContainmentPolicy::Inclusive);
        assert_eq!(ranges(&inclusive), vec![(10.0, 8.0, 2)]);
    }

    #[test]
    fn non_finite_bars_are_dropped_with_diagnostic() {
        let report = merge_inclusive(
            vec![mk_bar(10.0, 8.0), mk_bar(f64::NAN, 8.0), mk_bar(12.0, 9.0)],
            ContainmentPolicy::Inclusive,
        );
        assert_eq!(report.bars.len(), 2);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].position, 1);
        assert_eq!(report.diagnostics[0].field, "high");
        assert_eq!(report.merged_total(), 2);
    }
}
