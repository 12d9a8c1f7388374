//! 分型确认。
//!
//! 依次取相邻的三个候选分型 `(i0, i1, i2)`，判断中间的 `i1` 能否作为笔的端点：
//! - `i0` 与 `i1` 之间至少隔开 `STROKE_MIN_SPAN` 根 K 线，恰好等于时区间内须有合并过的 K 线；
//! - `i1` 与两侧候选的距离都不小于 `FRACTAL_MIN_GAP`；
//! - 顶分型的最高价是 `[i0, i2]` 内的最高价，底分型的最低价是区间内的最低价。

use tracing::debug;

use crate::bar::Bar;
use crate::constant::{Const, FractalType};
use crate::fractal::candidate_indices;
use crate::utils::approx_eq_f64;

/// 返回确认的转折点索引，升序。
pub fn confirm_turning_points(bars: &[Bar]) -> Vec<usize> {
    let candidates = candidate_indices(bars);
    let confirmed: Vec<usize> = candidates
        .windows(3)
        .filter(|w| is_confirmed(bars, w[0], w[1], w[2]))
        .map(|w| w[1])
        .collect();
    debug!(
        candidates = candidates.len(),
        confirmed = confirmed.len(),
        "turning points validated"
    );
    confirmed
}

pub fn is_confirmed(bars: &[Bar], i0: usize, i1: usize, i2: usize) -> bool {
    debug_assert!(
        i0 < i1 && i1 < i2 && i2 < bars.len(),
        "candidate triple ({i0}, {i1}, {i2}) does not fit {} bars",
        bars.len()
    );
    has_stroke_room(bars, i0, i1) && has_min_gap(i0, i1, i2) && is_extreme(bars, i0, i1, i2)
}

fn has_stroke_room(bars: &[Bar], i0: usize, i1: usize) -> bool {
    let span = i1 - i0;
    if span < Const::STROKE_MIN_SPAN {
        return false;
    }
    if span == Const::STROKE_MIN_SPAN
        && bars[i0..=i1]
            .iter()
            .all(|x| x.merged_count < Const::STROKE_MIN_MERGED)
    {
        return false;
    }
    true
}

fn has_min_gap(i0: usize, i1: usize, i2: usize) -> bool {
    i1 - i0 >= Const::FRACTAL_MIN_GAP && i2 - i1 >= Const::FRACTAL_MIN_GAP
}

fn is_extreme(bars: &[Bar], i0: usize, i1: usize, i2: usize) -> bool {
    let window = &bars[i0..=i2];
    let pivot = &bars[i1];
    match pivot.fractal_type {
        FractalType::Top => window
            .iter()
            .map(|x| x.high_price)
            .reduce(f64::max)
            .is_some_and(|highest| approx_eq_f64(pivot.high_price, highest)),
        FractalType::Bottom => window
            .iter()
            .map(|x| x.low_price)
            .reduce(f64::min)
            .is_some_and(|lowest| approx_eq_f64(pivot.low_price, lowest)),
        FractalType::None => false,
    }
}

/// 清除未被确认的分型标注。
pub fn clear_unconfirmed(bars: &mut [Bar], confirmed: &[usize]) {
    for (index, bar) in bars.iter_mut().enumerate() {
        if bar.fractal_type.is_some() && confirmed.binary_search(&index).is_err() {
            bar.fractal_type = FractalType::None;
        }
    }
}
