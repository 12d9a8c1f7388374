//! 顶底分型识别。
//!
//! 中间 K 线的最高价严格高于左右两根为顶分型，严格低于左右两根为底分型；
//! 底分型同样只比较最高价，最低价不参与判定。首尾两根永远不标注。

use crate::bar::{Bar, Fractal};
use crate::constant::FractalType;

pub fn detect_fractals(bars: &mut [Bar]) {
    for row in bars.iter_mut() {
        row.fractal_type = FractalType::None;
    }

    if bars.len() < 3 {
        return;
    }

    for pivot in 1..(bars.len() - 1) {
        let fractal = Fractal::verify(&bars[pivot - 1], &bars[pivot], &bars[pivot + 1]);
        bars[pivot].fractal_type = fractal;
    }
}

/// 按索引升序返回所有候选分型的位置。
pub fn candidate_indices(bars: &[Bar]) -> Vec<usize> {
    bars.iter()
        .enumerate()
        .filter(|(_, bar)| bar.fractal_type.is_some())
        .map(|(index, _)| index)
        .collect()
}
