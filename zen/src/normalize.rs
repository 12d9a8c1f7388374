use crate::bar::Bar;

/// 用高低点重写开收盘价，只保留方向信息。
///
/// 阴线（开盘价高于收盘价）开盘价取最高价、收盘价取最低价，其余视为阳线。
pub fn normalize_direction(bars: &mut [Bar]) {
    for bar in bars {
        if bar.is_bearish() {
            bar.open_price = bar.high_price;
            bar.close_price = bar.low_price;
        } else {
            bar.open_price = bar.low_price;
            bar.close_price = bar.high_price;
        }
    }
}
