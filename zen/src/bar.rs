use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constant::{ContainmentPolicy, FractalType};
use crate::utils::parse_timestamp;

/// 原始记录中的单个字段值。
///
/// 交易所导出的数据里价格列偶尔是 `"N/A"`、`"-"` 这类文本，
/// 因此在进入核心流程前保留原值，由 [`BarInput::into_bar`] 统一校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// 解析为有限浮点数；非数值、NaN、±inf 均返回 `None`。
    pub fn as_price(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_label(&self) -> String {
        match self {
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
            Self::Number(v) => v.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_label())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// 标准化的单根 K 线输入记录。
///
/// 字段别名覆盖交易所数据整理后的中文列名，其余列被忽略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarInput {
    #[serde(default, alias = "日期", alias = "date", alias = "datetime")]
    pub timestamp: Option<FieldValue>,
    #[serde(default, alias = "开盘价", alias = "open_price")]
    pub open: Option<FieldValue>,
    #[serde(default, alias = "最高价", alias = "high_price")]
    pub high: Option<FieldValue>,
    #[serde(default, alias = "最低价", alias = "low_price")]
    pub low: Option<FieldValue>,
    #[serde(default, alias = "收盘价", alias = "close_price")]
    pub close: Option<FieldValue>,
    #[serde(default, alias = "成交量")]
    pub volume: Option<FieldValue>,
    #[serde(default, alias = "持仓量")]
    pub open_interest: Option<FieldValue>,
}

impl BarInput {
    pub fn new(timestamp: impl Into<String>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp: Some(FieldValue::Text(timestamp.into())),
            open: Some(open.into()),
            high: Some(high.into()),
            low: Some(low.into()),
            close: Some(close.into()),
            volume: None,
            open_interest: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume.into());
        self
    }

    pub fn with_open_interest(mut self, open_interest: f64) -> Self {
        self.open_interest = Some(open_interest.into());
        self
    }

    /// 构造 `Bar`；价格缺失或非有限数时返回带原值的诊断信息。
    pub fn into_bar(self, position: usize) -> Result<Bar, MalformedBar> {
        let prices = (
            price_of(&self.open),
            price_of(&self.high),
            price_of(&self.low),
            price_of(&self.close),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = prices else {
            let field = match prices {
                (_, None, _, _) => "high",
                (_, _, None, _) => "low",
                (None, _, _, _) => "open",
                _ => "close",
            };
            return Err(MalformedBar {
                position,
                field,
                timestamp: label_of(&self.timestamp),
                open: label_of(&self.open),
                high: label_of(&self.high),
                low: label_of(&self.low),
                close: label_of(&self.close),
            });
        };

        Ok(Bar {
            timestamp: label_of(&self.timestamp),
            open_price: open,
            high_price: high,
            low_price: low,
            close_price: close,
            volume: self.volume.as_ref().and_then(FieldValue::as_price),
            open_interest: self.open_interest.as_ref().and_then(FieldValue::as_price),
            merged_count: 1,
            fractal_type: FractalType::None,
        })
    }
}

fn price_of(value: &Option<FieldValue>) -> Option<f64> {
    value.as_ref().and_then(FieldValue::as_price)
}

fn label_of(value: &Option<FieldValue>) -> String {
    value.as_ref().map(FieldValue::as_label).unwrap_or_default()
}

/// 被丢弃的坏 K 线诊断信息，保留其在输入序列中的位置和原始字段。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedBar {
    pub position: usize,
    pub field: &'static str,
    pub timestamp: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl Display for MalformedBar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed bar #{} ({}): invalid {} [open={}, high={}, low={}, close={}]",
            self.position, self.timestamp, self.field, self.open, self.high, self.low, self.close
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: String,
    #[serde(rename = "open")]
    pub open_price: f64,
    #[serde(rename = "high")]
    pub high_price: f64,
    #[serde(rename = "low")]
    pub low_price: f64,
    #[serde(rename = "close")]
    pub close_price: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub open_interest: Option<f64>,
    pub merged_count: u32,
    #[serde(rename = "fractal", default)]
    pub fractal_type: FractalType,
}

impl Bar {
    pub fn new(timestamp: impl Into<String>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            open_price: open,
            high_price: high,
            low_price: low,
            close_price: close,
            volume: None,
            open_interest: None,
            merged_count: 1,
            fractal_type: FractalType::None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_open_interest(mut self, open_interest: f64) -> Self {
        self.open_interest = Some(open_interest);
        self
    }

    pub fn has_finite_range(&self) -> bool {
        self.high_price.is_finite() && self.low_price.is_finite()
    }

    pub fn is_bearish(&self) -> bool {
        self.open_price > self.close_price
    }

    pub fn total_range(&self) -> f64 {
        self.high_price - self.low_price
    }

    /// 自身价格区间是否覆盖 `other`。
    pub fn contains(&self, other: &Self, policy: ContainmentPolicy) -> bool {
        policy.covers(self.high_price, self.low_price, other.high_price, other.low_price)
    }

    pub fn is_inclusive(&self, other: &Self, policy: ContainmentPolicy) -> bool {
        self.contains(other, policy) || other.contains(self, policy)
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// 单个分型标注。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fractal {
    pub index: usize,
    pub fractal_type: FractalType,
    pub high_price: f64,
    pub low_price: f64,
}

impl Fractal {
    /// 三根 K 线的顶底分型判定，只比较最高价。
    pub fn verify(left: &Bar, middle: &Bar, right: &Bar) -> FractalType {
        if middle.high_price > left.high_price && middle.high_price > right.high_price {
            return FractalType::Top;
        }
        if middle.high_price < left.high_price && middle.high_price < right.high_price {
            return FractalType::Bottom;
        }
        FractalType::None
    }

    /// 顶分型取最高价，底分型取最低价。
    pub fn price(&self) -> f64 {
        match self.fractal_type {
            FractalType::Bottom => self.low_price,
            _ => self.high_price,
        }
    }

    pub fn collect(bars: &[Bar]) -> Vec<Fractal> {
        bars.iter()
            .enumerate()
            .filter(|(_, bar)| bar.fractal_type.is_some())
            .map(|(index, bar)| Fractal {
                index,
                fractal_type: bar.fractal_type,
                high_price: bar.high_price,
                low_price: bar.low_price,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_prices_are_parsed_or_rejected() {
        assert_eq!(FieldValue::from(" 4,512.5 ").as_price(), Some(4512.5));
        assert_eq!(FieldValue::from("N/A").as_price(), None);
        assert_eq!(FieldValue::Number(f64::NAN).as_price(), None);
        assert_eq!(FieldValue::Number(f64::INFINITY).as_price(), None);
    }

    #[test]
    fn integral_timestamps_keep_their_digits() {
        assert_eq!(FieldValue::Number(20231008.0).as_label(), "20231008");
    }

    #[test]
    fn malformed_high_reports_original_values() {
        let input = BarInput {
            high: Some(FieldValue::from("N/A")),
            ..BarInput::new("2023-10-09", 10.0, 11.0, 9.0, 10.5)
        };
        let err = input.into_bar(2).unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.field, "high");
        assert_eq!(err.high, "N/A");
        assert_eq!(err.low, "9");
    }

    #[test]
    fn optional_columns_pass_through() {
        let bar = BarInput::new("2023-10-09", 10.0, 11.0, 9.0, 10.5)
            .with_volume(1200.0)
            .into_bar(0)
            .unwrap();
        assert_eq!(bar.volume, Some(1200.0));
        assert_eq!(bar.open_interest, None);
        assert_eq!(bar.merged_count, 1);
        assert_eq!(bar.fractal_type, FractalType::None);
    }
}
