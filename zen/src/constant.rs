use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FractalType {
    Top,
    Bottom,
    #[default]
    None,
}

impl FractalType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::None => "None",
        }
    }

    /// 图表标注使用的中文名称。
    pub fn desc(self) -> &'static str {
        match self {
            Self::Top => "顶分型",
            Self::Bottom => "底分型",
            Self::None => "",
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Self::Top => 1,
            Self::Bottom => -1,
            Self::None => 0,
        }
    }

    pub fn is_some(self) -> bool {
        self != Self::None
    }
}

/// 数据处理类型。
///
/// `desc` 是界面下拉框中展示的标签，解析时与 snake_case 键、数字编码等价。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProcessType {
    NoProcess,
    #[default]
    ZenInclude,
}

impl ProcessType {
    pub const ALL: [ProcessType; 2] = [Self::NoProcess, Self::ZenInclude];

    pub fn code(self) -> u8 {
        match self {
            Self::NoProcess => 0,
            Self::ZenInclude => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoProcess => "no_process",
            Self::ZenInclude => "zen_include",
        }
    }

    pub fn desc(self) -> &'static str {
        match self {
            Self::NoProcess => "不做任何处理",
            Self::ZenInclude => "缠中论禅",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DataError> {
        let key = value.trim();
        for candidate in Self::ALL {
            if key == candidate.desc() || key == candidate.code().to_string() {
                return Ok(candidate);
            }
        }
        match key.to_ascii_lowercase().replace('-', "_").as_str() {
            "no_process" | "none" | "raw" => Ok(Self::NoProcess),
            "zen_include" | "zen" | "chan" => Ok(Self::ZenInclude),
            _ => Err(DataError::InvalidProcessRequest(value.to_string())),
        }
    }
}

impl Display for ProcessType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.desc())
    }
}

impl FromStr for ProcessType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProcessType {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProcessType> for String {
    fn from(value: ProcessType) -> Self {
        value.as_str().to_string()
    }
}

/// 相邻 K 线包含关系的判定口径。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContainmentPolicy {
    /// 高低点相等也算包含（`>=` / `<=`）。
    #[default]
    Inclusive,
    /// 只有严格包含才合并（`>` / `<`）。
    Strict,
}

impl ContainmentPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive",
            Self::Strict => "strict",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DataError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inclusive" | "non_strict" | "non-strict" => Ok(Self::Inclusive),
            "strict" => Ok(Self::Strict),
            _ => Err(DataError::InvalidPolicy(value.to_string())),
        }
    }

    /// `outer` 的价格区间是否覆盖 `inner`。
    pub fn covers(self, outer_high: f64, outer_low: f64, inner_high: f64, inner_low: f64) -> bool {
        match self {
            Self::Inclusive => outer_high >= inner_high && outer_low <= inner_low,
            Self::Strict => outer_high > inner_high && outer_low < inner_low,
        }
    }
}

impl TryFrom<String> for ContainmentPolicy {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContainmentPolicy> for String {
    fn from(value: ContainmentPolicy) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug)]
pub enum DataError {
    InvalidProcessRequest(String),
    InvalidPolicy(String),
    UnsupportedFormat(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Polars(polars::error::PolarsError),
}

pub struct Const;

impl Const {
    /// 成笔要求的顶底分型最小间距。
    pub const STROKE_MIN_SPAN: usize = 3;
    /// 间距恰好为最小值时，至少一根 K 线需要由多少根原始 K 线合并而来。
    pub const STROKE_MIN_MERGED: u32 = 2;
    /// 相邻候选分型之间的最小索引差。
    pub const FRACTAL_MIN_GAP: usize = 2;
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProcessRequest(v) => write!(f, "unknown process type: {v}"),
            Self::InvalidPolicy(v) => write!(f, "unknown containment policy: {v}"),
            Self::UnsupportedFormat(v) => write!(f, "unsupported input format: {v}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Csv(e) => write!(f, "csv error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Yaml(e) => write!(f, "yaml error: {e}"),
            Self::Polars(e) => write!(f, "polars error: {e}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<std::io::Error> for DataError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for DataError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<serde_yaml::Error> for DataError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<polars::error::PolarsError> for DataError {
    fn from(value: polars::error::PolarsError) -> Self {
        Self::Polars(value)
    }
}
