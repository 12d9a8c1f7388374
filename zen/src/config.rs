use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant::{ContainmentPolicy, DataError, ProcessType};

pub const ENV_CONFIG_PATH: &str = "ZEN_CONFIG";
pub const ENV_PROCESS_TYPE: &str = "ZEN_PROCESS_TYPE";
pub const ENV_CONTAINMENT: &str = "ZEN_CONTAINMENT";
pub const ENV_CLEAR_REJECTED: &str = "ZEN_CLEAR_REJECTED";
pub const ENV_LOG: &str = "ZEN_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenConfig {
    pub process_type: ProcessType,
    pub containment: ContainmentPolicy,
    /// 为 `true` 时清除未通过确认的分型标注，否则确认列表只作参考。
    pub clear_rejected_fractals: bool,
    pub log_level: String,
}

impl Default for ZenConfig {
    fn default() -> Self {
        Self {
            process_type: ProcessType::ZenInclude,
            containment: ContainmentPolicy::Inclusive,
            clear_rejected_fractals: false,
            log_level: "info".to_string(),
        }
    }
}

impl ZenConfig {
    /// 按扩展名读取 json / yaml 配置文件。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|x| x.to_str()) {
            Some("json") => Ok(serde_json::from_str(&text)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&text)?),
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// `ZEN_CONFIG` 指向的文件（若有）叠加 `ZEN_*` 环境变量。
    pub fn resolve() -> Result<Self, DataError> {
        let base = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim())?,
            _ => Self::default(),
        };
        base.with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, DataError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DataError> {
        if let Some(value) = lookup(ENV_PROCESS_TYPE) {
            self.process_type = ProcessType::parse(&value)?;
        }
        if let Some(value) = lookup(ENV_CONTAINMENT) {
            self.containment = ContainmentPolicy::parse(&value)?;
        }
        if let Some(value) = lookup(ENV_CLEAR_REJECTED) {
            self.clear_rejected_fractals = parse_flag(&value).ok_or_else(|| {
                DataError::InvalidPolicy(format!("{ENV_CLEAR_REJECTED}={value}"))
            })?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            self.log_level = value.trim().to_string();
        }
        Ok(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
