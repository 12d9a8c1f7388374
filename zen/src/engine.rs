//! 单品种处理链路。
//!
//! 职责：
//! - 串联 `BarInput -> Bar -> 包含处理 -> 方向标准化 -> 分型识别 -> 分型确认`；
//! - 按 `ProcessType` 选择处理方式；
//! - 输出标注后的序列、确认的转折点与坏 K 线诊断。

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::bar::{Bar, BarInput, Fractal, MalformedBar};
use crate::config::ZenConfig;
use crate::constant::{DataError, ProcessType};
use crate::fractal::detect_fractals;
use crate::inclusion::InclusionMerger;
use crate::normalize::normalize_direction;
use crate::receiver::load_bar_inputs;
use crate::stroke::{clear_unconfirmed, confirm_turning_points};

#[derive(Debug, Clone, Serialize)]
pub struct ZenOutput {
    pub process_type: ProcessType,
    pub bars: Vec<Bar>,
    pub confirmed_turning_points: Vec<usize>,
    pub diagnostics: Vec<MalformedBar>,
}

impl ZenOutput {
    pub fn fractals(&self) -> Vec<Fractal> {
        Fractal::collect(&self.bars)
    }

    pub fn is_confirmed(&self, index: usize) -> bool {
        self.confirmed_turning_points.binary_search(&index).is_ok()
    }

    /// 输出序列代表的原始 K 线数量。
    pub fn source_bar_count(&self) -> u64 {
        self.bars.iter().map(|x| u64::from(x.merged_count)).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZenProcessor {
    config: ZenConfig,
}

impl ZenProcessor {
    pub fn new(config: ZenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZenConfig {
        &self.config
    }

    pub fn process(&self, inputs: Vec<BarInput>) -> ZenOutput {
        self.process_as(inputs, self.config.process_type)
    }

    /// 调用方以字符串指定处理类型，无法识别时整体失败。
    pub fn process_request(
        &self,
        inputs: Vec<BarInput>,
        mode: &str,
    ) -> Result<ZenOutput, DataError> {
        let process_type = ProcessType::parse(mode)?;
        Ok(self.process_as(inputs, process_type))
    }

    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<ZenOutput, DataError> {
        let path = path.as_ref();
        let inputs = load_bar_inputs(path)?;
        let output = self.process(inputs);
        info!(
            file = %path.display(),
            process = output.process_type.as_str(),
            bars = output.bars.len(),
            turning_points = output.confirmed_turning_points.len(),
            dropped = output.diagnostics.len(),
            "instrument processed"
        );
        Ok(output)
    }

    pub fn process_as(&self, inputs: Vec<BarInput>, process_type: ProcessType) -> ZenOutput {
        match process_type {
            ProcessType::NoProcess => self.passthrough(inputs),
            ProcessType::ZenInclude => self.zen_include(inputs),
        }
    }

    fn passthrough(&self, inputs: Vec<BarInput>) -> ZenOutput {
        let (bars, diagnostics) = build_bars(inputs);
        ZenOutput {
            process_type: ProcessType::NoProcess,
            bars,
            confirmed_turning_points: Vec::new(),
            diagnostics,
        }
    }

    fn zen_include(&self, inputs: Vec<BarInput>) -> ZenOutput {
        let mut merger = InclusionMerger::with_capacity(self.config.containment, inputs.len());
        for (position, input) in inputs.into_iter().enumerate() {
            match input.into_bar(position) {
                Ok(bar) => merger.push(bar),
                Err(diagnostic) => merger.reject(diagnostic),
            }
        }
        let report = merger.finish();
        let mut bars = report.bars;

        normalize_direction(&mut bars);
        detect_fractals(&mut bars);
        let confirmed_turning_points = confirm_turning_points(&bars);
        if self.config.clear_rejected_fractals {
            clear_unconfirmed(&mut bars, &confirmed_turning_points);
        }

        ZenOutput {
            process_type: ProcessType::ZenInclude,
            bars,
            confirmed_turning_points,
            diagnostics: report.diagnostics,
        }
    }
}

fn build_bars(inputs: Vec<BarInput>) -> (Vec<Bar>, Vec<MalformedBar>) {
    let mut bars = Vec::with_capacity(inputs.len());
    let mut diagnostics = Vec::new();
    for (position, input) in inputs.into_iter().enumerate() {
        match input.into_bar(position) {
            Ok(bar) => bars.push(bar),
            Err(diagnostic) => {
                tracing::warn!(%diagnostic, "dropping malformed bar");
                diagnostics.push(diagnostic);
            }
        }
    }
    (bars, diagnostics)
}
