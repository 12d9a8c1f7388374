//! 处理结果导出。
//!
//! - `to_dataframe`：标注后的序列转为 polars `DataFrame`；
//! - `write_parquet`：落地为 parquet；
//! - `ExportPayload`：图表前端使用的 json 结构。

use std::fs::{self, File};
use std::path::Path;

use polars::df;
use polars::prelude::{DataFrame, ParquetWriter};
use serde::Serialize;

use crate::bar::{Bar, MalformedBar};
use crate::constant::{DataError, FractalType};
use crate::engine::ZenOutput;

pub fn to_dataframe(output: &ZenOutput) -> Result<DataFrame, DataError> {
    let bars = &output.bars;
    let timestamp: Vec<String> = bars.iter().map(|x| x.timestamp.clone()).collect();
    let time: Vec<Option<i64>> = bars.iter().map(epoch_seconds).collect();
    let open: Vec<f64> = bars.iter().map(|x| x.open_price).collect();
    let high: Vec<f64> = bars.iter().map(|x| x.high_price).collect();
    let low: Vec<f64> = bars.iter().map(|x| x.low_price).collect();
    let close: Vec<f64> = bars.iter().map(|x| x.close_price).collect();
    let volume: Vec<Option<f64>> = bars.iter().map(|x| x.volume).collect();
    let open_interest: Vec<Option<f64>> = bars.iter().map(|x| x.open_interest).collect();
    let merged_count: Vec<u32> = bars.iter().map(|x| x.merged_count).collect();
    let fractal_type: Vec<i32> = bars
        .iter()
        .map(|x| i32::from(x.fractal_type.as_i8()))
        .collect();
    let confirmed: Vec<bool> = (0..bars.len()).map(|i| output.is_confirmed(i)).collect();

    Ok(df!(
        "timestamp" => timestamp,
        "time" => time,
        "open" => open,
        "high" => high,
        "low" => low,
        "close" => close,
        "volume" => volume,
        "open_interest" => open_interest,
        "merged_count" => merged_count,
        "fractal_type" => fractal_type,
        "confirmed" => confirmed
    )?)
}

pub fn write_parquet(output: &ZenOutput, path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut df = to_dataframe(output)?;
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct FractalMarker {
    pub index: usize,
    pub timestamp: String,
    pub time: Option<i64>,
    pub price: f64,
    pub kind: &'static str,
    pub label: &'static str,
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportPayload<'a> {
    pub symbol: String,
    pub process_type: &'static str,
    pub process_label: &'static str,
    pub bars: &'a [Bar],
    pub fractals: Vec<FractalMarker>,
    pub confirmed_turning_points: &'a [usize],
    pub diagnostics: &'a [MalformedBar],
}

impl<'a> ExportPayload<'a> {
    pub fn new(symbol: impl Into<String>, output: &'a ZenOutput) -> Self {
        let fractals = output
            .fractals()
            .into_iter()
            .map(|fractal| {
                let bar = &output.bars[fractal.index];
                FractalMarker {
                    index: fractal.index,
                    timestamp: bar.timestamp.clone(),
                    time: epoch_seconds(bar),
                    price: fractal.price(),
                    kind: fractal.fractal_type.as_str(),
                    label: fractal.fractal_type.desc(),
                    confirmed: output.is_confirmed(fractal.index),
                }
            })
            .collect();

        Self {
            symbol: symbol.into(),
            process_type: output.process_type.as_str(),
            process_label: output.process_type.desc(),
            bars: &output.bars,
            fractals,
            confirmed_turning_points: &output.confirmed_turning_points,
            diagnostics: &output.diagnostics,
        }
    }

    pub fn top_count(&self) -> usize {
        self.count_kind(FractalType::Top)
    }

    pub fn bottom_count(&self) -> usize {
        self.count_kind(FractalType::Bottom)
    }

    fn count_kind(&self, kind: FractalType) -> usize {
        self.fractals.iter().filter(|x| x.kind == kind.as_str()).count()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DataError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

fn epoch_seconds(bar: &Bar) -> Option<i64> {
    bar.datetime().map(|x| x.and_utc().timestamp())
}

fn ensure_parent(path: &Path) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
