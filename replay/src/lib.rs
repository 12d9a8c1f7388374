//! 文件级处理与批量导出。
//!
//! - `export_file`：单个品种文件 -> 图表 json（可选 parquet）；
//! - `batch_export`：目录内全部品种并行处理，每个文件互不影响；
//! - `audit_bars`：复查导出结果中的包含关系与分型标注。

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam::channel;
use serde::Serialize;
use tracing::{info, warn};
use zen::{
    Bar, ContainmentPolicy, DataError, ExportPayload, Fractal, FractalType, ZenConfig,
    ZenProcessor, write_parquet,
};

/// 导出文件名后缀，批量导出时据此跳过已有结果。
pub const EXPORT_SUFFIX: &str = ".zen.json";

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub config: ZenConfig,
    /// 同时写出同名 `.parquet`。
    pub parquet: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub symbol: String,
    pub bars: usize,
    pub tops: usize,
    pub bottoms: usize,
    pub confirmed: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub exported: Vec<ExportSummary>,
    pub failed: Vec<(PathBuf, String)>,
}

pub fn export_file(
    input: &Path,
    output: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary, DataError> {
    let result = ZenProcessor::new(options.config.clone()).process_file(input)?;
    let symbol = symbol_of(input);
    let payload = ExportPayload::new(symbol.clone(), &result);
    payload.write_json(output)?;
    if options.parquet {
        write_parquet(&result, output.with_extension("parquet"))?;
    }

    Ok(ExportSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        symbol,
        bars: result.bars.len(),
        tops: payload.top_count(),
        bottoms: payload.bottom_count(),
        confirmed: result.confirmed_turning_points.len(),
        dropped: result.diagnostics.len(),
    })
}

/// 目录下可处理的品种文件（`.json` / `.csv`，排除导出结果），按路径排序。
pub fn instrument_files(folder: &Path) -> Result<Vec<PathBuf>, DataError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|x| x.to_str()) else {
            continue;
        };
        if name.ends_with(EXPORT_SUFFIX) {
            continue;
        }
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".json") || lower.ends_with(".csv") {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

pub fn export_path(out_dir: &Path, input: &Path) -> PathBuf {
    out_dir.join(format!("{}{}", symbol_of(input), EXPORT_SUFFIX))
}

/// 多个工作线程从同一个队列取文件处理；单个文件失败记入 `failed`。
pub fn batch_export(
    folder: &Path,
    out_dir: &Path,
    options: &ExportOptions,
    workers: usize,
) -> Result<BatchReport, DataError> {
    let files = instrument_files(folder)?;
    let workers = workers.max(1).min(files.len().max(1));

    let (job_tx, job_rx) = channel::unbounded::<PathBuf>();
    let (result_tx, result_rx) = channel::unbounded();
    for file in files {
        if job_tx.send(file).is_err() {
            break;
        }
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for input in job_rx.iter() {
                    let output = export_path(out_dir, &input);
                    let result = export_file(&input, &output, options);
                    if result_tx.send((input, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut report = BatchReport::default();
    for (input, result) in result_rx.iter() {
        match result {
            Ok(summary) => report.exported.push(summary),
            Err(err) => {
                warn!(file = %input.display(), error = %err, "export failed");
                report.failed.push((input, err.to_string()));
            }
        }
    }
    report.exported.sort_by(|a, b| a.input.cmp(&b.input));
    report.failed.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        folder = %folder.display(),
        workers,
        exported = report.exported.len(),
        failed = report.failed.len(),
        "batch export finished"
    );
    Ok(report)
}

/// 从导出的 json 中读回标注后的序列。
pub fn load_payload_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut value: serde_json::Value = serde_json::from_slice(&fs::read(path)?)?;
    let bars = value
        .get_mut("bars")
        .map(serde_json::Value::take)
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    Ok(serde_json::from_value(bars)?)
}

/// 返回所有违规描述：相邻包含、首尾分型、分型标注与三根规则不符。
///
/// 传入的序列可能已经清除了未确认分型，此时只检查被标注的位置。
pub fn audit_bars(bars: &[Bar], policy: ContainmentPolicy) -> Vec<String> {
    let mut violations = Vec::new();

    for (i, pair) in bars.windows(2).enumerate() {
        if pair[0].is_inclusive(&pair[1], policy) {
            violations.push(format!(
                "inclusive neighbors #{i} ({}, {}) and #{} ({}, {})",
                pair[0].high_price,
                pair[0].low_price,
                i + 1,
                pair[1].high_price,
                pair[1].low_price
            ));
        }
    }

    for (i, bar) in bars.iter().enumerate() {
        if bar.fractal_type == FractalType::None {
            continue;
        }
        if i == 0 || i + 1 == bars.len() {
            violations.push(format!("boundary bar #{i} marked {}", bar.fractal_type.as_str()));
            continue;
        }
        let expected = Fractal::verify(&bars[i - 1], bar, &bars[i + 1]);
        if expected != bar.fractal_type {
            violations.push(format!(
                "bar #{i} marked {} but neighbors give {}",
                bar.fractal_type.as_str(),
                expected.as_str()
            ));
        }
    }

    violations
}

fn symbol_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|x| x.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("replay_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_csv(path: &Path, rows: usize) {
        let mut text = String::from("date,open,high,low,close\n");
        for i in 0..rows {
            let base = 100.0 + ((i as f64) * 0.7).sin() * 5.0;
            text.push_str(&format!(
                "2023-06-{:02},{},{},{},{}\n",
                i % 28 + 1,
                base,
                base + 1.0 + (i % 3) as f64 * 0.4,
                base - 1.0 - (i % 4) as f64 * 0.3,
                base + 0.2
            ));
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn batch_exports_every_instrument() {
        let dir = scratch("batch");
        write_csv(&dir.join("cu2401.csv"), 40);
        write_csv(&dir.join("rb2401.csv"), 25);
        fs::write(dir.join("broken.json"), "{not json").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let out_dir = dir.join("out");
        let report = batch_export(&dir, &out_dir, &ExportOptions::default(), 4).unwrap();
        assert_eq!(report.exported.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.exported[0].symbol, "cu2401");

        let bars = load_payload_bars(&out_dir.join("cu2401.zen.json")).unwrap();
        assert_eq!(bars.len(), report.exported[0].bars);
        assert!(audit_bars(&bars, ContainmentPolicy::Inclusive).is_empty());

        let again = instrument_files(&out_dir).unwrap();
        assert!(again.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn audit_flags_containment_and_bad_marks() {
        let mut bars = vec![
            Bar::new("d1", 9.0, 10.0, 8.0, 9.5),
            Bar::new("d2", 9.0, 9.5, 8.5, 9.0),
            Bar::new("d3", 9.0, 12.0, 9.0, 11.0),
        ];
        bars[0].fractal_type = FractalType::Top;
        bars[1].fractal_type = FractalType::Top;

        let violations = audit_bars(&bars, ContainmentPolicy::Inclusive);
        assert_eq!(violations.len(), 3);
        assert!(violations[0].starts_with("inclusive neighbors #0"));
        assert!(violations[1].starts_with("boundary bar #0"));
        assert!(violations[2].contains("neighbors give Bottom"));
    }
}
