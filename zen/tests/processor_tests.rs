use std::fs;
use std::path::PathBuf;

use zen::{
    BarInput, ContainmentPolicy, DataError, ExportPayload, FieldValue, FractalType, ProcessType,
    ZenConfig, ZenProcessor, write_parquet,
};

#[test]
fn unknown_process_type_fails_the_request() {
    let err = ZenProcessor::default()
        .process_request(rising_inputs(5), "wavelet")
        .unwrap_err();
    assert!(matches!(err, DataError::InvalidProcessRequest(ref v) if v == "wavelet"));
}

#[test]
fn no_process_mode_returns_bars_untouched() {
    let inputs = vec![
        BarInput::new("d1", 10.0, 12.0, 8.0, 9.0),
        BarInput::new("d2", 9.5, 11.0, 9.0, 10.0),
        BarInput::new("d3", 10.0, 13.0, 7.0, 12.0),
    ];
    let output = ZenProcessor::default()
        .process_request(inputs, "不做任何处理")
        .unwrap();

    assert_eq!(output.process_type, ProcessType::NoProcess);
    assert_eq!(output.bars.len(), 3);
    assert!(output.confirmed_turning_points.is_empty());
    let bar = &output.bars[1];
    assert_eq!(
        (bar.open_price, bar.high_price, bar.low_price, bar.close_price),
        (9.5, 11.0, 9.0, 10.0)
    );
    assert!(output.bars.iter().all(|x| x.merged_count == 1));
    assert!(output.bars.iter().all(|x| x.fractal_type == FractalType::None));
}

#[test]
fn nan_bar_is_dropped_from_a_clean_series() {
    let mut inputs = rising_inputs(8);
    inputs[3].low = Some(FieldValue::Number(f64::NAN));

    let output = ZenProcessor::default().process(inputs);
    assert_eq!(output.bars.len(), 7);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].position, 3);
    assert_eq!(output.diagnostics[0].field, "low");
}

#[test]
fn text_high_is_reported_with_its_raw_value() {
    let mut inputs = rising_inputs(6);
    inputs[2].high = Some(FieldValue::from("N/A"));

    let output = ZenProcessor::default().process(inputs);
    assert_eq!(output.bars.len(), 5);
    assert_eq!(output.source_bar_count(), 5);
    let diagnostic = &output.diagnostics[0];
    assert_eq!((diagnostic.position, diagnostic.field), (2, "high"));
    assert_eq!(diagnostic.high, "N/A");
    assert_eq!(diagnostic.timestamp, "2023-05-03");
}

#[test]
fn strict_policy_keeps_equal_highs_apart() {
    let inputs = vec![
        BarInput::new("d1", 9.0, 10.0, 8.0, 9.5),
        BarInput::new("d2", 9.5, 10.0, 9.0, 9.2),
    ];
    let inclusive = ZenProcessor::default().process(inputs.clone());
    let strict = ZenProcessor::new(ZenConfig {
        containment: ContainmentPolicy::Strict,
        ..ZenConfig::default()
    })
    .process(inputs);

    assert_eq!(inclusive.bars.len(), 1);
    assert_eq!(strict.bars.len(), 2);
}

#[test]
fn overrides_pick_mode_and_policy() {
    let config = ZenConfig::default()
        .with_overrides(|key| match key {
            "ZEN_PROCESS_TYPE" => Some("0".to_string()),
            "ZEN_CONTAINMENT" => Some("strict".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.process_type, ProcessType::NoProcess);
    assert_eq!(config.containment, ContainmentPolicy::Strict);
    assert!(!config.clear_rejected_fractals);
}

#[test]
fn json_file_with_chinese_columns_is_processed() {
    let dir = scratch_dir("json_file");
    let path = dir.join("cu2401.json");
    fs::write(
        &path,
        r#"[
            {"合约": "cu2401", "日期": "2023-10-09", "开盘价": 10, "最高价": 11, "最低价": 9, "收盘价": 10.5, "成交量": 120, "持仓量": NaN},
            {"合约": "cu2401", "日期": "2023-10-10", "开盘价": 11, "最高价": 13, "最低价": 10, "收盘价": 12.5, "成交量": 80, "持仓量": 300},
            {"合约": "cu2401", "日期": "2023-10-11", "开盘价": 11.5, "最高价": 12, "最低价": 9.5, "收盘价": 10, "成交量": 60, "持仓量": 320},
            {"合约": "cu2401", "日期": "2023-10-12", "开盘价": NaN, "最高价": NaN, "最低价": NaN, "收盘价": NaN, "成交量": 0, "持仓量": 320}
        ]"#,
    )
    .unwrap();

    let output = ZenProcessor::default().process_file(&path).unwrap();
    assert_eq!(output.bars.len(), 3);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.bars[0].open_interest, None);
    assert_eq!(output.bars[1].fractal_type, FractalType::Top);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn csv_file_is_processed() {
    let dir = scratch_dir("csv_file");
    let path = dir.join("rb2401.csv");
    fs::write(
        &path,
        "date,open,high,low,close,volume\n\
         2023-10-09,10,11,9,10.5,100\n\
         2023-10-10,10.5,10.8,9.2,10,90\n\
         2023-10-11,10,12,8,11.5,150\n",
    )
    .unwrap();

    let output = ZenProcessor::default().process_file(&path).unwrap();
    // 第二根被第一根包含，随后第三根包含合并结果
    assert_eq!(output.bars.len(), 1);
    let bar = &output.bars[0];
    assert_eq!((bar.high_price, bar.low_price, bar.merged_count), (12.0, 8.0, 3));
    assert_eq!(bar.volume, Some(150.0));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unsupported_file_extension_is_an_error() {
    let err = ZenProcessor::default().process_file("quotes.txt").unwrap_err();
    assert!(matches!(err, DataError::UnsupportedFormat(_)));
}

#[test]
fn exports_are_written_to_disk() {
    let dir = scratch_dir("exports");
    let output = ZenProcessor::default().process(rising_inputs(12));

    let json_path = dir.join("nested").join("payload.json");
    ExportPayload::new("ag2312", &output).write_json(&json_path).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&fs::read(&json_path).unwrap()).unwrap();
    assert_eq!(value["symbol"], "ag2312");
    assert_eq!(value["process_type"], "zen_include");
    assert_eq!(value["bars"].as_array().map(Vec::len), Some(12));

    let parquet_path = dir.join("bars.parquet");
    write_parquet(&output, &parquet_path).unwrap();
    assert!(fs::metadata(&parquet_path).unwrap().len() > 0);

    let _ = fs::remove_dir_all(dir);
}

/// 高低点逐根抬高，不会产生包含关系。
fn rising_inputs(count: usize) -> Vec<BarInput> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64;
            BarInput::new(format!("2023-05-{:02}", i + 1), base, base + 1.5, base - 0.5, base + 1.0)
        })
        .collect()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("zen_processor_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}
