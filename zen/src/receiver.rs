use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::bar::BarInput;
use crate::constant::DataError;

/// 按扩展名读取单个品种的 K 线记录（`.json` / `.csv`）。
pub fn load_bar_inputs(file_path: impl AsRef<Path>) -> Result<Vec<BarInput>, DataError> {
    let file_path = file_path.as_ref();
    match file_path
        .extension()
        .and_then(|x| x.to_str())
        .map(|x| x.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => load_json_bar_inputs(file_path),
        Some("csv") => load_csv_bar_inputs(file_path),
        _ => Err(DataError::UnsupportedFormat(file_path.display().to_string())),
    }
}

pub fn load_json_bar_inputs(file_path: impl AsRef<Path>) -> Result<Vec<BarInput>, DataError> {
    let text = fs::read_to_string(file_path)?;
    parse_json_bar_inputs(&text)
}

pub fn read_json_bar_inputs(mut reader: impl Read) -> Result<Vec<BarInput>, DataError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_json_bar_inputs(&text)
}

fn parse_json_bar_inputs(text: &str) -> Result<Vec<BarInput>, DataError> {
    Ok(serde_json::from_str(&relax_json_literals(text))?)
}

pub fn load_csv_bar_inputs(file_path: impl AsRef<Path>) -> Result<Vec<BarInput>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<BarInput>() {
        out.push(row?);
    }
    Ok(out)
}

/// 把 Python `json.dump` 写出的 `NaN` / `Infinity` / `-Infinity` 字面量替换为 `null`。
///
/// 字符串内部的内容保持不变。
pub fn relax_json_literals(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if let Some(token) = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|token| rest.starts_with(token))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    Cow::Owned(out)
}
