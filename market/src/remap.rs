//! `.value` + `.title` -> `.finished`。
//!
//! `.value` 中的记录只有位置意义，列名来自同名 `.title` 文件的第一条记录。

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::PrepareError;
use crate::records::{Record, files_with_suffix, read_records, sibling, write_records};

const TRADE_DATE: &str = "交易日期";
const DATE: &str = "日期";

/// 处理目录下所有 `.value` 文件，返回生成的 `.finished` 路径。
///
/// 单个文件失败只记日志并跳过。
pub fn remap_folder(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>, PrepareError> {
	let mut out = Vec::new();
	for value_path in files_with_suffix(folder, ".value")? {
		match remap_file(&value_path) {
			Ok(finished) => {
				info!(file = %finished.display(), "finished file written");
				out.push(finished);
			}
			Err(err) => warn!(file = %value_path.display(), error = %err, "skipping value file"),
		}
	}
	Ok(out)
}

pub fn remap_file(value_path: &Path) -> Result<PathBuf, PrepareError> {
	let title_path = sibling(value_path, "title");
	if !title_path.is_file() {
		return Err(PrepareError::MissingTitle(title_path));
	}

	let titles = read_records(&title_path)?;
	let Some(first) = titles.first() else {
		return Err(PrepareError::EmptyFile(title_path));
	};
	let names = column_names(first);

	let records: Vec<Record> = read_records(value_path)?
		.into_iter()
		.map(|record| rename_positional(record, &names))
		.collect();

	let finished = sibling(value_path, "finished");
	write_records(&finished, &records)?;
	Ok(finished)
}

pub fn column_names(title: &Record) -> Vec<String> {
	title
		.values()
		.map(|value| match value {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		})
		.collect()
}

/// 第 i 个值改用第 i 个列名；列名不足时保留原键。`交易日期` 统一改为 `日期`。
pub fn rename_positional(record: Record, names: &[String]) -> Record {
	record
		.into_iter()
		.enumerate()
		.map(|(i, (key, value))| {
			let name = names.get(i).cloned().unwrap_or(key);
			let name = if name == TRADE_DATE { DATE.to_string() } else { name };
			(name, value)
		})
		.collect()
}
