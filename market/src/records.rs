//! 交易所导出文件的读写工具。
//!
//! 文件内容是 json 记录数组，可能带有 `NaN` 等非标准字面量，读取时按 `null` 处理。

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use zen::relax_json_literals;

use crate::PrepareError;

pub type Record = Map<String, Value>;

/// 读取记录数组；非数组或空数组返回 `EmptyFile`，数组中的非对象元素被忽略。
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>, PrepareError> {
	let path = path.as_ref();
	let text = fs::read_to_string(path)?;
	let value: Value = serde_json::from_str(&relax_json_literals(&text))?;
	match value {
		Value::Array(items) if !items.is_empty() => Ok(items
			.into_iter()
			.filter_map(|item| match item {
				Value::Object(map) => Some(map),
				_ => None,
			})
			.collect()),
		_ => Err(PrepareError::EmptyFile(path.to_path_buf())),
	}
}

pub fn write_records(path: impl AsRef<Path>, records: &[Record]) -> Result<(), PrepareError> {
	fs::write(path, serde_json::to_vec_pretty(records)?)?;
	Ok(())
}

/// 目录下（不递归）指定后缀的文件，按文件名排序。
pub fn files_with_suffix(folder: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>, PrepareError> {
	let mut out = Vec::new();
	for entry in fs::read_dir(folder)? {
		let path = entry?.path();
		if path.is_file() && has_suffix(&path, suffix) {
			out.push(path);
		}
	}
	out.sort();
	Ok(out)
}

pub fn has_suffix(path: &Path, suffix: &str) -> bool {
	path.file_name()
		.and_then(|x| x.to_str())
		.is_some_and(|name| name.ends_with(suffix))
}

/// 替换扩展名，例如 `a.value` -> `a.finished`。
pub fn sibling(path: &Path, extension: &str) -> PathBuf {
	path.with_extension(extension)
}
