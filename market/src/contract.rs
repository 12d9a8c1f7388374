//! `.finished` -> `.temp`：`合约` 列向下填充。
//!
//! 交易所导出的表格中同一合约只在第一行写合约代码，后续行为空。

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::PrepareError;
use crate::records::{Record, files_with_suffix, read_records, sibling, write_records};

pub const CONTRACT: &str = "合约";

/// 先删除旧的 `.temp`，再为每个 `.finished` 生成填充后的 `.temp`。
pub fn fill_folder(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>, PrepareError> {
	let folder = folder.as_ref();
	for stale in files_with_suffix(folder, ".temp")? {
		if let Err(err) = fs::remove_file(&stale) {
			warn!(file = %stale.display(), error = %err, "failed to delete stale temp file");
		}
	}

	let mut out = Vec::new();
	for finished in files_with_suffix(folder, ".finished")? {
		let mut records = match read_records(&finished) {
			Ok(records) => records,
			Err(err) => {
				warn!(file = %finished.display(), error = %err, "skipping finished file");
				continue;
			}
		};
		fill_contracts(&mut records);

		let temp = sibling(&finished, "temp");
		write_records(&temp, &records)?;
		out.push(temp);
	}
	Ok(out)
}

/// 缺失、`null`、空串或 `nan` 的合约取前一个有效值；开头没有有效值时写 `null`。
pub fn fill_contracts(records: &mut [Record]) {
	let mut last: Option<Value> = None;
	for record in records.iter_mut() {
		match record.get(CONTRACT) {
			Some(value) if !is_blank(value) => last = Some(value.clone()),
			_ => {
				record.insert(CONTRACT.to_string(), last.clone().unwrap_or(Value::Null));
			}
		}
	}
}

pub fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => {
			let s = s.trim();
			s.is_empty() || s.eq_ignore_ascii_case("nan")
		}
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn records(values: &[Value]) -> Vec<Record> {
		values
			.iter()
			.map(|x| {
				let mut map = Record::new();
				map.insert(CONTRACT.to_string(), x.clone());
				map
			})
			.collect()
	}

	#[test]
	fn blanks_take_previous_contract() {
		let mut rows = records(&[json!(null), json!("cu2401"), json!(null), json!("nan"), json!("cu2402"), json!("")]);
		fill_contracts(&mut rows);
		let got: Vec<Value> = rows.iter().map(|x| x[CONTRACT].clone()).collect();
		assert_eq!(
			got,
			vec![json!(null), json!("cu2401"), json!("cu2401"), json!("cu2401"), json!("cu2402"), json!("cu2402")]
		);
	}

	#[test]
	fn missing_column_is_filled() {
		let mut rows = records(&[json!("ag2312")]);
		rows.push(Record::new());
		fill_contracts(&mut rows);
		assert_eq!(rows[1][CONTRACT], json!("ag2312"));
	}
}
