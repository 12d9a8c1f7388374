//! `.temp` -> `<合约>.json`：按合约归类。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::PrepareError;
use crate::contract::{CONTRACT, is_blank};
use crate::records::{Record, files_with_suffix, read_records, write_records};

/// 归类全部 `.temp` 记录并逐合约写出 json，完成后删除 `.temp`。
pub fn group_folder(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>, PrepareError> {
	let folder = folder.as_ref();
	let temps = files_with_suffix(folder, ".temp")?;

	let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
	for temp in &temps {
		let records = match read_records(temp) {
			Ok(records) => records,
			Err(err) => {
				warn!(file = %temp.display(), error = %err, "skipping temp file");
				continue;
			}
		};
		for record in records {
			let Some(contract) = contract_key(&record) else {
				continue;
			};
			groups.entry(contract).or_default().push(record);
		}
	}

	let mut out = Vec::with_capacity(groups.len());
	for (contract, records) in &groups {
		let path = folder.join(format!("{contract}.json"));
		write_records(&path, records)?;
		info!(file = %path.display(), records = records.len(), "contract file written");
		out.push(path);
	}

	for temp in temps {
		if let Err(err) = fs::remove_file(&temp) {
			warn!(file = %temp.display(), error = %err, "failed to delete temp file");
		}
	}
	Ok(out)
}

/// 记录所属合约的文件名，没有合约时返回 `None`。
pub fn contract_key(record: &Record) -> Option<String> {
	let value = record.get(CONTRACT)?;
	if is_blank(value) {
		return None;
	}
	let name = match value {
		Value::String(s) => s.trim().to_string(),
		other => other.to_string(),
	};
	Some(sanitize(&name))
}

pub fn sanitize(contract: &str) -> String {
	contract.replace(['/', '\\'], "_")
}
