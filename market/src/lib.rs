//! `market` crate 入口。
//!
//! 职责：把交易所导出的原始 json 整理为按合约拆分的 K 线文件，供 `zen` 读取。
//! 该文件只做模块装配与统一导出，具体实现位于各子模块。
//!
//! 模块分工：
//! - `remap`：`.value` 按 `.title` 列名重命名，生成 `.finished`。
//! - `contract`：`合约` 列向下填充，生成 `.temp`。
//! - `grouping`：按合约归类写出 `<合约>.json`，删除 `.temp`。
//! - `cleanup`：按后缀递归删除文件。
//!
//! 快速示例：
//! ```no_run
//! let report = market::prepare_folder("/data/shfe").unwrap();
//! println!("{} contracts", report.contracts.len());
//! ```

mod cleanup;
mod contract;
mod error;
mod grouping;
mod records;
mod remap;

use std::path::{Path, PathBuf};

use tracing::info;

pub use cleanup::delete_files_with_suffix;
pub use contract::{fill_contracts, fill_folder};
pub use error::PrepareError;
pub use grouping::{contract_key, group_folder, sanitize};
pub use records::{Record, read_records, write_records};
pub use remap::{remap_file, remap_folder};

/// `prepare_folder` 各步骤产出的文件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareReport {
	pub finished: Vec<PathBuf>,
	pub temp: Vec<PathBuf>,
	pub contracts: Vec<PathBuf>,
}

/// 依次执行重命名、合约填充、按合约归类。
pub fn prepare_folder(folder: impl AsRef<Path>) -> Result<PrepareReport, PrepareError> {
	let folder = folder.as_ref();
	let finished = remap_folder(folder)?;
	let temp = fill_folder(folder)?;
	let contracts = group_folder(folder)?;
	info!(
		folder = %folder.display(),
		finished = finished.len(),
		temp = temp.len(),
		contracts = contracts.len(),
		"dataset prepared"
	);
	Ok(PrepareReport {
		finished,
		temp,
		contracts,
	})
}
