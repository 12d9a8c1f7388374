use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::records::has_suffix;

/// 递归删除指定后缀的文件，返回删除数量。单个文件删除失败只记日志。
pub fn delete_files_with_suffix(folder: impl AsRef<Path>, suffix: &str) -> usize {
	let folder = folder.as_ref();
	let count = delete_in(folder, suffix);
	info!(folder = %folder.display(), suffix, count, "files deleted");
	count
}

fn delete_in(dir: &Path, suffix: &str) -> usize {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) => {
			warn!(dir = %dir.display(), error = %err, "failed to read directory");
			return 0;
		}
	};

	let mut count = 0;
	for entry in entries.flatten() {
		let path = entry.path();
		if path.is_dir() {
			count += delete_in(&path, suffix);
		} else if has_suffix(&path, suffix) {
			match fs::remove_file(&path) {
				Ok(()) => count += 1,
				Err(err) => warn!(file = %path.display(), error = %err, "failed to delete file"),
			}
		}
	}
	count
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deletes_matching_files_recursively() {
		let root = std::env::temp_dir().join(format!("market_cleanup_{}", std::process::id()));
		let nested = root.join("sub");
		fs::create_dir_all(&nested).unwrap();
		fs::write(root.join("a.json"), "[]").unwrap();
		fs::write(nested.join("b.json"), "[]").unwrap();
		fs::write(nested.join("c.value"), "[]").unwrap();

		assert_eq!(delete_files_with_suffix(&root, ".json"), 2);
		assert!(nested.join("c.value").exists());
		assert_eq!(delete_files_with_suffix(root.join("missing"), ".json"), 0);
		let _ = fs::remove_dir_all(root);
	}
}
