//! StreamSeal 原子写入工具。
//!
//! 提供「先写临时文件，成功后再替换目标文件」的写出语义：
//! 加密或解密中途失败时，目标路径保持原状，不会出现半截容器或未认证的明文。

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 原子写文件。
///
/// 流程：
/// 1. 在目标目录创建临时文件；
/// 2. 调用 `write_fn` 写入完整内容；
/// 3. 写入成功并落盘后，使用 rename 替换目标文件。
///
/// `write_fn` 返回错误时临时文件被删除，错误原样返回。
pub fn write_atomic<F>(target: &Path, write_fn: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "目标路径没有父目录，无法执行原子写入",
            ));
        }
    };

    fs::create_dir_all(parent)?;

    let tmp_path = build_tmp_path(parent, target.file_name());
    let mut tmp_file = File::create(&tmp_path)?;
    trace!(tmp = %tmp_path.display(), "temporary output created");

    let result = write_fn(&mut tmp_file).and_then(|()| tmp_file.sync_all());
    if let Err(err) = result {
        drop(tmp_file);
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(tmp_file);

    if let Err(err) = replace(&tmp_path, target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    Ok(())
}

/// Unix 上 rename 直接覆盖目标
#[cfg(not(windows))]
fn replace(tmp_path: &Path, target: &Path) -> io::Result<()> {
    fs::rename(tmp_path, target)
}

/// Windows 上目标已存在时 rename 可能失败，此时才删除目标后重试
#[cfg(windows)]
fn replace(tmp_path: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(tmp_path, target) {
        Err(_) if target.is_file() => {
            fs::remove_file(target)?;
            fs::rename(tmp_path, target)
        }
        other => other,
    }
}

fn build_tmp_path(parent: &Path, file_name: Option<&OsStr>) -> PathBuf {
    let base_name = file_name
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("streamseal-output");

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    parent.join(format!(
        ".{base_name}.tmp-{}-{timestamp}-{counter}",
        std::process::id()
    ))
}
