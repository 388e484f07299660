use anyhow::Result;
use std::path::Path;

/// 命令列輸入路徑的種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
}

/// 路徑不存在時回傳 `None`
#[must_use]
pub fn classify_input_path(path: &Path) -> Option<InputKind> {
    if path.is_dir() {
        Some(InputKind::Directory)
    } else if path.is_file() {
        Some(InputKind::File)
    } else {
        None
    }
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
