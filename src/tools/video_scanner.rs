use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 判斷副檔名是否符合（不分大小寫，可帶或不帶前導點）
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// 掃描資料夾第一層中指定副檔名的影片，依檔名排序
pub fn scan_video_files(directory: &Path, extension: &str) -> Result<Vec<VideoFileInfo>> {
    let mut video_files = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry =
            entry.with_context(|| format!("無法讀取資料夾: {}", directory.display()))?;
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        video_files.push(VideoFileInfo {
            path: entry.into_path(),
            size,
        });
    }

    video_files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(video_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("/a/clip.mp4"), "mp4"));
        assert!(has_extension(Path::new("/a/clip.MP4"), ".mp4"));
        assert!(!has_extension(Path::new("/a/clip.mkv"), "mp4"));
        assert!(!has_extension(Path::new("/a/mp4"), "mp4"));
    }

    #[test]
    fn test_scan_video_files_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.mp4"), b"bb").unwrap();
        fs::write(temp_dir.path().join("a.MP4"), b"aaaa").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(temp_dir.path().join("c.mkv"), b"c").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("d.mp4"), b"d").unwrap();

        let files = scan_video_files(temp_dir.path(), "mp4").unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.MP4", "b.mp4"]);
        assert_eq!(files[0].size, 4);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = scan_video_files(temp_dir.path(), "mp4").unwrap();
        assert!(files.is_empty());
    }
}
