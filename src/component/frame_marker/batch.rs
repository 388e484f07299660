use super::error::MarkerError;
use super::recorder::ExportRecord;
use super::session::CloseReason;
use std::path::{Path, PathBuf};

/// 單一影片處理結果
#[derive(Debug, Clone)]
pub struct VideoOutcome {
    pub video_name: String,
    pub records: Vec<ExportRecord>,
    pub reason: CloseReason,
}

/// 開啟失敗而略過的影片
#[derive(Debug, Clone)]
pub struct FailedVideo {
    pub path: PathBuf,
    pub error_message: String,
}

/// 整個批次的彙總，批次結束時一次寫出
#[derive(Debug, Default)]
pub struct BatchResult {
    records: Vec<ExportRecord>,
    videos: Vec<(String, usize, CloseReason)>,
    failures: Vec<FailedVideo>,
    quit_early: bool,
}

impl BatchResult {
    pub fn push(&mut self, outcome: VideoOutcome) {
        self.videos
            .push((outcome.video_name, outcome.records.len(), outcome.reason));
        self.records.extend(outcome.records);
    }

    pub fn push_failure(&mut self, path: &Path, error: &MarkerError) {
        self.failures.push(FailedVideo {
            path: path.to_path_buf(),
            error_message: error.to_string(),
        });
    }

    pub const fn mark_quit_early(&mut self) {
        self.quit_early = true;
    }

    /// 依處理順序排列的所有匯出紀錄
    #[must_use]
    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    #[must_use]
    pub fn failures(&self) -> &[FailedVideo] {
        &self.failures
    }

    #[must_use]
    pub const fn quit_early(&self) -> bool {
        self.quit_early
    }

    #[must_use]
    pub fn processed_videos(&self) -> usize {
        self.videos.len()
    }

    /// 至少匯出一次的影片數
    #[must_use]
    pub fn exported_videos(&self) -> usize {
        self.videos.iter().filter(|(_, count, _)| *count > 0).count()
    }

    /// 未匯出就離開的影片數
    #[must_use]
    pub fn skipped_videos(&self) -> usize {
        self.processed_videos() - self.exported_videos()
    }
}
