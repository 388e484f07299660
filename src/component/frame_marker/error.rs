use std::path::PathBuf;
use thiserror::Error;

/// 影格標記流程的錯誤分類
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("無效的輸入路徑: {}", .0.display())]
    InvalidInput(PathBuf),
    #[error("無法開啟影片 {}: {reason}", .path.display())]
    OpenFailure { path: PathBuf, reason: String },
    #[error("無法解碼第 {index} 幀: {reason}")]
    DecodeFailure { index: u64, reason: String },
    #[error("匯出失敗（第 {index} 幀）: {reason}")]
    ExportFailed { index: u64, reason: String },
    #[error("未選擇輸出資料夾")]
    NoOutputSelected,
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV 寫入錯誤: {0}")]
    Csv(#[from] csv::Error),
}

impl MarkerError {
    /// 單一影片層級的錯誤，批次模式下可略過該影片繼續處理
    #[must_use]
    pub const fn is_video_scoped(&self) -> bool {
        matches!(self, Self::OpenFailure { .. })
    }
}
