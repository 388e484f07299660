use crate::component::frame_marker::AfterExport;
use crate::tools::DEFAULT_JPEG_QUALITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 最多保留幾筆最近使用的輸出資料夾
pub const MAX_RECENT_PATHS: usize = 5;

/// 影格標記相關設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
    /// 資料夾模式下要處理的影片副檔名
    pub video_extension: String,
    /// ffmpeg mjpeg 品質（2-31，越小越好）
    pub jpeg_quality: u8,
    pub after_export: AfterExport,
    /// 批次彙總 CSV 檔名
    pub batch_csv_name: String,
    /// 每次匯出時額外寫入 `<影片>/timestamps.csv`
    pub per_video_csv: bool,
    /// 每次顯示影格時同步寫出預覽圖，供外部看圖程式即時瀏覽
    pub preview_path: Option<PathBuf>,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            video_extension: "mp4".to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            after_export: AfterExport::Continue,
            batch_csv_name: "output.csv".to_string(),
            per_video_csv: false,
            preview_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// 最近使用的輸出資料夾（最新在前）
    pub recent_paths: Vec<String>,
    pub marker: MarkerSettings,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}
