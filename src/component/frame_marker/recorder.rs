use super::error::MarkerError;
use super::source::DecodedFrame;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// 彙總 CSV 的欄位名稱（順序與 `ExportRecord` 欄位一致）
pub const BATCH_CSV_HEADERS: [&str; 7] = [
    "Video Name",
    "First Frame",
    "First Frame Timestamp (ms)",
    "Last Frame",
    "Last Frame Timestamp (ms)",
    "Time Difference (ms)",
    "Accident Occurred",
];

/// 解碼端固定輸出 JPEG
pub const IMAGE_EXTENSION: &str = "jpg";

const PER_VIDEO_CSV_NAME: &str = "timestamps.csv";
const PER_VIDEO_CSV_HEADERS: [&str; 3] = ["Frame ID", "Timestamp (ms)", "Accident"];

/// 一次成功匯出的紀錄，建立後不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "Video Name")]
    pub video_name: String,
    #[serde(rename = "First Frame")]
    pub first_frame_index: u64,
    #[serde(rename = "First Frame Timestamp (ms)")]
    pub first_frame_timestamp_ms: f64,
    #[serde(rename = "Last Frame")]
    pub last_frame_index: u64,
    #[serde(rename = "Last Frame Timestamp (ms)")]
    pub last_frame_timestamp_ms: f64,
    /// 尾幀減首幀，可能為負值
    #[serde(rename = "Time Difference (ms)")]
    pub time_difference_ms: f64,
    #[serde(rename = "Accident Occurred")]
    pub accident: bool,
}

impl ExportRecord {
    #[must_use]
    pub fn new(video_name: &str, first: &DecodedFrame, last: &DecodedFrame, accident: bool) -> Self {
        Self {
            video_name: video_name.to_string(),
            first_frame_index: first.index,
            first_frame_timestamp_ms: first.timestamp_ms,
            last_frame_index: last.index,
            last_frame_timestamp_ms: last.timestamp_ms,
            time_difference_ms: last.timestamp_ms - first.timestamp_ms,
            accident,
        }
    }
}

/// 匯出產物的寫入端
pub trait Recorder {
    /// 寫入影格圖片，回傳檔案路徑
    fn write_image(&mut self, video_name: &str, frame: &DecodedFrame)
    -> Result<PathBuf, MarkerError>;

    /// 記錄一次匯出
    fn record(&mut self, record: &ExportRecord) -> Result<(), MarkerError>;

    /// 移除匯出失敗時已寫入的圖片
    fn discard_image(&mut self, path: &Path) -> Result<(), MarkerError>;
}

/// 將圖片寫入 `<output_base>/<video_name>/frame_<index>.jpg`
#[derive(Debug, Clone)]
pub struct FsRecorder {
    output_base: PathBuf,
    per_video_csv: bool,
}

impl FsRecorder {
    #[must_use]
    pub fn new(output_base: &Path, per_video_csv: bool) -> Self {
        Self {
            output_base: output_base.to_path_buf(),
            per_video_csv,
        }
    }

    #[must_use]
    pub fn video_dir(&self, video_name: &str) -> PathBuf {
        self.output_base.join(video_name)
    }

    #[must_use]
    pub fn image_path(&self, video_name: &str, index: u64) -> PathBuf {
        self.video_dir(video_name)
            .join(format!("frame_{index}.{IMAGE_EXTENSION}"))
    }

    fn append_per_video_rows(&self, record: &ExportRecord) -> Result<(), MarkerError> {
        let dir = self.video_dir(&record.video_name);
        fs::create_dir_all(&dir)?;

        let path = dir.join(PER_VIDEO_CSV_NAME);
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer.write_record(PER_VIDEO_CSV_HEADERS)?;
        }
        let accident = if record.accident { "Accident" } else { "No Accident" };
        for (index, timestamp) in [
            (record.first_frame_index, record.first_frame_timestamp_ms),
            (record.last_frame_index, record.last_frame_timestamp_ms),
        ] {
            writer.write_record([index.to_string(), timestamp.to_string(), accident.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Recorder for FsRecorder {
    fn write_image(
        &mut self,
        video_name: &str,
        frame: &DecodedFrame,
    ) -> Result<PathBuf, MarkerError> {
        let dir = self.video_dir(video_name);
        fs::create_dir_all(&dir)?;

        let path = self.image_path(video_name, frame.index);
        fs::write(&path, &frame.image)?;
        debug!("已寫入影格圖片: {}", path.display());
        Ok(path)
    }

    fn record(&mut self, record: &ExportRecord) -> Result<(), MarkerError> {
        if self.per_video_csv {
            self.append_per_video_rows(record)?;
        }
        Ok(())
    }

    fn discard_image(&mut self, path: &Path) -> Result<(), MarkerError> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("已移除影格圖片: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 批次結束時一次寫入彙總 CSV；沒有紀錄時只寫標題列
pub fn write_batch_csv(path: &Path, records: &[ExportRecord]) -> Result<(), MarkerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(BATCH_CSV_HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
