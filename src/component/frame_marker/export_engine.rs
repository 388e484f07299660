use super::error::MarkerError;
use super::mark_state::MarkState;
use super::recorder::{ExportRecord, Recorder};
use super::source::{DecodedFrame, FrameSource};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 匯出成功後的行為
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterExport {
    /// 清除標記後繼續瀏覽同一部影片
    #[default]
    Continue,
    /// 直接結束目前影片，進入批次中的下一部
    NextVideo,
}

/// 匯出首尾兩幀與對應紀錄
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportEngine {
    after_export: AfterExport,
}

impl ExportEngine {
    #[must_use]
    pub const fn new(after_export: AfterExport) -> Self {
        Self { after_export }
    }

    #[must_use]
    pub const fn after_export(&self) -> AfterExport {
        self.after_export
    }

    /// 首尾兩幀皆已標記才會執行，否則回傳 `Ok(None)` 且不做任何事
    ///
    /// 兩幀都解碼成功後才寫入圖片與紀錄；任一幀解碼失敗時回傳
    /// `ExportFailed`，標記保持原樣讓操作者重試。成功時清除標記。
    pub fn request_export<S, R>(
        &self,
        video_name: &str,
        marks: &mut MarkState,
        source: &mut S,
        recorder: &mut R,
    ) -> Result<Option<ExportRecord>, MarkerError>
    where
        S: FrameSource + ?Sized,
        R: Recorder + ?Sized,
    {
        let Some((first_index, last_index)) = marks.marks() else {
            return Ok(None);
        };

        let first = decode_for_export(source, first_index)?;
        let last = decode_for_export(source, last_index)?;

        let record = ExportRecord::new(video_name, &first, &last, marks.accident());

        let mut written = Vec::with_capacity(2);
        if let Err(e) = write_export(recorder, video_name, [&first, &last], &record, &mut written) {
            for path in &written {
                if let Err(discard_err) = recorder.discard_image(path) {
                    warn!("無法移除未完成的匯出圖片 {}: {discard_err}", path.display());
                }
            }
            return Err(e);
        }

        debug!(
            "已匯出 {video_name}: 第 {first_index} 幀 ({:.1} ms) → 第 {last_index} 幀 ({:.1} ms), 差 {:.1} ms, 事故: {}",
            record.first_frame_timestamp_ms,
            record.last_frame_timestamp_ms,
            record.time_difference_ms,
            record.accident
        );

        marks.reset();
        Ok(Some(record))
    }
}

/// 依序寫入圖片與紀錄，已寫入的圖片路徑放進 `written`
fn write_export<R: Recorder + ?Sized>(
    recorder: &mut R,
    video_name: &str,
    frames: [&DecodedFrame; 2],
    record: &ExportRecord,
    written: &mut Vec<PathBuf>,
) -> Result<(), MarkerError> {
    for frame in frames {
        let path = recorder.write_image(video_name, frame)?;
        if !written.contains(&path) {
            written.push(path);
        }
    }
    recorder.record(record)
}

fn decode_for_export<S: FrameSource + ?Sized>(
    source: &mut S,
    index: u64,
) -> Result<DecodedFrame, MarkerError> {
    source.decode(index).map_err(|e| {
        debug!("匯出時解碼第 {index} 幀失敗: {e}");
        MarkerError::ExportFailed {
            index,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    struct FakeSource {
        frame_count: u64,
        failing: HashSet<u64>,
    }

    impl FrameSource for FakeSource {
        fn frame_count(&self) -> u64 {
            self.frame_count
        }

        fn dimensions(&self) -> (u32, u32) {
            (640, 360)
        }

        fn decode(&mut self, index: u64) -> Result<DecodedFrame, MarkerError> {
            if self.failing.contains(&index) {
                return Err(MarkerError::DecodeFailure {
                    index,
                    reason: "corrupt".to_string(),
                });
            }
            Ok(DecodedFrame {
                index,
                timestamp_ms: index as f64 * 100.0,
                image: vec![index as u8],
            })
        }
    }

    #[derive(Default)]
    struct MemoryRecorder {
        images: Vec<(String, u64)>,
        records: Vec<ExportRecord>,
        discarded: Vec<PathBuf>,
        failing_image: Option<u64>,
        failing_record: bool,
    }

    fn disk_full() -> MarkerError {
        MarkerError::Io(std::io::Error::other("disk full"))
    }

    impl Recorder for MemoryRecorder {
        fn write_image(
            &mut self,
            video_name: &str,
            frame: &DecodedFrame,
        ) -> Result<PathBuf, MarkerError> {
            if self.failing_image == Some(frame.index) {
                return Err(disk_full());
            }
            self.images.push((video_name.to_string(), frame.index));
            Ok(PathBuf::from(format!("frame_{}.jpg", frame.index)))
        }

        fn record(&mut self, record: &ExportRecord) -> Result<(), MarkerError> {
            if self.failing_record {
                return Err(disk_full());
            }
            self.records.push(record.clone());
            Ok(())
        }

        fn discard_image(&mut self, path: &Path) -> Result<(), MarkerError> {
            self.discarded.push(path.to_path_buf());
            Ok(())
        }
    }

    fn source(failing: &[u64]) -> FakeSource {
        FakeSource {
            frame_count: 100,
            failing: failing.iter().copied().collect(),
        }
    }

    fn marked(first: u64, last: u64, accident: bool) -> MarkState {
        let mut marks = MarkState::new();
        marks.toggle_first(first);
        marks.toggle_last(last);
        if accident {
            marks.toggle_accident();
        }
        marks
    }

    #[test]
    fn test_export_is_noop_when_marks_incomplete() {
        let engine = ExportEngine::default();
        let mut recorder = MemoryRecorder::default();

        let mut only_first = MarkState::new();
        only_first.toggle_first(3);
        let before = only_first;
        let result = engine
            .request_export("clip", &mut only_first, &mut source(&[]), &mut recorder)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(only_first, before);

        let mut empty = MarkState::new();
        let result = engine
            .request_export("clip", &mut empty, &mut source(&[]), &mut recorder)
            .unwrap();
        assert!(result.is_none());
        assert!(recorder.images.is_empty());
        assert!(recorder.records.is_empty());
    }

    #[test]
    fn test_export_writes_two_images_and_one_record() {
        let engine = ExportEngine::default();
        let mut recorder = MemoryRecorder::default();
        let mut marks = marked(10, 40, true);

        let record = engine
            .request_export("clip", &mut marks, &mut source(&[]), &mut recorder)
            .unwrap()
            .unwrap();

        assert_eq!(
            recorder.images,
            vec![("clip".to_string(), 10), ("clip".to_string(), 40)]
        );
        assert_eq!(recorder.records, vec![record.clone()]);
        assert!((record.first_frame_timestamp_ms - 1000.0).abs() < f64::EPSILON);
        assert!((record.last_frame_timestamp_ms - 4000.0).abs() < f64::EPSILON);
        assert!((record.time_difference_ms - 3000.0).abs() < f64::EPSILON);
        assert!(record.accident);
        assert_eq!(marks, MarkState::new());
    }

    #[test]
    fn test_reversed_marks_give_negative_difference() {
        let engine = ExportEngine::default();
        let mut recorder = MemoryRecorder::default();
        let mut marks = marked(40, 10, false);

        let record = engine
            .request_export("clip", &mut marks, &mut source(&[]), &mut recorder)
            .unwrap()
            .unwrap();

        assert_eq!(record.first_frame_index, 40);
        assert_eq!(record.last_frame_index, 10);
        assert!((record.time_difference_ms + 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_failure_on_second_frame_leaves_state_untouched() {
        let engine = ExportEngine::default();
        let mut recorder = MemoryRecorder::default();
        let mut marks = marked(10, 40, true);
        let before = marks;

        let err = engine
            .request_export("clip", &mut marks, &mut source(&[40]), &mut recorder)
            .unwrap_err();

        assert!(matches!(err, MarkerError::ExportFailed { index: 40, .. }));
        assert_eq!(marks, before);
        assert!(recorder.images.is_empty());
        assert!(recorder.records.is_empty());
    }

    #[test]
    fn test_failed_second_image_discards_first() {
        let engine = ExportEngine::default();
        let mut recorder = MemoryRecorder {
            failing_image: Some(40),
            ..MemoryRecorder::default()
        };
        let mut marks = marked(10, 40, false);
        let before = marks;

        let err = engine
            .request_export("clip", &mut marks, &mut source(&[]), &mut recorder)
            .unwrap_err();

        assert!(matches!(err, MarkerError::Io(_)));
        assert_eq!(recorder.discarded, vec![PathBuf::from("frame_10.jpg")]);
        assert!(recorder.records.is_empty());
        assert_eq!(marks, before);
    }

    #[test]
    fn test_failed_record_discards_both_images() {
        let engine = ExportEngine::default();
        let mut recorder = MemoryRecorder {
            failing_record: true,
            ..MemoryRecorder::default()
        };
        let mut marks = marked(10, 40, true);
        let before = marks;

        assert!(
            engine
                .request_export("clip", &mut marks, &mut source(&[]), &mut recorder)
                .is_err()
        );
        assert_eq!(
            recorder.discarded,
            vec![PathBuf::from("frame_10.jpg"), PathBuf::from("frame_40.jpg")]
        );
        assert_eq!(marks, before);
    }

    #[test]
    fn test_after_export_policy_defaults_to_continue() {
        assert_eq!(ExportEngine::default().after_export(), AfterExport::Continue);
        assert_eq!(
            ExportEngine::new(AfterExport::NextVideo).after_export(),
            AfterExport::NextVideo
        );
    }
}
