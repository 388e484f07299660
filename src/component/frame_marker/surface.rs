use super::error::MarkerError;
use super::mark_state::MarkState;
use super::navigation::{InputEvent, PlaybackState};
use super::source::DecodedFrame;

/// 疊加在畫面上的標記資訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub video_name: String,
    pub current_frame: u64,
    pub frame_count: u64,
    pub first_frame: Option<u64>,
    pub last_frame: Option<u64>,
    pub accident: bool,
    pub paused: bool,
}

impl Overlay {
    #[must_use]
    pub fn new(
        video_name: &str,
        frame_count: u64,
        playback: &PlaybackState,
        marks: &MarkState,
    ) -> Self {
        Self {
            video_name: video_name.to_string(),
            current_frame: playback.current_frame,
            frame_count,
            first_frame: marks.first_frame(),
            last_frame: marks.last_frame(),
            accident: marks.accident(),
            paused: playback.paused,
        }
    }
}

pub trait Display {
    fn render(&mut self, frame: &DecodedFrame, overlay: &Overlay) -> Result<(), MarkerError>;

    fn toggle_fullscreen(&mut self);

    /// 顯示一次性的提示訊息（例如匯出結果）
    fn notify(&mut self, message: &str);
}

pub trait EventSource {
    /// 取出目前所有待處理事件
    ///
    /// `block` 為 `true` 時可等待至少一個事件（或逾時回傳空集合）。
    fn poll(&mut self, block: bool) -> Result<Vec<InputEvent>, MarkerError>;
}
