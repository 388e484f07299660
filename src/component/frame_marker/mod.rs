//! 影格標記與匯出元件
//!
//! 流程：開啟影片 → 逐幀瀏覽並標記首尾兩幀 → 匯出圖片與時間戳記 → 下一部影片。
//! 影片來源、畫面、輸入與寫檔皆為 trait，核心狀態機可在無終端機的情況下測試。

mod batch;
mod error;
mod export_engine;
mod main;
mod mark_state;
mod navigation;
mod recorder;
mod session;
mod source;
mod surface;
mod terminal;

pub use batch::{BatchResult, FailedVideo, VideoOutcome};
pub use error::MarkerError;
pub use export_engine::{AfterExport, ExportEngine};
pub use main::{FrameMarker, RunOptions};
pub use mark_state::MarkState;
pub use navigation::{InputEvent, NavAction, NavigationController, PlaybackState, Transition};
pub use recorder::{BATCH_CSV_HEADERS, ExportRecord, FsRecorder, Recorder, write_batch_csv};
pub use session::{
    CloseReason, EventOutcome, SessionLoop, SessionPhase, VideoSession, video_name_of,
};
pub use source::{DecodedFrame, FrameSource, VideoOpener};
pub use surface::{Display, EventSource, Overlay};
pub use terminal::{KEY_HELP, KeyboardEvents, TerminalDisplay, map_key, status_line};
