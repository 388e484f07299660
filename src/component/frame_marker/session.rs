use super::batch::{BatchResult, VideoOutcome};
use super::error::MarkerError;
use super::export_engine::{AfterExport, ExportEngine};
use super::mark_state::MarkState;
use super::navigation::{InputEvent, NavAction, NavigationController, PlaybackState};
use super::recorder::{ExportRecord, Recorder};
use super::source::{FrameSource, VideoOpener};
use super::surface::{Display, EventSource, Overlay};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 影片關閉的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    NextVideo,
    Quit,
    /// 匯出後直接結束（`AfterExport::NextVideo`）
    Exported,
    /// 收到 Ctrl-C
    Interrupted,
}

impl CloseReason {
    /// 是否結束整個批次
    #[must_use]
    pub const fn ends_batch(self) -> bool {
        matches!(self, Self::Quit | Self::Interrupted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Opening,
    Navigating,
    Exporting,
    Closed(CloseReason),
}

/// 單一事件處理後，需要由外層迴圈回應的結果
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Continue,
    ToggleFullscreen,
    /// 標記不齊全，匯出請求被忽略
    ExportIgnored,
    Exported(ExportRecord),
    Closed(CloseReason),
}

/// 以檔名（不含副檔名）作為影片名稱
#[must_use]
pub fn video_name_of(path: &Path) -> String {
    path.file_stem().map_or_else(
        || "video".to_string(),
        |s| s.to_string_lossy().to_string(),
    )
}

/// 一部影片從開啟到關閉的狀態
pub struct VideoSession<S> {
    video_name: String,
    source: S,
    controller: NavigationController,
    playback: PlaybackState,
    marks: MarkState,
    phase: SessionPhase,
    records: Vec<ExportRecord>,
    rendered: Option<Overlay>,
}

impl<S: FrameSource> VideoSession<S> {
    /// Opening → Navigating；開啟失敗時回傳 `OpenFailure`
    pub fn open<O>(opener: &O, path: &Path) -> Result<Self, MarkerError>
    where
        O: VideoOpener<Source = S> + ?Sized,
    {
        let video_name = video_name_of(path);
        debug!("[{video_name}] {:?}: {}", SessionPhase::Opening, path.display());
        let source = opener.open(path)?;
        Ok(Self::with_source(&video_name, source))
    }

    #[must_use]
    pub fn with_source(video_name: &str, source: S) -> Self {
        let controller = NavigationController::new(source.frame_count());
        let (width, height) = source.dimensions();
        debug!(
            "[{video_name}] 共 {} 幀, {width}x{height}",
            controller.frame_count()
        );
        Self {
            video_name: video_name.to_string(),
            source,
            controller,
            playback: PlaybackState::default(),
            marks: MarkState::new(),
            phase: SessionPhase::Navigating,
            records: Vec::new(),
            rendered: None,
        }
    }

    #[must_use]
    pub fn video_name(&self) -> &str {
        &self.video_name
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn playback(&self) -> PlaybackState {
        self.playback
    }

    #[must_use]
    pub const fn marks(&self) -> MarkState {
        self.marks
    }

    #[must_use]
    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.phase, SessionPhase::Closed(_))
    }

    #[must_use]
    pub fn overlay(&self) -> Overlay {
        Overlay::new(
            &self.video_name,
            self.controller.frame_count(),
            &self.playback,
            &self.marks,
        )
    }

    /// 畫面內容與上次顯示不同時才需要重新解碼
    #[must_use]
    pub fn needs_render(&self) -> bool {
        !self.is_closed() && self.rendered.as_ref() != Some(&self.overlay())
    }

    pub fn handle_event<R>(
        &mut self,
        event: InputEvent,
        engine: &ExportEngine,
        recorder: &mut R,
    ) -> Result<EventOutcome, MarkerError>
    where
        R: Recorder + ?Sized,
    {
        if let SessionPhase::Closed(reason) = self.phase {
            return Ok(EventOutcome::Closed(reason));
        }

        let transition = self.controller.apply(event, self.playback, self.marks);
        self.playback = transition.playback;
        self.marks = transition.marks;

        match transition.action {
            NavAction::None | NavAction::Seek(_) => Ok(EventOutcome::Continue),
            NavAction::ToggleFullscreen => Ok(EventOutcome::ToggleFullscreen),
            NavAction::Export => self.export(engine, recorder),
            NavAction::NextVideo => Ok(self.close_with(CloseReason::NextVideo)),
            NavAction::Quit => Ok(self.close_with(CloseReason::Quit)),
        }
    }

    fn export<R>(
        &mut self,
        engine: &ExportEngine,
        recorder: &mut R,
    ) -> Result<EventOutcome, MarkerError>
    where
        R: Recorder + ?Sized,
    {
        self.phase = SessionPhase::Exporting;
        let result =
            engine.request_export(&self.video_name, &mut self.marks, &mut self.source, recorder);
        self.phase = SessionPhase::Navigating;

        match result? {
            None => {
                debug!("[{}] 標記不齊全，忽略匯出", self.video_name);
                Ok(EventOutcome::ExportIgnored)
            }
            Some(record) => {
                self.records.push(record.clone());
                if engine.after_export() == AfterExport::NextVideo {
                    self.close_with(CloseReason::Exported);
                }
                Ok(EventOutcome::Exported(record))
            }
        }
    }

    fn close_with(&mut self, reason: CloseReason) -> EventOutcome {
        debug!("[{}] 關閉: {reason:?}", self.video_name);
        self.phase = SessionPhase::Closed(reason);
        EventOutcome::Closed(reason)
    }

    pub fn interrupt(&mut self) {
        if !self.is_closed() {
            self.close_with(CloseReason::Interrupted);
        }
    }

    /// 解碼並顯示目前影格
    ///
    /// 解碼失敗時仍記錄此畫面已處理，避免在同一幀上反覆重試。
    pub fn render<D>(&mut self, display: &mut D) -> Result<(), MarkerError>
    where
        D: Display + ?Sized,
    {
        let overlay = self.overlay();
        self.rendered = Some(overlay.clone());
        let frame = self.source.decode(self.playback.current_frame)?;
        display.render(&frame, &overlay)
    }

    /// 自動播放：未暫停時前進一幀
    pub fn tick(&mut self) {
        self.playback = self.controller.autoplay(self.playback);
    }

    /// Closed → 釋放影片來源並交出本片的匯出紀錄
    #[must_use]
    pub fn close(self) -> VideoOutcome {
        let reason = match self.phase {
            SessionPhase::Closed(reason) => reason,
            _ => CloseReason::Interrupted,
        };
        VideoOutcome {
            video_name: self.video_name,
            records: self.records,
            reason,
        }
    }
}

/// 逐部影片驅動開啟、瀏覽標記、匯出與關閉
pub struct SessionLoop<O, E, D, R> {
    opener: O,
    events: E,
    display: D,
    recorder: R,
    engine: ExportEngine,
    shutdown_signal: Arc<AtomicBool>,
}

impl<O, E, D, R> SessionLoop<O, E, D, R>
where
    O: VideoOpener,
    E: EventSource,
    D: Display,
    R: Recorder,
{
    pub const fn new(
        opener: O,
        events: E,
        display: D,
        recorder: R,
        engine: ExportEngine,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            opener,
            events,
            display,
            recorder,
            engine,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// 處理單一影片直到關閉
    pub fn run_video(&mut self, path: &Path) -> Result<VideoOutcome, MarkerError> {
        let mut session = VideoSession::open(&self.opener, path)?;
        info!("開始處理影片: {}", path.display());
        self.drive(&mut session)?;
        let outcome = session.close();
        info!(
            "影片 {} 結束 ({:?}), 匯出 {} 筆",
            outcome.video_name,
            outcome.reason,
            outcome.records.len()
        );
        Ok(outcome)
    }

    /// 依序處理多部影片；開啟失敗的影片略過並記錄
    pub fn run_batch(&mut self, videos: &[PathBuf]) -> Result<BatchResult, MarkerError> {
        let mut result = BatchResult::default();

        for (index, path) in videos.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止處理");
                result.mark_quit_early();
                break;
            }

            debug!("[{}/{}] {}", index + 1, videos.len(), path.display());
            match self.run_video(path) {
                Ok(outcome) => {
                    let ends_batch = outcome.reason.ends_batch();
                    result.push(outcome);
                    if ends_batch {
                        result.mark_quit_early();
                        break;
                    }
                }
                Err(e) if e.is_video_scoped() => {
                    error!("{e}");
                    self.display.notify(&format!("略過影片: {e}"));
                    result.push_failure(path, &e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    fn drive(&mut self, session: &mut VideoSession<O::Source>) -> Result<(), MarkerError> {
        while !session.is_closed() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                session.interrupt();
                break;
            }

            let block = !session.needs_render();
            for event in self.events.poll(block)? {
                match session.handle_event(event, &self.engine, &mut self.recorder) {
                    Ok(EventOutcome::Continue | EventOutcome::ExportIgnored) => {}
                    Ok(EventOutcome::ToggleFullscreen) => self.display.toggle_fullscreen(),
                    Ok(EventOutcome::Exported(record)) => self.display.notify(&format!(
                        "已匯出第 {} 幀與第 {} 幀",
                        record.first_frame_index, record.last_frame_index
                    )),
                    Ok(EventOutcome::Closed(_)) => break,
                    Err(e) => {
                        debug!("[{}] {e}", session.video_name());
                        self.display.notify(&format!("匯出失敗，可重新嘗試: {e}"));
                    }
                }
            }

            if session.needs_render() {
                if let Err(e) = session.render(&mut self.display) {
                    debug!("[{}] 顯示影格失敗: {e}", session.video_name());
                    self.display.notify(&format!("顯示影格失敗: {e}"));
                }
                session.tick();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::frame_marker::source::DecodedFrame;

    struct CountingSource {
        frame_count: u64,
        decoded: Vec<u64>,
    }

    impl FrameSource for CountingSource {
        fn frame_count(&self) -> u64 {
            self.frame_count
        }

        fn dimensions(&self) -> (u32, u32) {
            (320, 240)
        }

        fn decode(&mut self, index: u64) -> Result<DecodedFrame, MarkerError> {
            self.decoded.push(index);
            Ok(DecodedFrame {
                index,
                timestamp_ms: index as f64 * 40.0,
                image: Vec::new(),
            })
        }
    }

    struct NullRecorder;

    impl Recorder for NullRecorder {
        fn write_image(
            &mut self,
            _video_name: &str,
            frame: &DecodedFrame,
        ) -> Result<PathBuf, MarkerError> {
            Ok(PathBuf::from(format!("frame_{}.jpg", frame.index)))
        }

        fn record(&mut self, _record: &ExportRecord) -> Result<(), MarkerError> {
            Ok(())
        }

        fn discard_image(&mut self, _path: &Path) -> Result<(), MarkerError> {
            Ok(())
        }
    }

    fn session(frame_count: u64) -> VideoSession<CountingSource> {
        VideoSession::with_source(
            "clip",
            CountingSource {
                frame_count,
                decoded: Vec::new(),
            },
        )
    }

    #[test]
    fn test_video_name_of() {
        assert_eq!(video_name_of(Path::new("/videos/dashcam_01.mp4")), "dashcam_01");
        assert_eq!(video_name_of(Path::new("/")), "video");
    }

    #[test]
    fn test_session_starts_navigating() {
        let session = session(10);
        assert_eq!(session.phase(), SessionPhase::Navigating);
        assert_eq!(session.playback().current_frame, 0);
        assert!(session.needs_render());
    }

    #[test]
    fn test_export_continue_policy_returns_to_navigating() {
        let mut session = session(100);
        let engine = ExportEngine::new(AfterExport::Continue);
        let mut recorder = NullRecorder;

        session
            .handle_event(InputEvent::MarkFirst, &engine, &mut recorder)
            .unwrap();
        for _ in 0..5 {
            session
                .handle_event(InputEvent::StepForward, &engine, &mut recorder)
                .unwrap();
        }
        session
            .handle_event(InputEvent::MarkLast, &engine, &mut recorder)
            .unwrap();

        let outcome = session
            .handle_event(InputEvent::RequestExport, &engine, &mut recorder)
            .unwrap();

        assert!(matches!(outcome, EventOutcome::Exported(ref r) if r.last_frame_index == 5));
        assert_eq!(session.phase(), SessionPhase::Navigating);
        assert_eq!(session.marks(), MarkState::new());
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn test_export_next_video_policy_closes_session() {
        let mut session = session(100);
        let engine = ExportEngine::new(AfterExport::NextVideo);
        let mut recorder = NullRecorder;

        session
            .handle_event(InputEvent::MarkFirst, &engine, &mut recorder)
            .unwrap();
        session
            .handle_event(InputEvent::MarkLast, &engine, &mut recorder)
            .unwrap();
        session
            .handle_event(InputEvent::RequestExport, &engine, &mut recorder)
            .unwrap();

        assert_eq!(session.phase(), SessionPhase::Closed(CloseReason::Exported));
        let outcome = session.close();
        assert_eq!(outcome.reason, CloseReason::Exported);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_incomplete_export_is_ignored() {
        let mut session = session(10);
        let engine = ExportEngine::default();
        let outcome = session
            .handle_event(InputEvent::RequestExport, &engine, &mut NullRecorder)
            .unwrap();
        assert_eq!(outcome, EventOutcome::ExportIgnored);
        assert_eq!(session.phase(), SessionPhase::Navigating);
    }

    #[test]
    fn test_next_video_discards_marks_and_ignores_later_events() {
        let mut session = session(10);
        let engine = ExportEngine::default();
        let mut recorder = NullRecorder;

        session
            .handle_event(InputEvent::MarkFirst, &engine, &mut recorder)
            .unwrap();
        let outcome = session
            .handle_event(InputEvent::NextVideo, &engine, &mut recorder)
            .unwrap();
        assert_eq!(outcome, EventOutcome::Closed(CloseReason::NextVideo));

        let after = session
            .handle_event(InputEvent::StepForward, &engine, &mut recorder)
            .unwrap();
        assert_eq!(after, EventOutcome::Closed(CloseReason::NextVideo));
        assert_eq!(session.playback().current_frame, 0);
        assert!(session.close().records.is_empty());
    }

    #[test]
    fn test_quit_stops_running() {
        let mut session = session(10);
        session
            .handle_event(InputEvent::Quit, &ExportEngine::default(), &mut NullRecorder)
            .unwrap();
        assert!(!session.playback().running);
        assert!(CloseReason::Quit.ends_batch());
        assert!(!CloseReason::NextVideo.ends_batch());
    }

    #[test]
    fn test_tick_after_pause_holds_position() {
        let mut session = session(10);
        session.tick();
        assert_eq!(session.playback().current_frame, 1);
        session
            .handle_event(InputEvent::TogglePause, &ExportEngine::default(), &mut NullRecorder)
            .unwrap();
        session.tick();
        assert_eq!(session.playback().current_frame, 1);
    }
}
