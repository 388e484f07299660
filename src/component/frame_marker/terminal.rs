use super::error::MarkerError;
use super::navigation::InputEvent;
use super::source::DecodedFrame;
use super::surface::{Display, EventSource, Overlay};
use console::{Key, Term, style};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

/// 阻塞等待按鍵的上限，逾時後外層迴圈會重新檢查中斷訊號
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

pub const KEY_HELP: &str = "\
    操作說明:
    - 滑鼠滾輪／↑ ↓: 逐幀瀏覽
    - , 或 ←: 上一幀
    - . 或 →: 下一幀
    - f: 標記首幀，再按一次取消（同時取消尾幀）
    - l: 標記尾幀，再按一次取消
    - e: 匯出首尾兩幀與時間戳記
    - a: 切換是否發生事故
    - 空白鍵: 暫停／繼續自動播放
    - Tab: 切換完整資訊面板
    - n: 下一部影片
    - q 或 Esc: 結束";

/// 將按鍵對應到輸入事件
#[must_use]
pub fn map_key(key: &Key) -> Option<InputEvent> {
    match key {
        Key::Char(',') | Key::ArrowLeft => Some(InputEvent::StepBack),
        Key::Char('.') | Key::ArrowRight => Some(InputEvent::StepForward),
        Key::ArrowUp => Some(InputEvent::ScrollUp),
        Key::ArrowDown => Some(InputEvent::ScrollDown),
        Key::Char('f') => Some(InputEvent::MarkFirst),
        Key::Char('l') => Some(InputEvent::MarkLast),
        Key::Char('a') => Some(InputEvent::ToggleAccident),
        Key::Char(' ') => Some(InputEvent::TogglePause),
        Key::Tab => Some(InputEvent::ToggleFullscreen),
        Key::Char('e') => Some(InputEvent::RequestExport),
        Key::Char('n') => Some(InputEvent::NextVideo),
        Key::Char('q') | Key::Escape => Some(InputEvent::Quit),
        _ => None,
    }
}

/// 單次 `poll` 最多取出的按鍵數，避免按鍵來源不斷送出時卡在迴圈內
const MAX_KEYS_PER_POLL: usize = 64;

/// 背景執行緒讀取按鍵，經由 channel 交給主迴圈
pub struct KeyboardEvents {
    receiver: Receiver<Key>,
}

impl KeyboardEvents {
    /// 標準輸出不是終端機時不啟動讀取執行緒，第一次 `poll` 即回傳 `Quit`
    #[must_use]
    pub fn spawn(term: Term) -> Self {
        if !term.is_term() {
            warn!("標準輸出不是終端機，無法讀取按鍵");
            return Self::closed();
        }
        Self::with_reader(move || term.read_key())
    }

    /// 以任意按鍵讀取函式啟動背景執行緒；讀到 `Key::Unknown` 或錯誤即停止
    pub fn with_reader<F>(mut read_key: F) -> Self
    where
        F: FnMut() -> io::Result<Key> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            loop {
                match read_key() {
                    Ok(Key::Unknown) => {
                        debug!("按鍵來源已結束");
                        break;
                    }
                    Ok(key) => {
                        if sender.send(key).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("停止讀取按鍵: {e}");
                        break;
                    }
                }
            }
        });
        Self { receiver }
    }

    fn closed() -> Self {
        let (_, receiver) = mpsc::channel();
        Self { receiver }
    }
}

impl EventSource for KeyboardEvents {
    fn poll(&mut self, block: bool) -> Result<Vec<InputEvent>, MarkerError> {
        let mut events = Vec::new();
        let mut received = 0;

        if block {
            match self.receiver.recv_timeout(POLL_TIMEOUT) {
                Ok(key) => {
                    received += 1;
                    events.extend(map_key(&key));
                }
                Err(RecvTimeoutError::Timeout) => return Ok(events),
                Err(RecvTimeoutError::Disconnected) => return Ok(vec![InputEvent::Quit]),
            }
        }

        while received < MAX_KEYS_PER_POLL {
            match self.receiver.try_recv() {
                Ok(key) => {
                    received += 1;
                    events.extend(map_key(&key));
                }
                Err(TryRecvError::Empty) => break,
                // 讀取執行緒已結束（Ctrl-C、輸入結束或不是終端機）
                Err(TryRecvError::Disconnected) => {
                    events.push(InputEvent::Quit);
                    break;
                }
            }
        }

        Ok(events)
    }
}

fn format_mark(mark: Option<u64>) -> String {
    mark.map_or_else(|| "-".to_string(), |m| m.to_string())
}

/// 精簡模式的單行狀態
#[must_use]
pub fn status_line(overlay: &Overlay) -> String {
    let mut line = format!(
        "[{}] Frame: {}/{}  First: {}  Last: {}",
        overlay.video_name,
        overlay.current_frame,
        overlay.frame_count.saturating_sub(1),
        format_mark(overlay.first_frame),
        format_mark(overlay.last_frame),
    );
    if overlay.accident {
        line.push_str("  Accident Occurred");
    }
    if overlay.paused {
        line.push_str("  (paused)");
    }
    line
}

/// 以終端機顯示標記資訊，可選擇同步寫出預覽圖
pub struct TerminalDisplay {
    term: Term,
    fullscreen: bool,
    preview_path: Option<PathBuf>,
    notice: Option<String>,
}

impl TerminalDisplay {
    #[must_use]
    pub const fn new(term: Term, preview_path: Option<PathBuf>) -> Self {
        Self {
            term,
            fullscreen: false,
            preview_path,
            notice: None,
        }
    }

    fn render_panel(&self, frame: &DecodedFrame, overlay: &Overlay) -> std::io::Result<()> {
        self.term.clear_screen()?;
        self.term
            .write_line(&style(format!("=== {} ===", overlay.video_name)).cyan().bold().to_string())?;
        self.term.write_line(&format!(
            "Frame: {} / {}  ({:.1} ms)",
            overlay.current_frame,
            overlay.frame_count.saturating_sub(1),
            frame.timestamp_ms
        ))?;
        self.term
            .write_line(&format!("First Frame: {}", format_mark(overlay.first_frame)))?;
        self.term
            .write_line(&format!("Last Frame: {}", format_mark(overlay.last_frame)))?;
        if overlay.accident {
            self.term
                .write_line(&style("Accident Occurred").red().bold().to_string())?;
        }
        if overlay.paused {
            self.term.write_line(&style("(paused)").dim().to_string())?;
        }
        if let Some(notice) = &self.notice {
            self.term.write_line(&style(notice).yellow().to_string())?;
        }
        self.term.write_line("")?;
        self.term.write_line(&style(KEY_HELP).dim().to_string())
    }

    fn render_status(&self, overlay: &Overlay) -> std::io::Result<()> {
        self.term.clear_line()?;
        let line = status_line(overlay);
        let line = if overlay.accident {
            style(line).red().to_string()
        } else {
            line
        };
        self.term.write_str(&line)
    }
}

impl Display for TerminalDisplay {
    fn render(&mut self, frame: &DecodedFrame, overlay: &Overlay) -> Result<(), MarkerError> {
        if let Some(path) = &self.preview_path {
            fs::write(path, &frame.image)?;
        }
        if self.fullscreen {
            self.render_panel(frame, overlay)?;
        } else {
            self.render_status(overlay)?;
        }
        Ok(())
    }

    fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        if !self.fullscreen {
            let _ = self.term.clear_screen();
        }
    }

    fn notify(&mut self, message: &str) {
        if !self.fullscreen {
            let _ = self.term.clear_line();
            let _ = self.term.write_line(&style(message).yellow().to_string());
        }
        self.notice = Some(message.to_string());
    }
}
