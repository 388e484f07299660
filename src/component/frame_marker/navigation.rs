use super::mark_state::MarkState;

/// 操作者輸入事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    StepBack,
    StepForward,
    ScrollUp,
    ScrollDown,
    MarkFirst,
    MarkLast,
    ToggleAccident,
    TogglePause,
    ToggleFullscreen,
    RequestExport,
    NextVideo,
    Quit,
}

/// 播放位置與狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_frame: u64,
    pub paused: bool,
    pub running: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_frame: 0,
            paused: false,
            running: true,
        }
    }
}

/// 事件套用後需要由呼叫端執行的後續動作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    None,
    Seek(u64),
    ToggleFullscreen,
    Export,
    NextVideo,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub playback: PlaybackState,
    pub marks: MarkState,
    pub action: NavAction,
}

/// 將單一輸入事件轉換為新的播放／標記狀態
#[derive(Debug, Clone, Copy)]
pub struct NavigationController {
    frame_count: u64,
}

impl NavigationController {
    /// `frame_count` 為 0 時視為只有一幀
    #[must_use]
    pub const fn new(frame_count: u64) -> Self {
        Self {
            frame_count: if frame_count == 0 { 1 } else { frame_count },
        }
    }

    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub const fn last_index(&self) -> u64 {
        self.frame_count - 1
    }

    #[must_use]
    pub fn clamp(&self, index: u64) -> u64 {
        index.min(self.last_index())
    }

    #[must_use]
    pub fn apply(
        &self,
        event: InputEvent,
        playback: PlaybackState,
        marks: MarkState,
    ) -> Transition {
        let mut playback = PlaybackState {
            current_frame: self.clamp(playback.current_frame),
            ..playback
        };
        let mut marks = marks;
        let before = playback.current_frame;

        let action = match event {
            InputEvent::StepBack | InputEvent::ScrollUp => {
                playback.current_frame = before.saturating_sub(1);
                NavAction::None
            }
            InputEvent::StepForward | InputEvent::ScrollDown => {
                playback.current_frame = self.clamp(before.saturating_add(1));
                NavAction::None
            }
            InputEvent::MarkFirst => {
                marks.toggle_first(before);
                NavAction::None
            }
            InputEvent::MarkLast => {
                marks.toggle_last(before);
                NavAction::None
            }
            InputEvent::ToggleAccident => {
                marks.toggle_accident();
                NavAction::None
            }
            InputEvent::TogglePause => {
                playback.paused = !playback.paused;
                NavAction::None
            }
            InputEvent::ToggleFullscreen => NavAction::ToggleFullscreen,
            InputEvent::RequestExport => NavAction::Export,
            InputEvent::NextVideo => NavAction::NextVideo,
            InputEvent::Quit => {
                playback.running = false;
                NavAction::Quit
            }
        };

        let action = match action {
            NavAction::None if playback.current_frame != before => {
                NavAction::Seek(playback.current_frame)
            }
            other => other,
        };

        Transition {
            playback,
            marks,
            action,
        }
    }

    /// 未暫停時每顯示一幀就前進一幀，停在最後一幀
    #[must_use]
    pub fn autoplay(&self, playback: PlaybackState) -> PlaybackState {
        if playback.paused {
            return playback;
        }
        PlaybackState {
            current_frame: self.clamp(playback.current_frame.saturating_add(1)),
            ..playback
        }
    }
}
