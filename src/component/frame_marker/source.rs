use super::error::MarkerError;
use std::path::Path;

/// 解碼後的單一影格（已編碼為 JPEG）
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub index: u64,
    /// 解碼器回報的時間位置（毫秒）
    pub timestamp_ms: f64,
    pub image: Vec<u8>,
}

/// 可依索引解碼影格的影片來源
pub trait FrameSource {
    fn frame_count(&self) -> u64;

    fn dimensions(&self) -> (u32, u32);

    fn decode(&mut self, index: u64) -> Result<DecodedFrame, MarkerError>;
}

/// 依路徑開啟影片來源
pub trait VideoOpener {
    type Source: FrameSource;

    fn open(&self, path: &Path) -> Result<Self::Source, MarkerError>;
}
