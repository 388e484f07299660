use crate::component::frame_marker::{DecodedFrame, FrameSource, MarkerError, VideoOpener};
use crate::tools::{VideoInfo, get_video_info};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

/// ffmpeg mjpeg 的品質參數（2 最好，31 最差）
pub const DEFAULT_JPEG_QUALITY: u8 = 2;

/// 以 ffmpeg 子程序逐幀解碼的影片來源
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    jpeg_quality: u8,
    pts_regex: Regex,
}

impl FfmpegFrameSource {
    pub fn open(path: &Path, jpeg_quality: u8) -> Result<Self, MarkerError> {
        let open_failure = |reason: String| MarkerError::OpenFailure {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(open_failure("檔案不存在".to_string()));
        }
        let info = get_video_info(path).map_err(|e| open_failure(format!("{e:#}")))?;
        let pts_regex = Regex::new(r"pts_time:\s*(-?[0-9]+(?:\.[0-9]+)?)")
            .map_err(|e| open_failure(e.to_string()))?;

        debug!(
            "已開啟 {}: {} 幀, {:.3} fps, {:.2} 秒, {}x{}",
            path.display(),
            info.frame_count,
            info.frame_rate,
            info.duration_seconds,
            info.width,
            info.height
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            jpeg_quality: jpeg_quality.clamp(2, 31),
            pts_regex,
        })
    }

    /// 依幀率換算的預估時間（秒）
    fn nominal_seconds(&self, index: u64) -> f64 {
        index as f64 / self.info.frame_rate
    }

    /// seek 目標取前半幀，讓 pts 捨入誤差仍落在第 `index` 幀上
    fn seek_seconds(&self, index: u64) -> f64 {
        ((index as f64 - 0.5) / self.info.frame_rate).max(0.0)
    }

    fn build_command(&self, index: u64) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-hide_banner",
            "-nostdin",
            "-nostats",
            "-loglevel",
            "info",
            "-copyts",
            "-ss",
            &format!("{:.6}", self.seek_seconds(index)),
            "-i",
        ])
        .arg(&self.path)
        .args([
            "-frames:v",
            "1",
            "-an",
            "-sn",
            "-dn",
            "-vf",
            "showinfo",
            "-c:v",
            "mjpeg",
            "-q:v",
            &self.jpeg_quality.to_string(),
            "-f",
            "image2pipe",
            "pipe:1",
        ]);
        cmd
    }
}

/// 從 showinfo 濾鏡輸出取出第一個 `pts_time`（秒）
fn parse_showinfo_pts(regex: &Regex, stderr: &str) -> Option<f64> {
    stderr
        .lines()
        .filter(|line| line.contains("showinfo"))
        .find_map(|line| regex.captures(line))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&self) -> u64 {
        self.info.frame_count
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn decode(&mut self, index: u64) -> Result<DecodedFrame, MarkerError> {
        let decode_failure = |reason: String| MarkerError::DecodeFailure { index, reason };

        if index >= self.info.frame_count {
            return Err(decode_failure(format!(
                "超出影格範圍（共 {} 幀）",
                self.info.frame_count
            )));
        }

        let output = self
            .build_command(index)
            .output()
            .map_err(|e| decode_failure(format!("無法執行 ffmpeg: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(decode_failure(format!("ffmpeg 解碼失敗: {}", stderr.trim())));
        }
        if output.stdout.is_empty() {
            return Err(decode_failure("ffmpeg 沒有輸出影格".to_string()));
        }

        let seconds =
            parse_showinfo_pts(&self.pts_regex, &stderr).unwrap_or_else(|| self.nominal_seconds(index));

        Ok(DecodedFrame {
            index,
            timestamp_ms: seconds * 1000.0,
            image: output.stdout,
        })
    }
}

/// 開啟 ffmpeg 影片來源
#[derive(Debug, Clone, Copy)]
pub struct FfmpegOpener {
    jpeg_quality: u8,
}

impl FfmpegOpener {
    #[must_use]
    pub const fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }
}

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl VideoOpener for FfmpegOpener {
    type Source = FfmpegFrameSource;

    fn open(&self, path: &Path) -> Result<Self::Source, MarkerError> {
        FfmpegFrameSource::open(path, self.jpeg_quality)
    }
}
