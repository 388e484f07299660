mod ffprobe_info;
mod frame_decoder;
mod path_validator;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use frame_decoder::{DEFAULT_JPEG_QUALITY, FfmpegFrameSource, FfmpegOpener};
pub use path_validator::{InputKind, classify_input_path, ensure_directory_exists};
pub use video_scanner::{VideoFileInfo, has_extension, scan_video_files};
