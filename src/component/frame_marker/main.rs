use super::batch::BatchResult;
use super::error::MarkerError;
use super::export_engine::{AfterExport, ExportEngine};
use super::recorder::{FsRecorder, write_batch_csv};
use super::session::SessionLoop;
use super::terminal::{KEY_HELP, KeyboardEvents, TerminalDisplay};
use crate::config::{Config, add_recent_path, save_settings};
use crate::tools::{
    FfmpegOpener, InputKind, VideoFileInfo, classify_input_path, ensure_directory_exists,
    scan_video_files,
};
use anyhow::{Context, Result, bail};
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 命令列傳入、可覆寫設定檔的選項
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub after_export: Option<AfterExport>,
    pub preview_path: Option<PathBuf>,
    pub per_video_csv: bool,
}

type TerminalSessionLoop = SessionLoop<FfmpegOpener, KeyboardEvents, TerminalDisplay, FsRecorder>;

/// 影格標記工具
///
/// 輸入為單一影片時，輸出寫在影片所在資料夾；
/// 輸入為資料夾時，需先選擇輸出資料夾，並逐一處理其中的影片。
pub struct FrameMarker {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl FrameMarker {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self, options: &RunOptions) -> Result<BatchResult> {
        let kind = classify_input_path(&options.input)
            .ok_or_else(|| MarkerError::InvalidInput(options.input.clone()))?;
        if !Term::stdout().is_term() {
            bail!("需要在終端機中執行，標準輸出不可重新導向");
        }

        println!("{}", style("=== 影格標記與匯出 ===").cyan().bold());
        println!("{}", style(KEY_HELP).dim());
        println!();

        match kind {
            InputKind::File => self.run_single(options),
            InputKind::Directory => self.run_directory(options),
        }
    }

    fn run_single(&self, options: &RunOptions) -> Result<BatchResult> {
        let video_path = &options.input;
        let output_base = match &options.output {
            Some(dir) => dir.clone(),
            None => video_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        };
        ensure_directory_exists(&output_base)?;

        let mut session_loop = self.build_session_loop(&output_base, options);
        let outcome = session_loop.run_video(video_path)?;

        let mut result = BatchResult::default();
        let ends_batch = outcome.reason.ends_batch();
        result.push(outcome);
        if ends_batch {
            result.mark_quit_early();
        }

        self.finish(&output_base, &result)?;
        Ok(result)
    }

    fn run_directory(&self, options: &RunOptions) -> Result<BatchResult> {
        let input_dir = &options.input;

        let output_dir = match &options.output {
            Some(dir) => dir.clone(),
            None => self
                .prompt_output_path()?
                .ok_or(MarkerError::NoOutputSelected)?,
        };
        ensure_directory_exists(&output_dir)
            .with_context(|| format!("無法建立輸出資料夾: {}", output_dir.display()))?;

        // 更新路徑歷史並儲存
        {
            let mut settings = self.config.settings.clone();
            add_recent_path(&mut settings, &output_dir.to_string_lossy());
            if let Err(e) = save_settings(&settings) {
                warn!("無法儲存路徑歷史: {e}");
            }
        }

        println!("{}", style("掃描影片檔案中...").dim());
        let video_files =
            scan_video_files(input_dir, &self.config.settings.marker.video_extension)?;
        self.print_video_list(&video_files);

        let videos: Vec<PathBuf> = video_files.into_iter().map(|f| f.path).collect();
        let mut session_loop = self.build_session_loop(&output_dir, options);
        let result = session_loop.run_batch(&videos)?;

        self.finish(&output_dir, &result)?;
        Ok(result)
    }

    fn build_session_loop(&self, output_base: &Path, options: &RunOptions) -> TerminalSessionLoop {
        let marker = &self.config.settings.marker;
        let after_export = options.after_export.unwrap_or(marker.after_export);
        let preview_path = options
            .preview_path
            .clone()
            .or_else(|| marker.preview_path.clone());
        let per_video_csv = options.per_video_csv || marker.per_video_csv;

        info!(
            "輸出資料夾: {}, 匯出後: {after_export:?}, 逐片 CSV: {per_video_csv}",
            output_base.display()
        );

        SessionLoop::new(
            FfmpegOpener::new(marker.jpeg_quality),
            KeyboardEvents::spawn(Term::stdout()),
            TerminalDisplay::new(Term::stdout(), preview_path),
            FsRecorder::new(output_base, per_video_csv),
            ExportEngine::new(after_export),
            Arc::clone(&self.shutdown_signal),
        )
    }

    /// 寫出彙總 CSV 並顯示摘要
    fn finish(&self, output_base: &Path, result: &BatchResult) -> Result<()> {
        let csv_path = output_base.join(&self.config.settings.marker.batch_csv_name);
        write_batch_csv(&csv_path, result.records())
            .with_context(|| format!("無法寫入 CSV: {}", csv_path.display()))?;

        println!();
        println!("{}", style("=== 標記摘要 ===").cyan().bold());
        println!("  處理影片: {} 部", result.processed_videos());
        println!("  已匯出: {} 部", style(result.exported_videos()).green());
        println!("  未匯出: {} 部", result.skipped_videos());
        if !result.failures().is_empty() {
            println!("  開啟失敗: {} 部", style(result.failures().len()).red());
            for failure in result.failures() {
                println!(
                    "    {} {}",
                    style("✗").red(),
                    failure.path.file_name().unwrap_or_default().to_string_lossy()
                );
            }
        }
        if result.quit_early() {
            println!("{}", style("已提前結束批次").yellow());
        }
        println!("  紀錄檔: {}", csv_path.display());

        info!(
            "標記完成 - 影片: {}, 紀錄: {}, 失敗: {}",
            result.processed_videos(),
            result.records().len(),
            result.failures().len()
        );
        Ok(())
    }

    fn print_video_list(&self, video_files: &[VideoFileInfo]) {
        if video_files.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return;
        }

        println!(
            "{}",
            style(format!("找到 {} 個影片檔案：", video_files.len())).green()
        );
        for (index, file) in video_files.iter().enumerate() {
            let size_mb = file.size as f64 / 1024.0 / 1024.0;
            println!(
                "  {}. {} ({:.2} MB)",
                index + 1,
                file.path.file_name().unwrap_or_default().to_string_lossy(),
                size_mb
            );
        }
        println!();
    }

    /// 選擇輸出資料夾；按 ESC 或輸入空白時回傳 `None`
    fn prompt_output_path(&self) -> Result<Option<PathBuf>> {
        let recent_paths = &self.config.settings.recent_paths;

        if recent_paths.is_empty() {
            return self.prompt_new_output_path();
        }

        let mut options: Vec<String> = recent_paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let exists = Path::new(p).exists();
                let indicator = if exists { "✓" } else { "✗" };
                format!("{} [{}] {}", i + 1, indicator, p)
            })
            .collect();
        options.push("輸入新路徑...".to_string());

        println!("{}", style("(按 ESC 取消)").dim());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇輸出資料夾")
            .items(&options)
            .default(0)
            .interact_opt()?;

        match selection {
            None => Ok(None),
            Some(idx) if idx < recent_paths.len() => Ok(Some(PathBuf::from(&recent_paths[idx]))),
            Some(_) => self.prompt_new_output_path(),
        }
    }

    fn prompt_new_output_path(&self) -> Result<Option<PathBuf>> {
        let path: String = Input::new()
            .with_prompt("請輸入輸出資料夾路徑")
            .allow_empty(true)
            .interact_text()?;
        let path = path.trim();
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }
}
