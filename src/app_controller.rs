use anyhow::{anyhow, Context, Result};
use encoding_rs::Encoding;
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::providers::{build_provider, Provider};
use crate::run_report::{total_line, FileReport};
use crate::script_processor::{resolve_encoding, ScriptBuffer};
use crate::translation::context::SpeakerTable;
use crate::translation::walker::dialogue_line_count;
use crate::translation::{ScriptWalker, TokenLedger, TranslationMode, TranslationService, UsageTotals, WalkerOptions};

// @module: Application controller for script translation runs

/// Name of the issues log written into the output directory
pub const ISSUES_LOG_FILE: &str = "lune-translator.issues.log";

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One report per file, in completion order
    pub reports: Vec<FileReport>,
    /// Ledger totals at the end of the run
    pub totals: UsageTotals,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|report| !report.is_success()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    pub fn report(&self, filename: &str) -> Option<&FileReport> {
        self.reports.iter().find(|report| report.filename == filename)
    }
}

/// Main application controller for script translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Live or estimate run
    mode: TranslationMode,
    // @field: Provider used instead of the configured one
    provider: Option<Arc<dyn Provider>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        resolve_encoding(&config.script.encoding)?;
        Ok(Self {
            config,
            mode: TranslationMode::Live,
            provider: None,
        })
    }

    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Use `provider` instead of building one from the configuration
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn build_service(&self) -> Result<TranslationService> {
        let provider = match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => build_provider(&self.config.translation).context("Failed to create translation provider")?,
        };
        Ok(TranslationService::from_config(provider, &self.config).with_mode(self.mode))
    }

    /// Resolve the files of a run: the named ones, or every file in the input directory
    pub fn collect_files(&self, names: &[String]) -> Result<Vec<PathBuf>> {
        let input_dir = Path::new(&self.config.script.input_dir);
        if names.is_empty() {
            let files = FileManager::list_script_files(input_dir)?;
            if files.is_empty() {
                return Err(anyhow!("No script files found in directory: {:?}", input_dir));
            }
            Ok(files)
        } else {
            Ok(names.iter().map(|name| input_dir.join(name)).collect())
        }
    }

    /// Translate the named files (or the whole input directory) concurrently
    pub async fn run(&self, names: Vec<String>) -> Result<RunSummary> {
        let start_time = Instant::now();
        let files = self.collect_files(&names)?;
        let encoding = resolve_encoding(&self.config.script.encoding)?;
        let service = self.build_service()?;
        let ledger = Arc::new(TokenLedger::new(self.config.pricing.cost_per_1k_tokens));
        let workers = self.config.script.workers.max(1);

        info!(
            "Translating {} file(s) with {} ({:?} mode, {} workers)",
            files.len(),
            service.provider_name(),
            self.mode,
            workers
        );

        if self.mode == TranslationMode::Live {
            if let Err(e) = service.test_connection().await {
                warn!("Connection test against {} failed: {}", service.provider_name(), e);
            }
        }

        let multi_progress = MultiProgress::new();
        let files_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        files_pb.set_style(Self::bar_style("files"));
        files_pb.set_message("Translating");

        let reports: Vec<FileReport> = stream::iter(files)
            .map(|path| {
                let service = &service;
                let ledger = Arc::clone(&ledger);
                let multi_progress = &multi_progress;
                let files_pb = &files_pb;
                async move {
                    let report = self.translate_file(service, encoding, multi_progress, &path).await;
                    ledger.record(report.tokens);
                    let line = report.status_line(ledger.cost_per_1k_tokens());
                    multi_progress.suspend(|| println!("{}", line));
                    files_pb.inc(1);
                    report
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        files_pb.finish_and_clear();

        let summary = RunSummary {
            reports,
            totals: ledger.totals(),
            elapsed: start_time.elapsed(),
        };
        println!("{}", total_line(&summary.totals, summary.elapsed));

        let summary_message = format!(
            "Run completed: {} file(s), {} failed, {} tokens, ${:.4} - Duration: {}",
            summary.reports.len(),
            summary.failed_count(),
            summary.totals.tokens,
            summary.totals.cost,
            Self::format_duration(summary.elapsed)
        );
        info!("{}", summary_message);
        if self.mode == TranslationMode::Live {
            self.append_issue(&summary_message);
        }

        Ok(summary)
    }

    /// Walk one file and write its translation; never fails the run
    async fn translate_file(
        &self,
        service: &TranslationService,
        encoding: &'static Encoding,
        multi_progress: &MultiProgress,
        path: &Path,
    ) -> FileReport {
        let start_time = Instant::now();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let file_pb = multi_progress.add(ProgressBar::new(0));
        file_pb.set_style(Self::bar_style("lines"));
        file_pb.set_message(filename.clone());

        let (tokens, result) = self.process_file(service, encoding, &file_pb, path).await;

        file_pb.finish_and_clear();
        multi_progress.remove(&file_pb);

        match result {
            Ok(()) => FileReport::success(filename, tokens, start_time.elapsed()),
            Err(e) => {
                error!("Error processing file {}: {:#}", filename, e);
                self.append_issue(&format!("{}: {:#}", filename, e));
                FileReport::failure(filename, tokens, start_time.elapsed(), format!("{:#}", e))
            }
        }
    }

    /// Tokens spent on the file, even when it failed, and the outcome
    async fn process_file(
        &self,
        service: &TranslationService,
        encoding: &'static Encoding,
        file_pb: &ProgressBar,
        path: &Path,
    ) -> (u64, Result<()>) {
        let display_path = path.display().to_string();
        let buffer = match FileManager::read_bytes(path)
            .and_then(|bytes| Ok(ScriptBuffer::decode(&bytes, encoding, &display_path)?))
        {
            Ok(buffer) => buffer,
            Err(e) => return (0, Err(e)),
        };

        let options = WalkerOptions::from_config(&self.config.script);
        file_pb.set_length(dialogue_line_count(&buffer, options.translate_unmarked_lines) as u64);

        let speakers = SpeakerTable::new(self.config.script.known_speakers.clone());
        let progress = file_pb.clone();
        let mut walker = ScriptWalker::new(service, speakers, options).with_progress(move || progress.inc(1));

        let walked = match walker.walk(buffer).await {
            Ok(walked) => walked,
            Err(failure) => return (failure.tokens, Err(anyhow!("{}", failure))),
        };
        debug!("{}: {} dialogue line(s), {} tokens", display_path, walked.dialogue_lines, walked.tokens);

        if self.mode == TranslationMode::Estimate {
            return (walked.tokens, Ok(()));
        }

        (walked.tokens, self.write_output(&walked.buffer, encoding, path))
    }

    fn write_output(&self, buffer: &ScriptBuffer, encoding: &'static Encoding, input_path: &Path) -> Result<()> {
        let file_name = input_path
            .file_name()
            .ok_or_else(|| anyhow!("Input path has no file name: {:?}", input_path))?;
        let output_path = Path::new(&self.config.script.output_dir).join(file_name);
        let bytes = buffer.encode(encoding, &output_path.display().to_string())?;
        FileManager::write_bytes(&output_path, &bytes)?;
        debug!("Wrote {}", output_path.display());
        Ok(())
    }

    fn append_issue(&self, message: &str) {
        let log_path = Path::new(&self.config.script.output_dir).join(ISSUES_LOG_FILE);
        if let Err(e) = FileManager::append_to_log_file(&log_path, message) {
            warn!("Failed to write to issues log {}: {}", log_path.display(), e);
        }
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
