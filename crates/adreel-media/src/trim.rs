//! Per-scene clip trimming.

use std::path::{Path, PathBuf};
use std::time::Duration;

use adreel_models::{ClipMatch, SceneId, SceneResolution, Script, ScriptResolution};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::download::ensure_downloaded;
use crate::error::{MediaError, MediaResult};

/// Trimming configuration.
#[derive(Debug, Clone)]
pub struct TrimConfig {
    /// Download cache for source clips
    pub work_dir: PathBuf,
    /// Destination of trimmed clips
    pub output_dir: PathBuf,
    pub ffmpeg_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("videos"),
            output_dir: PathBuf::from("trimmed_videos"),
            ffmpeg_timeout_secs: 120,
            download_timeout_secs: 300,
        }
    }
}

impl TrimConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("TRIM_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("TRIM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            ffmpeg_timeout_secs: std::env::var("TRIM_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ffmpeg_timeout_secs),
            download_timeout_secs: std::env::var("TRIM_DOWNLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.download_timeout_secs),
        }
    }

    pub fn with_dirs(mut self, work_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self.output_dir = output_dir.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimmedClip {
    pub scene_id: SceneId,
    pub path: PathBuf,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedScene {
    pub scene_id: SceneId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedScene {
    pub scene_id: SceneId,
    pub error: String,
}

/// Outcome of a trimming run, in scene order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrimReport {
    pub trimmed: Vec<TrimmedClip>,
    pub skipped: Vec<SkippedScene>,
    pub failed: Vec<FailedScene>,
}

impl TrimReport {
    pub fn total(&self) -> usize {
        self.trimmed.len() + self.skipped.len() + self.failed.len()
    }
}

/// Downloads chosen clips and cuts them to their scene durations.
pub struct ClipTrimmer {
    http: Client,
    config: TrimConfig,
    runner: FfmpegRunner,
}

impl ClipTrimmer {
    pub fn new(config: TrimConfig) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()?;
        let runner = FfmpegRunner::new().with_timeout(config.ffmpeg_timeout_secs);
        Ok(Self { http, config, runner })
    }

    pub fn from_env() -> MediaResult<Self> {
        Self::new(TrimConfig::from_env())
    }

    /// Abort in-flight FFmpeg runs when the flag flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.runner = self.runner.with_cancel(cancel_rx);
        self
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    /// Trim every resolved scene of the script.
    ///
    /// Scenes without a clip are skipped with a warning. A failing scene is
    /// recorded and the run continues.
    pub async fn trim_all(&self, script: &Script, resolution: &ScriptResolution) -> TrimReport {
        let mut report = TrimReport::default();

        for scene in script {
            let clip = match resolution.get(scene.id) {
                Some(SceneResolution::Found(clip)) => clip,
                Some(SceneResolution::NotFound { reason, .. }) => {
                    warn!(scene_id = scene.id, reason = %reason, "No clip for scene, skipping");
                    report.skipped.push(SkippedScene {
                        scene_id: scene.id,
                        reason: reason.to_string(),
                    });
                    continue;
                }
                None => {
                    warn!(scene_id = scene.id, "Scene missing from resolution, skipping");
                    report.skipped.push(SkippedScene {
                        scene_id: scene.id,
                        reason: "missing".to_string(),
                    });
                    continue;
                }
            };

            let duration = scene.duration.as_secs();
            match self.trim_clip(clip, duration).await {
                Ok(path) => {
                    metrics::counter!("adreel_clips_trimmed_total", "outcome" => "ok").increment(1);
                    report.trimmed.push(TrimmedClip {
                        scene_id: scene.id,
                        path,
                        duration_secs: duration,
                    });
                }
                Err(e) => {
                    metrics::counter!("adreel_clips_trimmed_total", "outcome" => "failed").increment(1);
                    warn!(scene_id = scene.id, error = %e, "Failed to trim clip");
                    report.failed.push(FailedScene {
                        scene_id: scene.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            trimmed = report.trimmed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Trimming finished"
        );
        report
    }

    /// Download (if needed) and cut one clip. Returns the output path.
    pub async fn trim_clip(&self, clip: &ClipMatch, duration_secs: f64) -> MediaResult<PathBuf> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(MediaError::InvalidDuration(duration_secs));
        }

        let source = source_path(&self.config.work_dir, clip);
        ensure_downloaded(&self.http, &clip.video_file_url, &source).await?;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let output = output_path(&self.config.output_dir, clip.scene_id);

        let cmd = FfmpegCommand::new(&source, &output)
            .seek(0.0)
            .duration(duration_secs)
            .codec_copy();
        self.runner.run(&cmd).await?;

        info!(scene_id = clip.scene_id, output = %output.display(), "Trimmed clip");
        Ok(output)
    }
}

/// Cache location of a downloaded source clip.
pub fn source_path(work_dir: &Path, clip: &ClipMatch) -> PathBuf {
    work_dir.join(format!("asset_{}_{}.mp4", clip.asset_id, clip.resolution))
}

/// Location of a scene's trimmed clip.
pub fn output_path(output_dir: &Path, scene_id: SceneId) -> PathBuf {
    output_dir.join(format!("scene_{}.mp4", scene_id))
}
