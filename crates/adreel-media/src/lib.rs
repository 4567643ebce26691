//! Clip download and trimming.
//!
//! Takes the per-scene clip mapping produced by the resolver, downloads each
//! chosen rendition once and cuts it to the scene's target duration with
//! FFmpeg (`-ss 0 -t <duration> -c copy`).

pub mod command;
pub mod download;
pub mod error;
pub mod trim;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use download::{download_file, ensure_downloaded};
pub use error::{MediaError, MediaResult};
pub use trim::{ClipTrimmer, FailedScene, SkippedScene, TrimConfig, TrimReport, TrimmedClip};
