//! Video capability for files, backed by the `ffprobe` and `ffmpeg` tools.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use fluentfs_core::codec::{from_value, Codec, Issue, Issues, Json, Schema, Structured};
use fluentfs_core::{File, FindOptions, Folder, FsResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

const FFPROBE: &str = "ffprobe";
const FFMPEG: &str = "ffmpeg";

/// Extensions treated as videos by [`find_video_files`].
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "flv", "mkv", "mov", "mp4", "mpeg", "mpg", "rm", "rmvb", "webm", "wmv",
];

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Container and first video stream facts.
///
/// `hours`, `minutes` and `seconds` split the duration for display;
/// `millis` is the whole duration rounded to the millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub bit_rate: u64,
    pub bytes: u64,
    pub width: u32,
    pub height: u32,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl VideoMetadata {
    fn from_duration(bit_rate: u64, bytes: u64, width: u32, height: u32, total: f64) -> Self {
        Self {
            bit_rate,
            bytes,
            width,
            height,
            hours: ((total / 3600.0) % 60.0).trunc() as u64,
            minutes: ((total / 60.0) % 60.0).trunc() as u64,
            seconds: (total % 60.0).trunc() as u64,
            millis: (total * 1000.0).round() as u64,
        }
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    #[serde(deserialize_with = "coerce_number")]
    bit_rate: f64,
    #[serde(deserialize_with = "coerce_number")]
    duration: f64,
    #[serde(deserialize_with = "coerce_number")]
    size: f64,
}

#[derive(Deserialize)]
#[serde(tag = "codec_type", rename_all = "lowercase")]
enum ProbeStream {
    Video { width: i64, height: i64 },
    #[serde(other)]
    Other,
}

/// `ffprobe` reports most format numbers as strings.
fn coerce_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    let number = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {text:?}")))?,
    };
    if number.is_finite() && number >= 0.0 {
        Ok(number)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative number, got {number}"
        )))
    }
}

/// Validates `ffprobe -show_format -show_streams` JSON into [`VideoMetadata`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoMetadataSchema;

impl Schema for VideoMetadataSchema {
    type Content = VideoMetadata;
    type Parsed = VideoMetadata;

    fn validate(&self, value: Value) -> Result<VideoMetadata, Issues> {
        let probe: ProbeOutput = from_value(value)?;

        let (width, height) = probe
            .streams
            .iter()
            .find_map(|stream| match stream {
                ProbeStream::Video { width, height } => Some((*width, *height)),
                ProbeStream::Other => None,
            })
            .ok_or_else(|| Issue::new("video was missing video stream").at("streams"))?;

        let mut issues = Issues::new();
        let width = positive(width, "width", &mut issues);
        let height = positive(height, "height", &mut issues);
        if !issues.is_empty() {
            return Err(issues.nested("streams"));
        }

        let format = probe.format;
        Ok(VideoMetadata::from_duration(
            format.bit_rate.round() as u64,
            format.size.round() as u64,
            width,
            height,
            format.duration,
        ))
    }

    fn to_value(&self, content: &VideoMetadata) -> Result<Value, Issues> {
        let mut issues = Issues::new();
        for (field, value) in [("width", content.width), ("height", content.height)] {
            if value == 0 {
                issues.push(Issue::new("must be positive").at(field).at("streams"));
            }
        }
        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(json!({
            "format": {
                "bit_rate": content.bit_rate.to_string(),
                "duration": format!("{:.3}", content.millis as f64 / 1000.0),
                "size": content.bytes.to_string(),
            },
            "streams": [{
                "codec_type": "video",
                "width": content.width,
                "height": content.height,
            }],
        }))
    }
}

fn positive(value: i64, field: &str, issues: &mut Issues) -> u32 {
    match u32::try_from(value) {
        Ok(v) if v > 0 => v,
        _ => {
            issues.push(Issue::new(format!("must be a positive integer, got {value}")).at(field));
            0
        }
    }
}

/// Where and when [`Video::extract_frame`] grabs a still.
#[derive(Debug, Clone)]
pub struct FrameOptions {
    /// A timestamp `ffmpeg -ss` accepts: seconds or `HH:MM:SS.mmm`.
    pub time: String,
    /// Defaults to `<base>.png` next to the video.
    pub destination: Option<File>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self::at("0")
    }
}

impl FrameOptions {
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            destination: None,
        }
    }

    pub fn at_seconds(seconds: f64) -> Self {
        Self::at(format!("{seconds:.3}"))
    }

    pub fn destination(mut self, destination: File) -> Self {
        self.destination = Some(destination);
        self
    }
}

/// A file viewed as a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    file: File,
}

/// Adds [`VideoExt::video`] to every file.
pub trait VideoExt {
    fn video(&self) -> Video;
}

impl<C: Codec> VideoExt for File<C> {
    fn video(&self) -> Video {
        Video { file: self.text() }
    }
}

impl Video {
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Probes the file with `ffprobe`.
    ///
    /// # Errors
    ///
    /// [`MediaError::Fs`] if the file is missing, [`MediaError::Spawn`] or
    /// [`MediaError::Tool`] if `ffprobe` cannot run or fails, and
    /// [`MediaError::Metadata`] if its output has no usable video stream.
    pub async fn metadata(&self) -> MediaResult<VideoMetadata> {
        self.file.stat().await?;
        let path = self.file.path();
        let stdout = run_tool(
            FFPROBE,
            path,
            &[
                OsStr::new("-v"),
                OsStr::new("quiet"),
                OsStr::new("-print_format"),
                OsStr::new("json"),
                OsStr::new("-show_format"),
                OsStr::new("-show_streams"),
                path.as_os_str(),
            ],
        )
        .await?;

        let metadata = parse_probe(&String::from_utf8_lossy(&stdout)).map_err(|cause| {
            MediaError::Metadata {
                path: path.to_path_buf(),
                cause,
            }
        })?;
        tracing::debug!(path = %path.display(), millis = metadata.millis, "probed video");
        Ok(metadata)
    }

    /// Writes one frame as an image and returns the image file.
    ///
    /// An existing destination is returned as is, without running `ffmpeg`.
    pub async fn extract_frame(&self, options: &FrameOptions) -> MediaResult<File> {
        let destination = options
            .destination
            .clone()
            .unwrap_or_else(|| self.file.with_extension("png"));
        if destination.exists().await {
            tracing::debug!(path = %destination.path().display(), "frame already extracted");
            return Ok(destination);
        }

        self.file.stat().await?;
        destination.folder().ensure_exists().await?;
        run_tool(
            FFMPEG,
            self.file.path(),
            &[
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-ss"),
                OsStr::new(&options.time),
                OsStr::new("-i"),
                self.file.path().as_os_str(),
                OsStr::new("-frames:v"),
                OsStr::new("1"),
                OsStr::new("-y"),
                destination.path().as_os_str(),
            ],
        )
        .await?;

        if !destination.exists().await {
            return Err(MediaError::MissingOutput {
                program: FFMPEG,
                path: destination.path().to_path_buf(),
            });
        }
        tracing::debug!(
            source = %self.file.path().display(),
            output = %destination.path().display(),
            time = %options.time,
            "extracted frame"
        );
        Ok(destination)
    }
}

fn parse_probe(text: &str) -> Result<VideoMetadata, fluentfs_core::Cause> {
    Structured::new(Json, VideoMetadataSchema).decode(text)
}

async fn run_tool(program: &'static str, path: &Path, args: &[&OsStr]) -> MediaResult<Vec<u8>> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| MediaError::Spawn {
            program,
            path: path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(MediaError::Tool {
            program,
            path: path.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(output.stdout)
}

/// Video files below `folder`, sorted by path.
pub async fn find_video_files(folder: &Folder) -> FsResult<Vec<Video>> {
    let files = folder.find_files(&FindOptions::new()).await?;
    Ok(files
        .iter()
        .filter(|file| is_video(file.path()))
        .map(VideoExt::video)
        .collect())
}
