//! Export - trimming, transcode plans and the raw-bytes fallback
//!
//! Transcoding itself is an external service (ffmpeg running beside the
//! page). This module decides what to ask it for and what to hand the user
//! when it fails: the unconverted recording, never nothing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::recording::{extension_for_mime, RecordedClip, RecordingMode, GIF_MIME};
use crate::error::{PipelineError, PipelineResult};

/// Shortest clip the trimmer allows, in seconds
pub const MIN_TRIM_SECONDS: f64 = 0.5;

pub const MP4_MIME: &str = "video/mp4";

// ============================================================================
// TRIM WINDOW
// ============================================================================

/// Selected [start, end] range of a video, in seconds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn new(start: f64, end: f64) -> PipelineResult<Self> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 {
            return Err(PipelineError::InvalidTrimWindow(format!("{}..{}", start, end)));
        }
        if end - start < MIN_TRIM_SECONDS {
            return Err(PipelineError::InvalidTrimWindow(format!(
                "{:.2}s is shorter than {}s",
                end - start,
                MIN_TRIM_SECONDS
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole video
    pub fn full(duration: f64) -> Self {
        Self { start: 0.0, end: duration.max(0.0) }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Move the start handle; it stops `MIN_TRIM_SECONDS` before the end
    pub fn with_start(self, start: f64) -> Self {
        Self { start: start.min(self.end - MIN_TRIM_SECONDS).max(0.0), ..self }
    }

    /// Move the end handle; it stops `MIN_TRIM_SECONDS` after the start
    pub fn with_end(self, end: f64) -> Self {
        Self { end: end.max(self.start + MIN_TRIM_SECONDS), ..self }
    }

    /// Fit inside a video of `duration` seconds. Videos shorter than the
    /// minimum keep their full length.
    pub fn clamp_to(&self, duration: f64) -> Self {
        let duration = duration.max(0.0);
        if duration <= MIN_TRIM_SECONDS {
            return Self::full(duration);
        }
        let end = self.end.clamp(MIN_TRIM_SECONDS, duration);
        let start = self.start.clamp(0.0, end - MIN_TRIM_SECONDS);
        Self { start, end }
    }
}

// ============================================================================
// TRANSCODE PLAN
// ============================================================================

/// An ffmpeg invocation: file names inside the encoder's virtual FS plus
/// the argument list
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodePlan {
    pub input_name: String,
    pub output_name: String,
    pub output_mime: String,
    input_args: Vec<String>,
    output_args: Vec<String>,
}

impl TranscodePlan {
    pub fn new(input_name: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            input_name: input_name.into(),
            output_name: output_name.into(),
            output_mime: MP4_MIME.to_string(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Shrink an uploaded video to 720p H.264, optionally trimmed
    pub fn compress(start: Option<f64>, end: Option<f64>) -> Self {
        let mut plan = Self::new("input.mov", "output.mp4");
        if let Some(start) = start {
            plan = plan.seek(start);
        }
        plan = match (start, end) {
            (Some(start), Some(end)) => plan.duration(end - start),
            (None, Some(end)) => plan.until(end),
            _ => plan,
        };
        plan.video_filter("scale=-2:720")
            .video_codec("libx264")
            .crf(28)
            .preset("ultrafast")
    }

    /// Convert a browser recording to web-ready MP4
    pub fn convert() -> Self {
        Self::new("recording.webm", "export.mp4")
            .video_codec("libx264")
            .preset("ultrafast")
            .crf(22)
            .output_arg("-movflags")
            .output_arg("+faststart")
    }

    /// Add an argument after the input.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Seek before the input (fast seek).
    pub fn seek(mut self, seconds: f64) -> Self {
        self.input_args.push("-ss".to_string());
        self.input_args.push(seconds.to_string());
        self
    }

    /// Output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(seconds.to_string())
    }

    /// Stop at an absolute timestamp.
    pub fn until(self, seconds: f64) -> Self {
        self.output_arg("-to").output_arg(seconds.to_string())
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Full argument list, output file last
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.input_args.clone();
        args.push("-i".to_string());
        args.push(self.input_name.clone());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output_name.clone());
        args
    }
}

/// Encoder progress ratio (0-1) as a whole percentage
pub fn progress_percent(ratio: f64) -> u8 {
    if !ratio.is_finite() {
        return 0;
    }
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

// ============================================================================
// TRANSCODER
// ============================================================================

/// Long-running external encoder. `progress` receives 0-100.
#[async_trait(?Send)]
pub trait Transcoder {
    async fn run(&self, input: &[u8], plan: &TranscodePlan, progress: &dyn Fn(u8)) -> PipelineResult<Vec<u8>>;

    /// Compress, optionally trimmed to `window`
    async fn reencode(
        &self,
        input: &[u8],
        window: Option<TrimWindow>,
        progress: &dyn Fn(u8),
    ) -> PipelineResult<Vec<u8>> {
        let plan = TranscodePlan::compress(window.map(|w| w.start), window.map(|w| w.end));
        self.run(input, &plan, progress).await
    }

    /// Recorded container to MP4
    async fn to_standard_format(&self, input: &[u8], progress: &dyn Fn(u8)) -> PipelineResult<Vec<u8>> {
        self.run(input, &TranscodePlan::convert(), progress).await
    }
}

/// File offered to the user
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    /// False when the raw recording was kept
    pub converted: bool,
}

pub fn export_file_name(mode: RecordingMode, mime: &str) -> String {
    format!("tennis-{}-analysis.{}", mode.as_str(), extension_for_mime(mime))
}

/// Convert a finished recording to MP4, falling back to the raw bytes when
/// the encoder is missing or fails. GIFs are offered as recorded.
pub async fn export_recording<T: Transcoder + ?Sized>(
    transcoder: Option<&T>,
    clip: RecordedClip,
    mode: RecordingMode,
    progress: &dyn Fn(u8),
) -> ExportedClip {
    let raw = |clip: RecordedClip| ExportedClip {
        file_name: export_file_name(mode, &clip.mime_type),
        mime_type: clip.mime_type,
        bytes: clip.bytes,
        converted: false,
    };

    if clip.mime_type.starts_with(GIF_MIME) {
        return raw(clip);
    }
    let Some(transcoder) = transcoder else {
        log::warn!("{}; exporting raw recording", PipelineError::unavailable("transcoder"));
        return raw(clip);
    };

    match transcoder.to_standard_format(&clip.bytes, progress).await {
        Ok(bytes) if !bytes.is_empty() => ExportedClip {
            bytes,
            mime_type: MP4_MIME.to_string(),
            file_name: export_file_name(mode, MP4_MIME),
            converted: true,
        },
        Ok(_) => {
            log::warn!("{}", PipelineError::encoding("converter produced no output"));
            raw(clip)
        }
        Err(e) => {
            log::warn!("export conversion failed, exporting raw recording: {}", e);
            raw(clip)
        }
    }
}

/// Reference video ready to play
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedVideo {
    pub bytes: Vec<u8>,
    pub compressed: bool,
}

/// Trim and compress an uploaded reference video; the upload is used as-is
/// if that fails.
pub async fn prepare_reference<T: Transcoder + ?Sized>(
    transcoder: &T,
    upload: Vec<u8>,
    window: Option<TrimWindow>,
    progress: &dyn Fn(u8),
) -> PreparedVideo {
    match transcoder.reencode(&upload, window, progress).await {
        Ok(bytes) if !bytes.is_empty() => PreparedVideo { bytes, compressed: true },
        Ok(_) => {
            log::warn!("reference compression produced no output; using upload");
            PreparedVideo { bytes: upload, compressed: false }
        }
        Err(e) => {
            log::warn!("reference compression failed, using upload: {}", e);
            PreparedVideo { bytes: upload, compressed: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    /// Records the plans it was asked to run and returns fixed bytes
    struct MockTranscoder {
        result: Option<Vec<u8>>,
        plans: RefCell<Vec<Vec<String>>>,
    }

    impl MockTranscoder {
        fn ok(bytes: &[u8]) -> Self {
            Self { result: Some(bytes.to_vec()), plans: RefCell::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { result: None, plans: RefCell::new(Vec::new()) }
        }
    }

    #[async_trait(?Send)]
    impl Transcoder for MockTranscoder {
        async fn run(&self, _input: &[u8], plan: &TranscodePlan, progress: &dyn Fn(u8)) -> PipelineResult<Vec<u8>> {
            self.plans.borrow_mut().push(plan.build_args());
            progress(50);
            progress(100);
            self.result.clone().ok_or_else(|| PipelineError::encoding("ffmpeg exited with 1"))
        }
    }

    fn webm_clip() -> RecordedClip {
        RecordedClip { bytes: vec![1, 2, 3], mime_type: "video/webm;codecs=vp9".to_string(), frame_count: 3 }
    }

    #[test]
    fn test_trim_window_minimum() {
        assert!(TrimWindow::new(1.0, 1.4).is_err());
        assert!(TrimWindow::new(-1.0, 3.0).is_err());
        let window = TrimWindow::new(1.0, 1.5).unwrap();
        assert!((window.duration() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_trim_handles_keep_gap() {
        let window = TrimWindow::full(10.0);
        assert_eq!(window.with_start(9.9).start, 9.5);
        let window = TrimWindow { start: 4.0, end: 8.0 };
        assert_eq!(window.with_end(1.0).end, 4.5);
    }

    #[test]
    fn test_clamp_to_duration() {
        let window = TrimWindow { start: 8.0, end: 20.0 }.clamp_to(10.0);
        assert_eq!(window, TrimWindow { start: 8.0, end: 10.0 });
        let window = TrimWindow { start: 9.9, end: 20.0 }.clamp_to(10.0);
        assert_eq!(window, TrimWindow { start: 9.5, end: 10.0 });
        assert_eq!(TrimWindow { start: 1.0, end: 2.0 }.clamp_to(0.3), TrimWindow::full(0.3));
    }

    #[test]
    fn test_compress_args() {
        let args = TranscodePlan::compress(Some(1.5), Some(4.0)).build_args();
        assert_eq!(
            args,
            [
                "-ss", "1.5", "-i", "input.mov", "-t", "2.5", "-vf", "scale=-2:720", "-c:v",
                "libx264", "-crf", "28", "-preset", "ultrafast", "output.mp4"
            ]
        );
        let args = TranscodePlan::compress(None, Some(4.0)).build_args();
        assert_eq!(&args[..4], ["-i", "input.mov", "-to", "4"]);
    }

    #[test]
    fn test_convert_args() {
        let args = TranscodePlan::convert().build_args();
        assert_eq!(
            args,
            [
                "-i", "recording.webm", "-c:v", "libx264", "-preset", "ultrafast", "-crf", "22",
                "-movflags", "+faststart", "export.mp4"
            ]
        );
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0.456), 46);
        assert_eq!(progress_percent(1.7), 100);
        assert_eq!(progress_percent(f64::NAN), 0);
    }

    #[test]
    fn test_export_converts() {
        let transcoder = MockTranscoder::ok(b"mp4");
        let last = Cell::new(0u8);
        let exported = block_on(export_recording(
            Some(&transcoder),
            webm_clip(),
            RecordingMode::Combined,
            &|p| last.set(p),
        ));
        assert!(exported.converted);
        assert_eq!(exported.bytes, b"mp4");
        assert_eq!(exported.file_name, "tennis-combined-analysis.mp4");
        assert_eq!(last.get(), 100);
        assert_eq!(transcoder.plans.borrow()[0][1], "recording.webm");
    }

    #[test]
    fn test_export_falls_back_to_raw() {
        let transcoder = MockTranscoder::failing();
        let exported = block_on(export_recording(Some(&transcoder), webm_clip(), RecordingMode::Skeleton, &|_| {}));
        assert!(!exported.converted);
        assert_eq!(exported.bytes, vec![1, 2, 3]);
        assert_eq!(exported.mime_type, "video/webm;codecs=vp9");
        assert_eq!(exported.file_name, "tennis-skeleton-analysis.webm");

        let exported = block_on(export_recording::<MockTranscoder>(None, webm_clip(), RecordingMode::Overlay, &|_| {}));
        assert!(!exported.converted);
    }

    #[test]
    fn test_gif_is_not_converted() {
        let transcoder = MockTranscoder::ok(b"mp4");
        let clip = RecordedClip { bytes: b"GIF89a".to_vec(), mime_type: GIF_MIME.to_string(), frame_count: 1 };
        let exported = block_on(export_recording(Some(&transcoder), clip, RecordingMode::Overlay, &|_| {}));
        assert_eq!(exported.file_name, "tennis-overlay-analysis.gif");
        assert!(transcoder.plans.borrow().is_empty());
    }

    #[test]
    fn test_prepare_reference() {
        let window = TrimWindow::new(2.0, 5.0).ok();
        let ok = block_on(prepare_reference(&MockTranscoder::ok(b"small"), b"big".to_vec(), window, &|_| {}));
        assert_eq!(ok, PreparedVideo { bytes: b"small".to_vec(), compressed: true });

        let failed = block_on(prepare_reference(&MockTranscoder::failing(), b"big".to_vec(), window, &|_| {}));
        assert_eq!(failed, PreparedVideo { bytes: b"big".to_vec(), compressed: false });
    }
}
