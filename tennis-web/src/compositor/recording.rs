//! Recording sinks - where composited frames go while recording is active

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use serde::{Deserialize, Serialize};

use super::layout::CompositeLayout;
use crate::error::{PipelineError, PipelineResult};

/// Container preference, best first
pub const DEFAULT_MIME_PREFERENCES: [&str; 4] = [
    "video/mp4",
    "video/webm;codecs=h264",
    "video/webm;codecs=vp9",
    "image/gif",
];

pub const GIF_MIME: &str = "image/gif";

/// Recording frame rate
pub const DEFAULT_FPS: u32 = 30;

/// First preference the platform supports
pub fn negotiate_mime<S: AsRef<str>>(preferences: &[S], supports: impl Fn(&str) -> bool) -> Option<String> {
    preferences
        .iter()
        .map(AsRef::as_ref)
        .find(|mime| supports(mime))
        .map(str::to_string)
}

/// File extension for a recorded MIME type
pub fn extension_for_mime(mime: &str) -> &'static str {
    if mime.starts_with("video/mp4") {
        "mp4"
    } else if mime.starts_with(GIF_MIME) {
        "gif"
    } else {
        "webm"
    }
}

/// What gets recorded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// Annotated video only
    Overlay,
    /// Skeleton surface only
    Skeleton,
    /// Annotated and skeleton together (plus the reference video when loaded)
    #[default]
    Combined,
}

impl RecordingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingMode::Overlay => "overlay",
            RecordingMode::Skeleton => "skeleton",
            RecordingMode::Combined => "combined",
        }
    }

    /// Output layout for this mode
    pub fn layout(&self, has_reference: bool) -> CompositeLayout {
        match self {
            RecordingMode::Overlay | RecordingMode::Skeleton => CompositeLayout::Single,
            RecordingMode::Combined if has_reference => CompositeLayout::Quad,
            RecordingMode::Combined => CompositeLayout::SideBySide,
        }
    }
}

/// A finished recording
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub frame_count: u32,
}

/// Destination for composited frames
pub trait RecordingSink {
    fn mime_type(&self) -> &str;

    /// Append one frame. Called only after the frame is fully drawn.
    fn push_frame(&mut self, frame: &RgbaImage) -> PipelineResult<()>;

    /// Finalize. `None` when the bytes are assembled elsewhere or nothing
    /// was recorded.
    fn finish(&mut self) -> PipelineResult<Option<RecordedClip>>;
}

// ============================================================================
// GIF SINK
// ============================================================================

/// In-memory animated GIF, looping forever
pub struct GifSink {
    frames: Vec<Frame>,
    delay: Delay,
}

impl GifSink {
    pub fn new(fps: u32) -> Self {
        Self {
            frames: Vec::new(),
            delay: Delay::from_numer_denom_ms(1000, fps.max(1)),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl RecordingSink for GifSink {
    fn mime_type(&self) -> &str {
        GIF_MIME
    }

    fn push_frame(&mut self, frame: &RgbaImage) -> PipelineResult<()> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(PipelineError::InvalidDimensions {
                width: frame.width(),
                height: frame.height(),
            });
        }
        self.frames.push(Frame::from_parts(frame.clone(), 0, 0, self.delay));
        Ok(())
    }

    fn finish(&mut self) -> PipelineResult<Option<RecordedClip>> {
        let frames = std::mem::take(&mut self.frames);
        if frames.is_empty() {
            return Ok(None);
        }
        let frame_count = frames.len() as u32;

        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            encoder.set_repeat(Repeat::Infinite)?;
            encoder.encode_frames(frames)?;
        }
        log::info!("gif recording finished: {} frames, {} bytes", frame_count, bytes.len());

        Ok(Some(RecordedClip {
            bytes,
            mime_type: GIF_MIME.to_string(),
            frame_count,
        }))
    }
}

// ============================================================================
// RECORDER
// ============================================================================

/// Active recording: the mode plus the sink receiving frames
#[derive(Default)]
pub struct Recorder {
    active: Option<(RecordingMode, Box<dyn RecordingSink>)>,
    frames: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin recording into `sink`. A recording already in progress is
    /// finalized and its result dropped.
    pub fn start(&mut self, mode: RecordingMode, sink: Box<dyn RecordingSink>) {
        if self.is_active() {
            log::warn!("recording restarted; previous clip discarded");
            if let Err(e) = self.stop() {
                log::warn!("failed to finalize previous recording: {}", e);
            }
        }
        log::info!("recording {} as {}", mode.as_str(), sink.mime_type());
        self.active = Some((mode, sink));
        self.frames = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn mode(&self) -> Option<RecordingMode> {
        self.active.as_ref().map(|(mode, _)| *mode)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.active.as_ref().map(|(_, sink)| sink.mime_type())
    }

    pub fn frames_recorded(&self) -> u32 {
        self.frames
    }

    /// Append a finished frame; empty frames are skipped
    pub fn push(&mut self, frame: &RgbaImage) -> PipelineResult<()> {
        let (_, sink) = self.active.as_mut().ok_or(PipelineError::RecordingInactive)?;
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }
        sink.push_frame(frame)?;
        self.frames += 1;
        Ok(())
    }

    /// Stop and release the sink. No frame can be appended afterwards.
    pub fn stop(&mut self) -> PipelineResult<Option<RecordedClip>> {
        let (mode, mut sink) = self.active.take().ok_or(PipelineError::RecordingInactive)?;
        log::info!("recording {} stopped after {} frames", mode.as_str(), self.frames);
        sink.finish()
    }
}
