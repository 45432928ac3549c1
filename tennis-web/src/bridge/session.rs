//! Browser-facing analysis session
//!
//! `WebSession` owns one `AnalysisSession` plus the mailboxes the page's
//! pose models post into. The page drives it once per animation frame:
//! deliver landmarks, `tick` with the current video pixels, then `present*`
//! the surfaces onto its canvases.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;
use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;

use super::external::{JsBallFinder, JsFrameSink, JsLineDetector, JsTranscoder};
use super::landmarks::LandmarkSet;
use crate::compositor::{
    export_recording, negotiate_mime, prepare_reference, ExportedClip, GifSink, PreparedVideo, RecordedClip,
    RecordingMode, RecordingSink, TrimWindow, GIF_MIME,
};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{AnalysisSession, LandmarkMailbox};
use crate::renderer::{SkeletonBackground, SkeletonStyle, Surface};

/// Wrap raw RGBA from `ImageData.data`
pub(crate) fn frame_from_rgba(width: u32, height: u32, data: Vec<u8>) -> PipelineResult<RgbaImage> {
    RgbaImage::from_raw(width, height, data).ok_or(PipelineError::InvalidDimensions { width, height })
}

/// Parse a recording mode name: "overlay", "skeleton" or "combined"
pub(crate) fn parse_mode(name: &str) -> PipelineResult<RecordingMode> {
    match name.to_lowercase().as_str() {
        "overlay" => Ok(RecordingMode::Overlay),
        "skeleton" => Ok(RecordingMode::Skeleton),
        "combined" => Ok(RecordingMode::Combined),
        other => Err(PipelineError::Config(format!("unknown recording mode '{}'", other))),
    }
}

/// Unknown names fall back to transparent
pub(crate) fn parse_background(name: &str) -> SkeletonBackground {
    match name.to_lowercase().as_str() {
        "black" => SkeletonBackground::Black,
        "blue" => SkeletonBackground::Blue,
        _ => SkeletonBackground::Transparent,
    }
}

fn progress_callback(callback: Option<js_sys::Function>) -> impl Fn(u8) {
    move |percent: u8| {
        if let Some(callback) = &callback {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from(percent));
        }
    }
}

fn set_field(target: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(target, &JsValue::from_str(key), value);
}

fn exported_to_js(clip: &ExportedClip) -> JsValue {
    let obj = js_sys::Object::new();
    set_field(&obj, "bytes", &js_sys::Uint8Array::from(clip.bytes.as_slice()).into());
    set_field(&obj, "mimeType", &JsValue::from_str(&clip.mime_type));
    set_field(&obj, "fileName", &JsValue::from_str(&clip.file_name));
    set_field(&obj, "converted", &JsValue::from(clip.converted));
    obj.into()
}

fn prepared_to_js(video: &PreparedVideo) -> JsValue {
    let obj = js_sys::Object::new();
    set_field(&obj, "bytes", &js_sys::Uint8Array::from(video.bytes.as_slice()).into());
    set_field(&obj, "compressed", &JsValue::from(video.compressed));
    obj.into()
}

fn present(surface: &Surface, ctx: &web_sys::CanvasRenderingContext2d) -> Result<(), JsValue> {
    if surface.is_empty() {
        return Ok(());
    }
    let data = web_sys::ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(surface.as_raw()),
        surface.width(),
        surface.height(),
    )?;
    ctx.put_image_data(&data, 0.0, 0.0)
}

struct WebSessionState {
    session: AnalysisSession,
    primary_mailbox: Rc<RefCell<LandmarkMailbox>>,
    reference_mailbox: Option<Rc<RefCell<LandmarkMailbox>>>,
    /// Reference video pixels for the next tick
    reference_frame: Option<RgbaImage>,
    transcoder: Option<Rc<JsTranscoder>>,
    recording_mode: RecordingMode,
    /// Clip encoded in Rust (GIF), waiting for export
    finished_clip: Option<RecordedClip>,
}

#[wasm_bindgen]
pub struct WebSession {
    state: Rc<RefCell<WebSessionState>>,
}

#[wasm_bindgen]
impl WebSession {
    /// Create a session. `config` may be a partial object or undefined.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WebSession, JsValue> {
        let config = PipelineConfig::from_js(config)?;
        let primary_mailbox = Rc::new(RefCell::new(LandmarkMailbox::consuming()));
        let session = AnalysisSession::new(config, Box::new(primary_mailbox.clone()))?;
        log::info!("analysis session created");

        Ok(WebSession {
            state: Rc::new(RefCell::new(WebSessionState {
                session,
                primary_mailbox,
                reference_mailbox: None,
                reference_frame: None,
                transcoder: None,
                recording_mode: RecordingMode::default(),
                finished_clip: None,
            })),
        })
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Post the player's pose (flat x, y, z[, visibility]; empty = none)
    #[wasm_bindgen(js_name = deliverLandmarks)]
    pub fn deliver_landmarks(&self, data: &[f32]) -> Result<(), JsValue> {
        let landmarks = LandmarkSet::from_flat(data)?;
        self.state.borrow().primary_mailbox.borrow_mut().deliver(landmarks);
        Ok(())
    }

    /// Post the reference performer's pose. Ignored with no reference loaded.
    #[wasm_bindgen(js_name = deliverReferenceLandmarks)]
    pub fn deliver_reference_landmarks(&self, data: &[f32]) -> Result<(), JsValue> {
        let landmarks = LandmarkSet::from_flat(data)?;
        if let Some(mailbox) = &self.state.borrow().reference_mailbox {
            mailbox.borrow_mut().deliver(landmarks);
        }
        Ok(())
    }

    /// Load a reference performer; its landmarks latch between deliveries
    #[wasm_bindgen(js_name = attachReference)]
    pub fn attach_reference(&self) {
        let mut state = self.state.borrow_mut();
        let mailbox = Rc::new(RefCell::new(LandmarkMailbox::latching()));
        state.session.attach_reference(Box::new(mailbox.clone()));
        state.reference_mailbox = Some(mailbox);
        state.reference_frame = None;
    }

    #[wasm_bindgen(js_name = detachReference)]
    pub fn detach_reference(&self) {
        let mut state = self.state.borrow_mut();
        state.session.detach_reference();
        state.reference_mailbox = None;
        state.reference_frame = None;
    }

    /// Pixels of the reference video for the next tick
    #[wasm_bindgen(js_name = setReferenceFrame)]
    pub fn set_reference_frame(&self, data: Clamped<Vec<u8>>, width: u32, height: u32) -> Result<(), JsValue> {
        let frame = frame_from_rgba(width, height, data.0)?;
        self.state.borrow_mut().reference_frame = Some(frame);
        Ok(())
    }

    /// `(pixels, width, height) => [{x1, y1, x2, y2}]`
    #[wasm_bindgen(js_name = setLineDetector)]
    pub fn set_line_detector(&self, detect: js_sys::Function) {
        self.state.borrow_mut().session.set_line_detector(Box::new(JsLineDetector::new(detect)));
    }

    /// `(pixels, width, height) => [x, y] | null`
    #[wasm_bindgen(js_name = setBallFinder)]
    pub fn set_ball_finder(&self, find: js_sys::Function) {
        self.state.borrow_mut().session.set_ball_finder(Box::new(JsBallFinder::new(find)));
    }

    /// Encoder used by exports and reference preparation
    #[wasm_bindgen(js_name = setTranscoder)]
    pub fn set_transcoder(&self, run: js_sys::Function) {
        self.state.borrow_mut().transcoder = Some(Rc::new(JsTranscoder::new(run)));
    }

    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&self, name: &str) {
        self.state.borrow_mut().session.set_style(SkeletonStyle::from_name(name));
    }

    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&self, name: &str) {
        self.state.borrow_mut().session.set_background(parse_background(name));
    }

    // ========================================================================
    // Loop
    // ========================================================================

    pub fn start(&self) {
        self.state.borrow_mut().session.start();
    }

    pub fn pause(&self) {
        self.state.borrow_mut().session.pause();
    }

    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.session.reset();
        state.primary_mailbox.borrow_mut().clear();
        if let Some(mailbox) = &state.reference_mailbox {
            mailbox.borrow_mut().clear();
        }
        state.reference_frame = None;
        state.finished_clip = None;
    }

    /// Process one video frame; returns the tick report object
    pub fn tick(&self, data: Clamped<Vec<u8>>, width: u32, height: u32, now_ms: f64) -> Result<JsValue, JsValue> {
        let frame = frame_from_rgba(width, height, data.0)?;
        let mut state = self.state.borrow_mut();
        let reference = state.reference_frame.take();
        let report = state.session.tick(&frame, reference.as_ref(), now_ms);
        serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = courtLines)]
    pub fn court_lines(&self) -> JsValue {
        let state = self.state.borrow();
        serde_wasm_bindgen::to_value(state.session.court_lines()).unwrap_or(JsValue::NULL)
    }

    // ========================================================================
    // Canvas output
    // ========================================================================

    /// Surface A: video with skeleton and badge
    #[wasm_bindgen(js_name = presentAnnotated)]
    pub fn present_annotated(&self, ctx: &web_sys::CanvasRenderingContext2d) -> Result<(), JsValue> {
        present(self.state.borrow().session.annotated_surface(), ctx)
    }

    /// Surface B: skeleton only
    #[wasm_bindgen(js_name = presentSkeleton)]
    pub fn present_skeleton(&self, ctx: &web_sys::CanvasRenderingContext2d) -> Result<(), JsValue> {
        present(self.state.borrow().session.skeleton_surface(), ctx)
    }

    /// Surface C: reference skeleton, to lay over the reference video
    #[wasm_bindgen(js_name = presentReference)]
    pub fn present_reference(&self, ctx: &web_sys::CanvasRenderingContext2d) -> Result<(), JsValue> {
        present(self.state.borrow().session.reference_surface(), ctx)
    }

    /// Last composited recording frame
    #[wasm_bindgen(js_name = presentOutput)]
    pub fn present_output(&self, ctx: &web_sys::CanvasRenderingContext2d) -> Result<(), JsValue> {
        present(self.state.borrow().session.output(), ctx)
    }

    // ========================================================================
    // Recording and export
    // ========================================================================

    /// Start recording and return the negotiated MIME type. `on_frame`
    /// receives composited frames for every non-GIF format.
    #[wasm_bindgen(js_name = startRecording)]
    pub fn start_recording(&self, mode: &str, on_frame: Option<js_sys::Function>) -> Result<String, JsValue> {
        let mode = parse_mode(mode)?;
        let mut state = self.state.borrow_mut();
        let config = state.session.config();
        let mime = negotiate_mime(&config.mime_preferences, |m| {
            m.starts_with(GIF_MIME) || web_sys::MediaRecorder::is_type_supported(m)
        })
        .ok_or_else(|| PipelineError::unavailable("no supported recording format"))?;

        let sink: Box<dyn RecordingSink> = if mime.starts_with(GIF_MIME) {
            Box::new(GifSink::new(config.recording_fps))
        } else {
            let on_frame = on_frame.ok_or_else(|| PipelineError::Config(format!("{} needs a frame callback", mime)))?;
            Box::new(JsFrameSink::new(mime.clone(), on_frame))
        };

        log::info!("recording {} as {}", mode.as_str(), mime);
        state.session.start_recording(mode, sink);
        state.recording_mode = mode;
        state.finished_clip = None;
        Ok(mime)
    }

    /// Stop recording. True when a clip encoded here awaits `exportRecording`;
    /// false when the page's recorder holds the bytes.
    #[wasm_bindgen(js_name = stopRecording)]
    pub fn stop_recording(&self) -> Result<bool, JsValue> {
        let mut state = self.state.borrow_mut();
        let clip = state.session.stop_recording()?;
        let held = clip.is_some();
        state.finished_clip = clip;
        Ok(held)
    }

    #[wasm_bindgen(js_name = isRecording)]
    pub fn is_recording(&self) -> bool {
        self.state.borrow().session.is_recording()
    }

    /// Export the clip from `stopRecording`.
    /// Resolves to `{bytes, mimeType, fileName, converted}`.
    #[wasm_bindgen(js_name = exportRecording)]
    pub fn export_recording(&self, on_progress: Option<js_sys::Function>) -> js_sys::Promise {
        let (clip, mode, transcoder) = {
            let mut state = self.state.borrow_mut();
            (state.finished_clip.take(), state.recording_mode, state.transcoder.clone())
        };
        wasm_bindgen_futures::future_to_promise(async move {
            let clip = clip.ok_or(PipelineError::RecordingInactive)?;
            let progress = progress_callback(on_progress);
            let exported = export_recording(transcoder.as_deref(), clip, mode, &progress).await;
            Ok(exported_to_js(&exported))
        })
    }

    /// Export bytes produced by the page's `MediaRecorder`
    #[wasm_bindgen(js_name = exportMediaRecording)]
    pub fn export_media_recording(
        &self,
        bytes: Vec<u8>,
        mime_type: String,
        on_progress: Option<js_sys::Function>,
    ) -> js_sys::Promise {
        let (mode, transcoder) = {
            let state = self.state.borrow();
            (state.recording_mode, state.transcoder.clone())
        };
        let clip = RecordedClip { bytes, mime_type, frame_count: 0 };
        wasm_bindgen_futures::future_to_promise(async move {
            let progress = progress_callback(on_progress);
            let exported = export_recording(transcoder.as_deref(), clip, mode, &progress).await;
            Ok(exported_to_js(&exported))
        })
    }

    /// Trim and compress an uploaded reference video.
    /// Resolves to `{bytes, compressed}`; the upload is returned untouched
    /// when no encoder is set or it fails.
    #[wasm_bindgen(js_name = prepareReference)]
    pub fn prepare_reference(
        &self,
        upload: Vec<u8>,
        start: Option<f64>,
        end: Option<f64>,
        on_progress: Option<js_sys::Function>,
    ) -> js_sys::Promise {
        let transcoder = self.state.borrow().transcoder.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let window = match (start, end) {
                (Some(start), Some(end)) => Some(TrimWindow::new(start, end)?),
                _ => None,
            };
            let Some(transcoder) = transcoder else {
                log::warn!("no transcoder set; using reference upload as-is");
                return Ok(prepared_to_js(&PreparedVideo { bytes: upload, compressed: false }));
            };
            let progress = progress_callback(on_progress);
            let prepared = prepare_reference(transcoder.as_ref(), upload, window, &progress).await;
            Ok(prepared_to_js(&prepared))
        })
    }
}
