//! JS-backed collaborators
//!
//! Adapters that let functions supplied by the page stand in for the
//! pipeline's encoder, frame sink and vision helpers.

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::future::{select, Either};
use futures::StreamExt;
use image::RgbaImage;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::compositor::{progress_percent, RecordedClip, RecordingSink, TranscodePlan, Transcoder};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{BrightObjectFinder, LineDetector};
use crate::renderer::CourtLine;

/// Copy a frame into a JS `Uint8ClampedArray` (ImageData layout)
fn frame_to_js(frame: &RgbaImage) -> js_sys::Uint8ClampedArray {
    js_sys::Uint8ClampedArray::from(frame.as_raw().as_slice())
}

/// Call `callback(pixels, width, height)`
fn call_with_frame(callback: &js_sys::Function, frame: &RgbaImage) -> PipelineResult<JsValue> {
    callback
        .call3(
            &JsValue::NULL,
            &frame_to_js(frame).into(),
            &JsValue::from(frame.width()),
            &JsValue::from(frame.height()),
        )
        .map_err(|e| PipelineError::from_js(&e))
}

// ============================================================================
// TRANSCODER
// ============================================================================

/// Encoder running in JS (ffmpeg.wasm or similar).
///
/// JS signature: `(input: Uint8Array, args: string[], inputName, outputName,
/// onProgress: (ratio) => void) => Promise<Uint8Array>`.
pub struct JsTranscoder {
    run: js_sys::Function,
}

impl JsTranscoder {
    pub fn new(run: js_sys::Function) -> Self {
        Self { run }
    }
}

#[async_trait(?Send)]
impl Transcoder for JsTranscoder {
    async fn run(&self, input: &[u8], plan: &TranscodePlan, progress: &dyn Fn(u8)) -> PipelineResult<Vec<u8>> {
        let (tx, mut rx) = mpsc::unbounded::<u8>();
        let on_progress = Closure::<dyn FnMut(f64)>::new(move |ratio: f64| {
            let _ = tx.unbounded_send(progress_percent(ratio));
        });

        let args: js_sys::Array = plan.build_args().iter().map(|a| JsValue::from_str(a)).collect();
        let call_args = js_sys::Array::new();
        call_args.push(&js_sys::Uint8Array::from(input).into());
        call_args.push(&args.into());
        call_args.push(&JsValue::from_str(&plan.input_name));
        call_args.push(&JsValue::from_str(&plan.output_name));
        call_args.push(on_progress.as_ref());

        log::debug!("transcode {} -> {}", plan.input_name, plan.output_name);
        let returned = self.run.apply(&JsValue::NULL, &call_args).map_err(|e| PipelineError::from_js(&e))?;
        let mut pending = JsFuture::from(js_sys::Promise::resolve(&returned));

        // Forward progress while the promise is outstanding
        let result = loop {
            match select(pending, rx.next()).await {
                Either::Left((result, _)) => break result,
                Either::Right((Some(percent), rest)) => {
                    progress(percent);
                    pending = rest;
                }
                Either::Right((None, rest)) => break rest.await,
            }
        };
        drop(on_progress);

        let output = result.map_err(|e| PipelineError::from_js(&e))?;
        progress(100);
        Ok(js_sys::Uint8Array::new(&output).to_vec())
    }
}

// ============================================================================
// FRAME SINK
// ============================================================================

/// Hands composited frames to a JS callback, typically painting a canvas
/// whose stream a `MediaRecorder` captures. The encoded bytes stay in JS,
/// so `finish` yields no clip.
pub struct JsFrameSink {
    mime_type: String,
    on_frame: js_sys::Function,
    frames: u32,
}

impl JsFrameSink {
    pub fn new(mime_type: impl Into<String>, on_frame: js_sys::Function) -> Self {
        Self {
            mime_type: mime_type.into(),
            on_frame,
            frames: 0,
        }
    }
}

impl RecordingSink for JsFrameSink {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn push_frame(&mut self, frame: &RgbaImage) -> PipelineResult<()> {
        call_with_frame(&self.on_frame, frame).map_err(|e| PipelineError::RecordingSink(e.to_string()))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> PipelineResult<Option<RecordedClip>> {
        log::debug!("{} frames handed to the page recorder ({})", self.frames, self.mime_type);
        Ok(None)
    }
}

// ============================================================================
// VISION HELPERS
// ============================================================================

/// Court line detector in JS. Returns `[{x1, y1, x2, y2}]`, normalized.
pub struct JsLineDetector {
    detect: js_sys::Function,
}

impl JsLineDetector {
    pub fn new(detect: js_sys::Function) -> Self {
        Self { detect }
    }
}

impl LineDetector for JsLineDetector {
    fn detect_lines(&mut self, frame: &RgbaImage) -> PipelineResult<Vec<CourtLine>> {
        let value = call_with_frame(&self.detect, frame)?;
        if value.is_undefined() || value.is_null() {
            return Ok(Vec::new());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| PipelineError::Js(e.to_string()))
    }
}

/// Ball finder in JS. Returns `[x, y]` normalized, or null.
pub struct JsBallFinder {
    find: js_sys::Function,
}

impl JsBallFinder {
    pub fn new(find: js_sys::Function) -> Self {
        Self { find }
    }
}

impl BrightObjectFinder for JsBallFinder {
    fn find_bright_object(&mut self, frame: &RgbaImage) -> PipelineResult<Option<(f32, f32)>> {
        let value = call_with_frame(&self.find, frame)?;
        serde_wasm_bindgen::from_value(value).map_err(|e| PipelineError::Js(e.to_string()))
    }
}
