//! Tennis Web - stroke analysis and video compositing for the browser
//!
//! Entry point for WASM module. Only contains:
//! - Module declarations
//! - wasm_bindgen entry points that delegate to submodules
//!
//! Pose models, video decoding and encoding run in the page; this crate
//! turns their landmarks into joint angles, knee-bend and stroke labels,
//! draws skeleton surfaces and assembles recording frames.

mod bridge;
mod classifier;
mod compositor;
mod config;
mod error;
mod physics;
mod pipeline;
mod renderer;

use wasm_bindgen::prelude::*;

pub use bridge::{Landmark, LandmarkSet, WebSession};
pub use classifier::{StrokeClassifier, StrokeType};
pub use compositor::{CompositeLayout, FrameCompositor, RecordingMode};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use physics::{AngleSet, KneeBend, KneeBendClassifier, KneeStatus};
pub use pipeline::{AnalysisSession, TickReport};
pub use renderer::{SkeletonBackground, SkeletonStyle, Surface};

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Route `log` output to the browser console.
///
/// `level` is one of "trace", "debug", "info", "warn" or "error"; anything
/// else means info.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => log::Level::Trace,
        "debug" => log::Level::Debug,
        "warn" => log::Level::Warn,
        "error" => log::Level::Error,
        _ => log::Level::Info,
    };

    let _ = wasm_logger::init(wasm_logger::Config::new(log_level));
    log::info!("tennis-web initialized with log level {}", log_level);
}

/// Skeleton style names accepted by `WebSession.setStyle`
#[wasm_bindgen(js_name = skeletonStyles)]
pub fn skeleton_styles() -> Vec<JsValue> {
    SkeletonStyle::ALL.iter().map(|s| JsValue::from_str(s.as_str())).collect()
}
