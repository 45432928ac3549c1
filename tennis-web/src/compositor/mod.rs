//! Compositor module - output layouts, frame assembly, recording and export
//!
//! Re-exports only. All logic in submodules.

mod export;
mod frame;
mod layout;
pub(crate) mod recording;

pub use export::{
    export_file_name, export_recording, prepare_reference, progress_percent, ExportedClip,
    PreparedVideo, TranscodePlan, Transcoder, TrimWindow, MIN_TRIM_SECONDS, MP4_MIME,
};
pub use frame::{CompositeSources, FrameCompositor, DEFAULT_DIVIDER_WIDTH};
pub use layout::{CompositeLayout, Divider, LayoutPlan, Placement, Slot};
pub use recording::{
    extension_for_mime, negotiate_mime, GifSink, RecordedClip, Recorder, RecordingMode,
    RecordingSink, DEFAULT_FPS, DEFAULT_MIME_PREFERENCES, GIF_MIME,
};
