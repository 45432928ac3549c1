//! Pipeline module - per-session tick loop and its external collaborators
//!
//! Re-exports only. All logic in submodules.

mod session;
mod sources;

pub use session::{AnalysisSession, LoopState, TickReport, Track, TrackReading};
pub use sources::{BrightObjectFinder, LandmarkMailbox, LineDetector, MailboxMode, PoseSource};
