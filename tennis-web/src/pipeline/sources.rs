//! External collaborators a session is built from
//!
//! Each session receives its detectors explicitly. Nothing here is global:
//! a primary and a reference track hold separate `PoseSource`s.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;

use crate::bridge::LandmarkSet;
use crate::error::{PipelineError, PipelineResult};
use crate::renderer::CourtLine;

/// Pose model capability: landmarks for a frame, or an empty set when no
/// body was found
pub trait PoseSource {
    fn detect(&mut self, frame: &RgbaImage) -> PipelineResult<LandmarkSet>;

    /// Whether the last `detect` returned a new model result rather than a
    /// repeat of an older one
    fn is_fresh(&self) -> bool {
        true
    }
}

/// Court line producer (normalized coordinates)
pub trait LineDetector {
    fn detect_lines(&mut self, frame: &RgbaImage) -> PipelineResult<Vec<CourtLine>>;
}

/// Ball finder: normalized (x, y) of the brightest ball-colored blob
pub trait BrightObjectFinder {
    fn find_bright_object(&mut self, frame: &RgbaImage) -> PipelineResult<Option<(f32, f32)>>;
}

/// How a mailbox hands out deliveries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailboxMode {
    /// Each delivery is read once; a tick without one sees no pose
    Consume,
    /// The newest non-empty delivery is kept until replaced, so a lagging
    /// model still has something to draw
    Latch,
}

/// `PoseSource` fed by the model's result callback.
///
/// The model runs outside Rust and posts results with `deliver`; `detect`
/// then returns what arrived, not necessarily from the same frame.
#[derive(Clone, Debug)]
pub struct LandmarkMailbox {
    mode: MailboxMode,
    slot: Option<LandmarkSet>,
    ready: bool,
    /// A delivery arrived since the last `detect`
    unread: bool,
    last_fresh: bool,
}

impl LandmarkMailbox {
    pub fn new(mode: MailboxMode) -> Self {
        Self {
            mode,
            slot: None,
            ready: true,
            unread: false,
            last_fresh: false,
        }
    }

    /// Mailbox for the player's video
    pub fn consuming() -> Self {
        Self::new(MailboxMode::Consume)
    }

    /// Mailbox for the reference video
    pub fn latching() -> Self {
        Self::new(MailboxMode::Latch)
    }

    /// Start in the not-ready state; `detect` fails until the first delivery
    pub fn pending(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Post a model result
    pub fn deliver(&mut self, landmarks: LandmarkSet) {
        self.ready = true;
        if self.mode == MailboxMode::Latch && landmarks.is_empty() {
            return;
        }
        self.slot = Some(landmarks);
        self.unread = true;
    }

    /// Forget any held result
    pub fn clear(&mut self) {
        self.slot = None;
        self.unread = false;
    }
}

impl PoseSource for LandmarkMailbox {
    fn detect(&mut self, _frame: &RgbaImage) -> PipelineResult<LandmarkSet> {
        if !self.ready {
            self.last_fresh = false;
            return Err(PipelineError::unavailable("pose model is still loading"));
        }
        self.last_fresh = std::mem::take(&mut self.unread);
        let landmarks = match self.mode {
            MailboxMode::Consume => self.slot.take(),
            MailboxMode::Latch => self.slot.clone(),
        };
        Ok(landmarks.unwrap_or_default())
    }

    fn is_fresh(&self) -> bool {
        self.last_fresh
    }
}

/// Shared handle: the callback side keeps delivering into a source the
/// session owns
impl<P: PoseSource + ?Sized> PoseSource for Rc<RefCell<P>> {
    fn detect(&mut self, frame: &RgbaImage) -> PipelineResult<LandmarkSet> {
        self.borrow_mut().detect(frame)
    }

    fn is_fresh(&self) -> bool {
        self.borrow().is_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::landmarks::tests::standing_pose;

    #[test]
    fn test_consuming_reads_once() {
        let frame = RgbaImage::new(1, 1);
        let mut mailbox = LandmarkMailbox::consuming();
        mailbox.deliver(standing_pose());
        assert!(!mailbox.detect(&frame).unwrap().is_empty());
        assert!(mailbox.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_latching_keeps_last_pose() {
        let frame = RgbaImage::new(1, 1);
        let mut mailbox = LandmarkMailbox::latching();
        mailbox.deliver(standing_pose());
        mailbox.deliver(LandmarkSet::empty());
        assert_eq!(mailbox.detect(&frame).unwrap(), standing_pose());
        assert_eq!(mailbox.detect(&frame).unwrap(), standing_pose());
    }

    #[test]
    fn test_latched_repeat_is_stale() {
        let frame = RgbaImage::new(1, 1);
        let mut mailbox = LandmarkMailbox::latching();
        mailbox.deliver(standing_pose());
        mailbox.detect(&frame).unwrap();
        assert!(mailbox.is_fresh());

        assert_eq!(mailbox.detect(&frame).unwrap(), standing_pose());
        assert!(!mailbox.is_fresh());

        // An empty result keeps the old pose without making it new again
        mailbox.deliver(LandmarkSet::empty());
        mailbox.detect(&frame).unwrap();
        assert!(!mailbox.is_fresh());

        mailbox.deliver(standing_pose());
        mailbox.detect(&frame).unwrap();
        assert!(mailbox.is_fresh());
    }

    #[test]
    fn test_pending_until_first_delivery() {
        let frame = RgbaImage::new(1, 1);
        let mut mailbox = LandmarkMailbox::consuming().pending();
        assert!(matches!(mailbox.detect(&frame), Err(PipelineError::UpstreamUnavailable(_))));
        mailbox.deliver(LandmarkSet::empty());
        assert!(mailbox.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_shared_handle_delivers() {
        let frame = RgbaImage::new(1, 1);
        let mailbox = Rc::new(RefCell::new(LandmarkMailbox::consuming()));
        let mut source: Box<dyn PoseSource> = Box::new(mailbox.clone());
        mailbox.borrow_mut().deliver(standing_pose());
        assert_eq!(source.detect(&frame).unwrap(), standing_pose());
    }
}
