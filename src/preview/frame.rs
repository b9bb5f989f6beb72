//! Displayable preview resource
//!
//! The rendered PDF is an opaque byte payload with exactly one owner: the
//! synchronizer's frame slot. At most one frame is live per document
//! instance, and the previous frame is released before a replacement is
//! installed, so repeated edits never accumulate dead payloads.

use bytes::Bytes;
use std::sync::Arc;

/// One rendered preview document
#[derive(Debug)]
pub struct PdfFrame {
    data: Arc<Vec<u8>>,
}

impl PdfFrame {
    pub(crate) fn new(bytes: Bytes) -> Self {
        Self {
            data: Arc::new(bytes.to_vec()),
        }
    }

    /// The rendered PDF bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cheap read snapshot for a display surface. The snapshot keeps the
    /// payload alive only as long as the caller holds it; the slot remains
    /// the owner of record.
    pub(crate) fn payload(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }
}

/// Holder enforcing the at-most-one-live-frame invariant
#[derive(Debug, Default)]
pub(crate) struct FrameSlot {
    current: Option<PdfFrame>,
    installed: u64,
}

impl FrameSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Install a new frame, releasing the previous one first.
    pub(crate) fn install(&mut self, frame: PdfFrame) {
        let previous = self.current.take();
        drop(previous);
        self.current = Some(frame);
        self.installed += 1;
    }

    /// Release the current frame without a replacement (teardown).
    pub(crate) fn clear(&mut self) {
        self.current = None;
    }

    pub(crate) fn payload(&self) -> Option<Arc<Vec<u8>>> {
        self.current.as_ref().map(PdfFrame::payload)
    }

    /// Monotonic count of installs, used as the status revision.
    pub(crate) fn installed(&self) -> u64 {
        self.installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;

    fn frame_with_probe(content: &[u8]) -> (PdfFrame, Weak<Vec<u8>>) {
        let frame = PdfFrame::new(Bytes::copy_from_slice(content));
        let probe = Arc::downgrade(&frame.data);
        (frame, probe)
    }

    #[test]
    fn test_install_replaces_and_releases_previous() {
        let mut slot = FrameSlot::new();
        let (first, first_probe) = frame_with_probe(b"%PDF-1");
        let (second, second_probe) = frame_with_probe(b"%PDF-2");

        slot.install(first);
        assert!(first_probe.upgrade().is_some());
        assert_eq!(slot.installed(), 1);

        slot.install(second);
        // The old frame is gone, exactly once, before the new one is live.
        assert!(first_probe.upgrade().is_none());
        assert!(second_probe.upgrade().is_some());
        assert_eq!(slot.installed(), 2);
        assert_eq!(slot.payload().unwrap().as_slice(), b"%PDF-2");
    }

    #[test]
    fn test_clear_releases_without_replacement() {
        let mut slot = FrameSlot::new();
        let (frame, probe) = frame_with_probe(b"%PDF-1");
        slot.install(frame);
        slot.clear();
        assert!(probe.upgrade().is_none());
        assert!(slot.payload().is_none());
    }

    #[test]
    fn test_snapshot_outlives_release_but_not_the_slot_invariant() {
        let mut slot = FrameSlot::new();
        let (frame, probe) = frame_with_probe(b"%PDF-1");
        slot.install(frame);

        let snapshot = slot.payload().unwrap();
        slot.clear();
        // The reader's snapshot stays valid until dropped...
        assert_eq!(snapshot.as_slice(), b"%PDF-1");
        drop(snapshot);
        // ...and the payload is freed once the last snapshot is gone.
        assert!(probe.upgrade().is_none());
    }

    #[test]
    fn test_empty_slot_reports_no_payload() {
        let slot = FrameSlot::new();
        assert!(slot.payload().is_none());
        assert_eq!(slot.installed(), 0);
    }
}
