use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Byte counter shared between the body stream and the UI channel.
///
/// The reported percentage never decreases and never exceeds 100, no matter how
/// the transport pulls chunks.
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    loaded: AtomicU64,
    percent: AtomicU8,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            loaded: AtomicU64::new(0),
            percent: AtomicU8::new(0),
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded.load(Ordering::Relaxed)
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Records `bytes` more bytes and returns the new percentage if it went up.
    pub fn advance(&self, bytes: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }

        let loaded = self.loaded.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let percent = Self::percent_of(loaded, self.total);
        let previous = self.percent.fetch_max(percent, Ordering::Relaxed);

        (percent > previous).then_some(percent)
    }

    pub fn percent_of(loaded: u64, total: u64) -> u8 {
        if total == 0 {
            return 0;
        }
        let percent = (u128::from(loaded) * 100) / u128::from(total);
        percent.min(100) as u8
    }
}
