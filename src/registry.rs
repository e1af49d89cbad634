//! The chunk registry: which tags this decoder recognizes, their
//! cardinality, and the ordering rules enforced while streaming chunks.

use crate::chunk::{BKGD, GAMA, IDAT, IEND, IHDR, PLTE};
use crate::error::{invalid, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ExactlyOne,
    ZeroOrOne,
    OneOrMore,
}

pub const RECOGNIZED: &[(u32, Cardinality)] = &[
    (IHDR, Cardinality::ExactlyOne),
    (PLTE, Cardinality::ZeroOrOne),
    (IDAT, Cardinality::OneOrMore),
    (IEND, Cardinality::ExactlyOne),
    (GAMA, Cardinality::ZeroOrOne),
    (BKGD, Cardinality::ZeroOrOne),
];

pub fn is_recognized(tag: u32) -> bool {
    RECOGNIZED.iter().any(|(t, _)| *t == tag)
}

/// Tracks ordering and cardinality state as the decoder streams chunks.
/// IHDR and IEND are handled directly by the decoder (they gate the start
/// and end of the loop); this tracks the rest.
#[derive(Default)]
pub struct OrderTracker {
    pub seen_plte: bool,
    pub seen_bkgd: bool,
    pub seen_gama: bool,
    pub seen_idat: bool,
    idat_run_closed: bool,
}

impl OrderTracker {
    pub fn on_plte(&mut self) -> Result<()> {
        if self.seen_plte {
            return Err(invalid("more than one PLTE chunk"));
        }
        if self.seen_bkgd {
            return Err(invalid("PLTE must come before bKGD"));
        }
        if self.seen_idat {
            return Err(invalid("PLTE must come before any IDAT"));
        }
        self.seen_plte = true;
        Ok(())
    }

    pub fn on_bkgd(&mut self) -> Result<()> {
        if self.seen_bkgd {
            return Err(invalid("more than one bKGD chunk"));
        }
        if self.seen_idat {
            return Err(invalid("bKGD must come before any IDAT"));
        }
        self.seen_bkgd = true;
        Ok(())
    }

    pub fn on_gama(&mut self) -> Result<()> {
        if self.seen_gama {
            return Err(invalid("more than one gAMA chunk"));
        }
        self.seen_gama = true;
        Ok(())
    }

    /// Call when an IDAT chunk is seen; fails if a non-IDAT chunk already
    /// closed the IDAT run (IDAT chunks must be contiguous).
    pub fn on_idat(&mut self) -> Result<()> {
        if self.idat_run_closed {
            return Err(invalid("IDAT chunks must be contiguous"));
        }
        self.seen_idat = true;
        Ok(())
    }

    /// Call for every chunk that is *not* IDAT, so that a later IDAT chunk
    /// can be recognized as breaking contiguity.
    pub fn on_non_idat_chunk(&mut self) {
        if self.seen_idat {
            self.idat_run_closed = true;
        }
    }

    pub fn require_idat_seen(&self) -> Result<()> {
        if !self.seen_idat {
            return Err(invalid("no IDAT chunk present"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_exactly_the_six_chunk_tags() {
        assert!(is_recognized(IHDR));
        assert!(is_recognized(PLTE));
        assert!(is_recognized(IDAT));
        assert!(is_recognized(IEND));
        assert!(is_recognized(GAMA));
        assert!(is_recognized(BKGD));
        assert!(!is_recognized(u32::from_be_bytes(*b"bLUB")));
        assert_eq!(RECOGNIZED.len(), 6);
    }

    #[test]
    fn plte_after_idat_is_rejected() {
        let mut tracker = OrderTracker::default();
        tracker.on_idat().unwrap();
        tracker.on_non_idat_chunk();
        assert!(tracker.on_plte().is_err());
    }

    #[test]
    fn bkgd_before_plte_is_rejected_when_plte_arrives_later() {
        let mut tracker = OrderTracker::default();
        tracker.on_bkgd().unwrap();
        tracker.on_non_idat_chunk();
        assert!(tracker.on_plte().is_err());
    }

    #[test]
    fn non_contiguous_idat_is_rejected() {
        let mut tracker = OrderTracker::default();
        tracker.on_idat().unwrap();
        tracker.on_non_idat_chunk(); // some other chunk breaks the run
        assert!(tracker.on_idat().is_err());
    }

    #[test]
    fn missing_idat_is_rejected() {
        let tracker = OrderTracker::default();
        assert!(tracker.require_idat_seen().is_err());
    }
}
