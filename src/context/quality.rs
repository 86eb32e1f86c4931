//! Sample-size trust tiers.
//!
//! Venue-specific samples earn their tier faster than season-wide
//! fallbacks, which need more matches to say the same thing.

use super::DataQuality;

/// Below this many opposition matches no classification is attempted.
pub const MIN_OPPOSITION_SAMPLE: usize = 3;

const VENUE_EXCELLENT: usize = 10;
const VENUE_GOOD: usize = 7;
const VENUE_FAIR: usize = 5;

const FALLBACK_GOOD: usize = 15;
const FALLBACK_FAIR: usize = 10;

/// Grade an opposition sample.
pub fn assess(sample: usize, venue_specific: bool) -> DataQuality {
    if sample < MIN_OPPOSITION_SAMPLE {
        return DataQuality::Insufficient;
    }
    if venue_specific {
        if sample >= VENUE_EXCELLENT {
            DataQuality::Excellent
        } else if sample >= VENUE_GOOD {
            DataQuality::Good
        } else if sample >= VENUE_FAIR {
            DataQuality::Fair
        } else {
            DataQuality::Poor
        }
    } else if sample >= FALLBACK_GOOD {
        DataQuality::Good
    } else if sample >= FALLBACK_FAIR {
        DataQuality::Fair
    } else {
        DataQuality::Poor
    }
}
