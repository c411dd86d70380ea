#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base frequency the whole grid is tuned from: A3.
pub const BASE_FREQUENCY: f32 = 220.0;

/// A musical scale as frequency ratios relative to [`BASE_FREQUENCY`].
///
/// Exactly one scale is active at a time; the ratio tables are immutable.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Pentatonic,
    Major,
    Minor,
    HarmonicMinor,
    Blues,
}

impl Scale {
    pub const ALL: [Scale; 5] = [
        Scale::Pentatonic,
        Scale::Major,
        Scale::Minor,
        Scale::HarmonicMinor,
        Scale::Blues,
    ];

    /// Ratios of each scale degree within one octave.
    pub fn ratios(&self) -> &'static [f32] {
        match self {
            // A, C, D, E, G
            Scale::Pentatonic => &[1.0, 1.2, 1.3333, 1.5, 1.8],
            // C, D, E, F, G, A, B
            Scale::Major => &[1.0, 1.125, 1.25, 1.3333, 1.5, 1.6667, 1.875],
            // C, D, Eb, F, G, Ab, Bb
            Scale::Minor => &[1.0, 1.125, 1.2, 1.3333, 1.5, 1.6, 1.75],
            // C, D, Eb, F, G, Ab, B
            Scale::HarmonicMinor => &[1.0, 1.125, 1.2, 1.3333, 1.5, 1.6, 1.875],
            // C, Eb, E, F, G, A
            Scale::Blues => &[1.0, 1.2, 1.25, 1.333, 1.5, 1.6],
        }
    }

    /// Parse the identifier used by UI controls and presets. Unknown names
    /// yield `None`; callers treat that as a no-op scale change.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pentatonic" => Some(Scale::Pentatonic),
            "major" => Some(Scale::Major),
            "minor" => Some(Scale::Minor),
            "harmonicMinor" | "harmonic_minor" => Some(Scale::HarmonicMinor),
            "blues" => Some(Scale::Blues),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scale::Pentatonic => "pentatonic",
            Scale::Major => "major",
            Scale::Minor => "minor",
            Scale::HarmonicMinor => "harmonicMinor",
            Scale::Blues => "blues",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Scale::Pentatonic => "Pentatonic",
            Scale::Major => "Major",
            Scale::Minor => "Natural Minor",
            Scale::HarmonicMinor => "Harmonic Minor",
            Scale::Blues => "Blues",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for scale in Scale::ALL {
            assert_eq!(Scale::from_name(scale.name()), Some(scale));
        }
        assert_eq!(Scale::from_name("chromatic"), None);
    }

    #[test]
    fn ratios_start_at_unison_and_ascend() {
        for scale in Scale::ALL {
            let ratios = scale.ratios();
            assert_eq!(ratios[0], 1.0, "{scale:?} must start at the root");
            for pair in ratios.windows(2) {
                assert!(pair[0] < pair[1], "{scale:?} ratios must ascend");
            }
            assert!(*ratios.last().unwrap() < 2.0, "{scale:?} stays inside one octave");
        }
    }
}
