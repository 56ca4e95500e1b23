//! Track metadata records and catalog lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a track and its audio features are stored in the catalog.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// External track identifier, unique within the catalog.
    pub track_id: String,
    pub name: String,
    pub artist: String,
    /// Normalized [0, 1] measure of the track's intensity.
    pub energy: f64,
    pub duration_ms: u64,
}

impl TrackInfo {
    /// Playback length rounded down to whole minutes. Session time advances
    /// by this amount when the track is served.
    #[must_use]
    pub fn duration_minutes(&self) -> usize {
        (self.duration_ms / 60_000) as usize
    }

    /// Duration formatted as `m:ss` for display.
    #[must_use]
    pub fn duration_display(&self) -> String {
        let minutes = self.duration_ms / 60_000;
        let seconds = (self.duration_ms % 60_000) / 1000;
        format!("{minutes}:{seconds:02}")
    }
}

/// Read-only track catalog keyed by external track id.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    tracks: HashMap<String, TrackInfo>,
}

impl Catalog {
    #[must_use]
    pub fn new(tracks: Vec<TrackInfo>) -> Self {
        Self {
            tracks: tracks
                .into_iter()
                .map(|t| (t.track_id.clone(), t))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, track_id: &str) -> Option<&TrackInfo> {
        self.tracks.get(track_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackInfo> {
        self.tracks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats_as_minutes_and_seconds() {
        let track = TrackInfo {
            track_id: "t1".to_string(),
            name: "Test".to_string(),
            artist: "Test".to_string(),
            energy: 0.5,
            duration_ms: 214_000,
        };
        assert_eq!(track.duration_display(), "3:34");
        assert_eq!(track.duration_minutes(), 3);
    }

    #[test]
    fn sub_minute_durations_round_down() {
        let track = TrackInfo {
            duration_ms: 59_999,
            ..TrackInfo::default()
        };
        assert_eq!(track.duration_minutes(), 0);
        assert_eq!(track.duration_display(), "0:59");
    }

    #[test]
    fn catalog_lookup_by_id() {
        let catalog = Catalog::new(vec![TrackInfo {
            track_id: "abc".to_string(),
            name: "Song".to_string(),
            artist: "Artist".to_string(),
            energy: 0.7,
            duration_ms: 180_000,
        }]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("abc").unwrap().energy, 0.7);
        assert!(catalog.get("missing").is_none());
    }
}
