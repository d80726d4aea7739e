use std::fmt;

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

/// Top-level dictionary of a `Library.xml` export
#[derive(Deserialize)]
pub struct Root {
    /// Values of the `Tracks` dictionary in document order
    #[serde(rename = "Tracks", deserialize_with = "dictionary_values")]
    pub(in crate::apple_music) tracks: Vec<Track>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Track {
    #[serde(rename = "Track ID")]
    pub(in crate::apple_music) track_id: Option<u64>,
    #[serde(rename = "Name")]
    pub(in crate::apple_music) name: Option<String>,
    #[serde(rename = "Artist")]
    pub(in crate::apple_music) artist: Option<String>,
    #[serde(rename = "Album Artist")]
    pub(in crate::apple_music) album_artist: Option<String>,
    #[serde(rename = "Album")]
    pub(in crate::apple_music) album: Option<String>,
    #[serde(rename = "Year")]
    pub(in crate::apple_music) year: Option<u32>,
    /// 0-100, 20 per star
    #[serde(rename = "Rating")]
    pub(in crate::apple_music) rating: Option<u8>,
    /// Set when the rating was derived from the album rating
    #[serde(rename = "Rating Computed")]
    pub(in crate::apple_music) rating_computed: Option<bool>,
    #[serde(rename = "Play Count")]
    pub(in crate::apple_music) play_count: Option<u64>,
    /// Bytes
    #[serde(rename = "Size")]
    pub(in crate::apple_music) size: Option<u64>,
    /// Milliseconds
    #[serde(rename = "Total Time")]
    pub(in crate::apple_music) total_time: Option<u64>,
}

// The `Tracks` dictionary is keyed by track ID, which every value repeats as
// `Track ID`. Only the values are kept, in the order they appear.
fn dictionary_values<'de, D>(deserializer: D) -> Result<Vec<Track>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ValuesVisitor;

    impl<'de> Visitor<'de> for ValuesVisitor {
        type Value = Vec<Track>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a dictionary of tracks")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut tracks = Vec::with_capacity(map.size_hint().unwrap_or_default());
            while let Some((_, track)) = map.next_entry::<String, Track>()? {
                tracks.push(track);
            }
            Ok(tracks)
        }
    }

    deserializer.deserialize_map(ValuesVisitor)
}
