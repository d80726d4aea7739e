mod api_types;
pub mod custom_types;

use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use crate::apple_music::custom_types::{AlbumKey, TrackRecord};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("library file not found or unreadable: {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed library file: {}", .path.display())]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },
}

/// Read every track of a `Library.xml` export, in document order
pub fn load_library(path: &Path, album_key: AlbumKey) -> Result<Vec<TrackRecord>, LoadError> {
    log::info!("Reading library from {}", path.display());
    let not_found = |source| LoadError::NotFound {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(not_found)?;
    // Directories open fine on some platforms and only fail on read
    if !file.metadata().map_err(not_found)?.is_file() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let root: api_types::library_xml::Root =
        plist::from_reader(BufReader::new(file)).map_err(|source| read_error(path, source))?;

    let tracks: Vec<TrackRecord> = root
        .tracks
        .into_iter()
        .map(|track| TrackRecord::from_library_track(track, album_key))
        .collect();

    for track in tracks.iter().filter(|t| t.album.is_none()) {
        log::debug!(
            "Track {} ({}) has no album",
            track.track_id.map_or_else(|| "?".to_owned(), |id| id.to_string()),
            track.name.as_deref().unwrap_or_default(),
        );
    }
    log::info!("Loaded {} tracks", tracks.len());

    Ok(tracks)
}

// Failing reads are I/O problems, everything else (including running out of
// input mid-document) is a malformed document.
fn read_error(path: &Path, source: plist::Error) -> LoadError {
    match source.as_io().map(io::Error::kind) {
        Some(kind) if kind != io::ErrorKind::UnexpectedEof => LoadError::NotFound {
            path: path.to_owned(),
            source: io::Error::new(kind, source),
        },
        _ => LoadError::MalformedInput {
            path: path.to_owned(),
            source,
        },
    }
}
