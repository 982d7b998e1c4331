use std::fs::File;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::SessionError;

/// Media duration probe.
///
/// Pure lookup: `probe(path) -> duration_ms`, failing with `NotFound` when
/// the file is missing and `MediaCorrupt` when it cannot be decoded. Sessions
/// take this as a trait object so tests can substitute a fake.
pub trait DurationProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<u64, SessionError>;
}

/// Symphonia-backed probe covering every container format the decoder knows
/// (WAV, M4A, MP3, FLAC, OGG).
pub struct MediaProbe;

impl DurationProbe for MediaProbe {
    fn probe(&self, path: &Path) -> Result<u64, SessionError> {
        if !path.exists() {
            return Err(SessionError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let corrupt = || SessionError::MediaCorrupt {
            path: path.to_path_buf(),
        };

        let file = File::open(path).map_err(|_| corrupt())?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|_| corrupt())?;

        let track = probed.format.default_track().ok_or_else(corrupt)?;
        let params = &track.codec_params;

        let duration_ms = match (params.n_frames, params.time_base) {
            (Some(frames), Some(time_base)) => {
                let time = time_base.calc_time(frames);
                time.seconds * 1000 + (time.frac * 1000.0) as u64
            }
            (Some(frames), None) => {
                let rate = params.sample_rate.ok_or_else(corrupt)?;
                frames * 1000 / rate as u64
            }
            _ => return Err(corrupt()),
        };

        debug!("Probed {}: {}ms", path.display(), duration_ms);

        Ok(duration_ms)
    }
}
