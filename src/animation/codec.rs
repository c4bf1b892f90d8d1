//! Saving and loading keyframe stores as chunked animation files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info, warn};

use super::chunk::{Chunk, ChunkTag, read_signature, write_chunk, write_signature};
use super::error::{FieldError, Result, SkippedField};
use super::store::{Keyframe, KeyframeStore};
use crate::curve::Spline;
use crate::schema::{CodecConfig, Thumbnail, TruncatedKeyframePolicy};

/// Signature at the start of every animation file.
pub const ANIMATION_SIGNATURE: &[u8] = b"de Jong Explorer Animation\n\r\xFF\n";

/// Begin a new keyframe definition.
pub const CHUNK_KEYFRAME_START: ChunkTag = ChunkTag::new(b"KfrS");
/// End a keyframe definition.
pub const CHUNK_KEYFRAME_END: ChunkTag = ChunkTag::new(b"KfrE");
/// Parameter-set text.
pub const CHUNK_PARAMETERS: ChunkTag = ChunkTag::new(b"djPR");
/// Encoded thumbnail image.
pub const CHUNK_THUMBNAIL: ChunkTag = ChunkTag::new(b"djTH");
/// Serialized curve control points.
pub const CHUNK_CURVE: ChunkTag = ChunkTag::new(b"splC");
/// Transition duration, little-endian f64.
pub const CHUNK_DURATION: ChunkTag = ChunkTag::new(b"dura");

/// A chunk classified by its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    KeyframeStart,
    KeyframeEnd,
    Parameters(Vec<u8>),
    Thumbnail(Vec<u8>),
    Curve(Vec<u8>),
    Duration(Vec<u8>),
    /// A chunk this version doesn't understand.
    Unknown(Chunk),
}

impl From<Chunk> for Record {
    fn from(chunk: Chunk) -> Self {
        match chunk.tag {
            CHUNK_KEYFRAME_START => Record::KeyframeStart,
            CHUNK_KEYFRAME_END => Record::KeyframeEnd,
            CHUNK_PARAMETERS => Record::Parameters(chunk.payload),
            CHUNK_THUMBNAIL => Record::Thumbnail(chunk.payload),
            CHUNK_CURVE => Record::Curve(chunk.payload),
            CHUNK_DURATION => Record::Duration(chunk.payload),
            _ => Record::Unknown(chunk),
        }
    }
}

impl Record {
    pub fn tag(&self) -> ChunkTag {
        match self {
            Record::KeyframeStart => CHUNK_KEYFRAME_START,
            Record::KeyframeEnd => CHUNK_KEYFRAME_END,
            Record::Parameters(_) => CHUNK_PARAMETERS,
            Record::Thumbnail(_) => CHUNK_THUMBNAIL,
            Record::Curve(_) => CHUNK_CURVE,
            Record::Duration(_) => CHUNK_DURATION,
            Record::Unknown(chunk) => chunk.tag,
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Keyframes added to the store.
    pub keyframes: usize,
    /// Fields that were skipped because they were malformed or misplaced.
    pub skipped: Vec<SkippedField>,
    /// Tags of chunks that were not recognized.
    pub unknown: Vec<ChunkTag>,
    /// True if the file ended inside a keyframe.
    pub truncated: bool,
}

impl LoadReport {
    /// True if every chunk was understood and applied.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.unknown.is_empty() && !self.truncated
    }
}

/// Statistics from a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveStats {
    pub keyframes: usize,
    pub chunks: usize,
    pub total_bytes: u64,
}

/// Reads and writes keyframe stores in the chunked animation format.
///
/// Usage:
/// ```ignore
/// let codec = AnimationCodec::default();
/// codec.save_file(&store, "flight.anim")?;
///
/// let mut loaded = KeyframeStore::new();
/// let report = codec.load_file(&mut loaded, "flight.anim")?;
/// assert!(report.is_clean());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnimationCodec {
    config: CodecConfig,
}

impl AnimationCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Write every keyframe of `store` to `w`.
    ///
    /// Empty parameters, missing thumbnails and the default curve are omitted;
    /// on load their absence leaves the defaults in place.
    pub fn save<W: Write>(&self, store: &KeyframeStore, w: &mut W) -> Result<SaveStats> {
        let mut stats = SaveStats {
            keyframes: 0,
            chunks: 0,
            total_bytes: ANIMATION_SIGNATURE.len() as u64,
        };
        let mut put = |w: &mut W, tag: ChunkTag, payload: &[u8]| -> Result<()> {
            write_chunk(w, tag, payload)?;
            stats.chunks += 1;
            stats.total_bytes += (Chunk::HEADER_SIZE + payload.len()) as u64;
            Ok(())
        };

        write_signature(w, ANIMATION_SIGNATURE)?;

        let default_curve = Spline::smooth();
        for (index, keyframe) in store.iter().enumerate() {
            put(w, CHUNK_KEYFRAME_START, &[])?;

            if !keyframe.parameters().is_empty() {
                put(w, CHUNK_PARAMETERS, keyframe.parameters())?;
            }
            if let Some(thumbnail) = keyframe.thumbnail() {
                put(w, CHUNK_THUMBNAIL, thumbnail.as_bytes())?;
            }
            put(w, CHUNK_DURATION, &keyframe.duration().to_le_bytes())?;
            if keyframe.curve() != &default_curve {
                put(w, CHUNK_CURVE, &keyframe.curve().to_bytes())?;
            }

            put(w, CHUNK_KEYFRAME_END, &[])?;
            debug!("Saved keyframe {} ({}s)", index, keyframe.duration());
        }
        w.flush()?;

        stats.keyframes = store.len();
        info!(
            "Saved {} keyframes in {} chunks ({} bytes)",
            stats.keyframes, stats.chunks, stats.total_bytes
        );
        Ok(stats)
    }

    /// Replace the contents of `store` with the animation read from `r`.
    ///
    /// The signature is checked before `store` is touched. Malformed or
    /// misplaced fields and unknown chunks are skipped and reported. If reading
    /// fails partway, `store` keeps the keyframes completed so far.
    pub fn load_into<R: Read>(&self, store: &mut KeyframeStore, r: &mut R) -> Result<LoadReport> {
        read_signature(r, ANIMATION_SIGNATURE)?;
        store.clear();

        let mut report = LoadReport::default();
        let mut pending: Option<Keyframe> = None;

        while let Some(chunk) = Chunk::read_from(r, self.config.max_chunk_len)? {
            let record = Record::from(chunk);
            let tag = record.tag();

            match record {
                Record::KeyframeStart => {
                    if let Some(unfinished) = pending.take() {
                        skip(&mut report, tag, Some(store.len()), FieldError::UnterminatedKeyframe);
                        self.close_truncated(store, &mut report, unfinished);
                    }
                    pending = Some(store.new_keyframe());
                }
                Record::KeyframeEnd => match pending.take() {
                    Some(keyframe) => {
                        debug!("Loaded keyframe {} ({}s)", store.len(), keyframe.duration());
                        store.append(keyframe);
                        report.keyframes += 1;
                    }
                    None => skip(&mut report, tag, None, FieldError::NoOpenKeyframe { tag }),
                },
                Record::Unknown(chunk) => {
                    warn!(
                        "Skipping unknown chunk type {} ({} bytes)",
                        chunk.tag,
                        chunk.payload.len()
                    );
                    report.unknown.push(chunk.tag);
                }
                field => match pending.as_mut() {
                    Some(keyframe) => {
                        if let Err(error) = apply_field(keyframe, field) {
                            skip(&mut report, tag, Some(store.len()), error);
                        }
                    }
                    None => skip(&mut report, tag, None, FieldError::NoOpenKeyframe { tag }),
                },
            }
        }

        if let Some(unfinished) = pending {
            report.truncated = true;
            self.close_truncated(store, &mut report, unfinished);
        }

        info!(
            "Loaded {} keyframes ({} skipped fields, {} unknown chunks)",
            report.keyframes,
            report.skipped.len(),
            report.unknown.len()
        );
        Ok(report)
    }

    /// Read an animation into a new store.
    pub fn load<R: Read>(&self, r: &mut R) -> Result<(KeyframeStore, LoadReport)> {
        let mut store = KeyframeStore::new();
        let report = self.load_into(&mut store, r)?;
        Ok((store, report))
    }

    /// Save to `path` atomically: the file is written to a temporary sibling
    /// and only renamed into place once complete.
    ///
    /// A new file gets the same mode as a plain create; an overwritten file
    /// keeps the permissions it had.
    pub fn save_file<P: AsRef<Path>>(&self, store: &KeyframeStore, path: P) -> Result<SaveStats> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut temp = builder.tempfile_in(dir)?;
        let stats = {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.save(store, &mut writer)?
        };
        if let Ok(existing) = fs::metadata(path) {
            temp.as_file().set_permissions(existing.permissions())?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        Ok(stats)
    }

    /// Load the animation at `path` into `store`.
    pub fn load_file<P: AsRef<Path>>(&self, store: &mut KeyframeStore, path: P) -> Result<LoadReport> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.load_into(store, &mut reader)
    }

    /// Handle a keyframe whose end marker never arrived.
    fn close_truncated(&self, store: &mut KeyframeStore, report: &mut LoadReport, keyframe: Keyframe) {
        match self.config.truncated_keyframe {
            TruncatedKeyframePolicy::Keep => {
                warn!("Keyframe {} has no end marker, keeping it", store.len());
                store.append(keyframe);
                report.keyframes += 1;
            }
            TruncatedKeyframePolicy::Discard => {
                warn!("Keyframe {} has no end marker, discarding it", store.len());
            }
        }
    }
}

fn skip(report: &mut LoadReport, tag: ChunkTag, keyframe: Option<usize>, error: FieldError) {
    warn!("Skipping {} chunk: {}", tag, error);
    report.skipped.push(SkippedField {
        tag,
        keyframe,
        error,
    });
}

/// Apply one field record to the keyframe under construction.
fn apply_field(keyframe: &mut Keyframe, record: Record) -> std::result::Result<(), FieldError> {
    match record {
        Record::Parameters(data) => keyframe.set_parameters(data),
        Record::Thumbnail(data) => keyframe.set_thumbnail(Some(Thumbnail::new(data))),
        Record::Curve(data) => keyframe.set_curve(Spline::from_bytes(&data)?),
        Record::Duration(data) => {
            let bytes: [u8; 8] = data
                .as_slice()
                .try_into()
                .map_err(|_| FieldError::DurationSize { length: data.len() })?;
            let duration = f64::from_le_bytes(bytes);
            keyframe
                .set_duration(duration)
                .map_err(|_| FieldError::InvalidDuration(duration))?;
        }
        // Structural records are handled by the caller
        Record::KeyframeStart | Record::KeyframeEnd | Record::Unknown(_) => {}
    }
    Ok(())
}
