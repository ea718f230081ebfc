//! The cast-list build pipeline — entries in, player records out.
//!
//! For every entry the builder runs resolve → (crop) → (resize), each stage
//! gated by the entry's flags, and maps the remaining fields straight
//! through. Entry processing is a pure function of
//! `(entry, base_dir, default_image)`: no state is shared between entries,
//! so processing is order-preserving and trivially parallelizable later
//! even though it runs sequentially.
//!
//! ## Failure policy
//!
//! A crop or resize failure for one entry does not abort the run: the
//! builder logs it and keeps the entry's pre-stage bytes, because a single
//! corrupted photo should not prevent generating cards for the rest of the
//! cast. Callers that prefer an abort opt in with
//! [`BuildOptions::fail_fast`].

use crate::castlist::CastEntry;
use crate::portrait::{MAX_PORTRAIT_EDGE, PortraitError, SubjectDetector, crop_to_subject, shrink_to_bounds};
use crate::resolve::{DEFAULT_FETCH_TIMEOUT, resolve_image};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// The bundled default portrait, embedded at compile time and shared
/// read-only by every build.
pub static DEFAULT_PORTRAIT: &[u8] = include_bytes!("../assets/default-portrait.png");

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("portrait processing failed for '{name}': {source}")]
    Portrait {
        name: String,
        #[source]
        source: PortraitError,
    },
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Longer-edge cap applied when an entry requests resizing.
    pub max_edge: u32,
    /// Timeout for remote image fetches.
    pub fetch_timeout: Duration,
    /// Abort the whole build on the first crop/resize failure instead of
    /// keeping the entry's pre-stage bytes.
    pub fail_fast: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_edge: MAX_PORTRAIT_EDGE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fail_fast: false,
        }
    }
}

/// Final per-member record, ready for serialization.
///
/// `compressed`, `scaled` and `version` are fixed constants required by the
/// player-list schema; `image` is never empty (default-portrait fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub name: String,
    pub role_name: String,
    pub comments: String,
    pub channel: String,
    pub image: Vec<u8>,
    pub compressed: bool,
    pub scaled: bool,
    pub version: u32,
}

impl PlayerRecord {
    /// Schema version tag expected by downstream tooling.
    pub const VERSION: u32 = 1;
}

/// Runs the per-entry pipeline with injected collaborators: the subject
/// detector and the default-portrait bytes.
pub struct CastlistBuilder<'a> {
    detector: &'a dyn SubjectDetector,
    default_image: &'a [u8],
    options: BuildOptions,
}

impl<'a> CastlistBuilder<'a> {
    pub fn new(detector: &'a dyn SubjectDetector, options: BuildOptions) -> Self {
        Self {
            detector,
            default_image: DEFAULT_PORTRAIT,
            options,
        }
    }

    /// Swap the bundled default portrait for caller-supplied bytes.
    pub fn with_default_image(mut self, default_image: &'a [u8]) -> Self {
        self.default_image = default_image;
        self
    }

    /// Build one record per entry, same order as the input.
    pub fn build(
        &self,
        entries: &[CastEntry],
        base_dir: &Path,
    ) -> Result<Vec<PlayerRecord>, BuildError> {
        entries
            .iter()
            .map(|entry| self.build_entry(entry, base_dir))
            .collect()
    }

    fn build_entry(&self, entry: &CastEntry, base_dir: &Path) -> Result<PlayerRecord, BuildError> {
        let who = display_name(entry);
        let mut image = resolve_image(
            entry.image.as_deref(),
            base_dir,
            self.default_image,
            self.options.fetch_timeout,
        );

        if entry.crop {
            match crop_to_subject(self.detector, &image) {
                Ok(cropped) => image = cropped,
                Err(source) if self.options.fail_fast => {
                    return Err(BuildError::Portrait {
                        name: who.to_string(),
                        source,
                    });
                }
                Err(err) => {
                    warn!("subject crop failed for '{}', keeping uncropped image: {}", who, err);
                }
            }
        }

        if entry.resize {
            match shrink_to_bounds(&image, self.options.max_edge) {
                Ok(resized) => image = resized,
                Err(source) if self.options.fail_fast => {
                    return Err(BuildError::Portrait {
                        name: who.to_string(),
                        source,
                    });
                }
                Err(err) => {
                    warn!("resize failed for '{}', keeping unresized image: {}", who, err);
                }
            }
        }

        Ok(PlayerRecord {
            name: entry.real_name.clone(),
            role_name: entry.character.clone(),
            comments: entry.comments.clone(),
            channel: entry.channel.clone(),
            image,
            compressed: false,
            scaled: false,
            version: PlayerRecord::VERSION,
        })
    }
}

/// Whichever name field is non-empty, role name first — used only for
/// diagnostics.
fn display_name(entry: &CastEntry) -> &str {
    if entry.character.is_empty() {
        &entry.real_name
    } else {
        &entry.character
    }
}
