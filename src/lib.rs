//! # cast-cards
//!
//! Turns a tabular cast list into the two artifacts a sound department
//! actually wants on tech day: a WaveTool-style player list (`.pla`, a
//! plist record collection with embedded portraits) and a printable PDF of
//! mic cards, one page per cast member.
//!
//! # Architecture: Per-Entry Pipeline
//!
//! The core is a build pipeline that runs once per cast member:
//!
//! ```text
//! CSV rows ── castlist ──► CastEntry
//!                             │
//!                   resolve ──► raw bytes (default portrait on any failure)
//!                   crop?   ──► padded box around the detected subject
//!                   resize? ──► longer edge bounded to 512 px
//!                             │
//!                         PlayerRecord ──► players (.pla)
//!                                      └─► cards   (.pdf)
//! ```
//!
//! Each entry's pipeline is an independent value flow — no state is shared
//! between entries — and both serializers consume the same record set.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`castlist`] | Row normalization: header-addressed rows (CSV) → typed entries |
//! | [`resolve`] | Image reference resolution with default-portrait fallback |
//! | [`portrait`] | Subject detection, crop geometry, crop/resize operations |
//! | [`pipeline`] | The builder orchestrating resolve → crop → resize per entry |
//! | [`players`] | Record serializer: plist player list |
//! | [`cards`] | Card renderer: paginated PDF via lopdf |
//!
//! # Design Decisions
//!
//! ## Fail-Soft by Default
//!
//! A cast list with one broken photo link still produces a complete player
//! list and a complete card set: resolution failures fall back to the
//! bundled default portrait, crop/resize failures keep the pre-stage
//! bytes. Aborting on the first failure is an explicit opt-in
//! ([`pipeline::BuildOptions::fail_fast`]), never an accident of control
//! flow.
//!
//! ## Detection Behind a Trait
//!
//! The cropper never talks to a face detector directly — it sees
//! [`portrait::SubjectDetector`], which returns zero-or-more regions over
//! a decoded raster. The production implementation is rustface (SeetaFace,
//! pure Rust, model file supplied at runtime); tests use stub detectors
//! with known boxes, and a missing model degrades to the "no crop
//! possible" path instead of an error.
//!
//! ## Sequential by Construction
//!
//! Entry processing is strictly sequential and order-preserving. Because
//! each entry is a pure function of `(entry, base_dir, default_image)`,
//! parallelizing later is a mechanical change, not a redesign.

pub mod cards;
pub mod castlist;
pub mod pipeline;
pub mod players;
pub mod portrait;
pub mod resolve;
