//! Coordinate reference system handles and SRS-name resolution.
//!
//! Layer configurations carry an SRS name such as `EPSG:3067`. Resolution
//! of that name into a usable [`Crs`] handle is a collaborator concern
//! behind the [`CrsResolver`] trait; the built-in [`EpsgCrsResolver`]
//! understands the common `authority:code`, bare-numeric and OGC URN forms.
//!
//! Resolution failure is a soft condition throughout the pipeline: it is
//! logged and the layer simply ends up without a CRS handle.

use std::fmt;
use thiserror::Error;

/// Resolved coordinate reference system handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs {
    authority: String,
    code: u32,
}

impl Crs {
    /// Create a handle for the given authority and numeric code.
    pub fn new(authority: impl Into<String>, code: u32) -> Self {
        Self {
            authority: authority.into(),
            code,
        }
    }

    /// Create an EPSG handle, e.g. `Crs::epsg(4326)`.
    pub fn epsg(code: u32) -> Self {
        Self::new("EPSG", code)
    }

    /// Authority namespace, e.g. `"EPSG"`.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Numeric code within the authority namespace.
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Canonical SRS name, e.g. `"EPSG:3067"`.
    pub fn srs_name(&self) -> String {
        format!("{}:{}", self.authority, self.code)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// CRS resolution errors.
#[derive(Debug, Error)]
pub enum CrsError {
    /// The SRS name was empty or whitespace.
    #[error("empty SRS name")]
    Empty,
    /// The SRS name did not end in a numeric code.
    #[error("unparseable SRS name '{0}'")]
    Unparseable(String),
}

/// Resolves an SRS name into a [`Crs`] handle.
pub trait CrsResolver: Send + Sync {
    /// Resolve the given SRS name. May fail; callers treat failure as
    /// "layer has no CRS" rather than aborting.
    fn resolve(&self, srs_name: &str) -> Result<Crs, CrsError>;
}

/// Resolver for authority-code SRS names.
///
/// Accepted forms:
/// - `EPSG:3067` (any alphabetic authority)
/// - `3067` (bare code, EPSG assumed)
/// - `urn:ogc:def:crs:EPSG:6.3:3067` (OGC URN, version segment ignored)
#[derive(Debug, Clone, Default)]
pub struct EpsgCrsResolver;

impl CrsResolver for EpsgCrsResolver {
    fn resolve(&self, srs_name: &str) -> Result<Crs, CrsError> {
        let srs = srs_name.trim();
        if srs.is_empty() {
            return Err(CrsError::Empty);
        }

        // Bare numeric code defaults to EPSG.
        if let Ok(code) = srs.parse::<u32>() {
            return Ok(Crs::epsg(code));
        }

        let segments: Vec<&str> = srs.split(':').collect();
        let code = segments
            .last()
            .and_then(|last| last.parse::<u32>().ok())
            .ok_or_else(|| CrsError::Unparseable(srs.to_string()))?;

        // The authority is the last purely-alphabetic segment before the
        // code; URN forms carry a version segment in between.
        let authority = segments
            .iter()
            .rev()
            .skip(1)
            .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphabetic()))
            .map(|segment| segment.to_ascii_uppercase())
            .ok_or_else(|| CrsError::Unparseable(srs.to_string()))?;

        Ok(Crs::new(authority, code))
    }
}
