//! Format version numbers.
//!
//! Payload versions are `major.minor.patch` strings, parsed with `winnow`.
//! A bare `major.minor` (as some early exports wrote) reads as patch 0.

use std::fmt;
use std::str::FromStr;
use winnow::ascii::digit1;
use winnow::combinator::{opt, preceded};
use winnow::prelude::*;

/// The version [`crate::export`] writes and import migrates up to.
pub const CURRENT_VERSION: Version = Version::new(2, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        let rest = &mut rest;
        let version = parse_version
            .parse_next(rest)
            .map_err(|e| format!("invalid version `{s}`: {e}"))?;
        if !rest.is_empty() {
            return Err(format!("invalid version `{s}`: trailing `{rest}`"));
        }
        Ok(version)
    }
}

fn parse_number(input: &mut &str) -> ModalResult<u32> {
    digit1.parse_to().parse_next(input)
}

fn parse_version(input: &mut &str) -> ModalResult<Version> {
    let _ = opt('v').parse_next(input)?;
    let major = parse_number.parse_next(input)?;
    let minor = preceded('.', parse_number).parse_next(input)?;
    let patch = opt(preceded('.', parse_number)).parse_next(input)?;
    Ok(Version::new(major, minor, patch.unwrap_or(0)))
}
