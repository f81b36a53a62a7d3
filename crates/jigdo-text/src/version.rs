use crate::error::TextError;

/// Highest `.jigdo` format major version this implementation understands
/// (spec.md §4.6 "Version gating"). Files declaring a newer major version
/// are rejected rather than silently misread, since the format allows
/// incompatible changes between major versions.
pub const SUPPORTED_MAJOR: u32 = 1;

/// A parsed `major.minor` format version, as found in `[Jigdo] Version=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    /// Major version; bumped for incompatible format changes.
    pub major: u32,
    /// Minor version; bumped for backwards-compatible additions.
    pub minor: u32,
}

impl Version {
    /// Parse a `major.minor` string.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        let s = s.trim();
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| TextError::InvalidVersion(s.to_string()))?;
        let major: u32 = major
            .parse()
            .map_err(|_| TextError::InvalidVersion(s.to_string()))?;
        let minor: u32 = minor
            .parse()
            .map_err(|_| TextError::InvalidVersion(s.to_string()))?;
        Ok(Self { major, minor })
    }

    /// Whether this implementation can read a file declaring this
    /// version (its major version is no newer than [`SUPPORTED_MAJOR`]).
    pub fn is_supported(&self) -> bool {
        self.major <= SUPPORTED_MAJOR
    }

    /// Check compatibility, returning a descriptive error if not.
    pub fn require_supported(&self) -> Result<(), TextError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(TextError::UnsupportedVersion {
                found: format!("{}.{}", self.major, self.minor),
                supported: SUPPORTED_MAJOR,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_major_minor() {
        let v = Version::parse("1.1").unwrap();
        assert_eq!(v, Version { major: 1, minor: 1 });
    }

    #[test]
    fn rejects_garbage() {
        assert!(Version::parse("one.one").is_err());
        assert!(Version::parse("1").is_err());
    }

    #[test]
    fn gates_future_major_versions() {
        let v = Version::parse("2.0").unwrap();
        assert!(!v.is_supported());
        assert!(v.require_supported().is_err());

        let v = Version::parse("1.9").unwrap();
        assert!(v.is_supported());
        assert!(v.require_supported().is_ok());
    }
}
