//! Packed engine version handling
//!
//! The engine version travels as a single integer: 64-bit in the extended
//! LSF header generations (major:7 bits @55, minor:8 @47, revision:16 @31,
//! build:31 @0), 32-bit in the legacy layout (4/4/8/16 bits).

/// Engine version unpacked into its four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
    pub build: u32,
}

impl PackedVersion {
    #[must_use]
    pub fn new(major: u32, minor: u32, revision: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            revision,
            build,
        }
    }

    #[must_use]
    pub fn from_version64(packed: u64) -> Self {
        Self {
            major: ((packed >> 55) & 0x7F) as u32,
            minor: ((packed >> 47) & 0xFF) as u32,
            revision: ((packed >> 31) & 0xFFFF) as u32,
            build: (packed & 0x7FFF_FFFF) as u32,
        }
    }

    #[must_use]
    pub fn to_version64(self) -> u64 {
        (u64::from(self.major) & 0x7F) << 55
            | (u64::from(self.minor) & 0xFF) << 47
            | (u64::from(self.revision) & 0xFFFF) << 31
            | (u64::from(self.build) & 0x7FFF_FFFF)
    }

    #[must_use]
    pub fn from_version32(packed: u32) -> Self {
        Self {
            major: (packed >> 28) & 0x0F,
            minor: (packed >> 24) & 0x0F,
            revision: (packed >> 16) & 0xFF,
            build: packed & 0xFFFF,
        }
    }

    #[must_use]
    pub fn to_version32(self) -> u32 {
        (self.major & 0x0F) << 28
            | (self.minor & 0x0F) << 24
            | (self.revision & 0xFF) << 16
            | (self.build & 0xFFFF)
    }
}

impl std::fmt::Display for PackedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.revision, self.build
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version64_round_trip() {
        let v = PackedVersion::new(4, 0, 9, 330);
        assert_eq!(PackedVersion::from_version64(v.to_version64()), v);
    }

    #[test]
    fn version64_field_placement() {
        let v = PackedVersion::new(4, 0, 0, 0);
        assert_eq!(v.to_version64(), 4u64 << 55);
    }

    #[test]
    fn version32_round_trip() {
        let v = PackedVersion::new(3, 6, 4, 1000);
        assert_eq!(PackedVersion::from_version32(v.to_version32()), v);
    }
}
