// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging destinations (sink selection bitset)

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A single sink, as named in configuration files
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Local log file
    File = 1 << 0,
    /// System debug channel (syslog)
    SystemDebug = 1 << 1,
    /// Standard error stream
    Stderr = 1 << 2,
}

impl Destination {
    /// All destinations, in sink lock order
    pub const ALL: [Destination; 3] = [
        Destination::File,
        Destination::SystemDebug,
        Destination::Stderr,
    ];

    #[inline]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Position of this destination in `Destination::ALL`
    pub const fn index(self) -> usize {
        match self {
            Destination::File => 0,
            Destination::SystemDebug => 1,
            Destination::Stderr => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Destination::File => "file",
            Destination::SystemDebug => "system_debug",
            Destination::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitset over destinations. `NONE` is the empty set.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationMask(u32);

impl DestinationMask {
    pub const NONE: DestinationMask = DestinationMask(0);
    pub const FILE: DestinationMask = DestinationMask(Destination::File.bit());
    pub const SYSTEM_DEBUG: DestinationMask = DestinationMask(Destination::SystemDebug.bit());
    pub const STDERR: DestinationMask = DestinationMask(Destination::Stderr.bit());
    pub const ALL: DestinationMask =
        DestinationMask(Self::FILE.0 | Self::SYSTEM_DEBUG.0 | Self::STDERR.0);
    /// Syslog plus stderr, the routing of `LoggingSettings::default()`
    pub const DEFAULT: DestinationMask = DestinationMask(Self::SYSTEM_DEBUG.0 | Self::STDERR.0);

    /// Build from raw bits, dropping unknown bits
    pub const fn from_bits_truncate(bits: u32) -> Self {
        DestinationMask(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, dest: Destination) -> bool {
        self.0 & dest.bit() != 0
    }

    /// Mask without the given destination
    #[inline]
    pub const fn without(self, dest: Destination) -> Self {
        DestinationMask(self.0 & !dest.bit())
    }

    #[inline]
    pub const fn with(self, dest: Destination) -> Self {
        DestinationMask(self.0 | dest.bit())
    }

    /// Number of destinations in the set
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Destinations in the set, in lock order
    pub fn iter(self) -> impl Iterator<Item = Destination> {
        Destination::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl From<Destination> for DestinationMask {
    fn from(dest: Destination) -> Self {
        DestinationMask(dest.bit())
    }
}

impl FromIterator<Destination> for DestinationMask {
    fn from_iter<I: IntoIterator<Item = Destination>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DestinationMask::NONE, |mask, dest| mask.with(dest))
    }
}

impl BitOr for DestinationMask {
    type Output = DestinationMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        DestinationMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for DestinationMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DestinationMask {
    type Output = DestinationMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        DestinationMask(self.0 & rhs.0)
    }
}

impl std::fmt::Display for DestinationMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        for (i, dest) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(dest.as_str())?;
        }
        Ok(())
    }
}
