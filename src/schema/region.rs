// src/schema/region.rs

use serde::{Deserialize, Serialize};

/// Surveillance regions in the publisher's canonical column order.
///
/// The derived `Ord` follows declaration order, so sorting by `Region`
/// sorts Canada first and the Territories last.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Region {
    #[default]
    #[serde(rename = "Can")]
    Can,
    #[serde(rename = "Atl")]
    Atl,
    #[serde(rename = "QC")]
    Qc,
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "Pr")]
    Pr,
    #[serde(rename = "BC")]
    Bc,
    #[serde(rename = "Terr")]
    Terr,
}

impl Region {
    /// Canonical ordering. Wide tables list their region column blocks in
    /// exactly this order.
    pub const ALL: [Region; 7] = [
        Region::Can,
        Region::Atl,
        Region::Qc,
        Region::On,
        Region::Pr,
        Region::Bc,
        Region::Terr,
    ];

    /// Short code as it appears in source column labels (`ON Tests`).
    pub fn code(self) -> &'static str {
        match self {
            Region::Can => "Can",
            Region::Atl => "Atl",
            Region::Qc => "QC",
            Region::On => "ON",
            Region::Pr => "Pr",
            Region::Bc => "BC",
            Region::Terr => "Terr",
        }
    }

    /// Region selector label.
    pub fn display_name(self) -> &'static str {
        match self {
            Region::Can => "All Canada",
            Region::Atl => "Atlantic",
            Region::Qc => "Quebec",
            Region::On => "Ontario",
            Region::Pr => "Prairies",
            Region::Bc => "British Columbia",
            Region::Terr => "Territories",
        }
    }

    /// Position in [`Region::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive lookup by source code.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Which regions a wide table carries column blocks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionCoverage {
    All,
    /// Every region except the Territories, which some tables omit.
    ExcludingTerritories,
}

impl RegionCoverage {
    pub fn regions(self) -> &'static [Region] {
        match self {
            RegionCoverage::All => &Region::ALL,
            RegionCoverage::ExcludingTerritories => &Region::ALL[..Region::ALL.len() - 1],
        }
    }

    /// Coverage implied by the number of region column blocks in a table.
    pub fn from_block_count(blocks: usize) -> Option<Self> {
        match blocks {
            7 => Some(RegionCoverage::All),
            6 => Some(RegionCoverage::ExcludingTerritories),
            _ => None,
        }
    }
}
