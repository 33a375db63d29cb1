// src/schema/virus.rs

use serde::{Deserialize, Serialize};

/// Pathogen codes as encoded by the publisher.
///
/// `Influenza` is the combined influenza count. It only feeds the A/B split
/// and has no display name of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Virus {
    SarsCov2,
    Influenza,
    FluA,
    FluB,
    Rsv,
    Hpiv,
    Adv,
    Hmpv,
    EvRv,
    Hcov,
}

impl Virus {
    pub const ALL: [Virus; 10] = [
        Virus::SarsCov2,
        Virus::Influenza,
        Virus::FluA,
        Virus::FluB,
        Virus::Rsv,
        Virus::Hpiv,
        Virus::Adv,
        Virus::Hmpv,
        Virus::EvRv,
        Virus::Hcov,
    ];

    /// Code used inside source column labels, e.g. the `RSV` in `RSV%.3`
    /// or the `A` in `ON A%`.
    pub fn code(self) -> &'static str {
        match self {
            Virus::SarsCov2 => "SARS-CoV-2",
            Virus::Influenza => "Flu",
            Virus::FluA => "A",
            Virus::FluB => "B",
            Virus::Rsv => "RSV",
            Virus::Hpiv => "HPIV",
            Virus::Adv => "ADV",
            Virus::Hmpv => "HMPV",
            Virus::EvRv => "EV/RV",
            Virus::Hcov => "HCoV",
        }
    }

    /// Canonical display name, or `None` for codes that never reach output.
    pub fn display_name(self) -> Option<&'static str> {
        Some(match self {
            Virus::SarsCov2 => "Severe acute respiratory syndrome coronavirus 2 (SARS-CoV-2)",
            Virus::Influenza => return None,
            Virus::FluA => "Influenza A",
            Virus::FluB => "Influenza B",
            Virus::Rsv => "Respiratory Syncytial Virus (RSV)",
            Virus::Hpiv => "Human Parainfluenza Virus (HPIV)",
            Virus::Adv => "Adenovirus (ADV)",
            Virus::Hmpv => "Human Metapneumovirus (HMPV)",
            Virus::EvRv => "Enterovirus/Rhinovirus (EV/RV)",
            Virus::Hcov => "Human Coronavirus (HCoV)",
        })
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|v| v.code() == code)
    }

    /// Reverse lookup used by the presentation side.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.display_name() == Some(name))
    }

    /// Influenza subtypes, in the order their positivity columns alternate.
    pub const FLU_SUBTYPES: [Virus; 2] = [Virus::FluA, Virus::FluB];
}

impl std::fmt::Display for Virus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
