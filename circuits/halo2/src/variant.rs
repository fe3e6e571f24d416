//! Circuit variants
//!
//! Each variant fixes its private witness shape, the sub-checks that feed the
//! aggregated `valid` output, and (in the prover service) its own proving and
//! verification keys. Variants never share keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CircuitError;

/// Which eligibility relation a proof attests to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitVariant {
    /// age >= 18, country risk <= 2, nullifier and commitment bound
    FullPersonhood,
    /// age >= 18 only
    AgeOnly,
    /// country risk <= 2 only
    CountryRiskOnly,
    /// Biometric and device hashes present (non-zero)
    AntiSybilOnly,
}

/// Strength of what `valid = 1` means for a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssuranceLevel {
    /// Attribute predicates were checked against committed values
    Predicate,
    /// Only presence of identity material was checked; any non-zero value passes
    PresenceOnly,
}

impl CircuitVariant {
    pub const ALL: [CircuitVariant; 4] = [
        CircuitVariant::FullPersonhood,
        CircuitVariant::AgeOnly,
        CircuitVariant::CountryRiskOnly,
        CircuitVariant::AntiSybilOnly,
    ];

    /// Stable identifier used in payloads and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitVariant::FullPersonhood => "full-personhood",
            CircuitVariant::AgeOnly => "age-only",
            CircuitVariant::CountryRiskOnly => "country-risk-only",
            CircuitVariant::AntiSybilOnly => "anti-sybil-only",
        }
    }

    /// Number of boolean sub-checks summed into `valid`
    pub fn check_count(&self) -> u64 {
        match self {
            CircuitVariant::FullPersonhood => 4,
            CircuitVariant::AgeOnly => 3,
            CircuitVariant::CountryRiskOnly => 3,
            CircuitVariant::AntiSybilOnly => 4,
        }
    }

    /// Names of the sub-checks, in circuit order
    pub fn checks(&self) -> &'static [&'static str] {
        match self {
            CircuitVariant::FullPersonhood => &["age", "country_risk", "nullifier", "commitment"],
            CircuitVariant::AgeOnly => &["age", "nullifier", "commitment"],
            CircuitVariant::CountryRiskOnly => &["country_risk", "nullifier", "commitment"],
            CircuitVariant::AntiSybilOnly => {
                &["biometric_present", "device_present", "nullifier", "commitment"]
            }
        }
    }

    /// Names of the private witness values
    pub fn private_inputs(&self) -> &'static [&'static str] {
        match self {
            CircuitVariant::FullPersonhood => {
                &["age", "country_risk", "unique_id_salt", "secret_key"]
            }
            CircuitVariant::AgeOnly => &["age", "unique_id_salt", "secret_key"],
            CircuitVariant::CountryRiskOnly => &["country_risk", "unique_id_salt", "secret_key"],
            CircuitVariant::AntiSybilOnly => {
                &["biometric_hash", "device_hash", "unique_id_salt", "secret_key"]
            }
        }
    }

    pub fn assurance(&self) -> AssuranceLevel {
        match self {
            CircuitVariant::AntiSybilOnly => AssuranceLevel::PresenceOnly,
            _ => AssuranceLevel::Predicate,
        }
    }
}

impl fmt::Display for CircuitVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitVariant {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CircuitVariant::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| CircuitError::UnknownVariant { name: s.to_string() })
    }
}
