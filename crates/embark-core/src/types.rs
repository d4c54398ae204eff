//! Type definitions shared by the flag derivation and the server.
//!
//! `FlagSource` is the flattened view of a firmware analysis record that the
//! emba command line is derived from. `AnalysisStatus` is the status blob the
//! running scan writes back while it progresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Target architecture of a Linux firmware, passed to emba with `-a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "MIPS")]
    Mips,
    #[serde(rename = "MIPS64R2")]
    Mips64R2,
    #[serde(rename = "MIPS64_III")]
    Mips64III,
    #[serde(rename = "MIPS64_N32")]
    Mips64N32,
    #[serde(rename = "ARM")]
    Arm,
    #[serde(rename = "ARM64")]
    Arm64,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x64")]
    X64,
    #[serde(rename = "PPC")]
    Ppc,
    #[serde(rename = "PPC64")]
    Ppc64,
    #[serde(rename = "NIOS2")]
    Nios2,
    #[serde(rename = "RISCV")]
    RiscV,
    #[serde(rename = "QCOM_DSP6")]
    QcomDsp6,
}

impl Architecture {
    pub const ALL: [Architecture; 13] = [
        Architecture::Mips,
        Architecture::Mips64R2,
        Architecture::Mips64III,
        Architecture::Mips64N32,
        Architecture::Arm,
        Architecture::Arm64,
        Architecture::X86,
        Architecture::X64,
        Architecture::Ppc,
        Architecture::Ppc64,
        Architecture::Nios2,
        Architecture::RiscV,
        Architecture::QcomDsp6,
    ];

    /// The identifier emba expects after `-a`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Mips => "MIPS",
            Architecture::Mips64R2 => "MIPS64R2",
            Architecture::Mips64III => "MIPS64_III",
            Architecture::Mips64N32 => "MIPS64_N32",
            Architecture::Arm => "ARM",
            Architecture::Arm64 => "ARM64",
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Ppc => "PPC",
            Architecture::Ppc64 => "PPC64",
            Architecture::Nios2 => "NIOS2",
            Architecture::RiscV => "RISCV",
            Architecture::QcomDsp6 => "QCOM_DSP6",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .iter()
            .copied()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| format!("Unknown architecture: '{}'", s))
    }
}

/// A device linked to an analysis, reduced to what the command line needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTag {
    pub name: String,
    /// Vendor name; devices without a vendor contribute an empty entry.
    #[serde(default)]
    pub vendor: Option<String>,
}

impl DeviceTag {
    pub fn new(name: impl Into<String>, vendor: Option<String>) -> Self {
        Self {
            name: name.into(),
            vendor,
        }
    }
}

/// Inputs of the emba flag derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagSource {
    /// Id of the analysis, embedded into the notes flag.
    pub analysis_id: Uuid,
    pub version: String,
    pub notes: String,
    pub devices: Vec<DeviceTag>,
    pub architecture: Option<Architecture>,
    pub user_emulation_test: bool,
    pub system_emulation_test: bool,
    pub scan_modules: Vec<String>,
}

/// Progress blob written by the running scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisStatus {
    pub percentage: f64,
    pub analysis: String,
    pub firmware_name: String,
    pub last_update: String,
    pub last_module: String,
    pub module_list: Vec<String>,
    pub last_phase: String,
    pub phase_list: Vec<String>,
    pub finished: bool,
    pub work: bool,
}

impl Default for AnalysisStatus {
    fn default() -> Self {
        Self {
            percentage: 0.0,
            analysis: String::new(),
            firmware_name: String::new(),
            last_update: String::new(),
            last_module: String::new(),
            module_list: Vec::new(),
            last_phase: String::new(),
            phase_list: Vec::new(),
            finished: false,
            work: false,
        }
    }
}

impl AnalysisStatus {
    /// Starting blob for a freshly submitted analysis.
    pub fn for_submission(analysis_id: Uuid, firmware_name: &str) -> Self {
        Self {
            analysis: analysis_id.to_string(),
            firmware_name: firmware_name.to_string(),
            ..Self::default()
        }
    }
}
