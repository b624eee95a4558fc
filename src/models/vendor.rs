use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AppError;

/// The three programmer vendors whose device databases are searched.
///
/// Declaration order is the priority order searches run in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    SystemGeneral,
    DataIo,
    BpMicro,
}

impl Vendor {
    pub const ALL: [Vendor; 3] = [Vendor::SystemGeneral, Vendor::DataIo, Vendor::BpMicro];

    /// Canonical lowercase id used on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Vendor::SystemGeneral => "systemgeneral",
            Vendor::DataIo => "dataio",
            Vendor::BpMicro => "bpmicro",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Vendor::SystemGeneral => "System General",
            Vendor::DataIo => "DataIO",
            Vendor::BpMicro => "BPMicro",
        }
    }

    /// Parses a list of vendor ids into a deduplicated set in priority order.
    pub fn parse_selection<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Vendor>, AppError> {
        let mut selected = ids
            .iter()
            .map(|id| id.as_ref().parse::<Vendor>())
            .collect::<Result<Vec<_>, _>>()?;
        selected.sort();
        selected.dedup();
        Ok(selected)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Vendor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "systemgeneral" => Ok(Vendor::SystemGeneral),
            "dataio" => Ok(Vendor::DataIo),
            "bpmicro" => Ok(Vendor::BpMicro),
            _ => Err(AppError::UnknownVendor(s.to_string())),
        }
    }
}
