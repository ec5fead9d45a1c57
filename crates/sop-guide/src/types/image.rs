//! Medical image kinds and their per-kind texts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::generation::templates as t;

/// What the user says an uploaded image shows
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// Laboratory results
    Lab,
    /// Menstrual cycle chart
    Cycle,
    /// Ultrasound scan
    Ultrasound,
    /// Anything else
    #[default]
    General,
}

impl ImageKind {
    pub const ALL: [ImageKind; 4] = [Self::Lab, Self::Cycle, Self::Ultrasound, Self::General];

    /// Machine name used on the wire and in the terminal chat
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lab => "lab",
            Self::Cycle => "cycle",
            Self::Ultrasound => "ultrasound",
            Self::General => "general",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lab => "🧪 Resultados de Laboratorio",
            Self::Cycle => "📅 Gráfica de Ciclos",
            Self::Ultrasound => "🔬 Ecografía",
            Self::General => "❓ Análisis General",
        }
    }

    /// Analysis instructions sent along with the image
    pub fn template(&self) -> &'static str {
        match self {
            Self::Lab => t::LAB_TEMPLATE,
            Self::Cycle => t::CYCLE_TEMPLATE,
            Self::Ultrasound => t::ULTRASOUND_TEMPLATE,
            Self::General => t::GENERAL_TEMPLATE,
        }
    }

    /// Message shown when the model refuses the image on safety grounds
    pub fn safety_message(&self) -> &'static str {
        match self {
            Self::Lab => t::LAB_SAFETY_MESSAGE,
            Self::Cycle => t::CYCLE_SAFETY_MESSAGE,
            Self::Ultrasound => t::ULTRASOUND_SAFETY_MESSAGE,
            Self::General => t::GENERAL_SAFETY_MESSAGE,
        }
    }

    /// Questions the user can bring to their doctor
    pub fn doctor_questions(&self) -> &'static [&'static str] {
        match self {
            Self::Lab => t::LAB_QUESTIONS,
            Self::Cycle => t::CYCLE_QUESTIONS,
            Self::Ultrasound => t::ULTRASOUND_QUESTIONS,
            Self::General => t::GENERAL_QUESTIONS,
        }
    }

    pub fn doctor_tip(&self) -> &'static str {
        match self {
            Self::Lab => t::LAB_TIP,
            Self::Cycle => t::CYCLE_TIP,
            Self::Ultrasound => t::ULTRASOUND_TIP,
            Self::General => t::GENERAL_TIP,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lab" | "laboratorio" => Ok(Self::Lab),
            "cycle" | "ciclo" | "ciclos" => Ok(Self::Cycle),
            "ultrasound" | "ecografia" | "ecografía" => Ok(Self::Ultrasound),
            "general" | "" => Ok(Self::General),
            other => Err(Error::BadRequest(format!(
                "Unknown image kind '{}'; expected one of lab, cycle, ultrasound, general",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("lab".parse::<ImageKind>().unwrap(), ImageKind::Lab);
        assert_eq!("Ecografía".parse::<ImageKind>().unwrap(), ImageKind::Ultrasound);
        assert_eq!("".parse::<ImageKind>().unwrap(), ImageKind::General);
        assert!("xray".parse::<ImageKind>().is_err());
    }

    #[test]
    fn test_each_kind_has_own_template() {
        for kind in ImageKind::ALL {
            assert_eq!(kind.as_str().parse::<ImageKind>().unwrap(), kind);
            assert!(!kind.doctor_questions().is_empty());
        }
        assert!(ImageKind::Lab.template().contains("LABORATORIO"));
        assert!(ImageKind::Cycle.template().contains("GRÁFICA DE CICLOS"));
        assert!(ImageKind::Ultrasound.template().contains("ECOGRAFÍA"));
        assert!(ImageKind::General.template().contains("imagen médica"));
    }
}
