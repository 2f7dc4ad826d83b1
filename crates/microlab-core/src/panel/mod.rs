//! Conditional panel resolution.
//!
//! Two pivots decide which fields of an exam are active:
//!
//! ```text
//! sample type ──► panel-specific shape   (URINE → CLED colony count,
//!                                          SPUTUM → Ziehl-Neelsen smear)
//! stain result ──► biochemistry vocabulary (POSITIVE → catalase/coagulase/novobiocin,
//!                                          NEGATIVE → MacConkey/EPM/MILI/citrate)
//! ```
//!
//! Both resolvers are pure and total. Anything they do not recognize degrades
//! to "nothing selected" rather than an error.

mod vocabulary;

pub use vocabulary::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PanelSpecific, SampleType};

/// Shape of the sample-type specific panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelShape {
    /// CLED agar colony count.
    Urine,
    /// Ziehl-Neelsen acid-fast smear.
    Sputum,
    /// No sample type chosen yet; ask the user to pick one first.
    Unselected,
}

/// Map a sample type to the panel shape it expects.
pub fn resolve_panel_specific(sample_type: SampleType) -> PanelShape {
    match sample_type {
        SampleType::Urine => PanelShape::Urine,
        SampleType::Sputum => PanelShape::Sputum,
        SampleType::General => PanelShape::Unselected,
    }
}

/// A populated panel that does not belong to the declared sample type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("panel {found:?} does not match sample type {sample_type} (expected {expected:?})")]
pub struct PanelMismatch {
    pub sample_type: SampleType,
    pub expected: PanelShape,
    pub found: PanelShape,
}

/// Check that a filled panel agrees with the declared sample type.
///
/// An empty panel is accepted for any sample type so drafts can be saved
/// before the bench work starts.
pub fn check_panel_shape(
    sample_type: SampleType,
    panel: &PanelSpecific,
) -> Result<(), PanelMismatch> {
    let expected = resolve_panel_specific(sample_type);
    let found = panel.shape();

    if found == PanelShape::Unselected || found == expected {
        return Ok(());
    }

    Err(PanelMismatch {
        sample_type,
        expected,
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_panel_specific() {
        assert_eq!(resolve_panel_specific(SampleType::Urine), PanelShape::Urine);
        assert_eq!(resolve_panel_specific(SampleType::Sputum), PanelShape::Sputum);
        assert_eq!(
            resolve_panel_specific(SampleType::General),
            PanelShape::Unselected
        );
    }

    #[test]
    fn test_matching_panel_passes() {
        let panel = PanelSpecific::Urine {
            colony_count: "50000".into(),
        };
        assert!(check_panel_shape(SampleType::Urine, &panel).is_ok());
    }

    #[test]
    fn test_empty_panel_passes_for_any_sample_type() {
        for sample_type in [SampleType::Urine, SampleType::Sputum, SampleType::General] {
            assert!(check_panel_shape(sample_type, &PanelSpecific::Unselected).is_ok());
        }
    }

    #[test]
    fn test_mismatched_panel_fails() {
        let panel = PanelSpecific::Sputum {
            acid_fast_result: "BAAR negative".into(),
        };
        let err = check_panel_shape(SampleType::Urine, &panel).unwrap_err();
        assert_eq!(err.expected, PanelShape::Urine);
        assert_eq!(err.found, PanelShape::Sputum);
    }

    #[test]
    fn test_general_rejects_populated_panel() {
        let panel = PanelSpecific::Urine {
            colony_count: "10".into(),
        };
        let err = check_panel_shape(SampleType::General, &panel).unwrap_err();
        assert_eq!(err.expected, PanelShape::Unselected);
    }
}
