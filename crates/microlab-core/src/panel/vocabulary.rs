//! Biochemistry vocabularies keyed by Gram stain outcome.
//!
//! Gram-positive isolates go through catalase, coagulase and novobiocin
//! testing. Gram-negative isolates go through MacConkey (lactose), EPM,
//! MILI and citrate media. The two key sets are disjoint.

use serde::{Deserialize, Serialize};

use crate::models::StainResult;

/// A recognized biochemistry field.
///
/// The wire key of each field is its snake_case name (see [`BiochemistryField::key`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiochemistryField {
    // Gram positive: catalase
    CatalaseColonyCount,
    CatalaseColoration,
    CatalaseLot,
    CatalaseExpiration,
    // Gram positive: coagulase
    CoagulaseResult,
    CoagulaseKitLot,
    CoagulaseKitExpiration,
    CoagulaseTubeLot,
    CoagulaseTubeExpiration,
    // Gram positive: novobiocin
    NovobiocinResult,
    NovobiocinAntibioticLot,
    NovobiocinAntibioticExpiration,
    NovobiocinAgarLot,
    // Gram negative: MacConkey agar
    MacconkeyLactose,
    // Gram negative: EPM
    EpmGas,
    EpmH2s,
    EpmUrease,
    EpmTryptophan,
    EpmLot,
    EpmExpiration,
    // Gram negative: MILI
    MiliIndole,
    MiliLysine,
    MiliMotility,
    MiliLot,
    // Gram negative: citrate
    CitrateUtilization,
    CitrateLot,
    CitrateExpiration,
}

/// Group of fields belonging to one bench test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestGroup {
    Catalase,
    Coagulase,
    Novobiocin,
    Macconkey,
    Epm,
    Mili,
    Citrate,
}

const GRAM_POSITIVE_FIELDS: &[BiochemistryField] = &[
    BiochemistryField::CatalaseColonyCount,
    BiochemistryField::CatalaseColoration,
    BiochemistryField::CatalaseLot,
    BiochemistryField::CatalaseExpiration,
    BiochemistryField::CoagulaseResult,
    BiochemistryField::CoagulaseKitLot,
    BiochemistryField::CoagulaseKitExpiration,
    BiochemistryField::CoagulaseTubeLot,
    BiochemistryField::CoagulaseTubeExpiration,
    BiochemistryField::NovobiocinResult,
    BiochemistryField::NovobiocinAntibioticLot,
    BiochemistryField::NovobiocinAntibioticExpiration,
    BiochemistryField::NovobiocinAgarLot,
];

const GRAM_NEGATIVE_FIELDS: &[BiochemistryField] = &[
    BiochemistryField::MacconkeyLactose,
    BiochemistryField::EpmGas,
    BiochemistryField::EpmH2s,
    BiochemistryField::EpmUrease,
    BiochemistryField::EpmTryptophan,
    BiochemistryField::EpmLot,
    BiochemistryField::EpmExpiration,
    BiochemistryField::MiliIndole,
    BiochemistryField::MiliLysine,
    BiochemistryField::MiliMotility,
    BiochemistryField::MiliLot,
    BiochemistryField::CitrateUtilization,
    BiochemistryField::CitrateLot,
    BiochemistryField::CitrateExpiration,
];

impl BiochemistryField {
    /// Wire key used inside the `biochemistry` map.
    pub fn key(self) -> &'static str {
        match self {
            Self::CatalaseColonyCount => "catalase_colony_count",
            Self::CatalaseColoration => "catalase_coloration",
            Self::CatalaseLot => "catalase_lot",
            Self::CatalaseExpiration => "catalase_expiration",
            Self::CoagulaseResult => "coagulase_result",
            Self::CoagulaseKitLot => "coagulase_kit_lot",
            Self::CoagulaseKitExpiration => "coagulase_kit_expiration",
            Self::CoagulaseTubeLot => "coagulase_tube_lot",
            Self::CoagulaseTubeExpiration => "coagulase_tube_expiration",
            Self::NovobiocinResult => "novobiocin_result",
            Self::NovobiocinAntibioticLot => "novobiocin_antibiotic_lot",
            Self::NovobiocinAntibioticExpiration => "novobiocin_antibiotic_expiration",
            Self::NovobiocinAgarLot => "novobiocin_agar_lot",
            Self::MacconkeyLactose => "macconkey_lactose",
            Self::EpmGas => "epm_gas",
            Self::EpmH2s => "epm_h2s",
            Self::EpmUrease => "epm_urease",
            Self::EpmTryptophan => "epm_tryptophan",
            Self::EpmLot => "epm_lot",
            Self::EpmExpiration => "epm_expiration",
            Self::MiliIndole => "mili_indole",
            Self::MiliLysine => "mili_lysine",
            Self::MiliMotility => "mili_motility",
            Self::MiliLot => "mili_lot",
            Self::CitrateUtilization => "citrate_utilization",
            Self::CitrateLot => "citrate_lot",
            Self::CitrateExpiration => "citrate_expiration",
        }
    }

    /// Look up a field by its wire key. Exact, case-sensitive match.
    pub fn parse(key: &str) -> Option<Self> {
        GRAM_POSITIVE_FIELDS
            .iter()
            .chain(GRAM_NEGATIVE_FIELDS)
            .copied()
            .find(|field| field.key() == key)
    }

    /// Vocabulary this field belongs to.
    pub fn vocabulary(self) -> Vocabulary {
        match self.group() {
            TestGroup::Catalase | TestGroup::Coagulase | TestGroup::Novobiocin => {
                Vocabulary::GramPositive
            }
            TestGroup::Macconkey | TestGroup::Epm | TestGroup::Mili | TestGroup::Citrate => {
                Vocabulary::GramNegative
            }
        }
    }

    /// Bench test this field is recorded under.
    pub fn group(self) -> TestGroup {
        match self {
            Self::CatalaseColonyCount
            | Self::CatalaseColoration
            | Self::CatalaseLot
            | Self::CatalaseExpiration => TestGroup::Catalase,
            Self::CoagulaseResult
            | Self::CoagulaseKitLot
            | Self::CoagulaseKitExpiration
            | Self::CoagulaseTubeLot
            | Self::CoagulaseTubeExpiration => TestGroup::Coagulase,
            Self::NovobiocinResult
            | Self::NovobiocinAntibioticLot
            | Self::NovobiocinAntibioticExpiration
            | Self::NovobiocinAgarLot => TestGroup::Novobiocin,
            Self::MacconkeyLactose => TestGroup::Macconkey,
            Self::EpmGas
            | Self::EpmH2s
            | Self::EpmUrease
            | Self::EpmTryptophan
            | Self::EpmLot
            | Self::EpmExpiration => TestGroup::Epm,
            Self::MiliIndole | Self::MiliLysine | Self::MiliMotility | Self::MiliLot => {
                TestGroup::Mili
            }
            Self::CitrateUtilization | Self::CitrateLot | Self::CitrateExpiration => {
                TestGroup::Citrate
            }
        }
    }
}

/// The set of biochemistry keys active for a stain outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    GramPositive,
    GramNegative,
    /// Stain not read yet: nothing is recognized.
    #[default]
    None,
}

impl Vocabulary {
    /// Fields of this vocabulary, in bench order.
    pub fn fields(self) -> &'static [BiochemistryField] {
        match self {
            Vocabulary::GramPositive => GRAM_POSITIVE_FIELDS,
            Vocabulary::GramNegative => GRAM_NEGATIVE_FIELDS,
            Vocabulary::None => &[],
        }
    }

    /// Wire keys of this vocabulary, in bench order.
    pub fn keys(self) -> impl Iterator<Item = &'static str> {
        self.fields().iter().map(|field| field.key())
    }

    /// Resolve a wire key to a field, only if it belongs to this vocabulary.
    pub fn recognize(self, key: &str) -> Option<BiochemistryField> {
        BiochemistryField::parse(key).filter(|field| field.vocabulary() == self)
    }

    pub fn recognizes(self, key: &str) -> bool {
        self.recognize(key).is_some()
    }

    pub fn is_empty(self) -> bool {
        self.fields().is_empty()
    }
}

/// Map a stain outcome to the biochemistry vocabulary it activates.
///
/// Total over [`StainResult`]: an unset stain degrades to [`Vocabulary::None`].
pub fn resolve_biochemistry_vocabulary(stain_result: StainResult) -> Vocabulary {
    match stain_result {
        StainResult::Positive => Vocabulary::GramPositive,
        StainResult::Negative => Vocabulary::GramNegative,
        StainResult::Unset => Vocabulary::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabularies_are_disjoint() {
        let positive: HashSet<_> = Vocabulary::GramPositive.keys().collect();
        let negative: HashSet<_> = Vocabulary::GramNegative.keys().collect();
        assert_eq!(positive.len(), 13);
        assert_eq!(negative.len(), 14);
        assert!(positive.is_disjoint(&negative));
    }

    #[test]
    fn test_unset_stain_has_no_vocabulary() {
        let vocabulary = resolve_biochemistry_vocabulary(StainResult::Unset);
        assert_eq!(vocabulary, Vocabulary::None);
        assert!(vocabulary.is_empty());
        assert!(!vocabulary.recognizes("catalase_lot"));
    }

    #[test]
    fn test_parse_round_trips_every_key() {
        for field in GRAM_POSITIVE_FIELDS.iter().chain(GRAM_NEGATIVE_FIELDS) {
            assert_eq!(BiochemistryField::parse(field.key()), Some(*field));
        }
        assert_eq!(BiochemistryField::parse("Catalase_Lot"), None);
        assert_eq!(BiochemistryField::parse("gram_color"), None);
    }

    #[test]
    fn test_recognize_respects_vocabulary() {
        assert_eq!(
            Vocabulary::GramPositive.recognize("coagulase_result"),
            Some(BiochemistryField::CoagulaseResult)
        );
        assert_eq!(Vocabulary::GramNegative.recognize("coagulase_result"), None);
        assert_eq!(
            Vocabulary::GramNegative.recognize("mili_motility"),
            Some(BiochemistryField::MiliMotility)
        );
    }

    #[test]
    fn test_groups() {
        assert_eq!(BiochemistryField::EpmH2s.group(), TestGroup::Epm);
        assert_eq!(BiochemistryField::NovobiocinAgarLot.group(), TestGroup::Novobiocin);
        assert_eq!(BiochemistryField::MacconkeyLactose.vocabulary(), Vocabulary::GramNegative);
    }
}
