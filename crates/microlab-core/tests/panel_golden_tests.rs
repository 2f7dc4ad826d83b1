//! Golden tests for conditional panel resolution.

use std::collections::BTreeSet;

use microlab_core::models::{PanelSpecific, SampleType, StainResult};
use microlab_core::panel::{
    check_panel_shape, resolve_biochemistry_vocabulary, resolve_panel_specific, BiochemistryField,
    PanelShape, TestGroup, Vocabulary,
};

const GRAM_POSITIVE_KEYS: &[&str] = &[
    "catalase_colony_count",
    "catalase_coloration",
    "catalase_lot",
    "catalase_expiration",
    "coagulase_result",
    "coagulase_kit_lot",
    "coagulase_kit_expiration",
    "coagulase_tube_lot",
    "coagulase_tube_expiration",
    "novobiocin_result",
    "novobiocin_antibiotic_lot",
    "novobiocin_antibiotic_expiration",
    "novobiocin_agar_lot",
];

const GRAM_NEGATIVE_KEYS: &[&str] = &[
    "macconkey_lactose",
    "epm_gas",
    "epm_h2s",
    "epm_urease",
    "epm_tryptophan",
    "epm_lot",
    "epm_expiration",
    "mili_indole",
    "mili_lysine",
    "mili_motility",
    "mili_lot",
    "citrate_utilization",
    "citrate_lot",
    "citrate_expiration",
];

fn key_set(vocabulary: Vocabulary) -> BTreeSet<&'static str> {
    vocabulary.keys().collect()
}

#[test]
fn test_panel_shape_cases() {
    let cases = vec![
        ("URINE", PanelShape::Urine),
        ("urine", PanelShape::Urine),
        ("SPUTUM", PanelShape::Sputum),
        ("GENERAL", PanelShape::Unselected),
        ("", PanelShape::Unselected),
        ("BLOOD", PanelShape::Unselected),
    ];

    for (tag, expected) in cases {
        assert_eq!(
            resolve_panel_specific(SampleType::parse(tag)),
            expected,
            "Sample type {:?} should resolve to {:?}",
            tag,
            expected
        );
    }
}

#[test]
fn test_gram_positive_vocabulary() {
    let vocabulary = resolve_biochemistry_vocabulary(StainResult::Positive);
    assert_eq!(vocabulary, Vocabulary::GramPositive);
    assert_eq!(key_set(vocabulary), GRAM_POSITIVE_KEYS.iter().copied().collect());
}

#[test]
fn test_gram_negative_vocabulary() {
    let vocabulary = resolve_biochemistry_vocabulary(StainResult::Negative);
    assert_eq!(vocabulary, Vocabulary::GramNegative);
    assert_eq!(key_set(vocabulary), GRAM_NEGATIVE_KEYS.iter().copied().collect());
}

#[test]
fn test_unset_vocabulary_is_empty() {
    let vocabulary = resolve_biochemistry_vocabulary(StainResult::Unset);
    assert!(vocabulary.is_empty());
    assert_eq!(vocabulary.keys().count(), 0);
}

#[test]
fn test_vocabularies_are_disjoint() {
    let positive = key_set(Vocabulary::GramPositive);
    let negative = key_set(Vocabulary::GramNegative);
    assert!(positive.is_disjoint(&negative));
}

#[test]
fn test_every_key_parses_back_to_its_vocabulary() {
    for vocabulary in [Vocabulary::GramPositive, Vocabulary::GramNegative] {
        for field in vocabulary.fields() {
            assert_eq!(BiochemistryField::parse(field.key()), Some(*field));
            assert_eq!(field.vocabulary(), vocabulary);
            assert!(vocabulary.recognizes(field.key()));
        }
    }
}

#[test]
fn test_test_groups_follow_key_prefix() {
    let prefixes = vec![
        (TestGroup::Catalase, "catalase_"),
        (TestGroup::Coagulase, "coagulase_"),
        (TestGroup::Novobiocin, "novobiocin_"),
        (TestGroup::Macconkey, "macconkey_"),
        (TestGroup::Epm, "epm_"),
        (TestGroup::Mili, "mili_"),
        (TestGroup::Citrate, "citrate_"),
    ];

    for vocabulary in [Vocabulary::GramPositive, Vocabulary::GramNegative] {
        for field in vocabulary.fields() {
            let (_, prefix) = prefixes
                .iter()
                .find(|(group, _)| *group == field.group())
                .unwrap();
            assert!(
                field.key().starts_with(prefix),
                "{} should belong to {:?}",
                field.key(),
                field.group()
            );
        }
    }
}

#[test]
fn test_panel_shape_checks() {
    let colony = PanelSpecific::Urine {
        colony_count: "100000".into(),
    };
    let smear = PanelSpecific::Sputum {
        acid_fast_result: "negative".into(),
    };

    assert!(check_panel_shape(SampleType::Urine, &colony).is_ok());
    assert!(check_panel_shape(SampleType::Sputum, &smear).is_ok());
    assert!(check_panel_shape(SampleType::Urine, &PanelSpecific::Unselected).is_ok());
    assert!(check_panel_shape(SampleType::General, &PanelSpecific::Unselected).is_ok());

    assert!(check_panel_shape(SampleType::Urine, &smear).is_err());
    assert!(check_panel_shape(SampleType::Sputum, &colony).is_err());
    assert!(check_panel_shape(SampleType::General, &colony).is_err());
}
