//! Exam answers: the variable-shape payload of an exam.
//!
//! Wire layout (JSON object, camelCase keys):
//!
//! ```text
//! {
//!   "sampleType":    "URINE" | "SPUTUM" | "GENERAL",
//!   "sampleId":      "...",
//!   "panelSpecific": {"colonyCount": "..."} | {"acidFastResult": "..."} | {},
//!   "stain":         {"result": "POSITIVE" | "NEGATIVE" | "UNSET", "lotNumber": "...", "expirationDate": "..."},
//!   "biochemistry":  {"<field key>": "...", ...},
//!   "report":        "...",
//!   ...unknown keys kept verbatim
//! }
//! ```
//!
//! Unknown keys inside `stain` and `panelSpecific` are kept as well. Free-text
//! fields accept numbers and booleans and read them as text.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::panel::{resolve_biochemistry_vocabulary, BiochemistryField, PanelShape, Vocabulary};

/// Top-level answer keys owned by [`Answers`]. Extras may not reuse them.
const RESERVED_KEYS: &[&str] = &[
    "sampleType",
    "sampleId",
    "panelSpecific",
    "stain",
    "biochemistry",
    "report",
];

const STAIN_KEYS: &[&str] = &["result", "lotNumber", "expirationDate"];

const PANEL_KEYS: &[&str] = &["colonyCount", "acidFastResult"];

/// Material examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleType {
    Urine,
    Sputum,
    /// No specific material selected.
    #[default]
    General,
}

impl SampleType {
    /// Canonical upper-case tag.
    pub fn as_str(self) -> &'static str {
        match self {
            SampleType::Urine => "URINE",
            SampleType::Sputum => "SPUTUM",
            SampleType::General => "GENERAL",
        }
    }

    /// Parse a tag case-insensitively. Blank or unknown text is `General`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "URINE" => SampleType::Urine,
            "SPUTUM" => SampleType::Sputum,
            _ => SampleType::General,
        }
    }

    /// Whether this is a concrete material that activates a panel.
    pub fn is_recognized(self) -> bool {
        !matches!(self, SampleType::General)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SampleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SampleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<Value>::deserialize(deserializer)?;
        Ok(match tag {
            Some(Value::String(tag)) => SampleType::parse(&tag),
            _ => SampleType::General,
        })
    }
}

/// Gram stain outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StainResult {
    Positive,
    Negative,
    #[default]
    Unset,
}

impl StainResult {
    pub fn as_str(self) -> &'static str {
        match self {
            StainResult::Positive => "POSITIVE",
            StainResult::Negative => "NEGATIVE",
            StainResult::Unset => "UNSET",
        }
    }

    /// Parse case-insensitively. Anything unrecognized is `Unset`.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => StainResult::Positive,
            "NEGATIVE" => StainResult::Negative,
            _ => StainResult::Unset,
        }
    }
}

impl Serialize for StainResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StainResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Option::<Value>::deserialize(deserializer)?;
        Ok(match text {
            Some(Value::String(text)) => StainResult::parse(&text),
            _ => StainResult::Unset,
        })
    }
}

/// Gram stain sub-record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stain {
    #[serde(default)]
    pub result: StainResult,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub lot_number: String,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub expiration_date: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Stain {
    pub fn new(result: StainResult) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    /// Unknown keys of the stain object, preserved verbatim.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Attach an unknown stain key. Returns `false` for the stain's own keys.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) -> bool {
        insert_unreserved(&mut self.extra, STAIN_KEYS, key.into(), value)
    }

    fn to_json_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("result".into(), Value::String(self.result.as_str().into()));
        map.insert("lotNumber".into(), Value::String(self.lot_number.clone()));
        map.insert(
            "expirationDate".into(),
            Value::String(self.expiration_date.clone()),
        );
        Value::Object(map)
    }
}

/// Sample-type specific panel. At most one shape is ever populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PanelSpecificWire", into = "PanelSpecificWire")]
pub enum PanelSpecific {
    /// Nothing filled in yet.
    #[default]
    Unselected,
    /// CLED agar colony count (urine).
    Urine { colony_count: String },
    /// Ziehl-Neelsen acid-fast smear result (sputum).
    Sputum { acid_fast_result: String },
}

impl PanelSpecific {
    pub fn shape(&self) -> PanelShape {
        match self {
            PanelSpecific::Unselected => PanelShape::Unselected,
            PanelSpecific::Urine { .. } => PanelShape::Urine,
            PanelSpecific::Sputum { .. } => PanelShape::Sputum,
        }
    }

    /// Write the populated field (if any) into a panel object.
    fn write_fields(&self, map: &mut Map<String, Value>) {
        match self {
            PanelSpecific::Unselected => {}
            PanelSpecific::Urine { colony_count } => {
                map.insert("colonyCount".into(), Value::String(colony_count.clone()));
            }
            PanelSpecific::Sputum { acid_fast_result } => {
                map.insert(
                    "acidFastResult".into(),
                    Value::String(acid_fast_result.clone()),
                );
            }
        }
    }
}

/// Flat wire form of [`PanelSpecific`]. `extra` only survives inside [`Answers`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PanelSpecificWire {
    #[serde(
        default,
        deserialize_with = "optional_scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    colony_count: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    acid_fast_result: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<PanelSpecificWire> for PanelSpecific {
    type Error = String;

    fn try_from(wire: PanelSpecificWire) -> Result<Self, Self::Error> {
        match (wire.colony_count, wire.acid_fast_result) {
            (None, None) => Ok(PanelSpecific::Unselected),
            (Some(colony_count), None) => Ok(PanelSpecific::Urine { colony_count }),
            (None, Some(acid_fast_result)) => Ok(PanelSpecific::Sputum { acid_fast_result }),
            (Some(_), Some(_)) => {
                Err("panelSpecific carries both urine and sputum fields".to_string())
            }
        }
    }
}

impl From<PanelSpecific> for PanelSpecificWire {
    fn from(panel: PanelSpecific) -> Self {
        match panel {
            PanelSpecific::Unselected => PanelSpecificWire::default(),
            PanelSpecific::Urine { colony_count } => PanelSpecificWire {
                colony_count: Some(colony_count),
                ..PanelSpecificWire::default()
            },
            PanelSpecific::Sputum { acid_fast_result } => PanelSpecificWire {
                acid_fast_result: Some(acid_fast_result),
                ..PanelSpecificWire::default()
            },
        }
    }
}

/// Biochemistry results: typed fields for the active vocabulary plus opaque extras.
///
/// Invariant: `fields` only holds keys of `vocabulary`; `extra` never holds a key
/// of `vocabulary` with a text value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Biochemistry {
    vocabulary: Vocabulary,
    fields: BTreeMap<BiochemistryField, String>,
    extra: Map<String, Value>,
}

impl Biochemistry {
    /// Empty biochemistry scoped to a vocabulary.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            ..Self::default()
        }
    }

    /// Partition a raw map against a vocabulary.
    pub fn from_map(vocabulary: Vocabulary, map: Map<String, Value>) -> Self {
        let mut biochemistry = Self::new(vocabulary);
        for (key, value) in map {
            biochemistry.insert(key, value);
        }
        biochemistry
    }

    /// Merge typed fields and extras back into one raw map.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        for (field, value) in &self.fields {
            map.insert(field.key().to_string(), Value::String(value.clone()));
        }
        map
    }

    /// Re-partition everything against a new vocabulary.
    pub fn rescope(&mut self, vocabulary: Vocabulary) {
        if vocabulary == self.vocabulary {
            return;
        }
        let map = self.to_map();
        *self = Self::from_map(vocabulary, map);
    }

    /// Store a value. Never rejects: unrecognized keys land in the extras.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match (self.vocabulary.recognize(&key), value) {
            (Some(field), Value::String(text)) => {
                self.extra.remove(&key);
                self.fields.insert(field, text);
            }
            (recognized, value) => {
                if let Some(field) = recognized {
                    self.fields.remove(&field);
                }
                self.extra.insert(key, value);
            }
        }
    }

    /// Remove a key from either side.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if let Some(field) = self.vocabulary.recognize(key) {
            if let Some(text) = self.fields.remove(&field) {
                return Some(Value::String(text));
            }
        }
        self.extra.remove(key)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary
    }

    pub fn get(&self, field: BiochemistryField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Recognized fields in bench order.
    pub fn recognized(&self) -> impl Iterator<Item = (BiochemistryField, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    /// Opaque entries outside the active vocabulary.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Fields of the active vocabulary with no non-blank value yet.
    pub fn missing_fields(&self) -> Vec<BiochemistryField> {
        self.vocabulary
            .fields()
            .iter()
            .copied()
            .filter(|field| self.get(*field).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.extra.is_empty()
    }
}

/// The full answers payload of an exam.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "AnswersWire")]
pub struct Answers {
    /// Mirrors the exam's sample type.
    pub sample_type: SampleType,
    /// Free-text specimen identifier.
    pub sample_id: String,
    pub panel_specific: PanelSpecific,
    /// Unknown keys of the `panelSpecific` object.
    panel_extra: Map<String, Value>,
    stain: Stain,
    biochemistry: Biochemistry,
    /// Final identification. Blank counts as absent.
    pub report: String,
    extra: Map<String, Value>,
}

impl Answers {
    /// Empty answers for a sample type.
    pub fn new(sample_type: SampleType) -> Self {
        Self {
            sample_type,
            ..Self::default()
        }
    }

    pub fn stain(&self) -> &Stain {
        &self.stain
    }

    /// Unknown keys of the panel object, preserved verbatim.
    pub fn panel_extra(&self) -> &Map<String, Value> {
        &self.panel_extra
    }

    /// Attach an unknown panel key. Returns `false` for the panel's own keys.
    pub fn insert_panel_extra(&mut self, key: impl Into<String>, value: Value) -> bool {
        insert_unreserved(&mut self.panel_extra, PANEL_KEYS, key.into(), value)
    }

    /// Attach an unknown stain key. Returns `false` for the stain's own keys.
    pub fn insert_stain_extra(&mut self, key: impl Into<String>, value: Value) -> bool {
        self.stain.insert_extra(key, value)
    }

    /// Replace the stain sub-record and re-scope the biochemistry to it.
    pub fn set_stain(&mut self, stain: Stain) {
        let vocabulary = resolve_biochemistry_vocabulary(stain.result);
        self.stain = stain;
        self.biochemistry.rescope(vocabulary);
    }

    /// Change only the stain result, re-scoping the biochemistry.
    pub fn set_stain_result(&mut self, result: StainResult) {
        self.stain.result = result;
        self.biochemistry
            .rescope(resolve_biochemistry_vocabulary(result));
    }

    pub fn set_stain_lot(&mut self, lot_number: impl Into<String>, expiration_date: impl Into<String>) {
        self.stain.lot_number = lot_number.into();
        self.stain.expiration_date = expiration_date.into();
    }

    pub fn biochemistry(&self) -> &Biochemistry {
        &self.biochemistry
    }

    /// Set a biochemistry value by wire key. Keys outside the active vocabulary
    /// are kept as opaque extras.
    pub fn set_biochemistry_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.biochemistry.insert(key, value.into());
    }

    pub fn remove_biochemistry_value(&mut self, key: &str) -> Option<Value> {
        self.biochemistry.remove(key)
    }

    /// Report with surrounding whitespace removed, `None` if blank.
    pub fn trimmed_report(&self) -> Option<&str> {
        let report = self.report.trim();
        (!report.is_empty()).then_some(report)
    }

    /// Unknown top-level keys, preserved verbatim.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Attach an unknown top-level key. Returns `false` for reserved keys.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) -> bool {
        insert_unreserved(&mut self.extra, RESERVED_KEYS, key.into(), value)
    }

    /// Structured JSON form. Infallible.
    pub fn to_json_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert(
            "sampleType".into(),
            Value::String(self.sample_type.as_str().into()),
        );
        map.insert("sampleId".into(), Value::String(self.sample_id.clone()));
        let mut panel = self.panel_extra.clone();
        self.panel_specific.write_fields(&mut panel);
        map.insert("panelSpecific".into(), Value::Object(panel));
        map.insert("stain".into(), self.stain.to_json_value());
        map.insert(
            "biochemistry".into(),
            Value::Object(self.biochemistry.to_map()),
        );
        map.insert("report".into(), Value::String(self.report.clone()));
        Value::Object(map)
    }
}

impl Serialize for Answers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

/// Loose wire form of [`Answers`]; nulls read as defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswersWire {
    #[serde(default)]
    sample_type: SampleType,
    #[serde(default, deserialize_with = "scalar_as_text")]
    sample_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    panel_specific: PanelSpecificWire,
    #[serde(default, deserialize_with = "null_as_default")]
    stain: Stain,
    #[serde(default, deserialize_with = "null_as_default")]
    biochemistry: Map<String, Value>,
    #[serde(default, deserialize_with = "scalar_as_text")]
    report: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<AnswersWire> for Answers {
    type Error = String;

    fn try_from(mut wire: AnswersWire) -> Result<Self, Self::Error> {
        let vocabulary = resolve_biochemistry_vocabulary(wire.stain.result);
        let panel_extra = std::mem::take(&mut wire.panel_specific.extra);
        Ok(Self {
            sample_type: wire.sample_type,
            sample_id: wire.sample_id,
            panel_specific: PanelSpecific::try_from(wire.panel_specific)?,
            panel_extra,
            stain: wire.stain,
            biochemistry: Biochemistry::from_map(vocabulary, wire.biochemistry),
            report: wire.report,
            extra: wire.extra,
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Free text that may arrive as a number or boolean. Null reads as empty.
fn scalar_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(optional_scalar_as_text(deserializer)?.unwrap_or_default())
}

fn optional_scalar_as_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Array(_)) => Err(de::Error::custom("expected text, found an array")),
        Some(Value::Object(_)) => Err(de::Error::custom("expected text, found an object")),
    }
}

fn insert_unreserved(
    map: &mut Map<String, Value>,
    reserved: &[&str],
    key: String,
    value: Value,
) -> bool {
    if reserved.contains(&key.as_str()) {
        return false;
    }
    map.insert(key, value);
    true
}
