//! Relation property flags and the static compatibility tables.
//!
//! The tables are reference data shipped with the crate
//! (`data/property_checks.json`):
//!
//! - `combinations`: every flag set that is logically admissible on a single
//!   relation
//! - `inverse_of`: every ordered pair of flag sets `(p1, p2)` such that a
//!   relation carrying `p1` may be declared `owl:inverseOf` a relation
//!   carrying `p2`
//!
//! They are loaded once per run and queried repeatedly by the relation
//! schema generator.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const PROPERTY_CHECKS_JSON: &str = include_str!("../data/property_checks.json");

// ============================================================================
// Property flags
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationProperty {
    #[serde(rename = "owl:Reflexive")]
    Reflexive,
    #[serde(rename = "owl:Irreflexive")]
    Irreflexive,
    #[serde(rename = "owl:Symmetric")]
    Symmetric,
    #[serde(rename = "owl:Asymmetric")]
    Asymmetric,
    #[serde(rename = "owl:Transitive")]
    Transitive,
    #[serde(rename = "owl:Functional")]
    Functional,
    #[serde(rename = "owl:InverseFunctional")]
    InverseFunctional,
}

impl RelationProperty {
    pub const ALL: [RelationProperty; 7] = [
        RelationProperty::Reflexive,
        RelationProperty::Irreflexive,
        RelationProperty::Symmetric,
        RelationProperty::Asymmetric,
        RelationProperty::Transitive,
        RelationProperty::Functional,
        RelationProperty::InverseFunctional,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Short name used in the info records and the property tables.
    pub fn owl_name(self) -> &'static str {
        match self {
            RelationProperty::Reflexive => "owl:Reflexive",
            RelationProperty::Irreflexive => "owl:Irreflexive",
            RelationProperty::Symmetric => "owl:Symmetric",
            RelationProperty::Asymmetric => "owl:Asymmetric",
            RelationProperty::Transitive => "owl:Transitive",
            RelationProperty::Functional => "owl:Functional",
            RelationProperty::InverseFunctional => "owl:InverseFunctional",
        }
    }

    /// Local name of the OWL class typing a property with this flag.
    pub fn owl_class(self) -> &'static str {
        match self {
            RelationProperty::Reflexive => "ReflexiveProperty",
            RelationProperty::Irreflexive => "IrreflexiveProperty",
            RelationProperty::Symmetric => "SymmetricProperty",
            RelationProperty::Asymmetric => "AsymmetricProperty",
            RelationProperty::Transitive => "TransitiveProperty",
            RelationProperty::Functional => "FunctionalProperty",
            RelationProperty::InverseFunctional => "InverseFunctionalProperty",
        }
    }

    pub fn from_owl_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.owl_name() == name)
    }

    /// The flag this one turns into on the inverse relation.
    pub fn mirror(self) -> Self {
        match self {
            RelationProperty::Functional => RelationProperty::InverseFunctional,
            RelationProperty::InverseFunctional => RelationProperty::Functional,
            other => other,
        }
    }
}

impl fmt::Display for RelationProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.owl_name())
    }
}

/// A set of [`RelationProperty`] flags, stored as a bitmask.
///
/// Serializes as the sorted list of flag names.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<RelationProperty>", into = "Vec<RelationProperty>")]
pub struct PropertySet(u8);

impl PropertySet {
    pub const EMPTY: PropertySet = PropertySet(0);

    pub fn contains(self, property: RelationProperty) -> bool {
        self.0 & property.bit() != 0
    }

    pub fn with(self, property: RelationProperty) -> Self {
        PropertySet(self.0 | property.bit())
    }

    pub fn insert(&mut self, property: RelationProperty) {
        self.0 |= property.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = RelationProperty> {
        RelationProperty::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }

    /// Flags as seen from the inverse relation.
    pub fn mirror(self) -> Self {
        self.iter().map(RelationProperty::mirror).collect()
    }
}

impl FromIterator<RelationProperty> for PropertySet {
    fn from_iter<I: IntoIterator<Item = RelationProperty>>(iter: I) -> Self {
        let mut set = PropertySet::EMPTY;
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl From<Vec<RelationProperty>> for PropertySet {
    fn from(value: Vec<RelationProperty>) -> Self {
        value.into_iter().collect()
    }
}

impl From<PropertySet> for Vec<RelationProperty> {
    fn from(value: PropertySet) -> Self {
        value.iter().collect()
    }
}

impl fmt::Debug for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let names: Vec<&str> = self.iter().map(RelationProperty::owl_name).collect();
        f.write_str(&names.join(","))
    }
}

// ============================================================================
// Compatibility tables
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPropertyChecks {
    combinations: Vec<Vec<String>>,
    inverse_of: Vec<(Vec<String>, Vec<String>)>,
}

#[derive(Debug, Clone)]
pub struct PropertyTables {
    combinations: BTreeSet<PropertySet>,
    inverse_of: BTreeMap<PropertySet, Vec<PropertySet>>,
}

impl PropertyTables {
    /// The tables bundled with the crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_json(PROPERTY_CHECKS_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let raw: RawPropertyChecks =
            serde_json::from_str(json).map_err(|e| SchemaError::PropertyTable(e.to_string()))?;

        let combinations = raw
            .combinations
            .iter()
            .map(|names| parse_set(names))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut inverse_of: BTreeMap<PropertySet, Vec<PropertySet>> = BTreeMap::new();
        for (first, second) in &raw.inverse_of {
            let first = parse_set(first)?;
            let second = parse_set(second)?;
            for set in [first, second] {
                if !combinations.contains(&set) {
                    return Err(SchemaError::PropertyTable(format!(
                        "inverse-of entry uses an inadmissible flag set {set}"
                    )));
                }
            }
            inverse_of.entry(first).or_default().push(second);
        }

        Ok(Self {
            combinations,
            inverse_of,
        })
    }

    pub fn is_admissible(&self, set: PropertySet) -> bool {
        self.combinations.contains(&set)
    }

    /// Whether `property` can be added to a relation currently carrying `set`.
    pub fn admits(&self, set: PropertySet, property: RelationProperty) -> bool {
        self.is_admissible(set.with(property))
    }

    /// Flag sets a relation may carry when it is the inverse of one carrying `set`.
    pub fn inverse_partners(&self, set: PropertySet) -> &[PropertySet] {
        self.inverse_of.get(&set).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn combinations(&self) -> impl Iterator<Item = PropertySet> + '_ {
        self.combinations.iter().copied()
    }
}

fn parse_set(names: &[String]) -> Result<PropertySet, SchemaError> {
    names
        .iter()
        .map(|name| {
            RelationProperty::from_owl_name(name)
                .ok_or_else(|| SchemaError::PropertyTable(format!("unknown property `{name}`")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use RelationProperty::*;

    fn set(props: &[RelationProperty]) -> PropertySet {
        props.iter().copied().collect()
    }

    #[test]
    fn builtin_tables_load() {
        let tables = PropertyTables::builtin().unwrap();
        assert_eq!(tables.combinations().count(), 30);
        assert!(tables.is_admissible(PropertySet::EMPTY));
    }

    #[test]
    fn contradictory_flags_are_not_admissible() {
        let tables = PropertyTables::builtin().unwrap();
        assert!(!tables.is_admissible(set(&[Symmetric, Asymmetric])));
        assert!(!tables.is_admissible(set(&[Reflexive, Irreflexive])));
        assert!(!tables.is_admissible(set(&[Transitive, Functional])));
        assert!(!tables.admits(set(&[Reflexive]), Asymmetric));
        assert!(tables.admits(set(&[Irreflexive]), Asymmetric));
        assert!(tables.admits(set(&[Symmetric]), Transitive));
    }

    #[test]
    fn functional_inverts_to_inverse_functional() {
        let tables = PropertyTables::builtin().unwrap();
        let partners = tables.inverse_partners(set(&[Functional]));
        assert!(partners.contains(&set(&[InverseFunctional])));
        assert_eq!(set(&[Functional, Irreflexive]).mirror(), set(&[InverseFunctional, Irreflexive]));
    }

    #[test]
    fn property_set_serializes_as_names() {
        let json = serde_json::to_string(&set(&[Asymmetric, Irreflexive])).unwrap();
        assert_eq!(json, r#"["owl:Irreflexive","owl:Asymmetric"]"#);
        let back: PropertySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set(&[Irreflexive, Asymmetric]));
    }

    #[test]
    fn unknown_flag_names_are_rejected() {
        let err = PropertyTables::from_json(r#"{"combinations":[["owl:Bogus"]],"inverse_of":[]}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::PropertyTable(_)));
    }
}
