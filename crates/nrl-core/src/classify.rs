//! Obstacle type classification from raw attribute records.

use crate::models::Attributes;

/// Schema families, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    Punkt,
    Mast,
    Luftspenn,
    Linje,
    Flate,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Punkt,
        Family::Mast,
        Family::Luftspenn,
        Family::Linje,
        Family::Flate,
    ];

    /// Attribute key carrying the type code for this family.
    pub fn type_key(self) -> &'static str {
        match self {
            Family::Punkt => "punktType",
            Family::Mast => "mastType",
            Family::Luftspenn => "luftspennType",
            Family::Linje => "linjeType",
            Family::Flate => "flateType",
        }
    }
}

/// A classified record: the family whose type key was present, and its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<'a> {
    pub family: Family,
    pub code: &'a str,
}

/// Determine the record's obstacle type.
///
/// Families are checked in priority order; the first key present wins. A
/// valid record carries exactly one family key, so the priority only matters
/// for malformed input. Returns `None` for records with no family key at all;
/// callers treat that as an unknown category, never as a failure.
pub fn classify(attributes: &Attributes) -> Option<Classified<'_>> {
    Family::ALL.into_iter().find_map(|family| {
        attributes
            .get(family.type_key())
            .map(|code| Classified { family, code })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_classify_each_family() {
        for (key, family) in [
            ("punktType", Family::Punkt),
            ("mastType", Family::Mast),
            ("luftspennType", Family::Luftspenn),
            ("linjeType", Family::Linje),
            ("flateType", Family::Flate),
        ] {
            let attributes = attrs(&[(key, "annet")]);
            let classified = classify(&attributes).unwrap();
            assert_eq!(classified.family, family);
            assert_eq!(classified.code, "annet");
        }
    }

    #[test]
    fn test_classify_priority_order() {
        // Should not occur in valid input, but the point family wins if it does.
        let attributes = attrs(&[("luftspennType", "høyspent"), ("punktType", "tårn")]);
        let classified = classify(&attributes).unwrap();
        assert_eq!(classified.family, Family::Punkt);
        assert_eq!(classified.code, "tårn");
    }

    #[test]
    fn test_classify_none_when_no_type_key() {
        let attributes = attrs(&[("status", "eksisterende"), ("navn", "Testen")]);
        assert!(classify(&attributes).is_none());
    }
}
