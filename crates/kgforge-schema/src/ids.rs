//! Prefixed numeric identifiers (`C12`, `R3`, `E408`).
//!
//! Identifiers are ordered by their numeric suffix, which gives every
//! canonical pair key (`(min, max)`) a total, run-stable order. They
//! serialize as their display string so they can be used as JSON map keys.

/// Declare a `u32`-backed identifier rendered as `<prefix><n>`.
#[macro_export]
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub u32);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn index(self) -> u32 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::ids::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix($prefix)
                    .and_then(|digits| digits.parse::<u32>().ok())
                    .map($name)
                    .ok_or_else(|| $crate::ids::IdParseError {
                        expected_prefix: $prefix,
                        found: s.to_string(),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::ids::IdParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier `{found}` (expected `{expected_prefix}<number>`)")]
pub struct IdParseError {
    pub expected_prefix: &'static str,
    pub found: String,
}

prefixed_id!(
    /// A generated class. Numbering starts at 1.
    ClassId,
    "C"
);

prefixed_id!(
    /// A generated relation (object property). Numbering starts at 1.
    RelationId,
    "R"
);

/// Order two identifiers so that the smaller numeric suffix comes first.
pub fn canonical_pair<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let id = ClassId(17);
        assert_eq!(id.to_string(), "C17");
        assert_eq!("C17".parse::<ClassId>().unwrap(), id);
        assert!("R17".parse::<ClassId>().is_err());
        assert!("C".parse::<ClassId>().is_err());
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic() {
        assert!(ClassId(2) < ClassId(10));
        assert_eq!(canonical_pair(ClassId(10), ClassId(2)), (ClassId(2), ClassId(10)));
    }

    #[test]
    fn ids_are_json_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(RelationId(3), 1usize);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"R3":1}"#);
        let back: std::collections::BTreeMap<RelationId, usize> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
