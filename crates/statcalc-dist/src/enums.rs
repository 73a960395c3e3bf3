//! Closed enumerations for comparison modes and alternative hypotheses.
//!
//! Each enum has:
//! - `as_str()` and `Display` (snake_case canonical name)
//! - `FromStr` accepting the canonical name plus aliases, case-insensitive,
//!   with spaces and dashes treated as underscores
//! - Serialize/Deserialize through the canonical name

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DistError;

// ---------------------------------------------------------------------------
// Macro: closed enum with canonical names and accepted aliases.
// ---------------------------------------------------------------------------
macro_rules! define_choice {
    (
        $(#[$meta:meta])*
        $name:ident, kind = $kind:expr, default = $default:ident,
        variants: [
            $( $(#[$vmeta:meta])* ($variant:ident, $str:expr, [$($alias:expr),* $(,)?]) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Returns the canonical string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DistError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = s.trim().to_lowercase().replace([' ', '-'], "_");
                $(
                    if key == $str $( || key == $alias )* {
                        return Ok(Self::$variant);
                    }
                )+
                Err(DistError::InvalidChoice {
                    kind: $kind,
                    value: s.to_string(),
                    expected: [$( $str ),+].join(", "),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_choice! {
    /// How an observed count is compared against `k`.
    Comparison, kind = "comparison mode", default = Exactly,
    variants: [
        /// P(X <= k) = F(k)
        (AtMost, "at_most", ["hoechstens", "höchstens", "le", "max", "<="]),
        /// P(X >= k) = 1 - F(k - 1)
        (AtLeast, "at_least", ["mindestens", "ge", "min", ">="]),
        /// P(X = k) = f(k)
        (Exactly, "exactly", ["genau", "exact", "eq", "="]),
        /// P(X > k) = 1 - F(k)
        (MoreThan, "more_than", ["mehr_als", "gt", ">"]),
        /// P(X < k) = F(k - 1)
        (LessThan, "less_than", ["weniger_als", "lt", "<"]),
    ]
}

define_choice! {
    /// Shape of the alternative hypothesis.
    Tail, kind = "test side", default = TwoSided,
    variants: [
        (TwoSided, "two_sided", ["zweiseitig", "zwei_seitig", "beidseitig", "two", "both"]),
        (Left, "left", ["einseitig_links", "links", "left_tailed", "less"]),
        (Right, "right", ["einseitig_rechts", "rechts", "right_tailed", "greater"]),
    ]
}

impl Comparison {
    /// Relational operator used in `P(X op k)`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::AtMost => "<=",
            Comparison::AtLeast => ">=",
            Comparison::Exactly => "=",
            Comparison::MoreThan => ">",
            Comparison::LessThan => "<",
        }
    }

    /// The CDF combinator this mode evaluates, in terms of `F` and `f`.
    pub fn combinator(&self, k: u64) -> String {
        match self {
            Comparison::AtMost => format!("F({k})"),
            Comparison::AtLeast if k == 0 => "1".to_string(),
            Comparison::AtLeast => format!("1 - F({})", k - 1),
            Comparison::Exactly => format!("f({k})"),
            Comparison::MoreThan => format!("1 - F({k})"),
            Comparison::LessThan if k == 0 => "0".to_string(),
            Comparison::LessThan => format!("F({})", k - 1),
        }
    }
}

impl Tail {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Tail::TwoSided => "two-sided",
            Tail::Left => "left-tailed",
            Tail::Right => "right-tailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_aliases() {
        assert_eq!("hoechstens".parse::<Comparison>().unwrap(), Comparison::AtMost);
        assert_eq!("Höchstens".parse::<Comparison>().unwrap(), Comparison::AtMost);
        assert_eq!("mehr als".parse::<Comparison>().unwrap(), Comparison::MoreThan);
        assert_eq!("at-least".parse::<Comparison>().unwrap(), Comparison::AtLeast);
        assert_eq!("genau".parse::<Comparison>().unwrap(), Comparison::Exactly);
        assert_eq!("weniger_als".parse::<Comparison>().unwrap(), Comparison::LessThan);
    }

    #[test]
    fn comparison_rejects_unknown() {
        let err = "ungefaehr".parse::<Comparison>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid comparison mode 'ungefaehr' (expected one of: at_most, at_least, exactly, more_than, less_than)"
        );
    }

    #[test]
    fn tail_aliases_and_default() {
        assert_eq!("links".parse::<Tail>().unwrap(), Tail::Left);
        assert_eq!("einseitig rechts".parse::<Tail>().unwrap(), Tail::Right);
        assert_eq!("beidseitig".parse::<Tail>().unwrap(), Tail::TwoSided);
        assert!(Tail::default().is_default());
        assert_eq!(Tail::default(), Tail::TwoSided);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&Comparison::AtLeast).unwrap();
        assert_eq!(json, r#""at_least""#);
        let back: Tail = serde_json::from_str(r#""rechts""#).unwrap();
        assert_eq!(back, Tail::Right);
    }

    #[test]
    fn combinators() {
        assert_eq!(Comparison::AtLeast.combinator(7), "1 - F(6)");
        assert_eq!(Comparison::AtLeast.combinator(0), "1");
        assert_eq!(Comparison::LessThan.combinator(0), "0");
    }
}
