//! Scalar encoders: canonical textual forms for query parameter values.
//!
//! - integers are plain decimal digits
//! - dates are ISO 8601 with millisecond precision and a `Z` suffix
//! - enumerations use their wire name
//! - lists join their encoded elements with `,`; an empty list is an absent field and
//!   empty elements are rejected
//! - strings are percent-encoded for characters that would break a query pair or a list

use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{Result, SearchError};
use crate::time::Time;

/// Characters escaped inside a string value. `,` is included so list elements stay unambiguous.
const VALUE_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'=')
    .add(b'?');

/// A value that has a canonical query string representation
pub trait ToQueryValue {
    /// Encode the value in its canonical form
    fn to_query_value(&self) -> Result<String>;

    /// Whether a present value still renders as an absent field
    fn is_absent(&self) -> bool {
        false
    }
}

/// A value that can be read back from its canonical query string representation
pub trait FromQueryValue: Sized {
    fn from_query_value(raw: &str) -> Result<Self>;
}

macro_rules! impl_unsigned {
    ($($ty:ty),+) => {
        $(
            impl ToQueryValue for $ty {
                fn to_query_value(&self) -> Result<String> {
                    Ok(self.to_string())
                }
            }

            impl FromQueryValue for $ty {
                fn from_query_value(raw: &str) -> Result<Self> {
                    parse_digits(raw)?
                        .parse::<$ty>()
                        .map_err(|e| SearchError::Parse(format!("'{}': {}", raw, e)))
                }
            }
        )+
    };
}

impl_unsigned!(u32, u64, usize);

/// Validate the integer grammar: digits only, no sign, no leading zeros
fn parse_digits(raw: &str) -> Result<&str> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SearchError::Parse(format!("'{}' is not an unsigned integer", raw)));
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return Err(SearchError::Parse(format!("'{}' has leading zeros", raw)));
    }
    Ok(raw)
}

impl ToQueryValue for String {
    fn to_query_value(&self) -> Result<String> {
        Ok(utf8_percent_encode(self, VALUE_ESCAPE).to_string())
    }
}

impl FromQueryValue for String {
    fn from_query_value(raw: &str) -> Result<Self> {
        percent_decode_str(raw)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|e| SearchError::Parse(format!("'{}' is not valid UTF-8: {}", raw, e)))
    }
}

impl ToQueryValue for Time {
    fn to_query_value(&self) -> Result<String> {
        self.to_canonical()
    }
}

impl FromQueryValue for Time {
    fn from_query_value(raw: &str) -> Result<Self> {
        Time::parse_canonical(raw)
    }
}

impl ToQueryValue for DateTime<Utc> {
    fn to_query_value(&self) -> Result<String> {
        Time::new(*self).to_canonical()
    }
}

impl FromQueryValue for DateTime<Utc> {
    fn from_query_value(raw: &str) -> Result<Self> {
        Time::parse_canonical(raw).map(Time::into_inner)
    }
}

impl<T: ToQueryValue> ToQueryValue for Vec<T> {
    fn to_query_value(&self) -> Result<String> {
        let parts = self
            .iter()
            .map(ToQueryValue::to_query_value)
            .collect::<Result<Vec<_>>>()?;
        // An empty element cannot be told apart from a missing one
        if parts.iter().any(String::is_empty) {
            return Err(SearchError::Encoding("list contains an empty element".to_string()));
        }
        Ok(parts.join(","))
    }

    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: FromQueryValue> FromQueryValue for Vec<T> {
    fn from_query_value(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(SearchError::Parse("empty list".to_string()));
        }
        raw.split(',')
            .map(|element| {
                if element.is_empty() {
                    return Err(SearchError::Parse(format!("'{}' has an empty list element", raw)));
                }
                T::from_query_value(element)
            })
            .collect()
    }
}

/// Declare an enumeration whose query and JSON form is a fixed wire name.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name used on the wire
            pub fn wire_name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }

            /// Look up a variant by its wire name
            pub fn from_wire_name(raw: &str) -> Option<Self> {
                match raw {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.wire_name())
            }
        }

        impl $crate::encoding::ToQueryValue for $name {
            fn to_query_value(&self) -> $crate::error::Result<String> {
                Ok(self.wire_name().to_string())
            }
        }

        impl $crate::encoding::FromQueryValue for $name {
            fn from_query_value(raw: &str) -> $crate::error::Result<Self> {
                $name::from_wire_name(raw).ok_or_else(|| {
                    $crate::error::SearchError::Parse(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        raw
                    ))
                })
            }
        }
    };
}

pub(crate) use wire_enum;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    wire_enum! {
        pub enum Color {
            DeepRed => "deepRed",
            Blue => "blue",
        }
    }

    #[test]
    fn test_integers() {
        assert_eq!(42u32.to_query_value().unwrap(), "42");
        assert_eq!(0usize.to_query_value().unwrap(), "0");
        assert_eq!(u64::from_query_value("99").unwrap(), 99);
        assert_eq!(u64::from_query_value("0").unwrap(), 0);

        for raw in ["", "007", "-1", "+1", "1_000", "1 000", "4.5"] {
            assert!(u64::from_query_value(raw).is_err(), "accepted {:?}", raw);
        }
        assert!(u32::from_query_value("4294967296").is_err());
    }

    #[test]
    fn test_dates() {
        let dt = Utc.with_ymd_and_hms(2019, 3, 22, 10, 7, 1).unwrap();
        assert_eq!(dt.to_query_value().unwrap(), "2019-03-22T10:07:01.000Z");
        assert_eq!(
            DateTime::<Utc>::from_query_value("2019-03-22T10:07:01.000Z").unwrap(),
            dt
        );
    }

    #[test]
    fn test_enums_use_wire_names() {
        assert_eq!(Color::DeepRed.to_query_value().unwrap(), "deepRed");
        assert_eq!(Color::from_query_value("blue").unwrap(), Color::Blue);
        assert!(Color::from_query_value("DeepRed").is_err());
        assert_eq!(serde_json::to_string(&Color::DeepRed).unwrap(), "\"deepRed\"");
    }

    #[test]
    fn test_lists() {
        let colors = vec![Color::Blue, Color::DeepRed];
        assert_eq!(colors.to_query_value().unwrap(), "blue,deepRed");
        assert!(!colors.is_absent());
        assert!(Vec::<Color>::new().is_absent());

        let fields = vec!["a,b".to_string(), "c".to_string()];
        let encoded = fields.to_query_value().unwrap();
        assert_eq!(encoded, "a%2Cb,c");
        assert_eq!(Vec::<String>::from_query_value(&encoded).unwrap(), fields);
    }

    #[test]
    fn test_lists_reject_empty_elements() {
        for fields in [vec![String::new()], vec!["a".to_string(), String::new()]] {
            assert!(matches!(fields.to_query_value(), Err(SearchError::Encoding(_))));
        }

        for raw in ["a,", ",a", "a,,b"] {
            assert!(
                matches!(Vec::<String>::from_query_value(raw), Err(SearchError::Parse(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_strings() {
        let value = "genre = sci-fi & year".to_string();
        let encoded = value.to_query_value().unwrap();
        assert_eq!(encoded, "genre%20%3D%20sci-fi%20%26%20year");
        assert_eq!(String::from_query_value(&encoded).unwrap(), value);

        assert_eq!("movies_2".to_string().to_query_value().unwrap(), "movies_2");
        assert!(String::from_query_value("%FF").is_err());
    }
}
