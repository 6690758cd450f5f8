//! Datatypes to better represent the domain of Pricewise.

use serde::{de, Deserialize, Serialize};
use std::fmt;

/// A number read from an untrusted upstream record.
///
/// Shopping providers report prices and ratings inconsistently: sometimes as
/// JSON numbers, sometimes as strings like `"4.5"` or `"4.5 stars"`, and
/// sometimes not at all. Deserializing this type never fails. Anything that
/// doesn't look like a finite number becomes `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LenientNumber(f64);

impl LenientNumber {
    /// The parsed value. Always finite.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Parse the leading numeric portion of `s`, the same way a browser's
    /// `parseFloat` would. Surrounding whitespace is ignored and trailing
    /// garbage is dropped, so `" 12.5 USD"` reads as `12.5`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim_start();
        let bytes = s.as_bytes();
        let mut end = 0;

        if matches!(bytes.first(), Some(b'+' | b'-')) {
            end += 1;
        }

        let int_start = end;
        while bytes.get(end).map_or(false, u8::is_ascii_digit) {
            end += 1;
        }
        let mut digits = end - int_start;

        if bytes.get(end) == Some(&b'.') {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while bytes.get(frac_end).map_or(false, u8::is_ascii_digit) {
                frac_end += 1;
            }
            digits += frac_end - frac_start;
            if digits > 0 {
                end = frac_end;
            }
        }

        if digits == 0 {
            return Self::default();
        }

        // An exponent only counts if at least one digit follows it.
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits_start = exp_end;
            while bytes.get(exp_end).map_or(false, u8::is_ascii_digit) {
                exp_end += 1;
            }
            if exp_end > exp_digits_start {
                end = exp_end;
            }
        }

        s[..end]
            .parse::<f64>()
            .map_or_else(|_| Self::default(), Self::from)
    }
}

impl From<f64> for LenientNumber {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Self(v)
        } else {
            Self::default()
        }
    }
}

impl<'de> Deserialize<'de> for LenientNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = LenientNumber;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a number, a numeric string, or anything else")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(v.into())
            }

            #[allow(clippy::cast_precision_loss)]
            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok((v as f64).into())
            }

            #[allow(clippy::cast_precision_loss)]
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok((v as f64).into())
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(LenientNumber::parse(v))
            }

            fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
                Ok(LenientNumber::default())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LenientNumber::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LenientNumber::default())
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                while seq.next_element::<de::IgnoredAny>()?.is_some() {}
                Ok(LenientNumber::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                while map
                    .next_entry::<de::IgnoredAny, de::IgnoredAny>()?
                    .is_some()
                {}
                Ok(LenientNumber::default())
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Deserialize an optional piece of text from an untrusted upstream record.
///
/// Strings are kept as they are. Numbers and booleans keep their JSON text, so
/// a numeric title of `7` reads as `"7"`. Nulls, lists and objects are
/// treated as absent. This never fails.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;

    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "a string, or anything else")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            while seq.next_element::<de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            while map
                .next_entry::<de::IgnoredAny, de::IgnoredAny>()?
                .is_some()
            {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::LenientNumber;
    use super::lenient_text;
    use parameterized::parameterized;
    use serde::Deserialize;
    use serde_json::json;

    #[parameterized(
        input = { "10", " 4.5 ", "4.5 stars", "1,299", ".5", "5.", "-3", "2e3", "2e", "1e-2x" },
        expected = { 10.0, 4.5, 4.5, 1.0, 0.5, 5.0, -3.0, 2000.0, 2.0, 0.01 },
    )]
    fn parses_leading_numbers(input: &str, expected: f64) {
        assert_eq!(LenientNumber::parse(input).value(), expected);
    }

    #[parameterized(input = { "", "abc", "₹1,299", ".", "-", "+.", "NaN", "Infinity", "e5" })]
    fn unparseable_strings_are_zero(input: &str) {
        assert_eq!(LenientNumber::parse(input).value(), 0.0);
    }

    #[test]
    fn non_finite_values_are_zero() {
        assert_eq!(LenientNumber::from(f64::NAN).value(), 0.0);
        assert_eq!(LenientNumber::from(f64::INFINITY).value(), 0.0);
        assert_eq!(LenientNumber::parse("1e999").value(), 0.0);
    }

    #[test]
    fn deserializes_from_any_json_shape() {
        let cases = vec![
            (json!(12), 12.0),
            (json!(12.25), 12.25),
            (json!("7.5"), 7.5),
            (json!(null), 0.0),
            (json!(true), 0.0),
            (json!([1, 2, 3]), 0.0),
            (json!({ "value": 3 }), 0.0),
        ];

        for (value, expected) in cases {
            let parsed: LenientNumber =
                serde_json::from_value(value.clone()).expect("deserialization never fails");
            assert_eq!(parsed.value(), expected, "for input {}", value);
        }
    }

    #[derive(Deserialize)]
    struct Labelled {
        #[serde(default, deserialize_with = "lenient_text")]
        label: Option<String>,
    }

    #[test]
    fn text_deserializes_from_any_json_shape() {
        let cases = vec![
            (json!({ "label": "Cable" }), Some("Cable")),
            (json!({ "label": 7 }), Some("7")),
            (json!({ "label": -2 }), Some("-2")),
            (json!({ "label": 4.5 }), Some("4.5")),
            (json!({ "label": true }), Some("true")),
            (json!({ "label": null }), None),
            (json!({ "label": ["a", "b"] }), None),
            (json!({ "label": { "text": "a" } }), None),
            (json!({}), None),
        ];

        for (value, expected) in cases {
            let parsed: Labelled =
                serde_json::from_value(value.clone()).expect("deserialization never fails");
            assert_eq!(parsed.label.as_deref(), expected, "for input {}", value);
        }
    }
}
