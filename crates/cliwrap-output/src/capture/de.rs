// SPDX-License-Identifier: MIT OR Apache-2.0
//! serde `Deserializer` over a [`GroupMap`].
//!
//! Struct targets are filled field by field from the groups of the same
//! name. Every declared field is visited, so fields without a group, and
//! groups that captured nothing, take the field type's zero value.
//! Non-struct targets are read from the whole matched text.

use std::fmt;
use std::str::FromStr;

use serde::de::value::StrDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::Deserializer;
use serde_json::Value;

use super::GroupMap;
use super::convert::FieldConverters;

#[derive(Debug)]
pub(crate) struct DeError(String);

impl fmt::Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DeError {}

impl de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

fn from_json(err: serde_json::Error) -> DeError {
    DeError(err.to_string())
}

/// Deserialize a `T` from the groups of one match.
pub(crate) fn from_groups<T: DeserializeOwned>(
    groups: &GroupMap,
    converters: &FieldConverters,
) -> Result<T, DeError> {
    T::deserialize(GroupDeserializer { groups, converters })
}

struct GroupDeserializer<'a> {
    groups: &'a GroupMap,
    converters: &'a FieldConverters,
}

impl<'a> GroupDeserializer<'a> {
    fn whole(&self) -> CaptureValue<'a> {
        CaptureValue {
            captures: self.groups.whole(),
            converters: self.converters,
        }
    }
}

macro_rules! forward_to_whole {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
            self.whole().$method(visitor)
        }
    )*};
}

impl<'de> Deserializer<'de> for GroupDeserializer<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_map(Fields {
            names: self.groups.names(),
            groups: self.groups,
            converters: self.converters,
            current: ("", &[]),
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_map(Fields {
            names: fields.iter().copied(),
            groups: self.groups,
            converters: self.converters,
            current: ("", &[]),
        })
    }

    forward_to_whole! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_option deserialize_unit
        deserialize_seq deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.whole().deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.whole().deserialize_newtype_struct(name, visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.whole().deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.whole().deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.whole().deserialize_enum(name, variants, visitor)
    }
}

struct Fields<'a, I> {
    names: I,
    groups: &'a GroupMap,
    converters: &'a FieldConverters,
    current: (&'a str, &'a [String]),
}

impl<'de, 'a, I: Iterator<Item = &'a str>> MapAccess<'de> for Fields<'a, I> {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        let Some(name) = self.names.next() else {
            return Ok(None);
        };
        self.current = (name, self.groups.get(name));
        seed.deserialize(StrDeserializer::<DeError>::new(name))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
        let (name, captures) = self.current;
        seed.deserialize(CaptureValue {
            captures,
            converters: self.converters,
        })
        .map_err(|e| DeError(format!("field `{name}`: {e}")))
    }
}

/// The captures of one group, deserialized as a single value.
struct CaptureValue<'a> {
    captures: &'a [String],
    converters: &'a FieldConverters,
}

impl<'a> CaptureValue<'a> {
    fn last(&self) -> &'a str {
        self.captures.last().map(String::as_str).unwrap_or_default()
    }

    fn converted(&self, type_name: &str) -> Result<Option<Value>, DeError> {
        match self.converters.get(type_name) {
            Some(convert) => convert(self.captures).map(Some).map_err(DeError),
            None => Ok(None),
        }
    }

    fn parse<T>(&self) -> Result<T, DeError>
    where
        T: FromStr + Default,
        T::Err: fmt::Display,
    {
        let text = self.last().trim();
        if text.is_empty() {
            return Ok(T::default());
        }
        text.parse().map_err(|e| {
            DeError(format!(
                "cannot parse {text:?} as {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }
}

macro_rules! parse_primitive {
    ($($method:ident => $visit:ident($ty:ident)),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
            if let Some(value) = self.converted(stringify!($ty))? {
                return value.$method(visitor).map_err(from_json);
            }
            visitor.$visit(self.parse::<$ty>()?)
        }
    )*};
}

impl<'de> Deserializer<'de> for CaptureValue<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.last() {
            "" => visitor.visit_unit(),
            text => visitor.visit_str(text),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if let Some(value) = self.converted("bool")? {
            return value.deserialize_bool(visitor).map_err(from_json);
        }
        match self.last().trim() {
            "" => visitor.visit_bool(false),
            t if t.eq_ignore_ascii_case("true") => visitor.visit_bool(true),
            t if t.eq_ignore_ascii_case("false") => visitor.visit_bool(false),
            t => Err(DeError(format!("cannot parse {t:?} as bool"))),
        }
    }

    parse_primitive! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if let Some(value) = self.converted("String")? {
            return value.deserialize_string(visitor).map_err(from_json);
        }
        visitor.visit_string(self.last().to_string())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_bytes(self.last().as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_byte_buf(self.last().as_bytes().to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if self.last().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        if let Some(value) = self.converted(name)? {
            return value
                .deserialize_newtype_struct(name, visitor)
                .map_err(from_json);
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_seq(Elements {
            captures: self.captures.iter(),
            converters: self.converters,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        if let Some(value) = self.converted(name)? {
            return value.deserialize_seq(visitor).map_err(from_json);
        }
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, DeError> {
        Err(DeError("a single group cannot fill a map".into()))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.converted(name)? {
            Some(value) => value
                .deserialize_struct(name, fields, visitor)
                .map_err(from_json),
            None => Err(DeError(format!("no conversion registered for `{name}`"))),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        if let Some(value) = self.converted(name)? {
            return value
                .deserialize_enum(name, variants, visitor)
                .map_err(from_json);
        }
        StrDeserializer::<DeError>::new(self.last().trim()).deserialize_enum(name, variants, visitor)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_str(self.last())
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }
}

struct Elements<'a> {
    captures: std::slice::Iter<'a, String>,
    converters: &'a FieldConverters,
}

impl<'de> SeqAccess<'de> for Elements<'_> {
    type Error = DeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DeError> {
        match self.captures.next() {
            Some(capture) => seed
                .deserialize(CaptureValue {
                    captures: std::slice::from_ref(capture),
                    converters: self.converters,
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.captures.len())
    }
}
