//! Format-agnostic field tree used as the snapshot representation.
//!
//! [`FieldValue`] is what a [`Snapshot`](super::Snapshot) stores: a plain tree
//! of primitives, lists and ordered maps produced by running an object's
//! `serde::Serialize` implementation through [`to_field_value`]. Struct fields
//! keep their declaration order, which makes diffs stable and reproducible.
//!
//! [`from_field_value`] goes the other way and is used when a patched tree is
//! written back into a live object.

use std::fmt;

use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize};

use super::snapshot::SnapshotError;

/// A captured field value.
///
/// Structs, maps and enum payloads are all represented as [`FieldValue::Map`]
/// with entries in serialization order.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<FieldValue>),
    Map(Vec<(String, FieldValue)>),
    /// A present optional whose payload would itself capture as `Null` or
    /// `Some`, so `Some(None)` stays distinct from `None`. Other payloads are
    /// stored unwrapped.
    Some(Box<FieldValue>),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I64(_) => "i64",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Some(_) => "some",
        }
    }

    /// Structural equality where floats compare by bit pattern.
    ///
    /// Unlike `==`, a `NaN` field equals itself, so an untouched `NaN` never
    /// shows up as a change.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Self::Some(a), Self::Some(b)) => a.same_as(b),
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_as(vb))
            }
            _ => self == other,
        }
    }

    /// Looks up a map entry by key.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Converts any `T: Serialize` into a [`FieldValue`] tree.
pub fn to_field_value<T: Serialize + ?Sized>(value: &T) -> Result<FieldValue, SnapshotError> {
    value
        .serialize(FieldSerializer)
        .map_err(|e| SnapshotError::Serialize(e.0))
}

/// Rebuilds a `T` from a [`FieldValue`] tree.
pub fn from_field_value<T: DeserializeOwned>(value: FieldValue) -> Result<T, SnapshotError> {
    T::deserialize(FieldDeserializer(value)).map_err(|e| SnapshotError::Deserialize(e.0))
}

#[derive(Debug)]
struct FieldError(String);

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FieldError {}

impl ser::Error for FieldError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        FieldError(msg.to_string())
    }
}

impl de::Error for FieldError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        FieldError(msg.to_string())
    }
}

// ---------------------------------------------------------------------------
// Serialization: T -> FieldValue
// ---------------------------------------------------------------------------

struct FieldSerializer;

macro_rules! serialize_widened {
    ($($method:ident: $ty:ty => $variant:ident as $wide:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<FieldValue, FieldError> {
                Ok(FieldValue::$variant(v as $wide))
            }
        )*
    };
}

impl ser::Serializer for FieldSerializer {
    type Ok = FieldValue;
    type Error = FieldError;
    type SerializeSeq = ListBuilder;
    type SerializeTuple = ListBuilder;
    type SerializeTupleStruct = ListBuilder;
    type SerializeTupleVariant = VariantListBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantMapBuilder;

    serialize_widened! {
        serialize_i8: i8 => I64 as i64,
        serialize_i16: i16 => I64 as i64,
        serialize_i32: i32 => I64 as i64,
        serialize_i64: i64 => I64 as i64,
        serialize_u8: u8 => U64 as u64,
        serialize_u16: u16 => U64 as u64,
        serialize_u32: u32 => U64 as u64,
        serialize_u64: u64 => U64 as u64,
    }

    fn serialize_bool(self, v: bool) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Bool(v))
    }

    fn serialize_f32(self, v: f32) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<FieldValue, FieldError> {
        Ok(match value.serialize(self)? {
            inner @ (FieldValue::Null | FieldValue::Some(_)) => FieldValue::Some(Box::new(inner)),
            inner => inner,
        })
    }

    fn serialize_unit(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<FieldValue, FieldError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<FieldValue, FieldError> {
        let payload = value.serialize(FieldSerializer)?;
        Ok(FieldValue::Map(vec![(variant.to_owned(), payload)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ListBuilder, FieldError> {
        Ok(ListBuilder(Vec::with_capacity(len.unwrap_or(0))))
    }

    fn serialize_tuple(self, len: usize) -> Result<ListBuilder, FieldError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<ListBuilder, FieldError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantListBuilder, FieldError> {
        Ok(VariantListBuilder {
            variant,
            list: ListBuilder(Vec::with_capacity(len)),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, FieldError> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder, FieldError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantMapBuilder, FieldError> {
        Ok(VariantMapBuilder {
            variant,
            map: MapBuilder {
                entries: Vec::with_capacity(len),
                key: None,
            },
        })
    }
}

struct ListBuilder(Vec<FieldValue>);

impl ListBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FieldError> {
        self.0.push(value.serialize(FieldSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for ListBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FieldError> {
        self.push(value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::List(self.0))
    }
}

impl ser::SerializeTuple for ListBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FieldError> {
        self.push(value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::List(self.0))
    }
}

impl ser::SerializeTupleStruct for ListBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FieldError> {
        self.push(value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::List(self.0))
    }
}

struct VariantListBuilder {
    variant: &'static str,
    list: ListBuilder,
}

impl ser::SerializeTupleVariant for VariantListBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FieldError> {
        self.list.push(value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Map(vec![(
            self.variant.to_owned(),
            FieldValue::List(self.list.0),
        )]))
    }
}

struct MapBuilder {
    entries: Vec<(String, FieldValue)>,
    key: Option<String>,
}

impl MapBuilder {
    fn insert<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<(), FieldError> {
        self.entries.push((key, value.serialize(FieldSerializer)?));
        Ok(())
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), FieldError> {
        // Non-string keys are flattened to their debug form so every map
        // stays addressable by a field path segment.
        self.key = Some(match key.serialize(FieldSerializer)? {
            FieldValue::String(s) => s,
            FieldValue::I64(v) => v.to_string(),
            FieldValue::U64(v) => v.to_string(),
            FieldValue::Bool(v) => v.to_string(),
            other => format!("{other:?}"),
        });
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FieldError> {
        let key = self
            .key
            .take()
            .ok_or_else(|| FieldError("map value serialized before its key".into()))?;
        self.insert(key, value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Map(self.entries))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), FieldError> {
        self.insert(key.to_owned(), value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Map(self.entries))
    }
}

struct VariantMapBuilder {
    variant: &'static str,
    map: MapBuilder,
}

impl ser::SerializeStructVariant for VariantMapBuilder {
    type Ok = FieldValue;
    type Error = FieldError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), FieldError> {
        self.map.insert(key.to_owned(), value)
    }

    fn end(self) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::Map(vec![(
            self.variant.to_owned(),
            FieldValue::Map(self.map.entries),
        )]))
    }
}

// ---------------------------------------------------------------------------
// Deserialization: FieldValue -> T
// ---------------------------------------------------------------------------

struct FieldDeserializer(FieldValue);

fn parse_key<T: std::str::FromStr>(s: &str) -> Result<T, FieldError> {
    s.parse()
        .map_err(|_| FieldError(format!("cannot parse map key {s:?}")))
}

macro_rules! deserialize_narrowed {
    ($($method:ident => $wide:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
                self.$wide(visitor)
            }
        )*
    };
}

impl FieldDeserializer {
    fn mismatch(&self, expected: &str) -> FieldError {
        FieldError(format!("expected {expected}, found {}", self.0.kind()))
    }
}

impl<'de> de::Deserializer<'de> for FieldDeserializer {
    type Error = FieldError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::Null => visitor.visit_unit(),
            FieldValue::Bool(v) => visitor.visit_bool(v),
            FieldValue::I64(v) => visitor.visit_i64(v),
            FieldValue::U64(v) => visitor.visit_u64(v),
            FieldValue::F32(v) => visitor.visit_f32(v),
            FieldValue::F64(v) => visitor.visit_f64(v),
            FieldValue::String(v) => visitor.visit_string(v),
            FieldValue::Bytes(v) => visitor.visit_byte_buf(v),
            FieldValue::List(items) => visitor.visit_seq(ListAccess(items.into_iter())),
            FieldValue::Map(entries) => visitor.visit_map(EntryAccess {
                entries: entries.into_iter(),
                value: None,
            }),
            FieldValue::Some(inner) => visitor.visit_some(FieldDeserializer(*inner)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::String(s) => visitor.visit_bool(parse_key(&s)?),
            _ => self.deserialize_any(visitor),
        }
    }

    // Map keys come back as strings, so integer targets accept a numeric
    // string as well.
    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::U64(v) => visitor.visit_i64(v as i64),
            FieldValue::String(s) => visitor.visit_i64(parse_key(&s)?),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::I64(v) => visitor.visit_u64(v as u64),
            FieldValue::String(s) => visitor.visit_u64(parse_key(&s)?),
            _ => self.deserialize_any(visitor),
        }
    }

    deserialize_narrowed! {
        deserialize_i8 => deserialize_i64,
        deserialize_i16 => deserialize_i64,
        deserialize_i32 => deserialize_i64,
        deserialize_u8 => deserialize_u64,
        deserialize_u16 => deserialize_u64,
        deserialize_u32 => deserialize_u64,
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::F64(v) => visitor.visit_f32(v as f32),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::F32(v) => visitor.visit_f64(v as f64),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::Null => visitor.visit_none(),
            FieldValue::Some(inner) => visitor.visit_some(FieldDeserializer(*inner)),
            other => visitor.visit_some(FieldDeserializer(other)),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::List(items) => visitor.visit_seq(ListAccess(items.into_iter())),
            _ => Err(self.mismatch("list")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::Map(entries) => visitor.visit_map(EntryAccess {
                entries: entries.into_iter(),
                value: None,
            }),
            _ => Err(self.mismatch("map")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        match self.0 {
            FieldValue::String(variant) => visitor.visit_enum(VariantAccess {
                variant,
                payload: None,
            }),
            FieldValue::Map(entries) if entries.len() == 1 => {
                let mut entries = entries.into_iter();
                match entries.next() {
                    Some((variant, payload)) => visitor.visit_enum(VariantAccess {
                        variant,
                        payload: Some(payload),
                    }),
                    None => Err(FieldError("enum map is empty".into())),
                }
            }
            _ => Err(self.mismatch("enum variant")),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FieldError> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        i128 u128 char str string bytes byte_buf identifier
    }
}

struct ListAccess(std::vec::IntoIter<FieldValue>);

impl<'de> SeqAccess<'de> for ListAccess {
    type Error = FieldError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, FieldError> {
        self.0
            .next()
            .map(|item| seed.deserialize(FieldDeserializer(item)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct EntryAccess {
    entries: std::vec::IntoIter<(String, FieldValue)>,
    value: Option<FieldValue>,
}

impl<'de> MapAccess<'de> for EntryAccess {
    type Error = FieldError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, FieldError> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.value = Some(value);
        seed.deserialize(FieldDeserializer(FieldValue::String(key)))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, FieldError> {
        let value = self
            .value
            .take()
            .ok_or_else(|| FieldError("map value requested before its key".into()))?;
        seed.deserialize(FieldDeserializer(value))
    }
}

struct VariantAccess {
    variant: String,
    payload: Option<FieldValue>,
}

impl<'de> de::EnumAccess<'de> for VariantAccess {
    type Error = FieldError;
    type Variant = PayloadAccess;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, PayloadAccess), FieldError> {
        let tag = seed.deserialize(FieldDeserializer(FieldValue::String(self.variant)))?;
        Ok((tag, PayloadAccess(self.payload)))
    }
}

struct PayloadAccess(Option<FieldValue>);

impl PayloadAccess {
    fn take(self, what: &str) -> Result<FieldValue, FieldError> {
        self.0
            .ok_or_else(|| FieldError(format!("expected {what} variant, found unit variant")))
    }
}

impl<'de> de::VariantAccess<'de> for PayloadAccess {
    type Error = FieldError;

    fn unit_variant(self) -> Result<(), FieldError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, FieldError> {
        seed.deserialize(FieldDeserializer(self.take("newtype")?))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, FieldError> {
        de::Deserializer::deserialize_seq(FieldDeserializer(self.take("tuple")?), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, FieldError> {
        de::Deserializer::deserialize_map(FieldDeserializer(self.take("struct")?), visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Light {
        name: String,
        intensity: f32,
        color: [u8; 3],
        shadow: Option<Shadow>,
        mode: Mode,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Shadow {
        bias: f64,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Mode {
        Baked,
        Mixed(u32),
        Realtime { cascades: u8 },
    }

    fn light() -> Light {
        Light {
            name: "sun".into(),
            intensity: 2.5,
            color: [255, 240, 200],
            shadow: Some(Shadow { bias: 0.01 }),
            mode: Mode::Realtime { cascades: 4 },
        }
    }

    #[test]
    fn struct_fields_keep_declaration_order() {
        let FieldValue::Map(entries) = to_field_value(&light()).unwrap() else {
            panic!("struct should capture as a map");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["name", "intensity", "color", "shadow", "mode"]);
    }

    #[test]
    fn nested_struct_rebuilds() {
        let value = to_field_value(&light()).unwrap();
        let restored: Light = from_field_value(value).unwrap();
        assert_eq!(restored, light());
    }

    #[test]
    fn enum_variants_rebuild() {
        for mode in [Mode::Baked, Mode::Mixed(3), Mode::Realtime { cascades: 2 }] {
            let value = to_field_value(&mode).unwrap();
            let restored: Mode = from_field_value(value).unwrap();
            assert_eq!(restored, mode);
        }
    }

    #[test]
    fn none_captures_as_null() {
        let mut l = light();
        l.shadow = None;
        let value = to_field_value(&l).unwrap();
        assert_eq!(value.field("shadow"), Some(&FieldValue::Null));
    }

    #[test]
    fn nested_options_stay_distinct() {
        let cases: [Option<Option<u8>>; 3] = [None, Some(None), Some(Some(4))];
        for case in cases {
            let value = to_field_value(&case).unwrap();
            let restored: Option<Option<u8>> = from_field_value(value).unwrap();
            assert_eq!(restored, case);
        }
        assert_eq!(
            to_field_value(&Some(None::<u8>)).unwrap(),
            FieldValue::Some(Box::new(FieldValue::Null))
        );
        assert_eq!(to_field_value(&Some(4u8)).unwrap(), FieldValue::U64(4));
    }

    #[test]
    fn clearing_inner_option_is_a_change() {
        let before = to_field_value(&Some(None::<u8>)).unwrap();
        let after = to_field_value(&None::<Option<u8>>).unwrap();
        assert!(!before.same_as(&after));
    }

    #[test]
    fn integer_keys_are_stringified() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(7u32, "seven".to_string());
        let value = to_field_value(&map).unwrap();
        assert_eq!(
            value.field("7"),
            Some(&FieldValue::String("seven".into()))
        );
    }

    #[test]
    fn integer_keyed_map_rebuilds() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(3u16, true);
        map.insert(11u16, false);
        let restored: std::collections::BTreeMap<u16, bool> =
            from_field_value(to_field_value(&map).unwrap()).unwrap();
        assert_eq!(restored, map);
    }

    #[test]
    fn nan_is_same_as_itself() {
        let a = FieldValue::F32(f32::NAN);
        assert_ne!(a, a.clone());
        assert!(a.same_as(&a.clone()));
        assert!(!FieldValue::F32(1.0).same_as(&FieldValue::F32(2.0)));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let err = from_field_value::<Vec<u32>>(FieldValue::Bool(true)).unwrap_err();
        assert!(matches!(err, SnapshotError::Deserialize(_)));
    }
}
