//! Arrays and string-keyed maps.

use alloc::{
    borrow::Cow,
    collections::{BTreeMap, VecDeque},
    string::String,
    vec::Vec,
};

use bstr::BString;

use crate::{
    codec::{Decode, Encode, JsonValue, Kind},
    decoder::{Decoder, Members},
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError, ErrorKind},
};

/// Drives the members of an array, handing each item position to `item`.
///
/// The cursor must be on the opening bracket. Returns the offset of the
/// closing bracket.
fn decode_items(
    de: &mut Decoder<'_>,
    mut item: impl FnMut(&mut Decoder<'_>) -> Result<(), DecodeError>,
) -> Result<usize, DecodeError> {
    de.expect(b'[')?;
    let mut members = Members::new(de);
    loop {
        if de.skip_whitespace()? == b']' {
            members.close(de)?;
            let end = de.position();
            de.bump();
            return Ok(end);
        }
        members.member(de)?;
        item(de)?;
        members.separator(de)?;
    }
}

fn encode_items<'i, T, S>(
    items: impl IntoIterator<Item = &'i T>,
    enc: &mut Encoder<'_, S>,
) -> Result<(), EncodeError>
where
    T: Encode + 'i,
    S: Sink + ?Sized,
{
    enc.write(b"[")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            enc.write(b",")?;
        }
        item.encode(enc)?;
    }
    enc.write(b"]")
}

impl<T: JsonValue> JsonValue for [T] {
    const KIND: Kind = Kind::Array;
}

impl<T: Encode> Encode for [T] {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        encode_items(self, enc)
    }
}

impl<T: JsonValue> JsonValue for Vec<T> {
    const KIND: Kind = Kind::Array;
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.clear();
        decode_items(de, |de| {
            let mut item = T::default();
            de.decode_value(&mut item)?;
            self.push(item);
            Ok(())
        })
        .map(drop)
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        encode_items(self, enc)
    }
}

impl<T: JsonValue> JsonValue for VecDeque<T> {
    const KIND: Kind = Kind::Array;
}

impl<T: Decode + Default> Decode for VecDeque<T> {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.clear();
        decode_items(de, |de| {
            let mut item = T::default();
            de.decode_value(&mut item)?;
            self.push_back(item);
            Ok(())
        })
        .map(drop)
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        encode_items(self, enc)
    }
}

impl<T: JsonValue, const N: usize> JsonValue for [T; N] {
    const KIND: Kind = Kind::Array;
}

/// Exactly `N` items are required; the array is never resized.
impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        let mut filled = 0;
        let end = decode_items(de, |de| {
            let slot = self
                .get_mut(filled)
                .ok_or_else(|| de.error(ErrorKind::FixedSizeContainerOverflow))?;
            de.decode_value(slot)?;
            filled += 1;
            Ok(())
        })?;
        if filled < N {
            return Err(DecodeError::new(ErrorKind::FixedSizeContainerUnderflow, end));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.iter_mut().for_each(Decode::reset);
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        encode_items(self, enc)
    }
}

/// A type usable as the key of a JSON map.
pub trait MapKey: Sized {
    /// Builds a key from unescaped key text, or `None` if the bytes are not
    /// acceptable for this key type.
    fn from_key(bytes: Cow<'_, [u8]>) -> Option<Self>;

    /// The key text, before escaping.
    fn key_bytes(&self) -> &[u8];
}

impl MapKey for String {
    fn from_key(bytes: Cow<'_, [u8]>) -> Option<Self> {
        String::from_utf8(bytes.into_owned()).ok()
    }

    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl MapKey for BString {
    fn from_key(bytes: Cow<'_, [u8]>) -> Option<Self> {
        Some(BString::from(bytes.into_owned()))
    }

    fn key_bytes(&self) -> &[u8] {
        self
    }
}

/// Drives the members of an object, handing each key and value position to
/// `entry`. The cursor must be on the opening brace.
fn decode_entries<K: MapKey>(
    de: &mut Decoder<'_>,
    mut entry: impl FnMut(K, &mut Decoder<'_>) -> Result<(), DecodeError>,
) -> Result<(), DecodeError> {
    de.expect(b'{')?;
    let mut members = Members::new(de);
    loop {
        if de.skip_whitespace()? == b'}' {
            members.close(de)?;
            de.bump();
            return Ok(());
        }
        members.member(de)?;
        let raw = de.string_literal()?;
        let key = K::from_key(raw.unescaped()?)
            .ok_or(DecodeError::new(ErrorKind::UnexpectedSymbol, raw.start))?;
        de.skip_whitespace_until(b':')?;
        entry(key, de)?;
        members.separator(de)?;
    }
}

fn encode_entries<'i, K, V, S>(
    entries: impl IntoIterator<Item = (&'i K, &'i V)>,
    enc: &mut Encoder<'_, S>,
) -> Result<(), EncodeError>
where
    K: MapKey + 'i,
    V: Encode + 'i,
    S: Sink + ?Sized,
{
    enc.write(b"{")?;
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            enc.write(b",")?;
        }
        enc.write_str(key.key_bytes())?;
        enc.write(b":")?;
        value.encode(enc)?;
    }
    enc.write(b"}")
}

impl<K, V: JsonValue> JsonValue for BTreeMap<K, V> {
    const KIND: Kind = Kind::Map;
}

/// A repeated key keeps the last value.
impl<K: MapKey + Ord, V: Decode + Default> Decode for BTreeMap<K, V> {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.clear();
        decode_entries(de, |key: K, de| {
            let mut value = V::default();
            de.decode_value(&mut value)?;
            self.insert(key, value);
            Ok(())
        })
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl<K: MapKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        encode_entries(self, enc)
    }
}

#[cfg(feature = "std")]
mod hash_map {
    use core::hash::{BuildHasher, Hash};
    use std::collections::HashMap;

    use super::{MapKey, decode_entries, encode_entries};
    use crate::{
        codec::{Decode, Encode, JsonValue, Kind},
        decoder::Decoder,
        encoder::{Encoder, Sink},
        error::{DecodeError, EncodeError},
    };

    impl<K, V: JsonValue, H> JsonValue for HashMap<K, V, H> {
        const KIND: Kind = Kind::Map;
    }

    impl<K, V, H> Decode for HashMap<K, V, H>
    where
        K: MapKey + Eq + Hash,
        V: Decode + Default,
        H: BuildHasher,
    {
        fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
            self.clear();
            decode_entries(de, |key: K, de| {
                let mut value = V::default();
                de.decode_value(&mut value)?;
                self.insert(key, value);
                Ok(())
            })
        }

        fn reset(&mut self) {
            self.clear();
        }
    }

    /// Entries are written in the map's iteration order.
    impl<K: MapKey, V: Encode, H> Encode for HashMap<K, V, H> {
        fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
            encode_entries(self, enc)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{
        collections::{BTreeMap, VecDeque},
        string::{String, ToString},
        vec,
        vec::Vec,
    };

    use bstr::BString;
    use rstest::rstest;

    use crate::{DecodeFlags, ErrorKind, decode, to_string};

    fn fail<T: crate::Decode>(
        dest: &mut T,
        input: impl AsRef<[u8]>,
        flags: DecodeFlags,
    ) -> (ErrorKind, usize) {
        let err = decode(dest, input.as_ref(), flags).unwrap_err();
        (err.kind(), err.offset())
    }

    #[rstest]
    #[case("[]", &[])]
    #[case("[ 1 , 2,3 ]", &[1, 2, 3])]
    #[case("[1 2 3]", &[1, 2, 3])]
    #[case("[1, null, 3,]", &[1, 0, 3])]
    fn decodes_growable_arrays(#[case] input: &str, #[case] expected: &[i32]) {
        let mut out = vec![9, 9, 9, 9, 9];
        decode(&mut out, input.as_bytes(), DecodeFlags::empty()).unwrap();
        assert_eq!(out, expected);

        let mut deque = VecDeque::from([7]);
        decode(&mut deque, input.as_bytes(), DecodeFlags::empty()).unwrap();
        assert!(deque.iter().eq(expected.iter()));
    }

    #[test]
    fn strict_arrays_need_commas() {
        let mut out: Vec<i32> = Vec::new();
        assert_eq!(
            fail(&mut out, "[1 2]", DecodeFlags::STRICT_SYNTAX),
            (ErrorKind::UnexpectedSymbol, 3)
        );
        assert_eq!(
            fail(&mut out, "[1, 2,]", DecodeFlags::STRICT_SYNTAX),
            (ErrorKind::UnexpectedSymbol, 6)
        );
        assert_eq!(
            fail(&mut out, "[1, 2] x", DecodeFlags::STRICT_SYNTAX),
            (ErrorKind::UnexpectedSymbol, 7)
        );
    }

    #[test]
    fn fixed_arrays_never_resize() {
        let mut out = [0u8; 3];
        decode(&mut out, b"[4, 5, 6]", DecodeFlags::empty()).unwrap();
        assert_eq!(out, [4, 5, 6]);

        assert_eq!(
            fail(&mut out, "[1, 2]", DecodeFlags::empty()),
            (ErrorKind::FixedSizeContainerUnderflow, 5)
        );
        assert_eq!(
            fail(&mut out, "[1, 2, 3, 4]", DecodeFlags::empty()),
            (ErrorKind::FixedSizeContainerOverflow, 10)
        );

        decode(&mut out, b"null", DecodeFlags::empty()).unwrap();
        assert_eq!(out, [0, 0, 0]);
    }

    #[test]
    fn nested_arrays() {
        let mut out: Vec<[i8; 2]> = Vec::new();
        decode(&mut out, b"[[1,-1],[2,-2]]", DecodeFlags::empty()).unwrap();
        assert_eq!(out, [[1, -1], [2, -2]]);
        assert_eq!(to_string(&out).unwrap(), "[[1,-1],[2,-2]]");
    }

    #[test]
    fn maps_keep_the_last_duplicate() {
        let mut map: BTreeMap<String, u16> = BTreeMap::new();
        map.insert("stale".to_string(), 1);
        decode(
            &mut map,
            br#"{"b": 2, "a1": 1, "b": 3, "z": null}"#,
            DecodeFlags::empty(),
        )
        .unwrap();
        assert_eq!(
            map.into_iter().collect::<Vec<_>>(),
            [("a1".to_string(), 1), ("b".to_string(), 3), ("z".to_string(), 0)]
        );
    }

    #[test]
    fn map_keys_follow_their_type() {
        let mut text: BTreeMap<String, bool> = BTreeMap::new();
        assert_eq!(
            fail(&mut text, b"{\"ok\": true, \"\xff\": false}", DecodeFlags::empty()),
            (ErrorKind::UnexpectedSymbol, 13)
        );

        let mut bytes: BTreeMap<BString, bool> = BTreeMap::new();
        decode(&mut bytes, b"{\"\xff\": true}", DecodeFlags::empty()).unwrap();
        assert_eq!(bytes.get(&BString::from(&b"\xff"[..])), Some(&true));
    }

    #[test]
    fn map_members_need_colons() {
        let mut map: BTreeMap<String, u8> = BTreeMap::new();
        assert_eq!(
            fail(&mut map, r#"{"a" 1}"#, DecodeFlags::empty()),
            (ErrorKind::UnexpectedSymbol, 5)
        );
    }

    #[test]
    fn encodes_maps_with_escaped_keys() {
        let map = BTreeMap::from([("q\"".to_string(), vec![1.5f64]), ("e".to_string(), vec![])]);
        assert_eq!(to_string(&map).unwrap(), r#"{"e":[],"q\"":[1.5]}"#);
        assert_eq!(to_string(&BTreeMap::<String, u8>::new()).unwrap(), "{}");
    }

    #[cfg(feature = "std")]
    #[test]
    fn hash_maps_keep_the_last_duplicate() {
        use std::collections::HashMap;

        let mut map: HashMap<String, Option<u8>> =
            HashMap::from([("stale".to_string(), Some(1))]);
        decode(
            &mut map,
            br#"{"k": 1, "n": 5, "k": 2, "n": null}"#,
            DecodeFlags::empty(),
        )
        .unwrap();
        assert_eq!(
            map,
            HashMap::from([("k".to_string(), Some(2)), ("n".to_string(), None)])
        );

        decode(&mut map, b"null", DecodeFlags::empty()).unwrap();
        assert!(map.is_empty());

        let one = HashMap::from([("k\t".to_string(), vec![1u8, 2])]);
        assert_eq!(to_string(&one).unwrap(), r#"{"k\t":[1,2]}"#);
        assert_eq!(to_string(&HashMap::<String, u8>::new()).unwrap(), "{}");
    }
}
