//! Records: JSON objects with a fixed, statically described set of fields.
//!
//! A [`Record`] publishes two tables. [`Record::FIELDS`] lists every field in
//! declaration order, including fields excluded from mapping. [`Record::KEYS`]
//! holds only the mapped fields, sorted by name, and is what the decoder
//! searches when it meets a key. Both are associated constants, so they are
//! built once per type and shared by every value.
//!
//! [`decode_record`] is the object state machine: it reads keys, dispatches
//! values to fields through [`Record::decode_field`], tracks which fields were
//! seen in a [`FilledFields`] set and settles the unseen ones at the closing
//! brace according to the [`DecodeFlags`].

use alloc::{vec, vec::Vec};

use bstr::BStr;

use crate::{
    codec::Kind,
    decoder::{Decoder, Members},
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError, ErrorKind},
    options::DecodeFlags,
};

/// One field of a record, as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    index: usize,
    kind: Option<Kind>,
}

impl FieldDescriptor {
    /// A field read from and written to JSON under `name`.
    #[must_use]
    pub const fn mapped(name: &'static str, index: usize, kind: Kind) -> Self {
        Self {
            name,
            index,
            kind: Some(kind),
        }
    }

    /// A field the codec never touches.
    #[must_use]
    pub const fn unmapped(name: &'static str, index: usize) -> Self {
        Self {
            name,
            index,
            kind: None,
        }
    }

    /// The JSON key, or the Rust field name for unmapped fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declaration position within the record.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The JSON shape of the field, `None` if it is not mapped.
    #[must_use]
    pub const fn kind(&self) -> Option<Kind> {
        self.kind
    }

    /// Whether the field takes part in JSON mapping.
    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        self.kind.is_some()
    }
}

/// A key of a [`KeyIndex`] and the field it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    name: &'static str,
    field: usize,
}

impl KeyEntry {
    /// Maps `name` to the field declared at position `field`.
    #[must_use]
    pub const fn new(name: &'static str, field: usize) -> Self {
        Self { name, field }
    }

    /// The JSON key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declaration position of the selected field.
    #[must_use]
    pub const fn field(&self) -> usize {
        self.field
    }
}

/// The mapped keys of a record, sorted by their bytes.
///
/// Lookups are exact byte comparisons on unescaped key text. A position
/// returned by a lookup is the key's rank in this table; it is what
/// [`FilledFields`] is indexed by.
#[derive(Debug, Clone, Copy)]
pub struct KeyIndex {
    entries: &'static [KeyEntry],
}

const fn precedes(a: &[u8], b: &[u8]) -> bool {
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if a[i] != b[i] {
            return a[i] < b[i];
        }
        i += 1;
    }
    a.len() < b.len()
}

const fn is_printable(name: &[u8]) -> bool {
    let mut i = 0;
    while i < name.len() {
        if name[i] < 0x20 || name[i] == b'"' || name[i] == b'\\' {
            return false;
        }
        i += 1;
    }
    true
}

impl KeyIndex {
    /// Wraps a table of entries.
    ///
    /// # Panics
    ///
    /// When the entries are not strictly ascending by name, or a name
    /// contains a control byte, `"` or `\`. In a constant this surfaces as a
    /// compile error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonshape::{KeyEntry, KeyIndex};
    ///
    /// const KEYS: KeyIndex = {
    ///     const ENTRIES: &[KeyEntry] = &[KeyEntry::new("id", 1), KeyEntry::new("name", 0)];
    ///     KeyIndex::new(ENTRIES)
    /// };
    /// assert_eq!(KEYS.find(b"name"), Some((1, 0)));
    /// assert_eq!(KEYS.find(b"nam"), None);
    /// ```
    #[must_use]
    pub const fn new(entries: &'static [KeyEntry]) -> Self {
        let mut i = 0;
        while i < entries.len() {
            assert!(
                is_printable(entries[i].name.as_bytes()),
                "record key contains a control byte, quote or backslash"
            );
            if i > 0 {
                assert!(
                    precedes(entries[i - 1].name.as_bytes(), entries[i].name.as_bytes()),
                    "record keys must be unique and sorted"
                );
            }
            i += 1;
        }
        Self { entries }
    }

    /// Number of mapped keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record maps no keys at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sorted entries.
    #[must_use]
    pub const fn entries(&self) -> &'static [KeyEntry] {
        self.entries
    }

    /// Binary search for `key`, returning its position and field index.
    #[must_use]
    pub fn find(&self, key: &[u8]) -> Option<(usize, usize)> {
        let pos = self
            .entries
            .binary_search_by(|entry| entry.name.as_bytes().cmp(key))
            .ok()?;
        Some((pos, self.entries[pos].field))
    }

    /// Starts an incremental lookup fed one key byte at a time.
    #[must_use]
    pub fn matcher(&self) -> KeyMatcher {
        KeyMatcher {
            entries: self.entries,
            low: 0,
            high: self.entries.len(),
            depth: 0,
        }
    }
}

/// Incremental key lookup over a [`KeyIndex`].
///
/// Keeps the `[low, high)` range of entries whose names start with the bytes
/// pushed so far. Gives the same answers as [`KeyIndex::find`].
///
/// ```rust
/// use jsonshape::{KeyEntry, KeyIndex};
///
/// static ENTRIES: [KeyEntry; 3] = [
///     KeyEntry::new("a", 0),
///     KeyEntry::new("ab", 1),
///     KeyEntry::new("b", 2),
/// ];
/// let keys = KeyIndex::new(&ENTRIES);
///
/// let mut m = keys.matcher();
/// assert!(m.push(b'a'));
/// assert_eq!(m.finish(), Some((0, 0)));
/// assert!(m.push(b'b'));
/// assert_eq!(m.finish(), Some((1, 1)));
/// assert!(!m.push(b'c'));
/// ```
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    entries: &'static [KeyEntry],
    low: usize,
    high: usize,
    depth: usize,
}

impl KeyMatcher {
    /// Narrows the range by the next key byte. Returns whether any key still
    /// has the pushed prefix.
    pub fn push(&mut self, byte: u8) -> bool {
        let depth = self.depth;
        let range = &self.entries[self.low..self.high];
        // Inside the range every name shares the first `depth` bytes, so the
        // names are ordered by their byte at `depth`, shorter names first.
        let start = range.partition_point(|e| {
            e.name.as_bytes().get(depth).is_none_or(|&b| b < byte)
        });
        let end = range.partition_point(|e| {
            e.name.as_bytes().get(depth).is_none_or(|&b| b <= byte)
        });
        self.high = self.low + end;
        self.low += start;
        self.depth += 1;
        self.low < self.high
    }

    /// The entry equal to the pushed bytes, as position and field index.
    #[must_use]
    pub fn finish(&self) -> Option<(usize, usize)> {
        if self.low == self.high {
            return None;
        }
        let entry = self.entries.get(self.low)?;
        (entry.name.len() == self.depth).then_some((self.low, entry.field))
    }
}

/// Which mapped fields of one object have been seen.
///
/// Indexed by [`KeyIndex`] position. The first 64 fields live inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledFields {
    inline: u64,
    spill: Vec<u64>,
}

impl FilledFields {
    /// An empty set sized for `len` fields.
    #[must_use]
    pub fn new(len: usize) -> Self {
        let spill = if len > 64 {
            vec![0; (len - 64).div_ceil(64)]
        } else {
            Vec::new()
        };
        Self { inline: 0, spill }
    }

    fn word(&mut self, pos: usize) -> Option<&mut u64> {
        match pos / 64 {
            0 => Some(&mut self.inline),
            n => self.spill.get_mut(n - 1),
        }
    }

    /// Marks the field at `pos`. Positions beyond the sized length are
    /// ignored.
    pub fn set(&mut self, pos: usize) {
        if let Some(word) = self.word(pos) {
            *word |= 1 << (pos % 64);
        }
    }

    /// Whether the field at `pos` was marked.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        let word = match pos / 64 {
            0 => self.inline,
            n => self.spill.get(n - 1).copied().unwrap_or(0),
        };
        word & (1 << (pos % 64)) != 0
    }
}

/// Field-level access to a record, usually derived with `#[derive(Record)]`.
///
/// Field indices are declaration positions, as in [`FieldDescriptor::index`].
pub trait Record {
    /// Every field in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    /// The mapped fields by key.
    const KEYS: KeyIndex;

    /// Decodes the value under the cursor into field `field`.
    ///
    /// # Errors
    ///
    /// The field's decode error, or [`ErrorKind::InternalError`] when the
    /// record has no mapped field `field`.
    fn decode_field(&mut self, field: usize, de: &mut Decoder<'_>) -> Result<(), DecodeError>;

    /// Resets field `field` to its default value.
    fn reset_field(&mut self, field: usize);

    /// Encodes field `field`.
    ///
    /// # Errors
    ///
    /// The field's encode error.
    fn encode_field<S: Sink + ?Sized>(
        &self,
        field: usize,
        enc: &mut Encoder<'_, S>,
    ) -> Result<(), EncodeError>;
}

/// Decodes a JSON object into `record`.
///
/// The cursor must be on the opening brace. Unknown keys are skipped (or
/// rejected with [`ErrorKind::ExcessField`]), a `null` resets its field
/// without entering the field's decoder, and a repeated key decodes again so
/// the last occurrence wins. Mapped fields absent from the object are reset,
/// or rejected with [`ErrorKind::MissingField`].
///
/// # Errors
///
/// The first syntax, field or policy error.
pub fn decode_record<R: Record + ?Sized>(
    record: &mut R,
    de: &mut Decoder<'_>,
) -> Result<(), DecodeError> {
    let keys = R::KEYS;
    let flags = de.flags();
    de.expect(b'{')?;
    let mut filled = FilledFields::new(keys.len());
    let mut members = Members::new(de);
    loop {
        if de.skip_whitespace()? == b'}' {
            members.close(de)?;
            settle_absent(record, &keys, &filled, de.position(), flags)?;
            de.bump();
            return Ok(());
        }
        members.member(de)?;
        let raw = de.string_literal()?;
        let key = raw.unescaped()?;
        de.skip_whitespace_until(b':')?;
        de.skip_whitespace()?;
        let null = de.at_null();

        match keys.find(&key) {
            Some((pos, field)) => {
                if null {
                    de.pos += 4;
                    record.reset_field(field);
                } else {
                    record.decode_field(field, de)?;
                }
                filled.set(pos);
            }
            None if flags.contains(DecodeFlags::EXCESS_FIELDS_PROHIBITED) => {
                return Err(DecodeError::new(ErrorKind::ExcessField, raw.start));
            }
            None => {
                log::trace!("skipping unknown field {:?}", BStr::new(&key));
                if null {
                    de.pos += 4;
                } else {
                    de.skip_value(de.max_skip_depth())?;
                }
            }
        }
        members.separator(de)?;
    }
}

fn settle_absent<R: Record + ?Sized>(
    record: &mut R,
    keys: &KeyIndex,
    filled: &FilledFields,
    close: usize,
    flags: DecodeFlags,
) -> Result<(), DecodeError> {
    let required = flags.contains(DecodeFlags::ALL_FIELDS_REQUIRED);
    for (pos, entry) in keys.entries().iter().enumerate() {
        if filled.contains(pos) {
            continue;
        }
        if required {
            return Err(DecodeError::new(ErrorKind::MissingField, close));
        }
        record.reset_field(entry.field());
    }
    Ok(())
}

/// Resets every mapped field; unmapped fields keep their values.
pub fn reset_record<R: Record + ?Sized>(record: &mut R) {
    for field in R::FIELDS.iter().filter(|f| f.is_mapped()) {
        record.reset_field(field.index());
    }
}

/// Encodes the mapped fields of `record` as a JSON object in declaration
/// order.
///
/// # Errors
///
/// The first field encode error or sink rejection.
pub fn encode_record<R: Record + ?Sized, S: Sink + ?Sized>(
    record: &R,
    enc: &mut Encoder<'_, S>,
) -> Result<(), EncodeError> {
    let last = R::FIELDS
        .iter()
        .rfind(|f| f.is_mapped())
        .map(FieldDescriptor::index);
    enc.write(b"{")?;
    for field in R::FIELDS.iter().filter(|f| f.is_mapped()) {
        enc.write(b"\"")?;
        enc.write(field.name().as_bytes())?;
        enc.write(b"\":")?;
        record.encode_field(field.index(), enc)?;
        if Some(field.index()) != last {
            enc.write(b",")?;
        }
    }
    enc.write(b"}")
}

#[cfg(test)]
mod tests {
    use alloc::{
        string::{String, ToString},
        vec,
        vec::Vec,
    };

    use rstest::rstest;

    use super::{FieldDescriptor, FilledFields, KeyEntry, KeyIndex, Record};
    use crate::{
        Decode, DecodeError, DecodeFlags, DecodeOptions, Decoder, Encode, EncodeError, Encoder,
        ErrorKind, JsonValue, Kind, Sink, decode, decode_with_options, to_string,
    };

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        name: String,
        seen: u32,
        id: u64,
        tags: Vec<String>,
    }

    impl JsonValue for Account {
        const KIND: Kind = Kind::Object;
    }

    impl Record for Account {
        const FIELDS: &'static [FieldDescriptor] = &[
            FieldDescriptor::mapped("name", 0, Kind::Plain),
            FieldDescriptor::unmapped("seen", 1),
            FieldDescriptor::mapped("id", 2, Kind::Plain),
            FieldDescriptor::mapped("tags", 3, Kind::Array),
        ];

        const KEYS: KeyIndex = {
            const ENTRIES: &[KeyEntry] = &[
                KeyEntry::new("id", 2),
                KeyEntry::new("name", 0),
                KeyEntry::new("tags", 3),
            ];
            KeyIndex::new(ENTRIES)
        };

        fn decode_field(&mut self, field: usize, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
            match field {
                0 => de.decode_value(&mut self.name),
                2 => de.decode_value(&mut self.id),
                3 => de.decode_value(&mut self.tags),
                _ => Err(de.error(ErrorKind::InternalError)),
            }
        }

        fn reset_field(&mut self, field: usize) {
            match field {
                0 => self.name.reset(),
                2 => self.id.reset(),
                3 => self.tags.reset(),
                _ => {}
            }
        }

        fn encode_field<S: Sink + ?Sized>(
            &self,
            field: usize,
            enc: &mut Encoder<'_, S>,
        ) -> Result<(), EncodeError> {
            match field {
                0 => self.name.encode(enc),
                2 => self.id.encode(enc),
                3 => self.tags.encode(enc),
                _ => Ok(()),
            }
        }
    }

    impl Decode for Account {
        fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
            super::decode_record(self, de)
        }

        fn reset(&mut self) {
            super::reset_record(self);
        }
    }

    impl Encode for Account {
        fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
            super::encode_record(self, enc)
        }
    }

    fn account() -> Account {
        Account {
            name: "old".to_string(),
            seen: 7,
            id: 99,
            tags: vec!["t".to_string()],
        }
    }

    fn run(input: &str, flags: DecodeFlags) -> Result<Account, (ErrorKind, usize)> {
        let mut out = account();
        decode(&mut out, input.as_bytes(), flags).map_err(|e| (e.kind(), e.offset()))?;
        Ok(out)
    }

    #[test]
    fn decodes_fields_in_any_order() {
        let out = run(
            r#"{"tags": ["a", "b"], "id": 5, "name": "n"}"#,
            DecodeFlags::empty(),
        )
        .unwrap();
        assert_eq!(
            out,
            Account {
                name: "n".to_string(),
                seen: 7,
                id: 5,
                tags: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn skips_unknown_fields() {
        let out = run(
            r#"{"id": 1, "extra": {"deep": [1, {"x": null}]}, "more": null, "name": "n", "tags": []}"#,
            DecodeFlags::empty(),
        )
        .unwrap();
        assert_eq!((out.id, out.name.as_str()), (1, "n"));
    }

    #[test]
    fn excess_field_points_at_the_key() {
        assert_eq!(
            run(r#"{"id": 1,  "extra": 2}"#, DecodeFlags::EXCESS_FIELDS_PROHIBITED),
            Err((ErrorKind::ExcessField, 11))
        );
    }

    #[test]
    fn absent_fields_reset_or_fail() {
        let out = run(r#"{"id": 3}"#, DecodeFlags::empty()).unwrap();
        assert_eq!(
            out,
            Account {
                name: String::new(),
                seen: 7,
                id: 3,
                tags: Vec::new(),
            }
        );

        assert_eq!(
            run(r#"{"id": 3, "name": "x" }"#, DecodeFlags::ALL_FIELDS_REQUIRED),
            Err((ErrorKind::MissingField, 22))
        );
        assert!(
            run(
                r#"{"id": 3, "name": "x", "tags": null}"#,
                DecodeFlags::ALL_FIELDS_REQUIRED
            )
            .is_ok()
        );
    }

    #[test]
    fn null_resets_without_entering_the_field() {
        let out = run(r#"{"tags": null, "id": null, "name": "z"}"#, DecodeFlags::empty()).unwrap();
        assert!(out.tags.is_empty());
        assert_eq!(out.id, 0);

        let mut whole = account();
        decode(&mut whole, b"null", DecodeFlags::empty()).unwrap();
        assert_eq!(
            whole,
            Account {
                seen: 7,
                ..Account::default()
            }
        );
    }

    #[test]
    fn last_duplicate_wins() {
        let out = run(r#"{"id": 1, "id": 2, "name": "a", "name": "b"}"#, DecodeFlags::empty())
            .unwrap();
        assert_eq!((out.id, out.name.as_str()), (2, "b"));
    }

    #[test]
    fn escaped_keys_are_unescaped_before_lookup() {
        let out = run(r#"{"n\u0061me": "esc", "\u0069d": 4}"#, DecodeFlags::empty()).unwrap();
        assert_eq!((out.id, out.name.as_str()), (4, "esc"));
    }

    #[rstest]
    #[case(r#"{"id" 1}"#, ErrorKind::UnexpectedSymbol, 6)]
    #[case(r"{id: 1}", ErrorKind::UnexpectedSymbol, 1)]
    #[case(r#"{"id": 1"#, ErrorKind::UnexpectedEndOfData, 8)]
    #[case(r#"["id"]"#, ErrorKind::UnexpectedSymbol, 0)]
    #[case(r#"{"id": "1"}"#, ErrorKind::IllformedNumber, 7)]
    #[case(r#"{"x": tru}"#, ErrorKind::SkippingError, 6)]
    fn malformed_objects(#[case] input: &str, #[case] kind: ErrorKind, #[case] offset: usize) {
        assert_eq!(run(input, DecodeFlags::empty()), Err((kind, offset)));
    }

    #[test]
    fn unknown_values_respect_the_skip_depth() {
        let options = DecodeOptions {
            max_skip_depth: 2,
            ..DecodeOptions::default()
        };
        let mut out = account();
        assert!(decode_with_options(&mut out, br#"{"x": [1]}"#, options).is_ok());
        let err = decode_with_options(&mut out, br#"{"x": [[1]]}"#, options).unwrap_err();
        assert_eq!((err.kind(), err.offset()), (ErrorKind::SkippingMaxRecursion, 8));
    }

    #[test]
    fn strict_objects() {
        assert_eq!(
            run(r#"{"id": 1 "name": "a"}"#, DecodeFlags::STRICT_SYNTAX),
            Err((ErrorKind::UnexpectedSymbol, 9))
        );
        assert_eq!(
            run(r#"{"id": 1,}"#, DecodeFlags::STRICT_SYNTAX),
            Err((ErrorKind::UnexpectedSymbol, 9))
        );
        assert!(run(r#"{"id": 1 "name": "a",}"#, DecodeFlags::empty()).is_ok());
    }

    #[test]
    fn encodes_mapped_fields_in_declaration_order() {
        assert_eq!(
            to_string(&account()).unwrap(),
            r#"{"name":"old","id":99,"tags":["t"]}"#
        );
    }

    #[test]
    fn find_and_matcher_agree() {
        let keys = Account::KEYS;
        for candidate in ["", "i", "id", "idx", "name", "nam", "tags", "tagz", "z"] {
            let mut matcher = keys.matcher();
            for &b in candidate.as_bytes() {
                matcher.push(b);
            }
            assert_eq!(matcher.finish(), keys.find(candidate.as_bytes()), "{candidate}");
        }
    }

    #[test]
    fn filled_fields_spill_past_64() {
        let mut filled = FilledFields::new(130);
        for pos in [0, 63, 64, 129] {
            filled.set(pos);
        }
        filled.set(500);
        let set: Vec<usize> = (0..200).filter(|&p| filled.contains(p)).collect();
        assert_eq!(set, [0, 63, 64, 129]);
    }

    #[test]
    #[should_panic(expected = "sorted")]
    fn key_index_rejects_unsorted_tables() {
        static ENTRIES: [KeyEntry; 2] = [KeyEntry::new("b", 0), KeyEntry::new("a", 1)];
        let _ = KeyIndex::new(&ENTRIES);
    }

    #[test]
    #[should_panic(expected = "sorted")]
    fn key_index_rejects_duplicates() {
        static ENTRIES: [KeyEntry; 2] = [KeyEntry::new("a", 0), KeyEntry::new("a", 1)];
        let _ = KeyIndex::new(&ENTRIES);
    }

    #[test]
    #[should_panic(expected = "quote")]
    fn key_index_rejects_quotes() {
        static ENTRIES: [KeyEntry; 1] = [KeyEntry::new("a\"b", 0)];
        let _ = KeyIndex::new(&ENTRIES);
    }
}
