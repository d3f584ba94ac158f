use alloc::{string::String, vec};

use rstest::rstest;

use super::sample::Sample;
use crate::{DecodeFlags, Record, decode, to_string};

const DEFAULTS: &str =
    r#"{"text":"","count":0,"ratio":0.0,"flag":false,"item-list":[],"labels":{},"maybe":null}"#;

fn canonical(input: &str) -> String {
    let mut sample = Sample::default();
    decode(&mut sample, input.as_bytes(), DecodeFlags::empty()).unwrap();
    to_string(&sample).unwrap()
}

#[rstest]
#[case::empty_object("{}", DEFAULTS)]
#[case::all_fields(
    r#"{"text": "a\tb", "count": -12, "ratio": 2.5e1, "flag": true, "item-list": [1, 2], "labels": {"k": 3}, "maybe": 9}"#,
    r#"{"text":"a\tb","count":-12,"ratio":25.0,"flag":true,"item-list":[1,2],"labels":{"k":3},"maybe":9}"#
)]
#[case::unknown_fields_and_whitespace(
    "\n{ \"zzz\" : [ {\"deep\": null} ], \"count\" : 1e3 , \"unused\": \"x\" }\n",
    r#"{"text":"","count":1000,"ratio":0.0,"flag":false,"item-list":[],"labels":{},"maybe":null}"#
)]
#[case::nulls(
    r#"{"text": null, "item-list": null, "labels": null, "maybe": null, "ratio": null}"#,
    DEFAULTS
)]
#[case::lenient_commas(
    r#"{"count": 1 "flag": true,}"#,
    r#"{"text":"","count":1,"ratio":0.0,"flag":true,"item-list":[],"labels":{},"maybe":null}"#
)]
#[case::escapes(
    r#"{"text": "\u00e9\ud83d\ude00\"\\\/"}"#,
    r#"{"text":"é😀\"\\/","count":0,"ratio":0.0,"flag":false,"item-list":[],"labels":{},"maybe":null}"#
)]
#[case::integral_floats(
    r#"{"count": -2.0E0, "item-list": [1e2, 0.0]}"#,
    r#"{"text":"","count":-2,"ratio":0.0,"flag":false,"item-list":[100,0],"labels":{},"maybe":null}"#
)]
#[case::null_root("null", DEFAULTS)]
fn decodes_into_sample(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(canonical(input), expected);
}

#[test]
fn redecoding_is_idempotent() {
    let input = br#"{"text": "t", "item-list": [3, 4], "labels": {"a": 1, "b": 2}, "maybe": 5}"#;
    let mut sample = Sample {
        scratch: 11,
        ..Sample::default()
    };
    decode(&mut sample, input, DecodeFlags::empty()).unwrap();
    let first = sample.clone();
    decode(&mut sample, input, DecodeFlags::empty()).unwrap();
    assert_eq!(sample, first);
    assert_eq!(sample.items, vec![3, 4]);
    assert_eq!(sample.scratch, 11);
}

#[test]
fn field_table_follows_declaration() {
    let names: alloc::vec::Vec<_> = Sample::FIELDS
        .iter()
        .map(|f| (f.name(), f.index(), f.is_mapped()))
        .collect();
    assert_eq!(
        names,
        [
            ("text", 0, true),
            ("count", 1, true),
            ("ratio", 2, true),
            ("flag", 3, true),
            ("item-list", 4, true),
            ("labels", 5, true),
            ("maybe", 6, true),
            ("scratch", 7, false),
        ]
    );

    let keys: alloc::vec::Vec<_> = Sample::KEYS
        .entries()
        .iter()
        .map(crate::KeyEntry::name)
        .collect();
    assert_eq!(
        keys,
        ["count", "flag", "item-list", "labels", "maybe", "ratio", "text"]
    );
}
