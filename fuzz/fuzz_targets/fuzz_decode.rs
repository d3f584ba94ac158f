#![no_main]
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
};

use arbitrary::Arbitrary;
use jsonshape::{DecodeFlags, DecodeOptions, FixedString, Record, decode, decode_with_options, to_vec};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng; // faster than StdRng
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 2; // 1 flag byte + 1 skip-depth byte

thread_local! {
    // One SmallRng per thread, seeded once from the host OS
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r"];

/// Keys the generator favors so values land in known fields.
static FIELD_KEYS: &[&str] = &[
    "name", "id", "score", "on", "tags", "children", "extra", "code", "counts",
];

#[derive(Debug, Default, PartialEq, Record)]
struct Node {
    name: String,
    id: i64,
    score: f64,
    on: bool,
    tags: BTreeMap<String, Option<Vec<f32>>>,
    children: Vec<Leaf>,
    code: FixedString<6>,
    counts: HashMap<String, i16>,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Leaf {
    id: u32,
    #[json(rename = "name")]
    label: Option<String>,
    extra: [u8; 2],
}

/// Helper: borrow the thread-local RNG and run a closure with it.
fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.random_range(0..=0x07));
        data[1] = with_rng(|rng| rng.random_range(0..=40));

        let mut prefix = HEADER;

        while prefix < size {
            let limit = max_size - prefix;

            prefix += append_whitespace(&mut data[prefix..], limit);
            prefix += append_value(&mut data[prefix..], size, limit);
            prefix += append_whitespace(&mut data[prefix..], limit);
        }

        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

/// Append 1‒N whitespace bytes (N chosen randomly) to `buf`, but never
/// exceed `limit`. Returns the number of bytes written.
fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 {
            return 0;
        }

        let n = rng.random_range(1..=limit.min(8));
        for slot in &mut buf[..n] {
            *slot = WS_TABLE[rng.random_range(0..WS_TABLE.len())][0];
        }
        n
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2 + 1).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        match ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            Ok(value) => break value,
            Err(_) => continue,
        };
    };

    let serialized = serde_json::to_vec(&value.0).expect("Failed to serialize arbitrary value");

    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);

    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let node_type = u.choose_index(21)?;
        let value = match node_type {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3 => Value::Number(u.arbitrary::<i64>()?.into()),
            4..=8 => Value::String(u.arbitrary()?),
            9..=13 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            14..=20 => {
                let m: Vec<(bool, String, ArbitraryValue)> = u.arbitrary()?;
                let mut map = Map::new();
                for (known, key, v) in m {
                    let key = if known {
                        FIELD_KEYS[u.choose_index(FIELD_KEYS.len())?].to_owned()
                    } else {
                        key
                    };
                    map.insert(key, v.0);
                }
                Value::Object(map)
            }
            _ => Err(arbitrary::Error::IncorrectFormat)?,
        };
        Ok(ArbitraryValue(value))
    }
}

fn decode_node(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let options = DecodeOptions {
        flags: DecodeFlags::from_bits_truncate(data[0]),
        max_skip_depth: data[1],
    };
    let input = &data[HEADER..];

    let mut node = Node::default();
    if decode_with_options(&mut node, input, options).is_err() {
        return;
    }

    // Whatever decodes must encode to valid JSON, and a strict decode of that
    // encoding must reach a fixed point. Map order is not stable, so the
    // fixed point is compared structurally.
    let Ok(first) = to_vec(&node) else {
        // Decoded strings may hold control bytes that have no short escape.
        return;
    };
    // Fixed-size strings carry raw bytes, so only UTF-8 output is checked.
    if let Ok(text) = std::str::from_utf8(&first) {
        serde_json::from_str::<Value>(text).expect("encoded output is not valid JSON");
    }

    let mut again = Node::default();
    decode(&mut again, &first, DecodeFlags::all()).expect("re-decoding own output failed");
    let second = to_vec(&again).expect("re-encoding failed");
    assert_eq!(first.len(), second.len());

    let mut settled = Node::default();
    decode(&mut settled, &second, DecodeFlags::all()).expect("decoding re-encoded output failed");
    assert_eq!(again, settled);
}

fuzz_target!(|data: &[u8]| decode_node(data));
