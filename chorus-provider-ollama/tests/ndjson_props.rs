//! Property-based tests: NDJSON decoding does not depend on read boundaries.

use chorus_provider_ollama::NdjsonDecoder;
use proptest::prelude::*;
use serde_json::{Value, json};

fn arb_record() -> impl Strategy<Value = Value> {
    (any::<String>(), any::<bool>(), any::<u32>()).prop_map(|(content, done, n)| {
        json!({
            "model": "m",
            "message": {"role": "assistant", "content": content},
            "done": done,
            "n": n,
        })
    })
}

fn encode(records: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        out.extend_from_slice(record.to_string().as_bytes());
        out.push(b'\n');
    }
    out
}

fn decode_in_pieces(bytes: &[u8], cuts: &[usize]) -> Vec<Value> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut decoder = NdjsonDecoder::<Value>::new();
    let mut out = Vec::new();
    let mut start = 0;
    for cut in cuts {
        out.extend(decoder.push(&bytes[start..cut]));
        start = cut;
    }
    out.extend(decoder.push(&bytes[start..]));
    out.extend(decoder.finish());
    out
}

proptest! {
    #[test]
    fn split_points_do_not_change_records(
        records in proptest::collection::vec(arb_record(), 0..8),
        cuts in proptest::collection::vec(any::<usize>(), 0..16),
    ) {
        let bytes = encode(&records);
        let decoded = decode_in_pieces(&bytes, &cuts);
        prop_assert_eq!(decoded, records);
    }

    #[test]
    fn byte_at_a_time_matches_whole(records in proptest::collection::vec(arb_record(), 0..4)) {
        let bytes = encode(&records);
        let cuts: Vec<usize> = (0..bytes.len()).collect();
        prop_assert_eq!(decode_in_pieces(&bytes, &cuts), records);
    }

    #[test]
    fn garbage_lines_are_dropped_without_disturbing_order(
        records in proptest::collection::vec(arb_record(), 1..6),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let mut bytes = Vec::new();
        for record in &records {
            bytes.extend_from_slice(b"{garbage\n");
            bytes.extend_from_slice(record.to_string().as_bytes());
            bytes.push(b'\n');
        }
        prop_assert_eq!(decode_in_pieces(&bytes, &cuts), records);
    }
}
