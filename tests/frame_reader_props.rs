//! Chunking must never change what the frame reader produces.

mod support;

use chat_relay::streaming::{FrameDelimiter, FrameReader};
use proptest::prelude::*;

fn frames(delimiter: FrameDelimiter, chunks: &[bytes::Bytes]) -> Vec<String> {
    let mut reader = FrameReader::new(delimiter);
    chunks.iter().flat_map(|c| reader.push(c)).collect()
}

fn whole(delimiter: FrameDelimiter, input: &[u8]) -> Vec<String> {
    frames(delimiter, &[bytes::Bytes::copy_from_slice(input)])
}

fn cuts() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..2048, 0..12)
}

proptest! {
    #[test]
    fn line_fixture_is_split_invariant(cuts in cuts()) {
        let input = support::fixture("openai/hello_world.sse");
        let expected = whole(FrameDelimiter::Line, &input);
        let got = frames(FrameDelimiter::Line, &support::split_at_cuts(&input, &cuts));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn event_fixture_is_split_invariant(cuts in cuts()) {
        let input = support::fixture("anthropic/message_stream.sse");
        let expected = whole(FrameDelimiter::Event, &input);
        prop_assert_eq!(expected.len(), 8);
        let got = frames(FrameDelimiter::Event, &support::split_at_cuts(&input, &cuts));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn json_fixture_is_split_invariant(cuts in cuts()) {
        let input = support::fixture("gemini/stream.json");
        let expected = whole(FrameDelimiter::JsonObject, &input);
        prop_assert_eq!(expected.len(), 2);
        let got = frames(FrameDelimiter::JsonObject, &support::split_at_cuts(&input, &cuts));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn arbitrary_lines_survive_any_split(
        lines in prop::collection::vec("[a-zA-Z0-9 {}\"\\\\é€😀]{1,24}", 1..10),
        cuts in cuts(),
        crlf in any::<bool>(),
    ) {
        let sep = if crlf { "\r\n" } else { "\n" };
        let input: String = lines.iter().map(|l| format!("{l}{sep}")).collect();
        let expected: Vec<String> = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect();
        let got = frames(FrameDelimiter::Line, &support::split_at_cuts(input.as_bytes(), &cuts));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn raw_lines_keep_blank_lines_under_any_split(
        lines in prop::collection::vec("[a-z {}é😀]{0,12}", 1..10),
        cuts in cuts(),
    ) {
        let input: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let got = frames(
            FrameDelimiter::RawLine,
            &support::split_at_cuts(input.as_bytes(), &cuts),
        );
        prop_assert_eq!(got, lines);
    }

    #[test]
    fn arbitrary_json_strings_survive_any_split(
        texts in prop::collection::vec("[a-z {}\\[\\]\"\\\\é😀]{0,16}", 1..6),
        cuts in cuts(),
    ) {
        let objects: Vec<String> = texts
            .iter()
            .map(|t| serde_json::json!({ "text": t, "nested": { "ok": true } }).to_string())
            .collect();
        let input = format!("[{}]", objects.join(",\n"));
        let got = frames(
            FrameDelimiter::JsonObject,
            &support::split_at_cuts(input.as_bytes(), &cuts),
        );
        prop_assert_eq!(got, objects);
    }
}
