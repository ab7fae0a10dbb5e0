//! Property-based tests for the guarantees that must hold for any input:
//! chunk boundaries never change an outcome, references behave the same
//! before and after their marker, and depth limits are exact.

use concise_rules::{
    validate, validate_with_limits, ArrayKind, Error, ErrorKind, Event, LimitKind, Limits,
};
use proptest::prelude::*;

fn document(body: Vec<Event>) -> Vec<Event> {
    let mut events = vec![Event::BeginDocument, Event::Version(1)];
    events.extend(body);
    events.push(Event::EndDocument);
    events
}

/// Splits `len` into consecutive piece lengths using `cuts` as cut points.
fn pieces(len: usize, cuts: &[usize]) -> Vec<usize> {
    let mut points: Vec<usize> = cuts.iter().map(|cut| cut % (len + 1)).collect();
    points.push(0);
    points.push(len);
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Delivers `content` as an array of `kind`: one chunk per entry of
/// `chunk_cuts`, and each chunk's data split again by `data_cuts`.
fn chunked_array(
    kind: ArrayKind,
    content: &[u8],
    chunk_cuts: &[usize],
    data_cuts: &[usize],
) -> Vec<Event> {
    let mut events = vec![Event::BeginArray(kind)];
    let chunks = pieces(content.len(), chunk_cuts);
    if chunks.is_empty() {
        events.push(Event::ArrayChunk {
            length: 0,
            more_chunks_follow: false,
        });
        return events;
    }
    let mut offset = 0;
    for (index, &chunk_len) in chunks.iter().enumerate() {
        events.push(Event::ArrayChunk {
            length: chunk_len as u64,
            more_chunks_follow: index + 1 < chunks.len(),
        });
        let chunk = &content[offset..offset + chunk_len];
        let mut data_offset = 0;
        for data_len in pieces(chunk.len(), data_cuts) {
            events.push(Event::ArrayData(
                chunk[data_offset..data_offset + data_len].to_vec(),
            ));
            data_offset += data_len;
        }
        offset += chunk_len;
    }
    events
}

fn single_chunk(kind: ArrayKind, content: &[u8]) -> Vec<Event> {
    vec![Event::Array {
        kind,
        element_count: content.len() as u64,
        data: content.to_vec(),
    }]
}

fn outcome(events: &[Event]) -> Result<(), ErrorKind> {
    validate(events).map_err(|err| err.kind())
}

proptest! {
    #[test]
    fn prop_string_chunking_is_transparent(
        text in "\\PC{0,40}",
        chunk_cuts in prop::collection::vec(any::<usize>(), 0..6),
        data_cuts in prop::collection::vec(any::<usize>(), 0..4),
    ) {
        let bytes = text.as_bytes();
        let whole = document(single_chunk(ArrayKind::String, bytes));
        let split = document(chunked_array(ArrayKind::String, bytes, &chunk_cuts, &data_cuts));
        prop_assert_eq!(outcome(&whole), outcome(&split));
    }

    #[test]
    fn prop_arbitrary_bytes_chunking_is_transparent(
        bytes in prop::collection::vec(any::<u8>(), 0..32),
        chunk_cuts in prop::collection::vec(any::<usize>(), 0..6),
        data_cuts in prop::collection::vec(any::<usize>(), 0..4),
    ) {
        for kind in [ArrayKind::String, ArrayKind::CustomText, ArrayKind::Uint8] {
            let whole = document(single_chunk(kind, &bytes));
            let split = document(chunked_array(kind, &bytes, &chunk_cuts, &data_cuts));
            prop_assert_eq!(outcome(&whole), outcome(&split), "{}", kind);
        }
    }

    #[test]
    fn prop_valid_text_is_accepted_in_any_chunking(
        text in "[a-zA-Z0-9 àéîõü€😀]{0,30}",
        chunk_cuts in prop::collection::vec(any::<usize>(), 0..8),
        data_cuts in prop::collection::vec(any::<usize>(), 0..4),
    ) {
        let events = document(chunked_array(ArrayKind::String, text.as_bytes(), &chunk_cuts, &data_cuts));
        prop_assert!(validate(&events).is_ok());
    }

    #[test]
    fn prop_reference_order_does_not_matter(
        object in prop::sample::select(vec![
            Event::string("value"),
            Event::PositiveInt(9),
            Event::NegativeInt(9),
            Event::Null,
            Event::Float(0.5),
            Event::BeginList,
        ]),
        in_key_position in any::<bool>(),
    ) {
        let mut marked = vec![Event::BeginMarker, Event::string("id"), object.clone()];
        if object == Event::BeginList {
            marked.push(Event::EndContainer);
        }
        let reference = if in_key_position {
            vec![
                Event::BeginMap,
                Event::BeginReference,
                Event::string("id"),
                Event::Null,
                Event::EndContainer,
            ]
        } else {
            vec![Event::BeginReference, Event::string("id")]
        };

        let list = |first: &[Event], second: &[Event]| {
            let mut body = vec![Event::BeginList];
            body.extend_from_slice(first);
            body.extend_from_slice(second);
            body.push(Event::EndContainer);
            document(body)
        };
        let backward = outcome(&list(&marked, &reference));
        let forward = outcome(&list(&reference, &marked));
        prop_assert_eq!(backward, forward);

        let keyable = !matches!(object, Event::Null | Event::Float(_) | Event::BeginList);
        prop_assert_eq!(backward.is_ok(), keyable || !in_key_position);
    }

    #[test]
    fn prop_depth_boundary(max_depth in 1u64..24, innermost_comment in any::<bool>()) {
        let limits = Limits::new().with_max_container_depth(max_depth);
        let nested = |depth: u64| {
            let mut body = Vec::new();
            for level in 0..depth {
                // Comments nest only as the innermost container.
                let comment = innermost_comment && level + 1 == depth && depth > 1;
                body.push(if comment { Event::BeginComment } else { Event::BeginList });
            }
            for _ in 0..depth {
                body.push(Event::EndContainer);
            }
            document(body)
        };
        prop_assert!(validate_with_limits(limits, &nested(max_depth)).is_ok());

        let err = validate_with_limits(limits, &nested(max_depth + 1)).unwrap_err();
        prop_assert_eq!(err, Error::limit(LimitKind::ContainerDepth, max_depth));
    }
}
