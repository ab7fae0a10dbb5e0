//! Documents described as JSON fixtures.
//!
//! Each case lists its events in the serde representation of [`Event`], the
//! limits to apply (missing fields keep their defaults) and the expected
//! outcome.

use concise_rules::{validate_with_limits, ErrorKind, Event, Limits};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct Case {
    name: String,
    #[serde(default)]
    limits: Limits,
    events: Vec<Event>,
    expect: Expect,
}

#[derive(Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Expect {
    Valid,
    Structural,
    Limit,
    Encoding,
}

impl Expect {
    fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Structural => Expect::Structural,
            ErrorKind::Limit => Expect::Limit,
            ErrorKind::Encoding => Expect::Encoding,
            ErrorKind::Configuration => panic!("fixture limits must be valid"),
        }
    }
}

const FIXTURES: &str = r#"[
  {
    "name": "list of one integer",
    "events": ["BeginDocument", {"Version": 1}, "BeginList", {"PositiveInt": 5000}, "EndContainer", "EndDocument"],
    "expect": "valid"
  },
  {
    "name": "unterminated list",
    "events": ["BeginDocument", {"Version": 1}, "BeginList", "EndDocument"],
    "expect": "structural"
  },
  {
    "name": "map with time key and markup value",
    "events": [
      "BeginDocument", {"Version": 1}, "BeginMap",
      {"Time": "2024-01-15T10:30:00+01:00"},
      {"BeginMarkup": "div"}, {"Array": {"kind": "String", "element_count": 2, "data": [105, 100]}},
      {"PositiveInt": 1}, "EndContainer", "EndContainer",
      {"CompactTime": {"Date": "2024-01-15"}}, {"NaN": {"signaling": false}},
      "EndContainer", "EndDocument"
    ],
    "expect": "valid"
  },
  {
    "name": "float key",
    "events": ["BeginDocument", {"Version": 1}, "BeginMap", {"Float": 1.5}, "Null", "EndContainer", "EndDocument"],
    "expect": "structural"
  },
  {
    "name": "chunked bit array",
    "events": [
      "BeginDocument", {"Version": 1}, {"BeginArray": "Bit"},
      {"ArrayChunk": {"length": 3, "more_chunks_follow": true}}, {"ArrayData": [5]},
      {"ArrayChunk": {"length": 9, "more_chunks_follow": false}}, {"ArrayData": [255]}, {"ArrayData": [1]},
      "EndDocument"
    ],
    "expect": "valid"
  },
  {
    "name": "string split inside a code point",
    "events": [
      "BeginDocument", {"Version": 1}, {"BeginArray": "String"},
      {"ArrayChunk": {"length": 1, "more_chunks_follow": true}}, {"ArrayData": [226]},
      {"ArrayChunk": {"length": 2, "more_chunks_follow": false}}, {"ArrayData": [130, 172]},
      "EndDocument"
    ],
    "expect": "valid"
  },
  {
    "name": "surrogate in string",
    "events": ["BeginDocument", {"Version": 1}, {"Array": {"kind": "String", "element_count": 3, "data": [237, 160, 128]}}, "EndDocument"],
    "expect": "encoding"
  },
  {
    "name": "too deep",
    "limits": {"max_container_depth": 2},
    "events": ["BeginDocument", {"Version": 1}, "BeginList", "BeginList", "BeginList", "EndContainer", "EndContainer", "EndContainer", "EndDocument"],
    "expect": "limit"
  },
  {
    "name": "forward reference",
    "events": [
      "BeginDocument", {"Version": 1}, "BeginList",
      "BeginReference", {"PositiveInt": 1},
      "BeginMarker", {"PositiveInt": 1}, {"Bool": true},
      "EndContainer", "EndDocument"
    ],
    "expect": "valid"
  },
  {
    "name": "unresolved reference",
    "events": ["BeginDocument", {"Version": 1}, "BeginReference", {"PositiveInt": 1}, "EndDocument"],
    "expect": "structural"
  },
  {
    "name": "too many references",
    "limits": {"max_reference_count": 1},
    "events": [
      "BeginDocument", {"Version": 1}, "BeginList",
      "BeginMarker", {"PositiveInt": 1}, "Null",
      "BeginReference", {"PositiveInt": 1},
      "EndContainer", "EndDocument"
    ],
    "expect": "limit"
  },
  {
    "name": "comment with control character",
    "events": ["BeginDocument", {"Version": 1}, "BeginComment", {"Array": {"kind": "String", "element_count": 1, "data": [27]}}, "EndContainer", "Null", "EndDocument"],
    "expect": "encoding"
  }
]"#;

#[test]
fn test_fixtures() {
    let cases: Vec<Case> = serde_json::from_str(FIXTURES).unwrap();
    assert_eq!(cases.len(), 12);
    for case in cases {
        let outcome = match validate_with_limits(case.limits, &case.events) {
            Ok(()) => Expect::Valid,
            Err(err) => Expect::from_kind(err.kind()),
        };
        assert_eq!(outcome, case.expect, "{}", case.name);
    }
}

#[test]
fn test_recorded_events_serialize() {
    let mut engine =
        concise_rules::RuleEngine::with_receiver(Limits::default(), Vec::new()).unwrap();
    let events = [
        Event::BeginDocument,
        Event::Version(1),
        Event::string("hi"),
        Event::EndDocument,
    ];
    for event in &events {
        engine.on_event(event).unwrap();
    }
    let json = serde_json::to_value(engine.receiver()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            "BeginDocument",
            {"Version": 1},
            {"Array": {"kind": "String", "element_count": 2, "data": [104, 105]}},
            "EndDocument"
        ])
    );
}
