//! Unit tests for command frames.

use rstest::rstest;

use super::*;

fn url(text: &str) -> Url {
    Url::parse(text).expect("valid url")
}

#[rstest]
#[case(r#"{"selector":"connect"}"#, Selector::Connect)]
#[case(r#"{"selector":"list-dir","url":"memfs:/docs"}"#, Selector::ListDir)]
#[case(r#"{"selector":"status-query"}"#, Selector::StatusQuery)]
#[case(r#"{"selector":"special","data":"cGluZw=="}"#, Selector::Special)]
#[case(r#"{"selector":"resume-answer","accepted":true}"#, Selector::ResumeAnswer)]
fn wire_tag_matches_selector(#[case] json: &str, #[case] expected: Selector) {
    let command: Command = serde_json::from_str(json).expect("deserialise");
    assert_eq!(command.selector(), expected);
}

#[test]
fn byte_payloads_travel_as_base64() {
    let json = serde_json::to_string(&Command::special(b"ping".to_vec())).expect("serialise");
    assert_eq!(json, r#"{"selector":"special","data":"cGluZw=="}"#);
}

#[test]
fn invalid_base64_is_rejected() {
    let result = serde_json::from_str::<Command>(r#"{"selector":"data","data":"***"}"#);
    assert!(result.is_err());
}

#[test]
fn end_of_data_is_empty() {
    assert_eq!(Command::end_of_data(), Command::data(Vec::new()));
}

#[test]
fn delete_defaults_to_file() {
    let command: Command =
        serde_json::from_str(r#"{"selector":"delete","url":"memfs:/a"}"#).expect("deserialise");
    assert!(matches!(command, Command::Delete { is_file: true, .. }));
}

#[test]
fn metadata_entries_deserialise_as_map() {
    let command: Command = serde_json::from_str(
        r#"{"selector":"metadata","entries":{"UserAgent":"courier","ReadTimeout":"5"}}"#,
    )
    .expect("deserialise");
    let Command::Metadata { entries } = command else {
        panic!("expected metadata frame");
    };
    assert_eq!(entries.get("UserAgent").map(String::as_str), Some("courier"));
    assert_eq!(entries.len(), 2);
}

#[rstest]
#[case(Command::Stat { url: url("memfs:/a") }, Some("memfs:/a"))]
#[case(
    Command::Rename { src: url("memfs:/a"), dest: url("memfs:/b"), flags: JobFlags::default() },
    Some("memfs:/a")
)]
#[case(
    Command::Symlink { target: "a".into(), dest: url("memfs:/link"), flags: JobFlags::default() },
    Some("memfs:/link")
)]
#[case(Command::Connect, None)]
fn url_returns_primary_resource(#[case] command: Command, #[case] expected: Option<&str>) {
    assert_eq!(command.url().map(Url::as_str), expected);
}

#[test]
fn unknown_selector_is_a_decode_error() {
    assert!(serde_json::from_str::<Command>(r#"{"selector":"teleport"}"#).is_err());
}
