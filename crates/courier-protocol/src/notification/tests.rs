//! Unit tests for notification frames.

use rstest::rstest;

use super::*;

#[test]
fn error_frame_carries_code_as_integer() {
    let frame = Notification::error(ErrorCode::FILE_ALREADY_EXIST, "destination exists");
    let json = serde_json::to_string(&frame).expect("serialise");
    assert_eq!(
        json,
        r#"{"kind":"error","code":112,"message":"destination exists"}"#
    );
}

#[rstest]
#[case(Notification::data(Vec::new()), true)]
#[case(Notification::data(b"x".to_vec()), false)]
#[case(Notification::Finished, false)]
fn end_of_data_detection(#[case] frame: Notification, #[case] expected: bool) {
    assert_eq!(frame.is_end_of_data(), expected);
}

#[rstest]
#[case(Notification::Finished, true)]
#[case(Notification::Connected, true)]
#[case(Notification::error(ErrorCode::INTERNAL, "boom"), true)]
#[case(Notification::Status { host: String::new(), connected: false }, true)]
#[case(Notification::DataReq, false)]
#[case(Notification::TotalSize { size: 3 }, false)]
fn terminal_frames(#[case] frame: Notification, #[case] expected: bool) {
    assert_eq!(frame.is_terminal(), expected);
}

#[test]
fn unit_variants_serialise_with_kind_only() {
    let json = serde_json::to_string(&Notification::DataReq).expect("serialise");
    assert_eq!(json, r#"{"kind":"data_req"}"#);
}
