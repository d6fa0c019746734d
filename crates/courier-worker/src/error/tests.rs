//! Tests for engine error types.

use std::io;

use courier_protocol::Selector;
use rstest::rstest;

use super::*;

#[test]
fn mismatch_names_both_selectors() {
    let error = AnswerError::Mismatch {
        expected: PendingAnswer::either(Selector::Data, Selector::ResumeAnswer),
        received: Selector::Stat,
    };
    assert_eq!(
        error.to_string(),
        "expected data or resume-answer but the controller sent stat"
    );
    assert!(!error.is_connection_lost());
}

#[rstest]
#[case(AnswerError::ConnectionLost { expected: PendingAnswer::one(Selector::HostInfo) }, true)]
#[case(AnswerError::Channel(ChannelError::ConnectionLost), true)]
#[case(AnswerError::Killed { expected: PendingAnswer::one(Selector::HostInfo) }, false)]
#[case(AnswerError::Channel(ChannelError::malformed("bad")), false)]
fn connection_lost_detection(#[case] error: AnswerError, #[case] lost: bool) {
    assert_eq!(error.is_connection_lost(), lost);
}

#[rstest]
#[case(WorkerError::Channel(ChannelError::io(io::Error::other("boom"))), 1)]
#[case(WorkerError::ThreadPanicked, 1)]
#[case(WorkerError::connect("tcp://127.0.0.1:1", ChannelError::ConnectionLost), 2)]
#[case(WorkerError::signals(io::Error::other("denied")), 2)]
#[case(WorkerError::spawn(io::Error::other("no threads")), 2)]
fn exit_status_separates_startup_from_runtime(#[case] error: WorkerError, #[case] status: i32) {
    assert_eq!(error.exit_status(), status);
}

#[test]
fn connect_error_names_endpoint() {
    let error = WorkerError::connect("unix:///tmp/courier.sock", ChannelError::ConnectionLost);
    assert!(error.to_string().contains("unix:///tmp/courier.sock"));
}
