//! Unit tests for the worker session.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use courier_protocol::{
    AuthInfo, Command, Entry, HostInfo, MessageBoxRequest, MessageBoxType, Notification,
    PrivilegeStatus, Selector,
};
use rstest::{fixture, rstest};
use url::Url;

use super::*;
use crate::channel::{ControllerHandle, MemoryChannel};
use crate::error::AnswerError;

struct Harness {
    session: Session,
    controller: ControllerHandle,
}

#[fixture]
fn harness() -> Harness {
    let (channel, controller) = MemoryChannel::pair();
    Harness {
        session: Session::new(String::from("memfs"), Box::new(channel)),
        controller,
    }
}

fn entries(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[rstest]
fn flush_without_keep_empties_outgoing(mut harness: Harness) {
    harness.session.set_metadata("charset", "utf-8");
    harness.session.flush_metadata(false).expect("flush");

    assert!(harness.session.outgoing_metadata().is_empty());
    assert_eq!(
        harness.controller.drain(),
        vec![Notification::MetaData {
            entries: entries(&[("charset", "utf-8")])
        }]
    );
}

#[rstest]
fn flush_with_keep_leaves_outgoing_unchanged(mut harness: Harness) {
    harness.session.set_metadata("charset", "utf-8");
    harness.session.flush_metadata(true).expect("first flush");
    harness.session.flush_metadata(true).expect("second flush");

    assert_eq!(harness.session.outgoing_metadata().len(), 1);
    assert_eq!(harness.controller.drain().len(), 2);
}

#[rstest]
fn empty_flush_sends_nothing(mut harness: Harness) {
    harness.session.flush_metadata(false).expect("flush");
    assert!(harness.controller.drain().is_empty());
}

#[rstest]
fn outgoing_writes_never_reach_incoming(mut harness: Harness) {
    harness.session.merge_incoming(entries(&[("UserAgent", "courier")]));
    harness.session.set_metadata("UserAgent", "other");

    assert_eq!(harness.session.metadata("UserAgent"), Some("courier"));
    assert_eq!(harness.session.metadata_or("Missing", "fallback"), "fallback");
    assert!(!harness.session.has_metadata("Missing"));
}

#[rstest]
#[case(&[], DEFAULT_CONNECT_TIMEOUT)]
#[case(&[("ConnectTimeout", "5")], Duration::from_secs(5))]
#[case(&[("ConnectTimeout", "0")], DEFAULT_CONNECT_TIMEOUT)]
#[case(&[("ConnectTimeout", "-3")], DEFAULT_CONNECT_TIMEOUT)]
#[case(&[("ConnectTimeout", "soon")], DEFAULT_CONNECT_TIMEOUT)]
fn connect_timeout_falls_back_to_default(
    mut harness: Harness,
    #[case] pairs: &[(&str, &str)],
    #[case] expected: Duration,
) {
    harness.session.merge_incoming(entries(pairs));
    assert_eq!(harness.session.connect_timeout(), expected);
}

#[rstest]
fn other_timeouts_have_their_own_defaults(harness: Harness) {
    assert_eq!(harness.session.proxy_connect_timeout(), Duration::from_secs(10));
    assert_eq!(harness.session.response_timeout(), Duration::from_secs(600));
    assert_eq!(harness.session.read_timeout(), Duration::from_secs(15));
}

#[rstest]
fn typed_config_values(mut harness: Harness) {
    harness.session.merge_incoming(entries(&[
        ("Flag", "TRUE"),
        ("Other", "yes"),
        ("Count", "42"),
        ("Name", "alpha"),
    ]));

    assert!(harness.session.config_bool("Flag", false));
    assert!(!harness.session.config_bool("Other", true));
    assert!(harness.session.config_bool("Absent", true));
    assert_eq!(harness.session.config_int("Count", 0), 42);
    assert_eq!(harness.session.config_int("Name", 7), 7);
    assert_eq!(harness.session.config_str("Name", "beta"), "alpha");
}

#[rstest]
fn first_data_chunk_flushes_metadata_first(mut harness: Harness) {
    harness.session.begin_operation(Selector::Get);
    harness.session.set_metadata("content-type", "text/plain");
    harness.session.data(b"hello").expect("data");
    harness.session.data(b"world").expect("data");

    let frames = harness.controller.drain();
    assert!(matches!(frames.first(), Some(Notification::MetaData { .. })));
    assert_eq!(frames.len(), 3);
    assert!(matches!(
        harness.session.state(),
        SessionState::Streaming {
            direction: Direction::Outbound,
            bytes: 10
        }
    ));
}

#[rstest]
fn data_after_end_of_stream_is_dropped(mut harness: Harness) {
    harness.session.begin_operation(Selector::Get);
    harness.session.data(b"abc").expect("data");
    harness.session.end_of_data().expect("end");
    harness.session.data(b"late").expect("late data is accepted and dropped");

    let frames = harness.controller.drain();
    assert_eq!(
        frames,
        vec![Notification::data(b"abc".to_vec()), Notification::data(Vec::new())]
    );
}

#[rstest]
#[case(Selector::Get, false, 1)]
#[case(Selector::Mimetype, false, 1)]
#[case(Selector::Stat, false, 0)]
#[case(Selector::MultiGet, true, 1)]
fn complete_stream_adds_a_single_marker(
    mut harness: Harness,
    #[case] selector: Selector,
    #[case] started: bool,
    #[case] markers: usize,
) {
    harness.session.begin_operation(selector);
    if started {
        harness.session.data(b"x").expect("data");
    }
    harness.session.complete_stream(selector).expect("complete");
    harness.session.complete_stream(selector).expect("complete twice");

    let count = harness
        .controller
        .drain()
        .iter()
        .filter(|frame| frame.is_end_of_data())
        .count();
    assert_eq!(count, markers);
}

#[rstest]
fn read_data_returns_chunks_then_end(mut harness: Harness) {
    harness
        .controller
        .send(Command::data(b"part".to_vec()))
        .expect("send");
    harness.controller.send(Command::end_of_data()).expect("send");

    assert_eq!(
        harness.session.next_upload_chunk().expect("chunk"),
        Some(b"part".to_vec())
    );
    assert_eq!(harness.session.next_upload_chunk().expect("end"), None);
    assert_eq!(harness.session.read_data().expect("still ended"), None);
    assert_eq!(
        harness.controller.drain(),
        vec![Notification::DataReq, Notification::DataReq]
    );
}

#[rstest]
fn wait_accepts_either_selector(mut harness: Harness) {
    harness
        .controller
        .send(Command::ResumeAnswer { accepted: true })
        .expect("send");

    let answer = harness
        .session
        .wait_for_answer(PendingAnswer::either(Selector::Data, Selector::ResumeAnswer))
        .expect("answer");

    assert_eq!(answer.selector(), Selector::ResumeAnswer);
    assert_eq!(harness.session.state(), &SessionState::Idle);
}

#[rstest]
fn metadata_during_a_wait_is_a_mismatch(mut harness: Harness) {
    harness
        .controller
        .send(Command::Metadata {
            entries: entries(&[("Realm", "files")]),
        })
        .expect("send");

    let error = harness
        .session
        .message_box(MessageBoxRequest::new(MessageBoxType::Information, "hi"))
        .expect_err("mismatch");

    assert!(matches!(
        error,
        AnswerError::Mismatch {
            received: Selector::Metadata,
            ..
        }
    ));
    assert_eq!(harness.session.metadata("Realm"), None);
    assert_eq!(harness.session.state(), &SessionState::Idle);
}

#[rstest]
fn wait_rejects_unexpected_frames(mut harness: Harness) {
    harness.controller.send(Command::Connect).expect("send");

    let error = harness
        .session
        .wait_for_answer(PendingAnswer::one(Selector::CredentialAnswer))
        .expect_err("mismatch");

    assert!(matches!(
        error,
        AnswerError::Mismatch {
            received: Selector::Connect,
            ..
        }
    ));
    assert!(!harness.session.is_terminating());
}

#[rstest]
fn wait_fails_when_channel_closes(mut harness: Harness) {
    harness.controller.close();

    let error = harness
        .session
        .wait_for_answer(PendingAnswer::one(Selector::HostInfo))
        .expect_err("closed");

    assert!(error.is_connection_lost());
    assert!(harness.session.is_terminating());
}

#[rstest]
fn wait_stops_when_killed(mut harness: Harness) {
    harness.session.kill_switch().kill();

    let error = harness
        .session
        .can_resume(10)
        .expect_err("killed");

    assert!(matches!(error, AnswerError::Killed { .. }));
}

#[rstest]
fn password_dialog_updates_info(mut harness: Harness) {
    let url = Url::parse("memfs://host/").expect("url");
    let mut reply = AuthInfo::for_url(url.clone());
    reply.username = String::from("ada");
    reply.password = String::from("secret");
    harness
        .controller
        .send(Command::CredentialAnswer { auth: Some(reply) })
        .expect("send");

    let mut info = AuthInfo::for_url(url);
    let accepted = harness
        .session
        .open_password_dialog(&mut info, "")
        .expect("dialog");

    assert!(accepted);
    assert_eq!(info.username, "ada");
}

#[rstest]
fn cancelled_password_dialog_leaves_info(mut harness: Harness) {
    harness
        .controller
        .send(Command::CredentialAnswer { auth: None })
        .expect("send");

    let mut info = AuthInfo::default();
    let accepted = harness
        .session
        .open_password_dialog(&mut info, "wrong password")
        .expect("dialog");

    assert!(!accepted);
    assert!(info.username.is_empty());
}

#[rstest]
fn host_lookup_round_trip(mut harness: Harness) {
    let info = HostInfo {
        hostname: String::from("example"),
        addresses: vec!["127.0.0.1".parse().expect("address")],
        error: None,
    };
    harness
        .controller
        .send(Command::HostInfo { info: info.clone() })
        .expect("send");

    harness.session.lookup_host("example").expect("lookup");
    let resolved = harness.session.wait_for_host_info().expect("host info");

    assert_eq!(resolved, info);
    assert_eq!(
        harness.controller.drain(),
        vec![Notification::HostLookup {
            hostname: String::from("example")
        }]
    );
}

#[rstest]
fn privilege_failure_is_unknown(mut harness: Harness) {
    harness.controller.send(Command::Connect).expect("send");
    assert_eq!(
        harness.session.request_privilege_operation("chown /a"),
        PrivilegeStatus::Unknown
    );
}

#[rstest]
fn privilege_grant_is_returned(mut harness: Harness) {
    harness
        .controller
        .send(Command::PrivilegeAnswer {
            status: PrivilegeStatus::Granted,
        })
        .expect("send");
    assert_eq!(
        harness.session.request_privilege_operation("chown /a"),
        PrivilegeStatus::Granted
    );
    harness.session.add_temporary_authorization("chown");
    assert!(harness.session.temporary_authorizations().contains("chown"));
}

#[rstest]
fn list_entries_are_batched(mut harness: Harness) {
    harness.session.begin_operation(Selector::ListDir);
    for index in 0..150 {
        harness
            .session
            .list_entry(Entry::file(format!("f{index}"), 0))
            .expect("entry");
    }
    harness.session.flush_listing().expect("flush");

    let sizes: Vec<usize> = harness
        .controller
        .drain()
        .into_iter()
        .filter_map(|frame| match frame {
            Notification::ListEntries { entries } => Some(entries.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sizes.iter().sum::<usize>(), 150);
    assert!(sizes.iter().all(|size| *size <= 100));
}

#[rstest]
fn discard_pending_drops_listing_and_metadata(mut harness: Harness) {
    harness.session.begin_operation(Selector::ListDir);
    harness
        .session
        .list_entry(Entry::directory("docs"))
        .expect("entry");
    harness.session.set_metadata("k", "v");
    harness.session.discard_pending();
    harness.session.flush_listing().expect("flush");
    harness.session.flush_metadata(false).expect("flush");

    assert!(harness.controller.drain().is_empty());
}

#[rstest]
fn timer_is_cancelled_by_next_operation(mut harness: Harness) {
    harness
        .session
        .set_timeout_special_command(Some(Duration::ZERO), b"tick".to_vec());
    assert!(harness.session.idle_timer_armed());

    harness.session.begin_operation(Selector::Stat);
    assert!(!harness.session.idle_timer_armed());
    assert_eq!(harness.session.take_due_timer(Instant::now()), None);
}

#[rstest]
fn due_timer_fires_once(mut harness: Harness) {
    harness
        .session
        .set_timeout_special_command(Some(Duration::ZERO), b"tick".to_vec());
    let now = Instant::now();

    assert_eq!(harness.session.take_due_timer(now), Some(b"tick".to_vec()));
    assert_eq!(harness.session.take_due_timer(now), None);
}

#[rstest]
fn idle_wait_is_bounded_by_the_timer(mut harness: Harness) {
    let poll = Duration::from_millis(50);
    let now = Instant::now();
    assert_eq!(harness.session.idle_wait(now, poll), poll);

    harness
        .session
        .set_timeout_special_command(Some(Duration::from_millis(5)), Vec::new());
    assert!(harness.session.idle_wait(Instant::now(), poll) <= Duration::from_millis(5));

    harness.session.set_timeout_special_command(None, Vec::new());
    assert!(!harness.session.idle_timer_armed());
}

#[rstest]
fn terminating_survives_end_of_operation(mut harness: Harness) {
    harness.session.begin_operation(Selector::Get);
    harness.session.terminate();
    harness.session.end_operation();
    assert!(harness.session.is_terminating());
}
