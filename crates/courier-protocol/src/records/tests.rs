//! Unit tests for protocol records.

use rstest::rstest;

use super::*;

#[test]
fn symlink_entry_records_target() {
    let entry = Entry::symlink("latest", "releases/1.2");
    assert_eq!(entry.kind(), EntryKind::Symlink);
    assert_eq!(entry.link_dest(), Some("releases/1.2"));
}

#[test]
fn entry_omits_unknown_fields_on_the_wire() {
    let json = serde_json::to_value(Entry::directory("src")).expect("serialise");
    let object = json.as_object().expect("object");
    assert!(!object.contains_key("owner"));
    assert!(!object.contains_key("mime_type"));
    assert_eq!(object.get("kind"), Some(&serde_json::json!("directory")));
}

#[test]
fn job_flags_default_to_cleared() {
    let flags: JobFlags = serde_json::from_str("{}").expect("deserialise");
    assert_eq!(flags, JobFlags::default());
    assert!(JobFlags::overwrite().overwrite);
}

#[rstest]
#[case(OpenMode::Read, false)]
#[case(OpenMode::Write, true)]
#[case(OpenMode::ReadWrite, true)]
#[case(OpenMode::Append, true)]
fn open_mode_reports_write_access(#[case] mode: OpenMode, #[case] writes: bool) {
    assert_eq!(mode.is_write(), writes);
}

#[test]
fn auth_info_debug_hides_password() {
    let info = AuthInfo {
        username: "alice".into(),
        password: "hunter2".into(),
        ..AuthInfo::default()
    };
    let rendered = format!("{info:?}");
    assert!(rendered.contains("alice"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn host_info_reports_resolution() {
    let unresolved = HostInfo {
        hostname: "nowhere.invalid".into(),
        addresses: Vec::new(),
        error: Some("NXDOMAIN".into()),
    };
    assert!(!unresolved.is_resolved());

    let resolved = HostInfo {
        hostname: "localhost".into(),
        addresses: vec!["127.0.0.1".parse().expect("address")],
        error: None,
    };
    assert!(resolved.is_resolved());
}

#[test]
fn privilege_status_defaults_to_unknown() {
    assert_eq!(PrivilegeStatus::default(), PrivilegeStatus::Unknown);
}
