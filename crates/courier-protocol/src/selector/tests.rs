//! Unit tests for selector classification.

use std::str::FromStr;

use rstest::rstest;
use strum::IntoEnumIterator;

use super::*;

#[rstest]
#[case(Selector::Get, "get")]
#[case(Selector::ListDir, "list-dir")]
#[case(Selector::SetModificationTime, "set-modification-time")]
#[case(Selector::FileSystemFreeSpace, "file-system-free-space")]
#[case(Selector::MessageBoxAnswer, "message-box-answer")]
fn display_and_parse_agree(#[case] selector: Selector, #[case] text: &str) {
    assert_eq!(selector.to_string(), text);
    assert_eq!(Selector::from_str(text).expect("parse selector"), selector);
}

#[rstest]
fn every_selector_belongs_to_exactly_one_group() {
    for selector in Selector::iter() {
        let groups = [
            selector.is_operation(),
            selector.is_answer(),
            selector.is_control(),
        ];
        let count = groups.iter().filter(|flag| **flag).count();
        assert_eq!(count, 1, "{selector} sits in {count} groups");
    }
}

#[rstest]
#[case(Selector::Data)]
#[case(Selector::HostInfo)]
#[case(Selector::PrivilegeAnswer)]
fn answers_are_not_operations(#[case] selector: Selector) {
    assert!(selector.is_answer());
    assert!(!selector.is_operation());
}

#[test]
fn unknown_selector_fails_to_parse() {
    assert!(Selector::from_str("teleport").is_err());
}
