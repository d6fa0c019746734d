//! Tests for the credential stores.

use courier_protocol::AuthInfo;
use mockall::mock;
use rstest::{fixture, rstest};
use url::Url;

use super::*;
use crate::channel::MemoryChannel;
use crate::session::Session;

mock! {
    Store {}
    impl AuthStore for Store {
        fn check_cached(&mut self, info: &mut AuthInfo) -> bool;
        fn cache(&mut self, info: &AuthInfo) -> bool;
    }
}

#[fixture]
fn credentials() -> AuthInfo {
    let mut info = AuthInfo::for_url(Url::parse("memfs://host/share").expect("url"));
    info.realm = Some(String::from("files"));
    info.username = String::from("ada");
    info.password = String::from("secret");
    info
}

#[rstest]
fn null_store_never_hits(credentials: AuthInfo) {
    let mut store = NullAuthStore;
    let mut probe = credentials.clone();
    assert!(!store.cache(&credentials));
    assert!(!store.check_cached(&mut probe));
}

#[rstest]
fn memory_store_fills_matching_request(credentials: AuthInfo) {
    let mut store = MemoryAuthStore::new();
    assert!(store.cache(&credentials));

    let mut request = AuthInfo::for_url(Url::parse("memfs://host/share").expect("url"));
    request.realm = Some(String::from("files"));
    assert!(store.check_cached(&mut request));
    assert_eq!(request.username, "ada");
    assert_eq!(request.password, "secret");
}

#[rstest]
fn memory_store_keys_on_realm(credentials: AuthInfo) {
    let mut store = MemoryAuthStore::new();
    store.cache(&credentials);

    let mut other_realm = credentials.clone();
    other_realm.realm = Some(String::from("admin"));
    other_realm.username.clear();
    assert!(!store.check_cached(&mut other_realm));
    assert!(other_realm.username.is_empty());
    assert_eq!(store.len(), 1);
}

#[rstest]
fn memory_store_ignores_requests_without_url() {
    let mut store = MemoryAuthStore::new();
    assert!(!store.cache(&AuthInfo::default()));
    assert!(store.is_empty());
}

#[rstest]
fn session_delegates_to_installed_store(credentials: AuthInfo) {
    let mut store = MockStore::new();
    store
        .expect_check_cached()
        .once()
        .returning(|info| {
            info.username = String::from("cached");
            true
        });
    store.expect_cache().once().return_const(true);

    let (channel, _controller) = MemoryChannel::pair();
    let mut session = Session::new(String::from("memfs"), Box::new(channel));
    session.set_auth_store(Box::new(store));

    let mut request = credentials.clone();
    assert!(session.check_cached_authentication(&mut request));
    assert_eq!(request.username, "cached");
    assert!(session.cache_authentication(&credentials));
}
