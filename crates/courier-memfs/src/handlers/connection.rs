//! Connection lifecycle, status and the keepalive timer.

use std::time::Duration;

use courier_protocol::{AuthInfo, Command, ErrorCode};
use courier_worker::{Session, WorkerFailure, WorkerResult};
use tracing::{debug, info};
use url::Url;

use super::misrouted;
use crate::{
    HOSTLESS, KEEPALIVE_KEY, KEEPALIVE_PAYLOAD, MEMFS_TARGET, MemFs, PROTOCOL, REQUIRE_AUTH_KEY,
};

const MAX_LOGIN_ATTEMPTS: usize = 3;

pub(super) fn connect(worker: &mut MemFs, session: &mut Session, _: &Command) -> WorkerResult {
    if worker.connected {
        return Ok(());
    }
    if session.config_bool(REQUIRE_AUTH_KEY, false) {
        authenticate(worker, session)?;
    }
    worker.connected = true;
    info!(target: MEMFS_TARGET, host = worker.host_name(), "connected");
    arm_keepalive(session);
    Ok(())
}

fn authenticate(worker: &MemFs, session: &mut Session) -> WorkerResult {
    let location = format!("{PROTOCOL}://{}/", worker.host_name());
    let url = Url::parse(&location)
        .map_err(|error| WorkerFailure::new(ErrorCode::MALFORMED_URL, error.to_string()))?;
    let mut info = AuthInfo::for_url(url);
    info.realm = Some(PROTOCOL.to_owned());
    info.username.clone_from(&worker.host.user);
    if session.check_cached_authentication(&mut info) && worker.accepts(&info) {
        debug!(target: MEMFS_TARGET, "cached credentials accepted");
        return Ok(());
    }
    let mut error_message = String::new();
    for _ in 0..MAX_LOGIN_ATTEMPTS {
        if !session.open_password_dialog(&mut info, &error_message)? {
            return Err(WorkerFailure::user_canceled(location));
        }
        if worker.accepts(&info) {
            if info.keep_password {
                session.cache_authentication(&info);
            }
            return Ok(());
        }
        "invalid user name or password".clone_into(&mut error_message);
    }
    Err(WorkerFailure::new(ErrorCode::COULD_NOT_LOGIN, location))
}

fn arm_keepalive(session: &mut Session) {
    let interval = session.config_int(KEEPALIVE_KEY, 0);
    let delay = u64::try_from(interval)
        .ok()
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis);
    session.set_timeout_special_command(delay, KEEPALIVE_PAYLOAD);
}

pub(super) fn close_connection(
    worker: &mut MemFs,
    session: &mut Session,
    _: &Command,
) -> WorkerResult {
    worker.connected = false;
    worker.open = None;
    session.set_timeout_special_command(None, Vec::<u8>::new());
    info!(target: MEMFS_TARGET, "connection closed");
    Ok(())
}

pub(super) fn set_host(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Command::SetHost {
        host,
        port,
        user,
        password,
    } = command
    else {
        return Err(misrouted(command));
    };
    if *host != worker.host.name || *user != worker.host.user {
        worker.connected = false;
    }
    worker.host.name.clone_from(host);
    worker.host.port = *port;
    worker.host.user.clone_from(user);
    worker.host.password.clone_from(password);
    Ok(())
}

pub(super) fn status_query(
    worker: &mut MemFs,
    session: &mut Session,
    _: &Command,
) -> WorkerResult {
    let host = if worker.connected {
        worker.host_name().to_owned()
    } else {
        String::new()
    };
    session.status(host, worker.connected)?;
    Ok(())
}

pub(super) fn special(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Special { data } = command else {
        return Err(misrouted(command));
    };
    if data.as_slice() != KEEPALIVE_PAYLOAD {
        return Err(WorkerFailure::unsupported_action(session.protocol(), command));
    }
    worker.keepalives = worker.keepalives.saturating_add(1);
    session.info_message("keepalive")?;
    arm_keepalive(session);
    Ok(())
}

pub(super) fn reparse_configuration(
    worker: &mut MemFs,
    session: &mut Session,
    _: &Command,
) -> WorkerResult {
    debug!(target: MEMFS_TARGET, "configuration reloaded");
    if worker.connected {
        arm_keepalive(session);
    }
    Ok(())
}

impl MemFs {
    pub(crate) const fn host_name(&self) -> &str {
        if self.host.name.is_empty() {
            HOSTLESS
        } else {
            self.host.name.as_str()
        }
    }

    // Without a configured password any non-empty user name logs in.
    fn accepts(&self, info: &AuthInfo) -> bool {
        if info.username.is_empty() {
            return false;
        }
        self.host.password.is_empty() || info.password == self.host.password
    }
}
