//! Shared world for the behavioural suites.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use courier_protocol::{AuthInfo, Command, Entry, ErrorCode, Notification, Selector};
use url::Url;

use crate::testing::{OperationSummary, collect_data};
use crate::{OperationTable, WorkerError, WorkerFailure, WorkerResult, WorkerThread};

pub(super) const WAIT: Duration = Duration::from_secs(2);
pub(super) const KEEPALIVE: &[u8] = b"keepalive";
const CONTENT: &[u8] = b"hello";

/// Worker state visible to the test after handlers ran.
struct Probe {
    invocations: Arc<AtomicUsize>,
}

impl Probe {
    fn touch(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }
}

fn path_of(url: Option<&Url>) -> String {
    url.map(|target| target.path().to_owned()).unwrap_or_default()
}

fn fetch(probe: &mut Probe, session: &mut crate::Session, command: &Command) -> WorkerResult {
    probe.touch();
    let path = path_of(command.url());
    if path != "/hello.txt" {
        return Err(WorkerFailure::does_not_exist(path));
    }
    session.mime_type("text/plain")?;
    session.total_size(5)?;
    session.data(CONTENT)?;
    Ok(())
}

fn login(probe: &mut Probe, session: &mut crate::Session, _: &Command) -> WorkerResult {
    probe.touch();
    if !session.config_bool("RequireLogin", false) {
        return Ok(());
    }
    let url = Url::parse("memfs://localhost/")
        .map_err(|error| WorkerFailure::internal(error.to_string()))?;
    let mut info = AuthInfo::for_url(url);
    if !session.open_password_dialog(&mut info, "")? {
        return Err(WorkerFailure::user_canceled("login"));
    }
    session.info_message(format!("welcome {}", info.username))?;
    Ok(())
}

fn probe_table() -> OperationTable<Probe> {
    let mut table = OperationTable::new();
    table.register(Selector::Get, fetch).expect("register get");
    table.register(Selector::Connect, login).expect("register connect");
    table
        .register(Selector::Stat, |probe: &mut Probe, session, command| {
            probe.touch();
            let path = path_of(command.url());
            session.stat_entry(Entry::file(path.trim_start_matches('/'), 5))?;
            Ok(())
        })
        .expect("register stat");
    table
        .register(Selector::ListDir, |probe: &mut Probe, session, _| {
            probe.touch();
            session.list_entry(Entry::file("hello.txt", 5))?;
            session.set_metadata("entry-count", "1");
            Ok(())
        })
        .expect("register list-dir");
    table
        .register(Selector::Delete, |probe: &mut Probe, session, command| {
            probe.touch();
            session.set_metadata("attempted", "true");
            Err(WorkerFailure::does_not_exist(path_of(command.url())))
        })
        .expect("register delete");
    table
        .register(Selector::SetHost, |probe: &mut Probe, session, _| {
            probe.touch();
            session.set_timeout_special_command(Some(Duration::from_millis(30)), KEEPALIVE);
            Ok(())
        })
        .expect("register set-host");
    table
        .register(Selector::Special, |probe: &mut Probe, session, command| {
            probe.touch();
            if let Command::Special { data } = command {
                session.info_message(String::from_utf8_lossy(data).into_owned())?;
            }
            Ok(())
        })
        .expect("register special");
    table
}

/// State carried between steps.
#[derive(Default)]
pub(crate) struct World {
    worker: Option<WorkerThread>,
    invocations: Arc<AtomicUsize>,
    replies: Vec<Vec<Notification>>,
    prompts: usize,
    stopped: Option<Result<(), WorkerError>>,
}

pub(crate) fn world() -> World {
    World::default()
}

impl World {
    pub(crate) fn start(&mut self) {
        let probe = Probe {
            invocations: Arc::clone(&self.invocations),
        };
        let worker = WorkerThread::spawn("memfs", probe, probe_table()).expect("spawn worker");
        self.worker = Some(worker);
    }

    fn worker(&self) -> &WorkerThread {
        self.worker.as_ref().expect("worker started")
    }

    pub(crate) fn send(&self, command: Command) {
        self.worker().send(command).expect("send command");
    }

    pub(crate) fn run_operation(&mut self, command: Command) {
        self.send(command);
        let frames = self.worker().collect_operation(WAIT);
        self.replies.push(frames);
    }

    /// Sends `connect` and waits for the credential prompt.
    pub(crate) fn connect_until_prompt(&mut self) {
        self.send(Command::Connect);
        loop {
            match self.worker().recv_timeout(WAIT) {
                Some(Notification::CredentialPrompt { .. }) => {
                    self.prompts += 1;
                    return;
                }
                Some(_) => {}
                None => panic!("credential prompt never arrived"),
            }
        }
    }

    pub(crate) fn finish_operation(&mut self) {
        let frames = self.worker().collect_operation(WAIT);
        self.replies.push(frames);
    }

    pub(crate) fn collect_for(&mut self, window: Duration) {
        let mut frames = Vec::new();
        while let Some(frame) = self.worker().recv_timeout(window) {
            frames.push(frame);
        }
        self.replies.push(frames);
    }

    pub(crate) fn stop(&mut self) {
        let worker = self.worker.take().expect("worker started");
        self.stopped = Some(worker.join());
    }

    pub(crate) fn last(&self) -> &[Notification] {
        self.replies.last().map_or(&[], Vec::as_slice)
    }

    pub(crate) fn summary(&self) -> OperationSummary {
        OperationSummary::from(self.last())
    }

    pub(crate) fn data(&self) -> Vec<u8> {
        collect_data(self.last())
    }

    pub(crate) fn replies(&self) -> &[Vec<Notification>] {
        &self.replies
    }

    pub(crate) fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub(crate) const fn prompts(&self) -> usize {
        self.prompts
    }

    pub(crate) const fn stopped(&self) -> Option<&Result<(), WorkerError>> {
        self.stopped.as_ref()
    }
}

pub(crate) fn command_for(selector: &str, path: &str) -> Command {
    let url = Url::parse(&format!("memfs:{path}")).expect("url");
    match selector {
        "get" => Command::Get { url },
        "mimetype" => Command::Mimetype { url },
        "stat" => Command::Stat { url },
        "list-dir" => Command::ListDir { url },
        "delete" => Command::Delete { url, is_file: true },
        "mkdir" => Command::Mkdir {
            url,
            permissions: None,
        },
        other => panic!("unknown selector {other}"),
    }
}

pub(crate) fn error_code(code: i32) -> ErrorCode {
    ErrorCode::new(code)
}
