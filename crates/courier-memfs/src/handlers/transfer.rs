//! Whole-resource transfers: `get`, `put` and `multi-get`.

use camino::Utf8Path;
use courier_protocol::{Command, ErrorCode};
use courier_worker::{Session, WorkerFailure, WorkerResult};
use tracing::debug;

use super::{misrouted, tree_path};
use crate::{MEMFS_TARGET, MemFs, mime};

/// Size of each `data` chunk sent by downloads.
pub const CHUNK_SIZE: usize = 64 * 1024;

pub(super) fn get(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Get { url } = command else {
        return Err(misrouted(command));
    };
    send_file(worker, session, &tree_path(url))
}

/// Streams each file in turn as one `data` stream.
///
/// A file starts with its `mime_type` and `total_size` frames; the
/// controller splits the stream by counting `total_size` bytes. Only the
/// last file is followed by the end-of-stream marker.
pub(super) fn multi_get(
    worker: &mut MemFs,
    session: &mut Session,
    command: &Command,
) -> WorkerResult {
    let Command::MultiGet { urls } = command else {
        return Err(misrouted(command));
    };
    for url in urls {
        send_file(worker, session, &tree_path(url))?;
    }
    Ok(())
}

fn send_file(worker: &MemFs, session: &mut Session, path: &Utf8Path) -> WorkerResult {
    let contents = worker.tree.read(path)?;
    session.mime_type(mime::guess(path))?;
    session.total_size(contents.len() as u64)?;
    let mut sent: u64 = 0;
    for chunk in contents.chunks(CHUNK_SIZE) {
        if session.was_killed() {
            return Err(WorkerFailure::new(ErrorCode::ABORTED, path.as_str()));
        }
        session.data(chunk)?;
        sent = sent.saturating_add(chunk.len() as u64);
        session.processed_size(sent)?;
    }
    debug!(target: MEMFS_TARGET, %path, bytes = sent, "sent file");
    Ok(())
}

pub(super) fn put(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Put {
        url,
        permissions,
        flags,
    } = command
    else {
        return Err(misrouted(command));
    };
    let path = tree_path(url);
    let existing = if worker.tree.exists(&path) {
        Some(worker.tree.read(&path)?.to_vec())
    } else {
        None
    };
    let mut contents = match existing {
        Some(_) if !flags.overwrite && !flags.resume => {
            return Err(WorkerFailure::already_exists(path.as_str()));
        }
        Some(partial) if flags.resume && !partial.is_empty() => {
            if session.can_resume(partial.len() as u64)? {
                partial
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };
    session.processed_size(contents.len() as u64)?;
    while let Some(chunk) = session.next_upload_chunk()? {
        if session.was_killed() {
            return Err(WorkerFailure::new(ErrorCode::ABORTED, path.as_str()));
        }
        contents.extend_from_slice(&chunk);
        session.processed_size(contents.len() as u64)?;
    }
    debug!(target: MEMFS_TARGET, %path, bytes = contents.len(), "stored file");
    worker.tree.write(&path, contents, *permissions)?;
    Ok(())
}
