//! `open` and the operations on the open file.
//!
//! The open file is edited in a private buffer. `close` writes the buffer
//! back when the file was opened for writing.

use camino::{Utf8Path, Utf8PathBuf};
use courier_protocol::{Command, ErrorCode, OpenMode};
use courier_worker::{Session, WorkerFailure, WorkerResult};
use tracing::debug;

use super::{misrouted, tree_path};
use crate::{MEMFS_TARGET, MemFs, mime};

/// A file opened with `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    path: Utf8PathBuf,
    mode: OpenMode,
    buffer: Vec<u8>,
    cursor: usize,
}

impl OpenFile {
    /// Returns the path of the open file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the cursor offset.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    fn require_write(&self) -> WorkerResult {
        if self.mode.is_write() {
            return Ok(());
        }
        Err(WorkerFailure::new(
            ErrorCode::WRITE_ACCESS_DENIED,
            self.path.as_str(),
        ))
    }
}

fn nothing_open(command: &Command) -> WorkerFailure {
    WorkerFailure::internal(format!("{} with no open file", command.selector()))
}

fn open_file<'a>(
    worker: &'a mut MemFs,
    command: &Command,
) -> Result<&'a mut OpenFile, WorkerFailure> {
    worker.open.as_mut().ok_or_else(|| nothing_open(command))
}

/// Largest length the open file may grow to before `close` would overflow
/// the tree.
fn growth_limit(worker: &MemFs) -> usize {
    let (_, available) = worker.tree.space();
    let committed = worker
        .open
        .as_ref()
        .and_then(|file| worker.tree.read(&file.path).ok())
        .map_or(0, <[u8]>::len);
    usize::try_from(available)
        .unwrap_or(usize::MAX)
        .saturating_add(committed)
}

fn ensure_room(file: &OpenFile, length: usize, limit: usize) -> WorkerResult {
    if length <= file.buffer.len() || length <= limit {
        return Ok(());
    }
    Err(WorkerFailure::new(
        ErrorCode::DISK_FULL,
        format!("{} cannot grow to {length} bytes", file.path),
    ))
}

fn to_offset(value: u64, code: ErrorCode) -> Result<usize, WorkerFailure> {
    usize::try_from(value).map_err(|_| WorkerFailure::new(code, value.to_string()))
}

pub(super) fn open(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Open { url, mode } = command else {
        return Err(misrouted(command));
    };
    let path = tree_path(url);
    let refusal = if mode.is_write() {
        ErrorCode::CANNOT_OPEN_FOR_WRITING
    } else {
        ErrorCode::CANNOT_OPEN_FOR_READING
    };
    if let Some(current) = &worker.open {
        return Err(WorkerFailure::new(
            refusal,
            format!("{} is still open", current.path),
        ));
    }
    let existing = match worker.tree.read(&path) {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(error) if error.code() == ErrorCode::DOES_NOT_EXIST && mode.is_write() => None,
        Err(error) => return Err(WorkerFailure::new(refusal, error.to_string())),
    };
    let buffer = match mode {
        OpenMode::Write => Vec::new(),
        OpenMode::Read | OpenMode::ReadWrite | OpenMode::Append => {
            existing.unwrap_or_default()
        }
    };
    let cursor = if *mode == OpenMode::Append {
        buffer.len()
    } else {
        0
    };
    session.mime_type(mime::guess(&path))?;
    session.total_size(buffer.len() as u64)?;
    session.position(cursor as u64)?;
    debug!(target: MEMFS_TARGET, %path, ?mode, "opened file");
    worker.open = Some(OpenFile {
        path,
        mode: *mode,
        buffer,
        cursor,
    });
    Ok(())
}

pub(super) fn read(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Read { size } = command else {
        return Err(misrouted(command));
    };
    let file = open_file(worker, command)?;
    let wanted = to_offset(*size, ErrorCode::COULD_NOT_READ)?;
    let end = file.cursor.saturating_add(wanted).min(file.buffer.len());
    let chunk = file.buffer.get(file.cursor..end).unwrap_or_default();
    if chunk.is_empty() && file.cursor < file.buffer.len() {
        return Ok(());
    }
    file.cursor = end.max(file.cursor);
    session.data(chunk)?;
    Ok(())
}

pub(super) fn write(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Write { data } = command else {
        return Err(misrouted(command));
    };
    let limit = growth_limit(worker);
    let file = open_file(worker, command)?;
    file.require_write()?;
    if file.mode == OpenMode::Append {
        file.cursor = file.buffer.len();
    }
    let end = file.cursor.saturating_add(data.len());
    ensure_room(file, end, limit)?;
    if file.buffer.len() < end {
        file.buffer.resize(end, 0);
    }
    if let Some(target) = file.buffer.get_mut(file.cursor..end) {
        target.copy_from_slice(data);
    }
    file.cursor = end;
    session.written(data.len() as u64)?;
    Ok(())
}

pub(super) fn seek(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Seek { offset } = command else {
        return Err(misrouted(command));
    };
    let file = open_file(worker, command)?;
    let target = to_offset(*offset, ErrorCode::CANNOT_SEEK)?;
    if target > file.buffer.len() {
        return Err(WorkerFailure::new(
            ErrorCode::CANNOT_SEEK,
            format!("{} is shorter than {offset} bytes", file.path),
        ));
    }
    file.cursor = target;
    session.position(*offset)?;
    Ok(())
}

pub(super) fn truncate(
    worker: &mut MemFs,
    session: &mut Session,
    command: &Command,
) -> WorkerResult {
    let Command::Truncate { length } = command else {
        return Err(misrouted(command));
    };
    let limit = growth_limit(worker);
    let file = open_file(worker, command)?;
    file.require_write()?;
    let new_length = to_offset(*length, ErrorCode::CANNOT_TRUNCATE)?;
    ensure_room(file, new_length, limit)?;
    file.buffer.resize(new_length, 0);
    file.cursor = file.cursor.min(new_length);
    session.truncated(*length)?;
    Ok(())
}

pub(super) fn close(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Some(file) = worker.open.take() else {
        return Err(nothing_open(command));
    };
    debug!(target: MEMFS_TARGET, path = %file.path, "closing file");
    if file.mode.is_write() {
        worker.tree.write(&file.path, file.buffer, None)?;
    }
    Ok(())
}
