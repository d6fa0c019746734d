//! Metadata and namespace operations on the tree.

use courier_protocol::{Command, ErrorCode, PrivilegeStatus};
use courier_worker::{Session, WorkerFailure, WorkerResult};
use tracing::{debug, warn};

use super::{misrouted, tree_path};
use crate::{CHOWN_ACTION, MEMFS_TARGET, MemFs, REQUIRE_PRIVILEGE_KEY};

/// Outgoing metadata key carrying the total capacity in bytes.
pub const TOTAL_SPACE_KEY: &str = "total";
/// Outgoing metadata key carrying the available capacity in bytes.
pub const AVAILABLE_SPACE_KEY: &str = "available";
/// Outgoing metadata key carrying the result of the usage extension.
pub const USAGE_KEY: &str = "usage";

pub(super) fn stat(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Stat { url } = command else {
        return Err(misrouted(command));
    };
    let entry = worker.tree.stat(&tree_path(url))?;
    session.stat_entry(entry)?;
    Ok(())
}

pub(super) fn list_dir(
    worker: &mut MemFs,
    session: &mut Session,
    command: &Command,
) -> WorkerResult {
    let Command::ListDir { url } = command else {
        return Err(misrouted(command));
    };
    let path = tree_path(url);
    let entries = worker.tree.list(&path).map_err(|error| {
        if error.code() == ErrorCode::IS_FILE {
            return WorkerFailure::new(ErrorCode::CANNOT_ENTER_DIRECTORY, path.as_str());
        }
        WorkerFailure::from(error)
    })?;
    session.total_size(entries.len() as u64)?;
    for entry in entries {
        session.list_entry(entry)?;
    }
    Ok(())
}

pub(super) fn mkdir(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Command::Mkdir { url, permissions } = command else {
        return Err(misrouted(command));
    };
    worker.tree.mkdir(&tree_path(url), *permissions)?;
    Ok(())
}

pub(super) fn rename(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Command::Rename { src, dest, flags } = command else {
        return Err(misrouted(command));
    };
    worker
        .tree
        .rename(&tree_path(src), &tree_path(dest), flags.overwrite)?;
    Ok(())
}

pub(super) fn symlink(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Command::Symlink {
        target,
        dest,
        flags,
    } = command
    else {
        return Err(misrouted(command));
    };
    worker
        .tree
        .symlink(target, &tree_path(dest), flags.overwrite)
        .map_err(|error| WorkerFailure::new(ErrorCode::CANNOT_SYMLINK, error.to_string()))
}

pub(super) fn set_link_dest(
    worker: &mut MemFs,
    _: &mut Session,
    command: &Command,
) -> WorkerResult {
    let Command::SetLinkDest { url, target } = command else {
        return Err(misrouted(command));
    };
    worker.tree.set_link_target(&tree_path(url), target)?;
    Ok(())
}

pub(super) fn chmod(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Command::Chmod { url, permissions } = command else {
        return Err(misrouted(command));
    };
    worker
        .tree
        .chmod(&tree_path(url), *permissions)
        .map_err(|error| WorkerFailure::new(ErrorCode::CANNOT_CHMOD, error.to_string()))
}

pub(super) fn chown(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Chown { url, owner, group } = command else {
        return Err(misrouted(command));
    };
    let path = tree_path(url);
    if session.config_bool(REQUIRE_PRIVILEGE_KEY, false)
        && !session.temporary_authorizations().contains(CHOWN_ACTION)
    {
        match session.request_privilege_operation(format!("chown {path} to {owner}:{group}")) {
            PrivilegeStatus::Granted => session.add_temporary_authorization(CHOWN_ACTION),
            PrivilegeStatus::Denied => {
                return Err(WorkerFailure::new(ErrorCode::ACCESS_DENIED, path.as_str()));
            }
            PrivilegeStatus::Unknown => {
                warn!(target: MEMFS_TARGET, %path, "privilege broker unavailable");
                return Err(WorkerFailure::new(ErrorCode::CANNOT_CHOWN, path.as_str()));
            }
        }
    }
    worker.tree.chown(&path, owner, group)?;
    Ok(())
}

pub(super) fn set_modification_time(
    worker: &mut MemFs,
    _: &mut Session,
    command: &Command,
) -> WorkerResult {
    let Command::SetModificationTime { url, mtime } = command else {
        return Err(misrouted(command));
    };
    worker
        .tree
        .set_modified(&tree_path(url), *mtime)
        .map_err(|error| WorkerFailure::new(ErrorCode::CANNOT_SETTIME, error.to_string()))
}

pub(super) fn copy(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Copy {
        src,
        dest,
        permissions,
        flags,
    } = command
    else {
        return Err(misrouted(command));
    };
    let source = tree_path(src);
    let size = worker.tree.read(&source)?.len() as u64;
    session.total_size(size)?;
    worker
        .tree
        .copy(&source, &tree_path(dest), *permissions, flags.overwrite)?;
    session.processed_size(size)?;
    Ok(())
}

pub(super) fn delete(worker: &mut MemFs, _: &mut Session, command: &Command) -> WorkerResult {
    let Command::Delete { url, is_file } = command else {
        return Err(misrouted(command));
    };
    let path = tree_path(url);
    if worker
        .open
        .as_ref()
        .is_some_and(|open| open.path() == path.as_path())
    {
        return Err(WorkerFailure::new(
            ErrorCode::CANNOT_DELETE,
            format!("{path} is open"),
        ));
    }
    worker.tree.delete(&path, *is_file)?;
    debug!(target: MEMFS_TARGET, %path, "deleted");
    Ok(())
}

pub(super) fn free_space(
    worker: &mut MemFs,
    session: &mut Session,
    command: &Command,
) -> WorkerResult {
    let Command::FileSystemFreeSpace { url } = command else {
        return Err(misrouted(command));
    };
    worker.tree.stat(&tree_path(url))?;
    let (total, available) = worker.tree.space();
    session.set_metadata(TOTAL_SPACE_KEY, total.to_string());
    session.set_metadata(AVAILABLE_SPACE_KEY, available.to_string());
    Ok(())
}

/// Extensions finalize without `finished`, so the result is sent
/// explicitly.
pub(super) fn usage(worker: &mut MemFs, session: &mut Session, command: &Command) -> WorkerResult {
    let Command::Extension { data, .. } = command else {
        return Err(misrouted(command));
    };
    let raw = std::str::from_utf8(data)
        .map_err(|error| WorkerFailure::new(ErrorCode::MALFORMED_URL, error.to_string()))?;
    let bytes = worker.tree.usage(&crate::tree::normalise(raw))?;
    session.set_metadata(USAGE_KEY, bytes.to_string());
    session.send_metadata()?;
    Ok(())
}
