//! Session: owner of a named control block's lifetime
//!
//! 会话：具名控制块生命周期的所有者

use super::error::Result;
use super::handle::Gate;
use super::options::GateOptions;
use super::region::Region;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Creates a shared control block under a path and removes it when dropped
///
/// 在某个路径下创建共享控制块，并在丢弃时删除它
///
/// Participants in other processes attach with [`Gate::open`] on the same path.
/// Dropping the session unlinks the file; handles that are already attached keep
/// their mapping until they are dropped.
///
/// 其他进程中的参与者通过在同一路径上调用 [`Gate::open`] 挂载。
/// 丢弃会话会删除该文件；已挂载的句柄在被丢弃前仍保留其映射。
///
/// # Examples
///
/// ```
/// # use ranged_gate::{Gate, GateOptions, Request, Result, Session};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// let path = dir.path().join("gate.shm");
/// let session = Session::create(&path, GateOptions::new())?;
///
/// // Another participant attaches by path
/// // 另一个参与者按路径挂载
/// let other = Gate::open(&path)?;
/// let admission = other.admit(Request::write(3))?;
/// assert_eq!(session.gate().occupancy().writers.len(), 1);
/// other.release(admission);
///
/// drop(session);
/// assert!(!path.exists());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    gate: Gate,
}

impl Session {
    /// Create the control block at `path`
    ///
    /// 在 `path` 处创建控制块
    ///
    /// # Errors
    /// - Returns `InvalidCapacity` if the options are out of range
    /// - Returns `Io(AlreadyExists)` if `path` already exists
    ///
    /// # Errors
    /// - 如果选项超出范围，返回 `InvalidCapacity`
    /// - 如果 `path` 已存在，返回 `Io(AlreadyExists)`
    pub fn create(path: impl AsRef<Path>, options: GateOptions) -> Result<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let region = Region::create(&path, options.get_max_admitted().get())?;
        Ok(Self {
            path,
            gate: Gate::from_region(region, options.get_verbosity()),
        })
    }

    /// A handle attached to this session's block
    ///
    /// 挂载到此会话控制块的句柄
    #[inline]
    pub fn gate(&self) -> Gate {
        self.gate.clone()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to unlink control block");
        }
    }
}
