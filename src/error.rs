//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Result<T>`], where the
//! error carries one of the kinds from the file-store's contract rather than
//! an OS `errno`. Kinds are chosen so a host embedding this library can match
//! on them without depending on any particular platform's error numbering.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all file-store, view, channel and path-service
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Lookup failed: the path's root is unknown, an intermediate component
    /// is missing, or the final component is missing where one was required.
    #[error("no such file or directory")]
    NotFound,

    /// A create/link destination already exists and no replace option was
    /// given.
    #[error("file already exists")]
    AlreadyExists,

    /// An intermediate path component is not a directory, or an operation
    /// required one.
    #[error("not a directory")]
    NotDirectory,

    /// An operation required a regular file.
    #[error("not a regular file")]
    NotRegularFile,

    /// `read_symlink` was called on something that is not a symbolic link.
    #[error("not a symbolic link")]
    NotSymbolicLink,

    /// A delete or replace was attempted on a non-empty directory.
    #[error("directory not empty")]
    DirectoryNotEmpty,

    /// A symbolic-link chain exceeded the maximum resolution depth.
    #[error("too many levels of symbolic links")]
    TooManyLinks,

    /// Root deletion, moving a directory into its own subtree, relative-path
    /// deletion of the working directory, an illegal attribute name, or
    /// relativizing paths with mismatched roots.
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// `HeapDisk::allocate` would exceed `max_blocks`.
    #[error("no space left on device")]
    OutOfSpace,

    /// `ATOMIC_MOVE` on copy, an unmapped attribute view, or `"view:*"`
    /// combined with explicit attribute names.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// An operation was attempted on a channel that has already been closed.
    #[error("channel is closed")]
    ChannelClosed,

    /// A blocking operation was interrupted by a concurrent close of the
    /// same channel.
    #[error("channel closed by interrupt")]
    ChannelClosedByInterrupt,

    /// The channel was not opened with `READ`.
    #[error("channel is not readable")]
    NonReadable,

    /// The channel was not opened with `WRITE`/`APPEND`.
    #[error("channel is not writable")]
    NonWritable,

    /// A path originates from a different [`crate::filestore::FileStore`]
    /// instance than the view operating on it.
    #[error("path belongs to a different file system provider")]
    ProviderMismatch,
}
