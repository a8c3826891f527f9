//! An embeddable, in-memory, POSIX-style hierarchical file system.
//!
//! The entry point is [`config::Configuration`]: build a store, get back a
//! [`view::FileSystemView`], and operate on it with [`path::Path`]s produced
//! by a [`service::PathService`].
//!
//! ```no_run
//! use heapfs::config::Configuration;
//! use heapfs::view::OpenOptions;
//!
//! let config = Configuration::unix();
//! let service = config.path_service();
//! let (_store, view) = config.build().unwrap();
//!
//! let path = service.parse("/greeting.txt");
//! let (content, _key, _times) = view.open(&path, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
//! content.write_at(0, b"hello").unwrap();
//! ```
//!
//! The module layout mirrors the system's layering, bottom to top:
//! [`disk`] (block pool) -> [`store`] (resizable byte content) ->
//! [`inode`]/[`dir`] (the object graph) -> [`tree`] (symlink-aware
//! resolution) -> [`filestore`] (locking boundary) -> [`view`] (the
//! operation API) -> [`channel`] (open file handles) -> [`service`]/[`path`]/
//! [`name`] (path parsing) -> [`attr`] (metadata) -> [`config`] (assembly).

pub mod attr;
pub mod channel;
pub mod config;
pub mod dir;
pub mod disk;
pub mod error;
pub mod filestore;
pub mod inode;
pub mod name;
pub mod path;
pub mod service;
pub mod store;
pub mod tree;
pub mod view;

pub use config::Configuration;
pub use error::{Error, Result};
pub use path::Path;
pub use view::FileSystemView;
