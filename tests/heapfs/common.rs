use std::sync::Arc;

use heapfs::config::Configuration;
use heapfs::filestore::FileStore;
use heapfs::name::Name;
use heapfs::path::Path;
use heapfs::view::FileSystemView;

pub fn unix_view() -> FileSystemView {
    let (_store, view) = Configuration::unix().build().unwrap();
    view
}

pub fn abs(names: &[&str]) -> Path {
    Path::absolute(Name::new("/", Default::default()), names.iter().map(|n| Name::new(*n, Default::default())).collect())
}

pub fn abs_under(root: &str, names: &[&str]) -> Path {
    Path::absolute(Name::new(root, Default::default()), names.iter().map(|n| Name::new(*n, Default::default())).collect())
}

pub fn rel(names: &[&str]) -> Path {
    Path::relative(names.iter().map(|n| Name::new(*n, Default::default())).collect())
}

pub fn store_with_roots(roots: &[&str]) -> Arc<FileStore> {
    Arc::new(FileStore::with_roots(
        Arc::new(heapfs::disk::HeapDisk::new(512, 4096, 256)),
        roots.iter().map(|r| Name::new(*r, Default::default())).collect(),
    ))
}
