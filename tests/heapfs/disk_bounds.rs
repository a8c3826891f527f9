use std::sync::Arc;

use heapfs::disk::HeapDisk;
use heapfs::error::Error;
use heapfs::filestore::FileStore;
use heapfs::view::{FileSystemView, OpenOptions};

use crate::common::abs;

#[test]
fn writing_past_the_disk_bound_runs_out_of_space() {
    let store = Arc::new(FileStore::new(Arc::new(HeapDisk::new(64, 4, 4))));
    let view = FileSystemView::new(store.clone());

    let file = abs(&["f"]);
    let (content, _, _) = view.open(&file, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();

    assert!(matches!(content.write_at(0, &vec![0u8; 257]), Err(Error::OutOfSpace)));
    content.write_at(0, &vec![0u8; 256]).unwrap();
    assert_eq!(store.disk().unallocated_space(), 0);

    view.delete(&file, heapfs::view::DeleteMode::Any).unwrap();
    content.closed();
    assert_eq!(store.disk().unallocated_space(), 256);
}
