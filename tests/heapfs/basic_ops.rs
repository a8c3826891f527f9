use heapfs::view::OpenOptions;

use crate::common::{abs, unix_view};

#[test]
fn create_and_read_nested_file() {
    let view = unix_view();
    view.create_directory(&abs(&["a"])).unwrap();
    view.create_directory(&abs(&["a", "b"])).unwrap();
    view.create_directory(&abs(&["a", "b", "c"])).unwrap();

    let file = abs(&["a", "b", "c", "f"]);
    let (content, _key, _) = view.open(&file, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    content.write_at(0, &[0, 1, 2, 3]).unwrap();
    content.closed();

    let (content, _key, _) = view.open(&file, OpenOptions::READ).unwrap();
    let mut buf = [0u8; 4];
    let read = content.read_at(0, &mut buf).unwrap().unwrap();
    assert_eq!(read, 4);
    assert_eq!(buf, [0, 1, 2, 3]);
    assert_eq!(content.size(), 4);
}

#[test]
fn reading_at_or_beyond_size_hits_eof() {
    let view = unix_view();
    let file = abs(&["f"]);
    let (content, _key, _) = view.open(&file, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    content.write_at(0, &[1, 2, 3]).unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(content.read_at(3, &mut buf).unwrap(), None);
    assert_eq!(content.read_at(10, &mut buf).unwrap(), None);
}

#[test]
fn write_past_end_zero_fills_the_gap() {
    let view = unix_view();
    let file = abs(&["f"]);
    let (content, _key, _) = view.open(&file, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    content.write_at(5, &[9]).unwrap();

    let mut buf = [0xffu8; 6];
    let read = content.read_at(0, &mut buf).unwrap().unwrap();
    assert_eq!(read, 6);
    assert_eq!(buf, [0, 0, 0, 0, 0, 9]);
}

#[test]
fn truncate_to_a_larger_size_is_a_no_op() {
    let view = unix_view();
    let file = abs(&["f"]);
    let (content, _key, _) = view.open(&file, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    content.write_at(0, &[1, 2, 3]).unwrap();
    assert!(!content.truncate(100).unwrap());
    assert_eq!(content.size(), 3);
}
