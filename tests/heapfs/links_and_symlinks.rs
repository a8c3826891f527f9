use heapfs::error::Error;
use heapfs::view::{DeleteMode, OpenOptions};

use crate::common::{abs, unix_view};

#[test]
fn hard_link_shares_content_and_survives_original_deletion() {
    let view = unix_view();
    let x = abs(&["x"]);
    let y = abs(&["y"]);

    let (content, _, _) = view.open(&x, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    content.write_at(0, &[9, 9, 9]).unwrap();
    content.closed();

    view.link(&x, &y).unwrap();

    let (content, key, _) = view.open(&y, OpenOptions::WRITE | OpenOptions::APPEND).unwrap();
    content.write_at(content.size(), &[1]).unwrap();
    content.closed();

    let read_all = |path: &heapfs::path::Path| {
        let (content, _, _) = view.open(path, OpenOptions::READ).unwrap();
        let mut buf = vec![0u8; content.size() as usize];
        content.read_at(0, &mut buf).unwrap();
        buf
    };
    assert_eq!(read_all(&x), vec![9, 9, 9, 1]);
    assert_eq!(read_all(&y), vec![9, 9, 9, 1]);

    {
        let arena = view.store().read();
        assert_eq!(arena.get(key).unwrap().link_count(), 2);
    }

    view.delete(&x, DeleteMode::Any).unwrap();
    assert_eq!(read_all(&y), vec![9, 9, 9, 1]);

    let arena = view.store().read();
    assert_eq!(arena.get(key).unwrap().link_count(), 1);
}

#[test]
fn symlink_cycle_is_rejected_past_the_depth_limit() {
    let view = unix_view();
    view.create_directory(&abs(&["foo"])).unwrap();
    view.create_symlink(&abs(&["foo", "bar"]), heapfs::path::Path::relative(vec![heapfs::name::Name::new(
        "baz",
        Default::default(),
    )]))
    .unwrap();
    view.create_symlink(&abs(&["foo", "baz"]), heapfs::path::Path::relative(vec![heapfs::name::Name::new(
        "bar",
        Default::default(),
    )]))
    .unwrap();

    let result = view.open(&abs(&["foo", "bar", "file"]), OpenOptions::CREATE | OpenOptions::WRITE);
    assert!(matches!(result, Err(Error::TooManyLinks)));
}

#[test]
fn deleting_a_non_empty_directory_fails() {
    let view = unix_view();
    view.create_directory(&abs(&["d"])).unwrap();
    view.open(&abs(&["d", "inside"]), OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    assert!(matches!(view.delete(&abs(&["d"]), DeleteMode::Any), Err(Error::DirectoryNotEmpty)));
}

#[test]
fn delete_modes_reject_the_wrong_kind() {
    let view = unix_view();
    view.create_directory(&abs(&["d"])).unwrap();
    view.open(&abs(&["f"]), OpenOptions::CREATE | OpenOptions::WRITE).unwrap();

    assert!(matches!(view.delete(&abs(&["d"]), DeleteMode::NonDirectoryOnly), Err(Error::NotRegularFile)));
    assert!(matches!(view.delete(&abs(&["f"]), DeleteMode::DirectoryOnly), Err(Error::NotDirectory)));

    view.delete(&abs(&["d"]), DeleteMode::DirectoryOnly).unwrap();
    view.delete(&abs(&["f"]), DeleteMode::NonDirectoryOnly).unwrap();
}
