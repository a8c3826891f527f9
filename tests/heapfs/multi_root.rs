use heapfs::error::Error;
use heapfs::view::{CopyOptions, DeleteMode, FileSystemView, OpenOptions};

use crate::common::{abs_under, store_with_roots};

#[test]
fn secure_stream_survives_a_move_to_another_root() {
    let store = store_with_roots(&["C:/", "D:/"]);
    let view = FileSystemView::new(store);

    let foo = abs_under("C:/", &["foo"]);
    view.create_directory(&foo).unwrap();
    view.open(&abs_under("C:/", &["foo", "a"]), OpenOptions::CREATE | OpenOptions::WRITE).unwrap();

    let stream = view.new_secure_directory_stream(&foo).unwrap();

    view.create_directory(&abs_under("D:/", &["baz"])).unwrap();
    let baz_stuff = abs_under("D:/", &["baz", "stuff"]);
    view.move_to(&foo, &view, &baz_stuff, CopyOptions::empty()).unwrap();

    let a = heapfs::path::Path::relative(vec![heapfs::name::Name::new("a", Default::default())]);
    stream.delete_file(&a).unwrap();

    assert!(view.to_real_path(&abs_under("D:/", &["baz", "stuff", "a"])).is_err());
    assert_eq!(stream.current_path().unwrap(), baz_stuff);
}

#[test]
fn atomic_move_unsupported_across_stores_but_fine_within_one() {
    let store = store_with_roots(&["/"]);
    let view = FileSystemView::new(store);

    let src = abs_under("/", &["src"]);
    view.open(&src, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    let dst = abs_under("/", &["dst"]);
    view.move_to(&src, &view, &dst, CopyOptions::ATOMIC_MOVE).unwrap();
    assert!(view.to_real_path(&dst).is_ok());

    let other_store = store_with_roots(&["/"]);
    let other_view = FileSystemView::new(other_store);
    let src2 = abs_under("/", &["dst"]);
    let dst2 = abs_under("/", &["moved"]);
    assert!(matches!(view.move_to(&src2, &other_view, &dst2, CopyOptions::ATOMIC_MOVE), Err(Error::Unsupported(_))));
}

#[test]
fn move_between_two_roots_of_the_same_store_is_an_in_place_rename() {
    let store = store_with_roots(&["C:/", "D:/"]);
    let view = FileSystemView::new(store);

    let src = abs_under("C:/", &["a.txt"]);
    view.open(&src, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
    let dst = abs_under("D:/", &["a.txt"]);
    view.move_to(&src, &view, &dst, CopyOptions::empty()).unwrap();

    assert!(matches!(view.to_real_path(&src), Err(Error::NotFound)));
    assert!(view.to_real_path(&dst).is_ok());
}

#[test]
fn an_unconfigured_root_token_is_a_provider_mismatch() {
    let store = store_with_roots(&["/"]);
    let view = FileSystemView::new(store);
    assert!(matches!(view.to_real_path(&abs_under("E:/", &["nope"])), Err(Error::ProviderMismatch)));
}

#[test]
fn deleting_any_configured_root_is_rejected() {
    let store = store_with_roots(&["C:/", "D:/"]);
    let view = FileSystemView::new(store);
    assert!(matches!(view.delete(&abs_under("D:/", &[]), DeleteMode::Any), Err(Error::Invalid(_))));
}
