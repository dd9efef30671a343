//! Integration tests for saving and loading whole projects.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{sample_movie, BrokenSave, FrameList, RecordingNotifier, ResetCounter};
use tasproj::movie::PortDevice;
use tasproj::prelude::*;
use tasproj::APP_VERSION_NUMERIC;

use tempfile::tempdir;

struct Fixture {
    project: Project,
    markers: Rc<RefCell<FrameList>>,
    bookmarks: Rc<RefCell<FrameList>>,
    greenzone: Rc<RefCell<FrameList>>,
    history: Rc<RefCell<FrameList>>,
    notifier: Rc<RefCell<RecordingNotifier>>,
    playback: Rc<RefCell<ResetCounter>>,
}

/// Project with frame-list codecs for four modules; piano roll and
/// selection stay opaque.
fn fixture() -> Fixture {
    let markers = FrameList::shared(&[]);
    let bookmarks = FrameList::shared(&[]);
    let greenzone = FrameList::shared(&[]);
    let history = FrameList::shared(&[]);
    let notifier = RecordingNotifier::shared();
    let playback = Rc::new(RefCell::new(ResetCounter::default()));

    let project = Project::builder()
        .module(ModuleId::Markers, markers.clone())
        .module(ModuleId::Bookmarks, bookmarks.clone())
        .module(ModuleId::Greenzone, greenzone.clone())
        .module(ModuleId::History, history.clone())
        .notifier(notifier.clone())
        .session_component(playback.clone())
        .autosave(AutosaveConfig::disabled())
        .build();

    Fixture { project, markers, bookmarks, greenzone, history, notifier, playback }
}

#[test]
fn test_roundtrip_full_save() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("run.fm3");

    // Write project
    {
        let mut fx = fixture();
        *fx.project.movie_mut() = sample_movie();
        fx.markers.borrow_mut().frames = vec![0, 100, 250];
        fx.history.borrow_mut().frames = vec![7];
        fx.project.mark_changed();
        fx.project.save_as(&path).expect("Failed to save project");
        assert!(!fx.project.is_changed());
        assert_eq!(fx.notifier.borrow().saves, 1);
    }

    // Read back and verify
    let mut fx = fixture();
    fx.bookmarks.borrow_mut().frames = vec![99];
    let report = fx.project.load(&path).expect("Failed to load project");

    assert_eq!(report.selection, ModuleSelection::all());
    assert!(report.is_clean());

    let expected = Movie { emu_version: APP_VERSION_NUMERIC, load_frame_count: 300, ..sample_movie() };
    assert_eq!(fx.project.movie(), &expected);

    assert_eq!(fx.markers.borrow().frames, vec![0, 100, 250]);
    assert_eq!(fx.history.borrow().frames, vec![7]);
    // Saved empty, so loading clears the stale state.
    assert!(fx.bookmarks.borrow().frames.is_empty());
    assert!(fx.greenzone.borrow().frames.is_empty());
}

#[test]
fn test_compact_save_single_module_stays_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.fm3");

    let mut fx = fixture();
    *fx.project.movie_mut() = sample_movie();
    fx.markers.borrow_mut().frames = vec![1, 2];
    fx.bookmarks.borrow_mut().frames = vec![3];
    fx.greenzone.borrow_mut().frames = vec![4, 5, 6];
    fx.history.borrow_mut().frames = vec![8];
    fx.project.mark_changed();

    let options = CompactOptions { binary: false, modules: ModuleSelection::none().with(ModuleId::Greenzone) };
    fx.project.save_compact(&path, &options).unwrap();
    assert!(fx.project.is_changed(), "compact save must not clear the changed flag");
    assert!(fx.project.project_file().is_none());

    let mut reader = fixture();
    let report = reader.project.load(&path).unwrap();
    assert_eq!(report.selection, options.modules);
    assert_eq!(reader.greenzone.borrow().frames, vec![4, 5, 6]);
    assert!(reader.markers.borrow().frames.is_empty());
    assert!(reader.bookmarks.borrow().frames.is_empty());
    assert!(reader.history.borrow().frames.is_empty());
    assert_eq!(reader.project.movie().records, sample_movie().records);
}

#[test]
fn test_clean_after_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clean.fm3");

    let mut fx = fixture();
    fx.project.rename(&path);
    fx.project.mark_changed();
    fx.project.save().unwrap();
    assert!(!fx.project.is_changed());

    fx.project.mark_changed();
    fx.project.load(&path).unwrap();
    assert!(!fx.project.is_changed());
    assert_eq!(fx.notifier.borrow().dirty_events, vec![true, false, true, false]);
}

#[test]
fn test_mark_changed_notifies_once() {
    let mut fx = fixture();
    for _ in 0..5 {
        fx.project.mark_changed();
    }
    assert!(fx.project.is_changed());
    assert_eq!(fx.notifier.borrow().marked(), 1);
}

#[test]
fn test_load_resets_session_and_forwards_subtitles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("subs.fm3");

    let mut fx = fixture();
    *fx.project.movie_mut() = sample_movie();
    fx.project.save_as(&path).unwrap();
    assert_eq!(fx.playback.borrow().resets, 0);

    fx.project.load(&path).unwrap();
    assert_eq!(fx.playback.borrow().resets, 1);
    assert_eq!(fx.notifier.borrow().subtitles, sample_movie().subtitles);
    assert_eq!(fx.project.project_name(), "subs");
    assert_eq!(fx.project.companion_file_name(), "subs.fm2");
}

#[test]
fn test_load_normalizes_input_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ports.fm3");

    // Hand-written text project with an unplugged port and no module blocks.
    let text = "version 3\nport0 0\nport1 1\nfourscore 0\nlength 1\n|0|R.......|.......A|\n";
    let mut bytes = text.as_bytes().to_vec();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    std::fs::write(&path, bytes).unwrap();

    let mut fx = fixture();
    let report = fx.project.load(&path).unwrap();
    assert!(report.blocks.iter().all(|(_, o)| matches!(o, BlockOutcome::Missing)));

    let movie = fx.project.movie();
    assert_eq!(movie.ports, [PortDevice::Gamepad; 2]);
    assert_eq!(movie.records[0].joypads, [0x80, 0x01, 0, 0]);
}

#[test]
fn test_failed_load_leaves_project_untouched() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.fm3");
    let bad = dir.path().join("bad.fm3");
    std::fs::write(&bad, b"this is not a project\n\x00\x01\x02").unwrap();

    let mut fx = fixture();
    *fx.project.movie_mut() = sample_movie();
    fx.markers.borrow_mut().frames = vec![42];
    fx.project.save_as(&good).unwrap();
    fx.project.load(&good).unwrap();
    fx.project.mark_changed();

    let movie_before = fx.project.movie().clone();
    let resets_before = fx.playback.borrow().resets;

    let err = fx.project.load(&bad).unwrap_err();
    assert!(matches!(err, Error::DatasetParse(_)), "unexpected error: {err}");
    assert_eq!(fx.project.project_file(), Some(good.as_path()));
    assert!(fx.project.is_changed());
    assert_eq!(fx.project.movie(), &movie_before);
    assert_eq!(fx.markers.borrow().frames, vec![42]);
    assert_eq!(fx.playback.borrow().resets, resets_before);

    let err = fx.project.load(dir.path().join("missing.fm3")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert_eq!(fx.project.project_file(), Some(good.as_path()));
}

#[test]
fn test_unknown_modules_survive_resave() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.fm3");
    let second = dir.path().join("second.fm3");

    let mut fx = fixture();
    let selection = Rc::new(RefCell::new(OpaqueModule::new(vec![0xDE, 0xAD, 0xBE, 0xEF])));
    fx.project.modules_mut().register(ModuleId::Selection, Box::new(selection));
    fx.project.save_as(&first).unwrap();

    // Plain project: every slot opaque.
    let mut plain = Project::builder().autosave(AutosaveConfig::disabled()).mmap(false).build();
    plain.load(&first).unwrap();
    plain.save_as(&second).unwrap();

    let mut reader = fixture();
    let kept = Rc::new(RefCell::new(OpaqueModule::default()));
    reader.project.modules_mut().register(ModuleId::Selection, Box::new(kept.clone()));
    reader.project.load(&second).unwrap();
    assert_eq!(kept.borrow().payload(), &[0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn test_save_to_bad_path_fails() {
    let dir = tempdir().unwrap();
    let mut fx = fixture();
    fx.project.mark_changed();
    let result = fx.project.save_as(dir.path().join("no_such_dir").join("x.fm3"));
    assert!(result.is_err());
    assert!(fx.project.is_changed());
    assert!(fx.project.project_file().is_none());
}

#[test]
fn test_failed_save_keeps_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.fm3");

    let mut fx = fixture();
    *fx.project.movie_mut() = sample_movie();
    fx.markers.borrow_mut().frames = vec![3, 30];
    fx.project.save_as(&path).unwrap();
    let before = std::fs::read(&path).unwrap();

    fx.project.modules_mut().register(ModuleId::History, Box::new(BrokenSave));
    fx.project.movie_mut().records.truncate(10);
    fx.project.mark_changed();
    assert!(fx.project.save().is_err());

    assert!(fx.project.is_changed());
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1, "temp file left behind");

    let mut reader = fixture();
    let report = reader.project.load(&path).unwrap();
    assert!(report.is_clean());
    assert_eq!(reader.project.movie().len(), 300);
    assert_eq!(reader.markers.borrow().frames, vec![3, 30]);
}

#[test]
fn test_truncated_mask_reported_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mask.fm3");
    let mut bytes = b"version 3\nlength 0\n".to_vec();
    bytes.extend_from_slice(&[0x3f, 0x00]);
    std::fs::write(&path, bytes).unwrap();

    let mut fx = fixture();
    fx.markers.borrow_mut().frames = vec![1];
    let report = fx.project.load(&path).unwrap();
    assert_eq!(report.failures().count(), 1);
    assert!(matches!(
        report.outcome(ModuleId::Markers),
        Some(BlockOutcome::Failed(Error::ModuleLoad { module: ModuleId::Markers, .. }))
    ));
    assert!(fx.markers.borrow().frames.is_empty());
}
