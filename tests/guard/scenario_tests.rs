/*!
 * End-to-end scenarios
 *
 * Multi-resource transfers, multi-exit critical sections and release
 * failures across several open resources.
 */

use crate::common::{Recorder, RecordingResource};
use pretty_assertions::assert_eq;
use resource_scope::*;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Copy `src` to `dst` with both files bound to one scope
///
/// Returns a record of the copy; the handles themselves are left untouched.
fn transfer(
    files: &Arc<RecordingResource>,
    src: &str,
    dst: &str,
) -> Result<String, ScopedError<GuardError>> {
    scoped(|scope| -> Result<String, GuardError> {
        let input = scope.acquire(files, src.into())?;
        let output = scope.acquire(files, dst.into())?;
        let payload = scope.with(input, |name| name.clone())?;
        let copied = scope.with(output, |name| format!("{payload} -> {name}"))?;
        Ok(copied)
    })
}

#[test]
fn test_two_file_transfer_second_open_fails() {
    let recorder = Recorder::new();
    let files = RecordingResource::new("file", &recorder)
        .fail_acquire("file2")
        .shared();

    let err = transfer(&files, "file1", "file2").unwrap_err();

    match err {
        ScopedError::Body(GuardError::Acquire { resource_type, .. }) => {
            assert_eq!(resource_type, "file")
        }
        other => panic!("unexpected outcome: {other}"),
    }
    assert_eq!(recorder.release_count("file1"), 1);
    assert_eq!(recorder.release_count("file2"), 0);
}

#[test]
fn test_two_file_transfer_success() {
    let recorder = Recorder::new();
    let files = RecordingResource::new("file", &recorder).shared();

    let copied = transfer(&files, "file1", "file2").unwrap();
    assert_eq!(copied, "file1 -> file2");
    assert_eq!(recorder.released(), vec!["file2", "file1"]);
}

#[test]
fn test_two_real_files_second_open_fails() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    std::fs::write(&src, b"payload").unwrap();

    let closes = Arc::new(AtomicUsize::new(0));
    let opener = FileResource::new();
    let closer = FileResource::new();
    let closes_clone = closes.clone();
    let counted = Arc::new(FnResource::new(
        "file",
        move |params: FileParams| Ok(opener.acquire(params)?),
        move |handle| {
            closes_clone.fetch_add(1, Ordering::SeqCst);
            Ok(closer.release(handle)?)
        },
    ));

    let result = scoped(|scope| -> Result<(), GuardError> {
        let input = scope.acquire(&counted, FileParams::read(&src))?;
        // Parent directory does not exist
        let output = scope.acquire(&counted, FileParams::create(dir.path().join("no/such/dst")))?;

        let mut buf = Vec::new();
        scope.with(input, |f| f.read_to_end(&mut buf))?.expect("read source");
        scope.with(output, |f| f.write_all(&buf))?.expect("write destination");
        Ok(())
    });

    assert!(matches!(result, Err(ScopedError::Body(GuardError::Acquire { .. }))));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

/// Critical section with an early return before any work is done
fn update_counter(lock: &Arc<LockResource<u64>>, skip: bool) -> GuardResult<u64> {
    let mut guard = ScopedGuard::acquire(lock, ())?;
    if skip {
        return Ok(0);
    }
    guard.with(|value| {
        **value += 1;
        **value
    })
}

#[test]
fn test_lock_released_on_every_exit_path() {
    let lock = Arc::new(LockResource::new(0u64));

    assert_eq!(update_counter(&lock, true).unwrap(), 0);
    assert!(!lock.is_locked());

    assert_eq!(update_counter(&lock, false).unwrap(), 1);
    assert!(!lock.is_locked());

    assert_eq!(update_counter(&lock, true).unwrap(), 0);
    assert_eq!(update_counter(&lock, false).unwrap(), 2);
    assert!(!lock.is_locked());
}

#[test]
fn test_lock_release_counted_on_early_return() {
    let recorder = Recorder::new();
    let locks = RecordingResource::new("lock", &recorder).shared();

    fn critical(locks: &Arc<RecordingResource>, bail: bool) -> GuardResult<&'static str> {
        let mut scope = Scope::with_config(ScopeConfig::relaxed());
        scope.acquire(locks, "mutex".into())?;
        if bail {
            return Ok("early");
        }
        scope.exit().map_err(|agg| agg.into_failures().remove(0))?;
        Ok("normal")
    }

    assert_eq!(critical(&locks, true).unwrap(), "early");
    assert_eq!(recorder.release_count("mutex"), 1);

    assert_eq!(critical(&locks, false).unwrap(), "normal");
    assert_eq!(recorder.release_count("mutex"), 2);
}

#[test]
fn test_release_failure_with_two_open_resources() {
    let recorder = Recorder::new();
    let res = RecordingResource::new("socket", &recorder)
        .fail_release("B")
        .shared();

    let mut scope = Scope::enter();
    scope.acquire(&res, "A".into()).unwrap();
    scope.acquire(&res, "B".into()).unwrap();

    let err = scope.exit().unwrap_err();

    assert_eq!(recorder.released(), vec!["B", "A"]);
    assert_eq!(err.len(), 1);
    let failure = &err.failures()[0];
    assert!(failure.is_release());
    assert_eq!(
        std::error::Error::source(failure).unwrap().to_string(),
        "cannot close B"
    );
}

#[test]
fn test_nested_scopes_release_inner_first() {
    let recorder = Recorder::new();
    let res = RecordingResource::new("arena", &recorder).shared();

    let mut outer = Scope::enter();
    outer.acquire(&res, "outer-1".into()).unwrap();
    {
        let mut inner = Scope::enter();
        inner.acquire(&res, "inner-1".into()).unwrap();
        inner.acquire(&res, "inner-2".into()).unwrap();
        inner.exit().unwrap();
    }
    outer.acquire(&res, "outer-2".into()).unwrap();
    outer.exit().unwrap();

    assert_eq!(
        recorder.released(),
        vec!["inner-2", "inner-1", "outer-2", "outer-1"]
    );
}

#[test]
fn test_arena_and_file_in_one_scope() {
    let dir = tempfile::tempdir().unwrap();
    let arenas = Arc::new(ArenaResource::with_budget(4096));
    let files = Arc::new(FileResource::new());

    let mut scope = Scope::enter();
    let arena = scope.acquire(&arenas, 1024).unwrap();
    let file = scope
        .acquire(&files, FileParams::create(dir.path().join("out.txt")))
        .unwrap();

    let line = scope
        .get(arena)
        .unwrap()
        .handle()
        .unwrap()
        .alloc_str("scoped\n")
        .to_string();
    scope.with(file, |f| f.write_all(line.as_bytes())).unwrap().unwrap();
    assert_eq!(arenas.in_use(), 1024);

    scope.exit().unwrap();
    assert_eq!(arenas.in_use(), 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "scoped\n"
    );
}
