/*!
 * Property tests for release ordering and exactly-once release
 */

use crate::common::{Recorder, RecordingResource};
use proptest::prelude::*;
use resource_scope::*;

proptest! {
    #[test]
    fn prop_n_acquisitions_n_reverse_releases(n in 0usize..40) {
        let recorder = Recorder::new();
        let res = RecordingResource::new("item", &recorder).shared();

        let mut scope = Scope::enter();
        for i in 0..n {
            scope.acquire(&res, i.to_string()).unwrap();
        }
        scope.exit().unwrap();

        let expected: Vec<String> = (0..n).rev().map(|i| i.to_string()).collect();
        prop_assert_eq!(recorder.released(), expected);
    }

    #[test]
    fn prop_early_closes_never_release_twice(
        n in 1usize..20,
        closes in proptest::collection::vec(any::<prop::sample::Index>(), 0..20),
    ) {
        let recorder = Recorder::new();
        let res = RecordingResource::new("item", &recorder).shared();

        let mut scope = Scope::with_config(ScopeConfig::relaxed());
        let keys: Vec<_> = (0..n)
            .map(|i| scope.acquire(&res, i.to_string()).unwrap())
            .collect();

        for idx in &closes {
            scope.close(keys[idx.index(n)]).unwrap();
        }
        scope.exit().unwrap();
        drop(scope);

        for i in 0..n {
            prop_assert_eq!(recorder.release_count(&i.to_string()), 1);
        }
    }

    #[test]
    fn prop_failed_releases_all_reported(
        fails in proptest::collection::vec(any::<bool>(), 1..20),
    ) {
        let recorder = Recorder::new();
        let mut builder = RecordingResource::new("item", &recorder);
        for (i, fail) in fails.iter().enumerate() {
            if *fail {
                builder = builder.fail_release(&i.to_string());
            }
        }
        let res = builder.shared();

        let mut scope = Scope::enter();
        for i in 0..fails.len() {
            scope.acquire(&res, i.to_string()).unwrap();
        }

        let expected_failures = fails.iter().filter(|f| **f).count();
        match scope.exit() {
            Ok(()) => prop_assert_eq!(expected_failures, 0),
            Err(agg) => prop_assert_eq!(agg.len(), expected_failures),
        }
        prop_assert_eq!(recorder.released().len(), fails.len());
    }

    #[test]
    fn prop_acquire_failure_releases_only_opened(n in 1usize..20, fail_at in 0usize..20) {
        let fail_at = fail_at % n;
        let recorder = Recorder::new();
        let res = RecordingResource::new("item", &recorder)
            .fail_acquire(&fail_at.to_string())
            .shared();

        let result = scoped(|scope| -> Result<(), GuardError> {
            for i in 0..n {
                scope.acquire(&res, i.to_string())?;
            }
            Ok(())
        });

        let failed_on_acquire = matches!(result, Err(ScopedError::Body(GuardError::Acquire { .. })));
        prop_assert!(failed_on_acquire);
        let expected: Vec<String> = (0..fail_at).rev().map(|i| i.to_string()).collect();
        prop_assert_eq!(recorder.released(), expected);
    }
}
