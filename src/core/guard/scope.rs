/*!
 * Scope Coordinator
 *
 * LIFO registry that releases every guard opened within one extent
 */

use super::scoped::ScopedGuard;
use super::traits::{Guard, Resource};
use crate::core::config::ScopeConfig;
use crate::core::errors::{AggregateReleaseError, GuardError, GuardResult, ScopeResult, ScopedError};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn, Span};
use uuid::Uuid;

/// Typed handle to a guard registered with a [`Scope`]
///
/// Only valid for the scope that issued it, and only until the guard is
/// taken out with [`Scope::take`].
pub struct GuardKey<R> {
    scope_id: Uuid,
    index: usize,
    _resource: PhantomData<fn() -> R>,
}

impl<R> GuardKey<R> {
    /// Position in acquisition order
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn scope_id(&self) -> Uuid {
        self.scope_id
    }
}

impl<R> Clone for GuardKey<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for GuardKey<R> {}

impl<R> fmt::Debug for GuardKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardKey")
            .field("scope_id", &self.scope_id)
            .field("index", &self.index)
            .finish()
    }
}

/// Scope coordinator for one dynamic extent
///
/// Guards are released newest-first when the scope exits, whether by an
/// explicit [`exit`](Scope::exit) or by drop during an early return, a `?`,
/// a panic or cancellation of the owning task.
///
/// # Example
///
/// ```ignore
/// let mut scope = Scope::enter();
/// let src = scope.acquire(&files, FileParams::read("in.txt"))?;
/// let dst = scope.acquire(&files, FileParams::create("out.txt"))?; // src released if this fails
/// scope.with(src, |f| io::copy(f, ...))?;
/// scope.exit()?; // dst released, then src
/// ```
pub struct Scope {
    id: Uuid,
    config: ScopeConfig,
    stack: Vec<Option<Box<dyn Guard>>>,
    live: usize,
    exited: bool,
    span: Span,
}

impl Scope {
    /// Begin a new extent with default configuration
    pub fn enter() -> Self {
        Self::with_config(ScopeConfig::default())
    }

    /// Begin a new extent
    pub fn with_config(config: ScopeConfig) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!("scope", scope_id = %id);
        debug!(parent: &span, "scope entered");

        Self {
            id,
            stack: Vec::with_capacity(config.initial_capacity),
            config,
            live: 0,
            exited: false,
            span,
        }
    }

    /// Register an open guard
    ///
    /// The scope takes ownership. A guard that cannot be registered (closed,
    /// over capacity, scope already exited) is released before the error is
    /// returned, so it never leaks.
    pub fn register<R>(&mut self, guard: ScopedGuard<R>) -> GuardResult<GuardKey<R>>
    where
        R: Resource + 'static,
        R::Handle: 'static,
    {
        let resource_type = guard.metadata().resource_type;

        if !guard.is_open() {
            return Err(GuardError::UseAfterClose { resource_type });
        }

        if self.exited {
            drop(guard);
            return Err(GuardError::ScopeExited {
                scope_id: self.id,
                resource_type,
            });
        }

        if let Some(limit) = self.config.max_guards {
            if self.live >= limit {
                warn!(parent: &self.span, resource_type, limit, "scope at capacity, releasing guard");
                drop(guard);
                return Err(GuardError::CapacityExceeded {
                    resource_type,
                    limit,
                });
            }
        }

        let index = self.stack.len();
        self.stack.push(Some(Box::new(guard)));
        self.live += 1;
        debug!(parent: &self.span, resource_type, guard_index = index, "guard registered");

        Ok(GuardKey {
            scope_id: self.id,
            index,
            _resource: PhantomData,
        })
    }

    /// Acquire a resource and register its guard in one step
    ///
    /// On acquisition failure nothing is registered and the guards already
    /// held stay registered for the eventual unwind.
    pub fn acquire<R>(&mut self, resource: &Arc<R>, params: R::Params) -> GuardResult<GuardKey<R>>
    where
        R: Resource + 'static,
        R::Handle: 'static,
    {
        if self.exited {
            return Err(GuardError::ScopeExited {
                scope_id: self.id,
                resource_type: resource.kind(),
            });
        }

        let guard = ScopedGuard::acquire(resource, params)?;
        self.register(guard)
    }

    /// Borrow a registered guard
    pub fn get<R>(&self, key: GuardKey<R>) -> GuardResult<&ScopedGuard<R>>
    where
        R: Resource + 'static,
        R::Handle: 'static,
    {
        self.check_usable(&key)?;
        self.stack
            .get(key.index)
            .and_then(Option::as_ref)
            .and_then(|guard| guard.as_any().downcast_ref::<ScopedGuard<R>>())
            .ok_or(GuardError::ForeignKey { scope_id: self.id })
    }

    /// Mutably borrow a registered guard
    pub fn get_mut<R>(&mut self, key: GuardKey<R>) -> GuardResult<&mut ScopedGuard<R>>
    where
        R: Resource + 'static,
        R::Handle: 'static,
    {
        self.check_usable(&key)?;
        let scope_id = self.id;
        self.stack
            .get_mut(key.index)
            .and_then(Option::as_mut)
            .and_then(|guard| guard.as_any_mut().downcast_mut::<ScopedGuard<R>>())
            .ok_or(GuardError::ForeignKey { scope_id })
    }

    /// Run an operation against a registered guard's handle
    pub fn with<R, F, T>(&mut self, key: GuardKey<R>, op: F) -> GuardResult<T>
    where
        R: Resource + 'static,
        R::Handle: 'static,
        F: FnOnce(&mut R::Handle) -> T,
    {
        self.get_mut(key)?.with(op)
    }

    /// Close one guard ahead of scope exit
    ///
    /// The guard stays in its slot as Closed and is skipped on unwind. It no
    /// longer counts towards `len` or the guard cap. Closing again, or after
    /// the scope exited, is a no-op.
    pub fn close<R>(&mut self, key: GuardKey<R>) -> GuardResult<()>
    where
        R: Resource + 'static,
        R::Handle: 'static,
    {
        if self.exited {
            return self.check_key(&key);
        }

        let guard = self.get_mut(key)?;
        let was_open = guard.is_open();
        let result = guard.close();
        if was_open {
            self.live -= 1;
        }
        result
    }

    /// Move a registered guard out to a longer-lived owner
    ///
    /// The scope no longer releases it; the returned guard does, exactly once.
    pub fn take<R>(&mut self, key: GuardKey<R>) -> GuardResult<ScopedGuard<R>>
    where
        R: Resource + 'static,
        R::Handle: 'static,
    {
        // Type-check before removing so a mismatch leaves the slot intact
        self.get(key)?;

        let boxed = self.stack[key.index]
            .take()
            .ok_or(GuardError::ForeignKey { scope_id: self.id })?;
        if boxed.is_open() {
            self.live -= 1;
        }

        match boxed.into_any().downcast::<ScopedGuard<R>>() {
            Ok(guard) => {
                debug!(parent: &self.span, guard_index = key.index, "guard taken out of scope");
                Ok((*guard).transfer_ownership())
            }
            Err(_) => Err(GuardError::ForeignKey { scope_id: self.id }),
        }
    }

    /// Release every registered guard, newest first
    ///
    /// Every guard is closed even when earlier releases fail; all failures
    /// are returned together in release order. Calling `exit` again is a
    /// no-op that succeeds.
    pub fn exit(&mut self) -> ScopeResult<()> {
        if self.exited {
            return Ok(());
        }
        self.exited = true;

        let span = self.span.clone();
        let _entered = span.enter();

        let mut failures = Vec::new();
        let mut released = 0usize;
        let threshold = self.config.slow_release_threshold;

        // Closed guards keep their slots so stale keys report use-after-close
        for guard_index in (0..self.stack.len()).rev() {
            let Some(guard) = self.stack[guard_index].as_mut() else {
                continue;
            };
            if !guard.is_open() {
                continue;
            }
            let resource_type = guard.resource_type();

            let started = Instant::now();
            let result = guard.close();
            let elapsed = started.elapsed();
            released += 1;
            self.live = self.live.saturating_sub(1);

            if elapsed > threshold {
                warn!(
                    resource_type,
                    guard_index,
                    duration_ms = elapsed.as_millis() as u64,
                    slow = true,
                    "slow release detected"
                );
            }

            if let Err(e) = result {
                failures.push(e);
            }
        }
        self.live = 0;

        if failures.is_empty() {
            debug!(released, "scope exited");
            Ok(())
        } else {
            error!(
                released,
                failed = failures.len(),
                "scope exited with release failures"
            );
            Err(AggregateReleaseError::new(self.id, failures))
        }
    }

    /// Number of open guards the scope will release on exit
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Resource types of open guards in acquisition order
    pub fn guard_types(&self) -> Vec<&'static str> {
        self.stack
            .iter()
            .flatten()
            .filter(|guard| guard.is_open())
            .map(|guard| guard.resource_type())
            .collect()
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn is_exited(&self) -> bool {
        self.exited
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    fn check_key<R>(&self, key: &GuardKey<R>) -> GuardResult<()> {
        if key.scope_id == self.id {
            Ok(())
        } else {
            Err(GuardError::ForeignKey { scope_id: self.id })
        }
    }

    fn check_usable<R>(&self, key: &GuardKey<R>) -> GuardResult<()> {
        self.check_key(key)?;
        if !self.exited {
            return Ok(());
        }

        let resource_type = self
            .stack
            .get(key.index)
            .and_then(Option::as_ref)
            .map(|guard| guard.resource_type())
            .ok_or(GuardError::ForeignKey { scope_id: self.id })?;
        Err(GuardError::UseAfterClose { resource_type })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::enter()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("guards", &self.guard_types())
            .field("exited", &self.exited)
            .finish()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.exited {
            if self.config.warn_on_implicit_exit && self.live > 0 {
                warn!(
                    parent: &self.span,
                    guards = self.live,
                    panicking = std::thread::panicking(),
                    "scope dropped without explicit exit, unwinding"
                );
            }

            if let Err(e) = self.exit() {
                error!(parent: &self.span, error = %e, "implicit scope exit had release failures");
            }
        }

        // A release that panicked mid-exit leaves the older guards open
        let span = &self.span;
        for guard in self.stack.iter_mut().rev().flatten() {
            if guard.is_open() {
                if let Err(e) = guard.close() {
                    error!(parent: span, error = %e, "release failed while finishing interrupted exit");
                }
            }
        }
    }
}

/// Run `body` inside a fresh scope and always exit it
///
/// Body failures and release failures are both reported; neither hides the
/// other.
pub fn scoped<T, E, F>(body: F) -> Result<T, ScopedError<E>>
where
    E: std::error::Error + 'static,
    F: FnOnce(&mut Scope) -> Result<T, E>,
{
    scoped_with(ScopeConfig::default(), body)
}

/// [`scoped`] with explicit configuration
pub fn scoped_with<T, E, F>(config: ScopeConfig, body: F) -> Result<T, ScopedError<E>>
where
    E: std::error::Error + 'static,
    F: FnOnce(&mut Scope) -> Result<T, E>,
{
    let mut scope = Scope::with_config(config);
    let outcome = body(&mut scope);
    let released = scope.exit();

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(body), Ok(())) => Err(ScopedError::Body(body)),
        (Ok(_), Err(release)) => Err(ScopedError::Release(release)),
        (Err(body), Err(release)) => Err(ScopedError::Both { body, release }),
    }
}
