/*!
 * Closure Resources
 *
 * Build a resource descriptor from an acquire closure and a release closure
 */

use super::traits::Resource;
use crate::core::errors::BoxError;
use std::fmt;

type AcquireFn<P, H> = Box<dyn Fn(P) -> Result<H, BoxError> + Send + Sync>;
type ReleaseFn<H> = Box<dyn Fn(H) -> Result<(), BoxError> + Send + Sync>;

/// Descriptor backed by two closures
///
/// # Example
///
/// ```ignore
/// let sockets = Arc::new(FnResource::new(
///     "socket",
///     |addr: SocketAddr| Ok(TcpStream::connect(addr)?),
///     |stream: TcpStream| Ok(stream.shutdown(Shutdown::Both)?),
/// ));
/// ```
pub struct FnResource<P, H> {
    kind: &'static str,
    acquire_fn: AcquireFn<P, H>,
    release_fn: ReleaseFn<H>,
}

impl<P, H> FnResource<P, H> {
    pub fn new<A, R>(kind: &'static str, acquire_fn: A, release_fn: R) -> Self
    where
        A: Fn(P) -> Result<H, BoxError> + Send + Sync + 'static,
        R: Fn(H) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            kind,
            acquire_fn: Box::new(acquire_fn),
            release_fn: Box::new(release_fn),
        }
    }
}

impl<P, H: Send> Resource for FnResource<P, H> {
    type Params = P;
    type Handle = H;
    type Error = BoxError;

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn acquire(&self, params: P) -> Result<H, BoxError> {
        (self.acquire_fn)(params)
    }

    fn release(&self, handle: H) -> Result<(), BoxError> {
        (self.release_fn)(handle)
    }
}

impl<P, H> fmt::Debug for FnResource<P, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResource").field("kind", &self.kind).finish()
    }
}
