/*!
 * Monitoring
 * Tracing setup for guard lifecycle events
 */

mod tracer;

pub use tracer::init_tracing;
