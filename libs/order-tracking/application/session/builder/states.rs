/// Type-state markers for the session builder
///
/// A session cannot start without a way to find its order id, so the
/// resolver is tracked at compile time.

/// Marker trait for resolver state
pub trait ResolverState {}

/// Resolver has not been set
pub struct NoResolver;
impl ResolverState for NoResolver {}

/// Resolver has been set
pub struct HasResolver;
impl ResolverState for HasResolver {}
