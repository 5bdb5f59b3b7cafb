pub mod error;
pub mod resolver;

pub use error::{ResolveError, ResolveErrorKind};
pub use resolver::{Resolver, resolve};

#[cfg(test)]
mod resolver_test;
