//! Asset path resolution

mod locator;

pub use locator::ResourceLocator;
