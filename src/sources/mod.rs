//! Package sources.
//!
//! A source answers which releases of a package exist. All source I/O
//! happens before resolution; the resolver only sees the releases a source
//! returned.

pub mod index;

pub use index::{IndexError, PackageIndex, Release};

/// A source of package releases.
pub trait Source {
    /// Get the source name for display.
    fn name(&self) -> &str;

    /// All releases of a package, newest first.
    fn query(&self, identity: &str) -> Vec<Release>;

    /// Every package identity this source knows about.
    fn identities(&self) -> Vec<String>;
}
