//! Dispatch domains.
//!
//! A [`Domain`] partitions multimethods and backends into namespaces that
//! never interact: a backend is only consulted for multimethods whose domain
//! is in its [`DomainSet`].

use std::{borrow::Borrow, fmt, sync::Arc};

/// An opaque namespace identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(Arc<str>);

impl Domain {
    /// Create a domain from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The domain name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Domain({:?})", &*self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Domain {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Domain {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// The set of domains a backend serves.
///
/// Backends serve a handful of domains at most, so this is a small,
/// insertion-ordered vector rather than a hash set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainSet(Vec<Domain>);

impl DomainSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a domain; duplicates are ignored.
    pub fn insert(&mut self, domain: impl Into<Domain>) {
        let domain = domain.into();
        if !self.0.contains(&domain) {
            self.0.push(domain);
        }
    }

    /// Returns `true` if `domain` is in the set.
    pub fn contains(&self, domain: &str) -> bool {
        self.0.iter().any(|d| d.as_str() == domain)
    }

    /// Iterate over the domains in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.0.iter()
    }

    /// Number of domains.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<D: Into<Domain>> FromIterator<D> for DomainSet {
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        let mut set = DomainSet::new();
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}

impl From<&str> for DomainSet {
    fn from(domain: &str) -> Self {
        std::iter::once(domain).collect()
    }
}

impl From<Domain> for DomainSet {
    fn from(domain: Domain) -> Self {
        Self(vec![domain])
    }
}

impl<const N: usize> From<[&str; N]> for DomainSet {
    fn from(domains: [&str; N]) -> Self {
        domains.into_iter().collect()
    }
}
