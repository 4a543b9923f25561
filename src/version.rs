//! Comparable package versions.
//!
//! A [`Version`] is the upstream version of an installed package, stored as a
//! list of dot separated components from major to minor. Distribution
//! revisions are stripped by the backends before parsing.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVersionError {
    #[error("empty version string")]
    Empty,
    #[error("empty component in version '{0}'")]
    EmptyComponent(String),
    #[error("invalid character '{ch}' in version '{input}'")]
    InvalidCharacter { input: String, ch: char },
    #[error("numeric component '{component}' in version '{input}' is too large")]
    Overflow { input: String, component: String },
}

/// A single version component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Numeric(u64),
    Alpha(String),
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Component::Numeric(a), Component::Numeric(b)) => a.cmp(b),
            (Component::Alpha(a), Component::Alpha(b)) => a.cmp(b),
            // 1.0.0 is newer than 1.0.rc1
            (Component::Numeric(_), Component::Alpha(_)) => Ordering::Greater,
            (Component::Alpha(_), Component::Numeric(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Numeric(n) => write!(f, "{}", n),
            Component::Alpha(s) => f.write_str(s),
        }
    }
}

/// Version of a software package.
///
/// Comparison is component-wise. Missing trailing components count as `0`, so
/// `1.2` and `1.2.0` are equal.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<Component>,
}

impl Version {
    /// Parse a string of the form `number.number.number`.
    ///
    /// Components may also be alphanumeric (`2.0.rc1`, `1.2a`).
    pub fn parse(input: &str) -> Result<Self, ParseVersionError> {
        if input.is_empty() {
            return Err(ParseVersionError::Empty);
        }

        let components = input
            .split('.')
            .map(|part| parse_component(input, part))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The leading component if it is numeric.
    pub fn major(&self) -> Option<u64> {
        match self.components.first() {
            Some(Component::Numeric(n)) => Some(*n),
            _ => None,
        }
    }
}

fn parse_component(input: &str, part: &str) -> Result<Component, ParseVersionError> {
    if part.is_empty() {
        return Err(ParseVersionError::EmptyComponent(input.to_string()));
    }
    if let Some(ch) = part.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(ParseVersionError::InvalidCharacter {
            input: input.to_string(),
            ch,
        });
    }
    if part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse::<u64>()
            .map(Component::Numeric)
            .map_err(|_| ParseVersionError::Overflow {
                input: input.to_string(),
                component: part.to_string(),
            })
    } else {
        Ok(Component::Alpha(part.to_string()))
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let zero = Component::Numeric(0);
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).unwrap_or(&zero);
            let b = other.components.get(i).unwrap_or(&zero);
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
