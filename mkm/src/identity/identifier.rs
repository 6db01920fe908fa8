//! # Identifiers
//!
//! `name@address[/terminal]`. The name is the Meta seed, the address is
//! derived from the Meta, and the terminal names one device or session of
//! the same entity. Two identifiers that differ only in terminal are the
//! same entity and compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ANYONE, EVERYONE, NAME_SEPARATOR, TERMINAL_SEPARATOR};
use crate::identity::address::Address;
use crate::identity::network::NetworkType;

/// Errors from building or parsing an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The string isn't shaped like `name@address[/terminal]`, or the
    /// address part doesn't parse.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Empty, or contains a separator.
    #[error("invalid identifier name: {0:?}")]
    InvalidName(String),

    /// Empty, or contains a separator.
    #[error("invalid identifier terminal: {0:?}")]
    InvalidTerminal(String),
}

/// An entity identifier.
#[derive(Clone)]
pub struct Identifier {
    name: String,
    address: Address,
    terminal: Option<String>,
}

impl Identifier {
    pub fn new(name: impl Into<String>, address: Address) -> Result<Self, IdentifierError> {
        let name = name.into();
        check_name(&name)?;
        Ok(Self {
            name,
            address,
            terminal: None,
        })
    }

    /// The same entity at a specific terminal.
    pub fn with_terminal(mut self, terminal: impl Into<String>) -> Result<Self, IdentifierError> {
        let terminal = terminal.into();
        check_terminal(&terminal)?;
        self.terminal = Some(terminal);
        Ok(self)
    }

    /// The same entity with no terminal.
    pub fn without_terminal(mut self) -> Self {
        self.terminal = None;
        self
    }

    /// Parse `name@address[/terminal]`.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let (name, rest) = s.split_once(NAME_SEPARATOR).ok_or_else(|| {
            IdentifierError::MalformedIdentifier(format!("missing '{}' in {:?}", NAME_SEPARATOR, s))
        })?;
        if name.is_empty() {
            return Err(IdentifierError::MalformedIdentifier(format!(
                "empty name in {:?}",
                s
            )));
        }

        let (address, terminal) = match rest.split_once(TERMINAL_SEPARATOR) {
            Some((address, terminal)) => (address, Some(terminal)),
            None => (rest, None),
        };
        let address = Address::parse(address)
            .map_err(|e| IdentifierError::MalformedIdentifier(e.to_string()))?;

        let id = Self::new(name, address)?;
        match terminal {
            Some(terminal) => id.with_terminal(terminal),
            None => Ok(id),
        }
    }

    /// `anyone@anywhere`, addressing every user.
    pub fn anyone() -> Self {
        Self {
            name: ANYONE.to_string(),
            address: Address::anywhere(),
            terminal: None,
        }
    }

    /// `everyone@everywhere`, addressing every group.
    pub fn everyone() -> Self {
        Self {
            name: EVERYONE.to_string(),
            address: Address::everywhere(),
            terminal: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn terminal(&self) -> Option<&str> {
        self.terminal.as_deref()
    }

    pub fn network(&self) -> NetworkType {
        self.address.network()
    }

    pub fn number(&self) -> u32 {
        self.address.number()
    }

    /// Stable partition key, taken from the address check code.
    pub fn shard_key(&self) -> u32 {
        self.address.number()
    }

    pub fn is_broadcast(&self) -> bool {
        self.address.is_broadcast()
    }
}

fn check_name(name: &str) -> Result<(), IdentifierError> {
    if name.is_empty() || name.contains(NAME_SEPARATOR) || name.contains(TERMINAL_SEPARATOR) {
        return Err(IdentifierError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn check_terminal(terminal: &str) -> Result<(), IdentifierError> {
    if terminal.is_empty()
        || terminal.contains(NAME_SEPARATOR)
        || terminal.contains(TERMINAL_SEPARATOR)
    {
        return Err(IdentifierError::InvalidTerminal(terminal.to_string()));
    }
    Ok(())
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.address == other.address
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.address.hash(state);
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, NAME_SEPARATOR, self.address)?;
        if let Some(terminal) = &self.terminal {
            write!(f, "{}{}", TERMINAL_SEPARATOR, terminal)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self)
    }
}

impl Serialize for Identifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identifier::parse(&s).map_err(serde::de::Error::custom)
    }
}
