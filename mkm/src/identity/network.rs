//! # Network Tags
//!
//! The first byte of every address says what kind of entity owns it. The
//! values are bit flags rather than a dense enum (`Station = 0x88` is
//! `Thing | Main`), so the tag is a newtype over `u8` and any byte read off
//! the wire is kept exactly as it was.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One-byte entity type prefix of an address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkType(u8);

impl NetworkType {
    /// Bitcoin main net. Counted as a user network.
    pub const BTC_MAIN: Self = Self(0x00);

    /// A person.
    pub const MAIN: Self = Self(0x08);

    /// A group of users.
    pub const GROUP: Self = Self(0x10);

    /// Older name for [`GROUP`](Self::GROUP).
    pub const POLYLOGUE: Self = Self::GROUP;

    pub const CHATROOM: Self = Self(0x30);

    /// A service provider.
    pub const PROVIDER: Self = Self(0x76);

    /// A server node.
    pub const STATION: Self = Self(0x88);

    /// A device.
    pub const THING: Self = Self(0x80);

    pub const ROBOT: Self = Self(0xC8);

    /// Every named tag, in ascending byte order.
    pub const KNOWN: [Self; 8] = [
        Self::BTC_MAIN,
        Self::MAIN,
        Self::GROUP,
        Self::CHATROOM,
        Self::PROVIDER,
        Self::THING,
        Self::STATION,
        Self::ROBOT,
    ];

    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Owned by a person: the Main bit is set, or this is BTC main net.
    pub fn is_user(self) -> bool {
        self.0 & Self::MAIN.0 != 0 || self == Self::BTC_MAIN
    }

    /// Owned by a group: the Group bit is set.
    pub fn is_group(self) -> bool {
        self.0 & Self::GROUP.0 != 0
    }

    /// Owned by a device: the Thing bit is set.
    pub fn is_thing(self) -> bool {
        self.0 & Self::THING.0 != 0
    }

    /// The tag's name, if it has one.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::BTC_MAIN => "BTCMain",
            Self::MAIN => "Main",
            Self::GROUP => "Group",
            Self::CHATROOM => "Chatroom",
            Self::PROVIDER => "Provider",
            Self::STATION => "Station",
            Self::THING => "Thing",
            Self::ROBOT => "Robot",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u8> for NetworkType {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl From<NetworkType> for u8 {
    fn from(network: NetworkType) -> Self {
        network.0
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

impl fmt::Debug for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "NetworkType::{}(0x{:02X})", name, self.0),
            None => write!(f, "NetworkType(0x{:02X})", self.0),
        }
    }
}
