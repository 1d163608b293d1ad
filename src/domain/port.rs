// Port domain model - one of the four outlets on the multiplug
use super::error::{MultiplugError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PORT_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Port(u8);

impl Port {
    pub fn new(number: u8) -> Result<Self> {
        if (1..=PORT_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(MultiplugError::validation("Invalid port number"))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// All ports in ascending order
    pub fn all() -> impl Iterator<Item = Port> {
        (1..=PORT_COUNT).map(Port)
    }

    /// Key used by the dashboard payload, e.g. "port3"
    pub fn key(self) -> String {
        format!("port{}", self.number())
    }
}

impl TryFrom<u8> for Port {
    type Error = MultiplugError;

    fn try_from(number: u8) -> Result<Self> {
        Port::new(number)
    }
}

impl From<Port> for u8 {
    fn from(port: Port) -> u8 {
        port.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
