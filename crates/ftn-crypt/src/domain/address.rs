//! # Node Addresses
//!
//! FidoNet-technology 4D addresses: `zone:net/node[.point][@domain]`.

use crate::domain::errors::AddressError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A structured network address. The point is 0 for a node itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FtnAddress {
    pub zone: u16,
    pub net: u16,
    pub node: u16,
    pub point: u16,
}

impl FtnAddress {
    pub fn new(zone: u16, net: u16, node: u16, point: u16) -> Self {
        Self {
            zone,
            net,
            node,
            point,
        }
    }

    pub fn is_point(&self) -> bool {
        self.point != 0
    }
}

impl fmt::Display for FtnAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.zone, self.net, self.node)?;
        if self.is_point() {
            write!(f, ".{}", self.point)?;
        }
        Ok(())
    }
}

impl FromStr for FtnAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AddressError::Malformed(s.to_string());

        // Domain suffix carries no routing information here.
        let addr = s.trim().split('@').next().unwrap_or_default();
        let (zone, rest) = addr.split_once(':').ok_or_else(malformed)?;
        let (net, rest) = rest.split_once('/').ok_or_else(malformed)?;
        let (node, point) = match rest.split_once('.') {
            Some((node, point)) => (node, point),
            None => (rest, "0"),
        };

        let number = |part: &str| part.parse::<u16>().map_err(|_| malformed());
        Ok(Self {
            zone: number(zone)?,
            net: number(net)?,
            node: number(node)?,
            point: number(point)?,
        })
    }
}

impl Serialize for FtnAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FtnAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
