use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Endpoint that produced a captured payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The configured game server.
    Host,
    /// The remote client talking to it.
    Node,
}

impl Origin {
    pub const ALL: [Origin; 2] = [Origin::Node, Origin::Host];

    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Host => "host",
            Origin::Node => "node",
        }
    }

    /// Direction marker printed in front of every decoded line.
    pub fn arrow(self) -> &'static str {
        match self {
            Origin::Host => "<--",
            Origin::Node => "-->",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown origin '{0}' (expected 'host' or 'node')")]
pub struct ParseOriginError(String);

impl FromStr for Origin {
    type Err = ParseOriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "host" => Ok(Origin::Host),
            "node" => Ok(Origin::Node),
            _ => Err(ParseOriginError(s.to_string())),
        }
    }
}
