use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

/// Version named in the `OPENQASM <major>[.<minor>];` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Version {
    major: u32,
    minor: Option<u32>,
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Version {
    pub fn new(major: u32, minor: Option<u32>) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> Option<u32> {
        self.minor
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(3, Some(0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

fn parse_part(part: &str, what: &str, s: &str) -> Result<u32, String> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid {what} in version '{s}'"));
    }
    part.parse().map_err(|_| format!("invalid {what} in version '{s}'"))
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [major] => Ok(Self::new(parse_part(major, "major", s)?, None)),
            [major, minor] => Ok(Self::new(
                parse_part(major, "major", s)?,
                Some(parse_part(minor, "minor", s)?),
            )),
            _ => Err(format!("invalid version '{s}', expected 'X.Y'")),
        }
    }
}
