use crate::KeySharesError;
use std::fmt::Display;
use std::str::FromStr;

/// Schema versions of the key-shares document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeySharesVersion {
    /// Operator ids and keys as parallel arrays
    V2,
    /// Operators as `{id, publicKey}` objects, owner fields in `data`
    #[default]
    V3,
}

impl KeySharesVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl FromStr for KeySharesVersion {
    type Err = KeySharesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v2" => Ok(Self::V2),
            "v3" => Ok(Self::V3),
            other => Err(KeySharesError::UnsupportedVersion(other.to_string())),
        }
    }
}

impl Display for KeySharesVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod version_tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("v2".parse::<KeySharesVersion>().unwrap(), KeySharesVersion::V2);
        assert_eq!("v3".parse::<KeySharesVersion>().unwrap(), KeySharesVersion::V3);
        assert_eq!(KeySharesVersion::default().to_string(), "v3");
        assert_eq!(
            "v4".parse::<KeySharesVersion>().unwrap_err(),
            KeySharesError::UnsupportedVersion("v4".to_string())
        );
        // only the exact tags are accepted
        for tag in ["V3", " v3", "v2 ", ""] {
            assert_eq!(
                tag.parse::<KeySharesVersion>().unwrap_err(),
                KeySharesError::UnsupportedVersion(tag.to_string())
            );
        }
    }
}
