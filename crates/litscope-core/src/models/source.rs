use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LitscopeError;

/// Bibliographic database a query file was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Ieee,
    Scopus,
    WebOfScience,
    AcmDl,
}

impl SourceKind {
    /// Most to least specific. Earlier sources win attribution of duplicates.
    pub const DEFAULT_ORDER: [SourceKind; 4] = [
        SourceKind::Ieee,
        SourceKind::Scopus,
        SourceKind::WebOfScience,
        SourceKind::AcmDl,
    ];

    /// File name prefix used in the queries directory (`<PREFIX>_<query>`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ieee => "IEEE",
            Self::Scopus => "SCP",
            Self::WebOfScience => "WOS",
            Self::AcmDl => "ACM",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ieee => "IEEE Xplore",
            Self::Scopus => "Scopus",
            Self::WebOfScience => "Web of Science",
            Self::AcmDl => "ACM Digital Library",
        }
    }

    /// Parse a list of prefixes, keeping the given order.
    pub fn parse_order<S: AsRef<str>>(prefixes: &[S]) -> Result<Vec<Self>, LitscopeError> {
        let mut order = Vec::with_capacity(prefixes.len());
        for prefix in prefixes {
            let kind = prefix.as_ref().parse::<Self>()?;
            if order.contains(&kind) {
                return Err(LitscopeError::ConfigError(format!(
                    "source {} listed twice in source order",
                    kind.prefix()
                )));
            }
            order.push(kind);
        }
        Ok(order)
    }
}

impl FromStr for SourceKind {
    type Err = LitscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IEEE" => Ok(Self::Ieee),
            "SCP" | "SCOPUS" => Ok(Self::Scopus),
            "WOS" => Ok(Self::WebOfScience),
            "ACM" => Ok(Self::AcmDl),
            _ => Err(LitscopeError::UnknownSource(s.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
