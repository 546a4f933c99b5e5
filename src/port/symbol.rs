use std::fmt;
use std::str::FromStr;

/// Typed form of a `"<pluginUri>:<portSymbol>"` key.
///
/// Plugin URIs may contain colons themselves, so parsing splits on the LAST
/// colon. Port symbols never contain one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedSymbol {
    pub plugin_uri: String,
    pub port_symbol: String,
}

impl QualifiedSymbol {
    pub fn new(plugin_uri: impl Into<String>, port_symbol: impl Into<String>) -> Self {
        Self {
            plugin_uri: plugin_uri.into(),
            port_symbol: port_symbol.into(),
        }
    }

    /// Split a qualified symbol. `None` when there is no colon or either side is empty.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (uri, symbol) = qualified.rsplit_once(':')?;
        if uri.is_empty() || symbol.is_empty() {
            return None;
        }
        Some(Self::new(uri, symbol))
    }
}

impl fmt::Display for QualifiedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plugin_uri, self.port_symbol)
    }
}

/// Returned when a string is not a qualified symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not of the form <pluginUri>:<portSymbol>")]
pub struct MalformedSymbol(pub String);

impl FromStr for QualifiedSymbol {
    type Err = MalformedSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| MalformedSymbol(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_last_colon() {
        let sym = QualifiedSymbol::parse("urn:orpheus:delay:feedback").unwrap();
        assert_eq!(sym.plugin_uri, "urn:orpheus:delay");
        assert_eq!(sym.port_symbol, "feedback");
        assert_eq!(sym.to_string(), "urn:orpheus:delay:feedback");
    }

    #[test]
    fn malformed_symbols_are_rejected() {
        assert_eq!(QualifiedSymbol::parse("nocolon"), None);
        assert_eq!(QualifiedSymbol::parse("uri:"), None);
        assert_eq!(QualifiedSymbol::parse(":port"), None);
        assert!("nocolon".parse::<QualifiedSymbol>().is_err());
    }
}
