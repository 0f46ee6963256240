//! The set of instruments a monitor watches.
//!
//! Pairs are configured as a comma-separated `SYMBOL:TIMEFRAME` list, e.g.
//! `BTC/USDT:15m, ETH/USDT:1h`.

use std::collections::HashSet;
use std::fmt;

/// One monitored (symbol, timeframe) unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instrument {
    pub symbol: String,
    pub timeframe: String,
}

impl Instrument {
    pub fn new(symbol: &str, timeframe: &str) -> Self {
        Instrument {
            symbol: symbol.to_uppercase(),
            timeframe: timeframe.to_string(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.timeframe)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in pair list")]
    EmptyToken,

    #[error("pair {0:?} is not SYMBOL:TIMEFRAME")]
    MalformedPair(String),

    #[error("duplicate pair: {0}")]
    DuplicatePair(String),
}

pub fn parse_pairs(input: &str) -> Result<Vec<Instrument>, UniverseError> {
    let mut pairs = Vec::new();
    let mut seen = HashSet::new();

    if input.trim().is_empty() {
        return Ok(pairs);
    }

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let (symbol, timeframe) = trimmed
            .rsplit_once(':')
            .map(|(s, t)| (s.trim(), t.trim()))
            .filter(|(s, t)| !s.is_empty() && !t.is_empty())
            .ok_or_else(|| UniverseError::MalformedPair(trimmed.to_string()))?;

        let instrument = Instrument::new(symbol, timeframe);
        if !seen.insert(instrument.clone()) {
            return Err(UniverseError::DuplicatePair(instrument.to_string()));
        }
        pairs.push(instrument);
    }

    Ok(pairs)
}
