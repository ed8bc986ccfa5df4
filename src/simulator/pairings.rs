use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PairingError {
    #[error("Failed to read pairings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error on line {line} ({text}): expected two player identifiers")]
    MissingOpponent { line: usize, text: String },
}

/// One scheduled pairing; `first` plays White in the opening game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub first: String,
    pub second: String,
}

/// Ordered list of pairings, one per line: `white black`.
///
/// Blank lines and `#` comments are skipped; words after the second are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairings {
    pairs: Vec<Pairing>,
}

impl Pairings {
    pub fn parse(text: &str) -> Result<Self, PairingError> {
        let mut pairs = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some(first), Some(second)) => pairs.push(Pairing {
                    first: first.to_string(),
                    second: second.to_string(),
                }),
                _ => {
                    return Err(PairingError::MissingOpponent {
                        line: index + 1,
                        text: raw.to_string(),
                    })
                }
            }
        }
        Ok(Self { pairs })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PairingError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PairingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pairing> {
        self.pairs.iter()
    }
}
