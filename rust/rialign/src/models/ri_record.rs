//! Retention index annotations as found in GC (NIST style) spectral libraries.
//!
//! The textual field looks like `s=1200/3/15 n=1150 p=1634/2/8`:
//! whitespace separated tokens, each either a bare number (default column)
//! or `<prefix>=<ri>[/<n_samples>/<ci>]` with prefix one of `s` (semipolar),
//! `n` (nonpolar), `p` (polar) or `a` (default).
//! Columns without samples are left out, and a single-sample measurement
//! carries no `/n_samples/ci` suffix.

use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

/// Chromatographic phase a retention index was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetentionIndexColumn {
    #[default]
    Default,
    Semipolar,
    Nonpolar,
    Polar,
}

impl RetentionIndexColumn {
    pub const ALL: [RetentionIndexColumn; 4] = [
        RetentionIndexColumn::Default,
        RetentionIndexColumn::Semipolar,
        RetentionIndexColumn::Nonpolar,
        RetentionIndexColumn::Polar,
    ];

    pub fn prefix(&self) -> char {
        match self {
            RetentionIndexColumn::Default => 'a',
            RetentionIndexColumn::Semipolar => 's',
            RetentionIndexColumn::Nonpolar => 'n',
            RetentionIndexColumn::Polar => 'p',
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "a" => Some(RetentionIndexColumn::Default),
            "s" => Some(RetentionIndexColumn::Semipolar),
            "n" => Some(RetentionIndexColumn::Nonpolar),
            "p" => Some(RetentionIndexColumn::Polar),
            _ => None,
        }
    }
}

impl Display for RetentionIndexColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RetentionIndexColumn::Default => "default",
            RetentionIndexColumn::Semipolar => "semipolar",
            RetentionIndexColumn::Nonpolar => "nonpolar",
            RetentionIndexColumn::Polar => "polar",
        };
        f.write_str(name)
    }
}

/// One column entry of a [`RetentionIndexRecord`].
///
/// `sample_count` of `None` means "one sample or unspecified", never zero samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionIndexRecordPart {
    pub ri: f32,
    pub sample_count: Option<u32>,
    pub confidence_interval: Option<f32>,
}

impl RetentionIndexRecordPart {
    pub fn single(ri: f32) -> Self {
        Self {
            ri,
            sample_count: None,
            confidence_interval: None,
        }
    }
}

#[derive(Debug)]
enum TokenError {
    UnknownPrefix,
    InvalidValue,
}

impl Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::UnknownPrefix => write!(f, "not a number and no known column prefix"),
            TokenError::InvalidValue => write!(f, "retention index is not a finite number"),
        }
    }
}

/// Retention indices of one compound, keyed by column.
///
/// Built once from the library annotation and read-only afterwards.
/// Lookups for a column without an entry fall back to [`RetentionIndexColumn::Default`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetentionIndexRecord {
    parts: BTreeMap<RetentionIndexColumn, RetentionIndexRecordPart>,
}

impl RetentionIndexRecord {
    /// Parses a textual annotation. Never fails: tokens that cannot be
    /// interpreted are dropped with a warning.
    ///
    /// ```
    /// use rialign::models::{RetentionIndexColumn, RetentionIndexRecord};
    ///
    /// let record = RetentionIndexRecord::parse("x=999 s=1200");
    /// assert_eq!(record.get(RetentionIndexColumn::Semipolar), Some(1200.0));
    /// assert_eq!(record.len(), 1);
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut parts = BTreeMap::new();
        for token in text.split_whitespace() {
            match Self::parse_token(token, text) {
                // Repeated columns overwrite, last one wins
                Ok((column, part)) => {
                    parts.insert(column, part);
                }
                Err(reason) => {
                    warn!(token, annotation = text, "Dropping RI record token: {}", reason);
                }
            }
        }
        Self { parts }
    }

    fn parse_token(
        token: &str,
        annotation: &str,
    ) -> Result<(RetentionIndexColumn, RetentionIndexRecordPart), TokenError> {
        if let Ok(ri) = token.parse::<f32>() {
            if !ri.is_finite() {
                return Err(TokenError::InvalidValue);
            }
            return Ok((
                RetentionIndexColumn::Default,
                RetentionIndexRecordPart::single(ri),
            ));
        }

        let (prefix, values) = token.split_once('=').ok_or(TokenError::UnknownPrefix)?;
        let column = RetentionIndexColumn::from_prefix(prefix).ok_or(TokenError::UnknownPrefix)?;

        let mut fields = values.split('/');
        let ri = fields
            .next()
            .and_then(|x| x.parse::<f32>().ok())
            .filter(|x| x.is_finite())
            .ok_or(TokenError::InvalidValue)?;

        let suffix: Vec<&str> = fields.collect();
        let (sample_count, confidence_interval) = match suffix.as_slice() {
            [] => (None, None),
            [count, ci, ..] => match (count.parse::<u32>(), ci.parse::<f32>()) {
                (Ok(count), Ok(ci)) if ci.is_finite() => (Some(count), Some(ci)),
                _ => {
                    warn!(
                        token,
                        annotation, "Unparseable sample count or confidence interval, keeping RI only"
                    );
                    (None, None)
                }
            },
            [_] => {
                warn!(
                    token,
                    annotation, "Sample count without confidence interval, keeping RI only"
                );
                (None, None)
            }
        };

        Ok((
            column,
            RetentionIndexRecordPart {
                ri,
                sample_count,
                confidence_interval,
            },
        ))
    }

    pub fn from_parts(
        parts: impl IntoIterator<Item = (RetentionIndexColumn, RetentionIndexRecordPart)>,
    ) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }

    /// Record holding a single value in the default column.
    pub fn from_default(ri: f32) -> Self {
        Self::from_parts([(
            RetentionIndexColumn::Default,
            RetentionIndexRecordPart::single(ri),
        )])
    }

    /// Entry for `column`, or the default column entry when there is none.
    pub fn part(&self, column: RetentionIndexColumn) -> Option<&RetentionIndexRecordPart> {
        self.parts
            .get(&column)
            .or_else(|| self.parts.get(&RetentionIndexColumn::Default))
    }

    pub fn get(&self, column: RetentionIndexColumn) -> Option<f32> {
        self.part(column).map(|x| x.ri)
    }

    /// Entry for exactly `column`, without default fallback.
    pub fn get_exact(&self, column: RetentionIndexColumn) -> Option<&RetentionIndexRecordPart> {
        self.parts.get(&column)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RetentionIndexColumn, &RetentionIndexRecordPart)> {
        self.parts.iter()
    }
}

/// Writes the semipolar then nonpolar entries as `s=RI[/N/CI] n=RI[/N/CI]`.
///
/// This is lossy: values are rounded to integers, and the default and polar
/// columns are not written.
impl Display for RetentionIndexRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for column in [
            RetentionIndexColumn::Semipolar,
            RetentionIndexColumn::Nonpolar,
        ] {
            let Some(part) = self.parts.get(&column) else {
                continue;
            };
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", column.prefix(), part.ri.round() as i64)?;
            if let (Some(count), Some(ci)) = (part.sample_count, part.confidence_interval) {
                write!(f, "/{}/{}", count, ci.round() as i64)?;
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for RetentionIndexRecord {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for RetentionIndexRecord {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Deserializes from the textual library annotation.
impl<'de> Deserialize<'de> for RetentionIndexRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
