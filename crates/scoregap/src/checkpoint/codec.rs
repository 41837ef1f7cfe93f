use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::analysis::{CountryTotals, GapTotals};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointParseError {
    #[error("checkpoint is empty")]
    Empty,

    #[error("checkpoint does not end with a newline")]
    Truncated,

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("checkpoint kind '{found}' does not match '{expected}'")]
    KindMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("invalid totals: {0}")]
    Totals(String),
}

/// Totals that can be written into and read back from a checkpoint.
pub trait CheckpointState: Sized {
    /// Written on the `kind=` line; a checkpoint of another kind is rejected.
    const KIND: &'static str;

    /// Accumulator fields in a fixed order.
    fn encode(&self) -> Vec<(String, u64)>;

    fn decode(fields: &[(String, u64)]) -> Result<Self, CheckpointParseError>;
}

const GAP_KEYS: [&str; 4] = ["analyzed", "compared", "qualifying", "missing_score"];

impl CheckpointState for GapTotals {
    const KIND: &'static str = "missing-score";

    fn encode(&self) -> Vec<(String, u64)> {
        let values = [
            self.analyzed,
            self.compared,
            self.qualifying,
            self.missing_score,
        ];
        GAP_KEYS
            .iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn decode(fields: &[(String, u64)]) -> Result<Self, CheckpointParseError> {
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        if keys != GAP_KEYS {
            return Err(CheckpointParseError::Totals(format!(
                "expected keys {:?}, found {:?}",
                GAP_KEYS, keys
            )));
        }

        let totals = GapTotals {
            analyzed: fields[0].1,
            compared: fields[1].1,
            qualifying: fields[2].1,
            missing_score: fields[3].1,
        };
        if totals.compared > totals.analyzed {
            return Err(CheckpointParseError::Totals(
                "more items compared than analyzed".to_string(),
            ));
        }
        if totals.qualifying > totals.compared {
            return Err(CheckpointParseError::Totals(
                "more items retained than compared".to_string(),
            ));
        }
        Ok(totals)
    }
}

impl CheckpointState for CountryTotals {
    const KIND: &'static str = "leaderboard";

    fn encode(&self) -> Vec<(String, u64)> {
        self.iter()
            .map(|(code, total)| (code.to_string(), total))
            .collect()
    }

    fn decode(fields: &[(String, u64)]) -> Result<Self, CheckpointParseError> {
        if fields.is_empty() {
            return Err(CheckpointParseError::Totals(
                "no country totals".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (code, _) in fields {
            if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(CheckpointParseError::Totals(format!(
                    "'{}' is not a country code",
                    code
                )));
            }
            if !seen.insert(code.as_str()) {
                return Err(CheckpointParseError::Totals(format!(
                    "duplicate country '{}'",
                    code
                )));
            }
        }
        Ok(CountryTotals::from_entries(fields.to_vec()))
    }
}

/// Everything needed to continue a run: items `[0, next_index)` are folded
/// into `totals`, and the report holds exactly `report_len` bytes for them.
///
/// `scope` names the analysis settings the totals were computed under. A run
/// with different settings must not continue from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint<T> {
    pub next_index: usize,
    pub report_len: u64,
    pub scope: String,
    pub totals: T,
}

impl<T: CheckpointState> Checkpoint<T> {
    pub fn new(next_index: usize, report_len: u64, totals: T) -> Self {
        Self {
            next_index,
            report_len,
            scope: String::new(),
            totals,
        }
    }

    /// Line breaks are replaced so the scope stays on its own line.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into().replace(['\n', '\r'], " ");
        self
    }

    /// ```text
    /// <next_index>
    /// report_len=<u64>
    /// kind=<kind>
    /// scope=<text>
    /// <key>=<u64>
    /// ```
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.next_index);
        let _ = writeln!(out, "report_len={}", self.report_len);
        let _ = writeln!(out, "kind={}", T::KIND);
        let _ = writeln!(out, "scope={}", self.scope);
        for (key, value) in self.totals.encode() {
            let _ = writeln!(out, "{}={}", key, value);
        }
        out
    }

    /// Any malformed line rejects the whole checkpoint.
    pub fn parse(text: &str) -> Result<Self, CheckpointParseError> {
        if text.is_empty() {
            return Err(CheckpointParseError::Empty);
        }
        if !text.ends_with('\n') {
            return Err(CheckpointParseError::Truncated);
        }

        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

        let (line, first) = lines.next().ok_or(CheckpointParseError::Empty)?;
        let next_index = first.parse::<usize>().map_err(|e| malformed(line, e))?;

        let (line, raw) = lines.next().ok_or_else(|| missing(2, "report_len"))?;
        let report_len = match split_field(line, raw)? {
            ("report_len", value) => value.parse::<u64>().map_err(|e| malformed(line, e))?,
            (key, _) => return Err(unexpected(line, "report_len", key)),
        };

        let (line, raw) = lines.next().ok_or_else(|| missing(3, "kind"))?;
        match split_field(line, raw)? {
            ("kind", kind) if kind == T::KIND => {}
            ("kind", kind) => {
                return Err(CheckpointParseError::KindMismatch {
                    expected: T::KIND,
                    found: kind.to_string(),
                })
            }
            (key, _) => return Err(unexpected(line, "kind", key)),
        }

        let (line, raw) = lines.next().ok_or_else(|| missing(4, "scope"))?;
        let scope = match split_field(line, raw)? {
            ("scope", value) => value.to_string(),
            (key, _) => return Err(unexpected(line, "scope", key)),
        };

        let mut fields = Vec::new();
        for (line, raw) in lines {
            let (key, value) = split_field(line, raw)?;
            let value = value.parse::<u64>().map_err(|e| malformed(line, e))?;
            fields.push((key.to_string(), value));
        }

        Ok(Self {
            next_index,
            report_len,
            scope,
            totals: T::decode(&fields)?,
        })
    }
}

fn split_field(line: usize, raw: &str) -> Result<(&str, &str), CheckpointParseError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(CheckpointParseError::Malformed {
            line,
            message: format!("expected key=value, found '{}'", raw),
        }),
    }
}

fn malformed(line: usize, e: impl std::fmt::Display) -> CheckpointParseError {
    CheckpointParseError::Malformed {
        line,
        message: e.to_string(),
    }
}

fn missing(line: usize, key: &str) -> CheckpointParseError {
    CheckpointParseError::Malformed {
        line,
        message: format!("missing '{}' line", key),
    }
}

fn unexpected(line: usize, expected: &str, found: &str) -> CheckpointParseError {
    CheckpointParseError::Malformed {
        line,
        message: format!("expected '{}', found '{}'", expected, found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap_totals() -> GapTotals {
        GapTotals {
            analyzed: 3,
            compared: 1,
            qualifying: 1,
            missing_score: 2_500_000,
        }
    }

    #[test]
    fn test_encode_gap_checkpoint() {
        let checkpoint = Checkpoint::new(3, 180, gap_totals()).with_scope("target=FR");
        assert_eq!(
            checkpoint.encode(),
            "3\nreport_len=180\nkind=missing-score\nscope=target=FR\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=2500000\n"
        );
        assert_eq!(
            Checkpoint::<GapTotals>::parse(&checkpoint.encode()),
            Ok(checkpoint)
        );
    }

    #[test]
    fn test_leaderboard_checkpoint_keeps_country_order() {
        let totals = CountryTotals::from_entries(vec![
            ("US".to_string(), 1_000),
            ("FR".to_string(), 900),
        ]);
        let text = Checkpoint::new(7, 0, totals.clone()).encode();
        assert!(text.ends_with("kind=leaderboard\nscope=\nUS=1000\nFR=900\n"));

        let parsed = Checkpoint::<CountryTotals>::parse(&text).unwrap();
        assert_eq!(parsed.next_index, 7);
        assert_eq!(parsed.totals, totals);
    }

    #[test]
    fn test_scope_stays_on_one_line() {
        let checkpoint = Checkpoint::new(2, 0, gap_totals()).with_scope("target=FR\nanalyzed=9");
        let parsed = Checkpoint::<GapTotals>::parse(&checkpoint.encode()).unwrap();
        assert_eq!(parsed.scope, "target=FR analyzed=9");
        assert_eq!(parsed.totals, gap_totals());
    }

    #[test]
    fn test_parse_rejects_wrong_kind() {
        let text = Checkpoint::new(1, 0, gap_totals()).encode();
        assert_eq!(
            Checkpoint::<CountryTotals>::parse(&text),
            Err(CheckpointParseError::KindMismatch {
                expected: "leaderboard",
                found: "missing-score".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_fails_closed() {
        let cases = [
            "",
            "3\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5",
            "x\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\n",
            "-1\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\n",
            "3\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\n",
            "3\nreport_len=0\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\n",
            "3\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\n",
            "3\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=-5\n",
            "3\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\n\nqualifying=1\nmissing_score=5\n",
            "3\nreport_len=0\nkind=missing-score\nscope=\ncompared=1\nanalyzed=3\nqualifying=1\nmissing_score=5\n",
            "3\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\nextra=1\n",
            "3\nreport_len=0\nkind=missing-score\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\n",
            "3\nreport_len=0\nkind=missing-score\nscope\nanalyzed=3\ncompared=1\nqualifying=1\nmissing_score=5\n",
        ];
        for text in cases {
            assert!(
                Checkpoint::<GapTotals>::parse(text).is_err(),
                "accepted: {:?}",
                text
            );
        }
    }

    #[test]
    fn test_parse_rejects_impossible_counters() {
        let text = "2\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=2\ncompared=3\nqualifying=0\nmissing_score=0\n";
        assert!(matches!(
            Checkpoint::<GapTotals>::parse(text),
            Err(CheckpointParseError::Totals(_))
        ));

        let text = "2\nreport_len=0\nkind=missing-score\nscope=\nanalyzed=2\ncompared=1\nqualifying=2\nmissing_score=0\n";
        assert!(matches!(
            Checkpoint::<GapTotals>::parse(text),
            Err(CheckpointParseError::Totals(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_country_lines() {
        for body in ["fr=1\n", "FRA=1\n", "FR=1\nFR=2\n", ""] {
            let text = format!("1\nreport_len=0\nkind=leaderboard\nscope=\n{}", body);
            assert!(
                Checkpoint::<CountryTotals>::parse(&text).is_err(),
                "accepted: {:?}",
                text
            );
        }
    }
}
