//! Field delimiter sniffing.

use std::collections::BTreeMap;
use tracing::debug;

/// Delimiter used when sniffing finds nothing consistent.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Candidate delimiters in order of preference.
pub const CANDIDATE_DELIMITERS: [u8; 5] = [b',', b';', b'\t', b'|', b':'];

/// A csv reader over in-memory text that tolerates ragged rows.
pub(crate) fn flexible_reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Guess the field delimiter from the first `sample_bytes` bytes of `text`.
///
/// The winner is the candidate that splits the most sample records into the
/// same number (above one) of fields; ties go to the wider split, then to the
/// earlier candidate. Falls back to [`DEFAULT_DELIMITER`].
pub fn sniff_delimiter(text: &str, sample_bytes: usize) -> u8 {
    let sample = truncate_to_char_boundary(text, sample_bytes);
    let truncated = sample.len() < text.len();

    let mut best: Option<(u8, usize, usize)> = None;
    for &candidate in &CANDIDATE_DELIMITERS {
        let Some(mut widths) = record_widths(sample, candidate) else {
            continue;
        };
        // A cut-off final record would skew the counts.
        if truncated && widths.len() > 1 {
            widths.pop();
        }
        let Some(mode) = mode_of(&widths) else {
            continue;
        };
        if mode < 2 {
            continue;
        }
        let consistent = widths.iter().filter(|&&w| w == mode).count();
        debug!(
            "Delimiter {:?}: {} of {} records have {} fields",
            candidate as char,
            consistent,
            widths.len(),
            mode
        );

        let better = match best {
            None => true,
            Some((_, best_consistent, best_mode)) => {
                consistent > best_consistent || (consistent == best_consistent && mode > best_mode)
            }
        };
        if better {
            best = Some((candidate, consistent, mode));
        }
    }

    best.map(|(d, _, _)| d).unwrap_or(DEFAULT_DELIMITER)
}

/// Field count of every non-blank record, or `None` if the sample does not parse.
fn record_widths(sample: &str, delimiter: u8) -> Option<Vec<usize>> {
    let mut reader = flexible_reader(sample, delimiter);
    let mut record = csv::StringRecord::new();
    let mut widths = Vec::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {
                if !is_blank(&record) {
                    widths.push(record.len());
                }
            }
            Ok(false) => return Some(widths),
            Err(e) => {
                debug!("Sample does not parse with {:?}: {}", delimiter as char, e);
                return None;
            }
        }
    }
}

/// A record holding a single whitespace-only field, i.e. a blank line.
pub(crate) fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|field| field.trim().is_empty())
}

fn mode_of(counts: &[usize]) -> Option<usize> {
    let mut tally: BTreeMap<usize, usize> = BTreeMap::new();
    for &c in counts {
        *tally.entry(c).or_insert(0) += 1;
    }
    // Highest frequency; on ties the larger count wins.
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(count, _)| count)
}

fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
