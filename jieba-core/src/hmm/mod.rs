//! HMM model file parsing and Viterbi decoding over the B/E/M/S tag set
//! (spec.md §4.4, §7's HMM strategy).

use std::collections::HashMap;
use std::path::Path;

use crate::error::{JiebaErrorKind, JiebaResult};

/// Tag indices, fixed by the model file's line order: start probabilities,
/// each `transProb` row, and the four `emitProb` lines are all in this
/// order.
pub const B: usize = 0;
pub const E: usize = 1;
pub const M: usize = 2;
pub const S: usize = 3;
pub const STATUS_SUM: usize = 4;

/// Floor for an unseen emission, matching cppjieba's `MIN_DOUBLE`. Low
/// enough that any observed transition beats it, but finite so Viterbi's
/// running sums stay comparable instead of collapsing to `-inf`.
pub const MIN_DOUBLE: f64 = -3.14e+100;

/// Parsed `jieba.hmm_model` contents: start/transition tables plus one
/// emission map per state, keyed by codepoint.
pub struct HmmModel {
    start_prob: [f64; STATUS_SUM],
    trans_prob: [[f64; STATUS_SUM]; STATUS_SUM],
    emit_prob: [HashMap<u32, f64>; STATUS_SUM],
}

impl HmmModel {
    /// Loads a model file shaped as: one line of 4 space-separated start
    /// probabilities, 4 lines of 4 space-separated transition
    /// probabilities (`transProb[from]`), then 4 `emitProb` lines in
    /// B/E/M/S order, each a comma-separated `codepoint:logp` list.
    /// Blank lines and lines starting with `#` are skipped wherever a line
    /// is expected (spec.md §4.4).
    pub fn load(path: &Path) -> JiebaResult<HmmModel> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?;
        let mut lines = content.lines().filter(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        });

        let start_line = lines
            .next()
            .ok_or_else(|| JiebaErrorKind::FileOperationError.with_error(anyhow::anyhow!("missing startProb line")))?;
        let start_prob = parse_prob_row(start_line)?;

        let mut trans_prob = [[0f64; STATUS_SUM]; STATUS_SUM];
        for row in trans_prob.iter_mut() {
            let line = lines.next().ok_or_else(|| {
                JiebaErrorKind::FileOperationError.with_error(anyhow::anyhow!("missing transProb line"))
            })?;
            *row = parse_prob_row(line)?;
        }

        let mut emit_prob: [HashMap<u32, f64>; STATUS_SUM] = Default::default();
        for slot in emit_prob.iter_mut() {
            let line = lines.next().ok_or_else(|| {
                JiebaErrorKind::FileOperationError.with_error(anyhow::anyhow!("missing emitProb line"))
            })?;
            *slot = parse_emit_prob(line)?;
        }

        Ok(HmmModel { start_prob, trans_prob, emit_prob })
    }

    fn emit_prob(&self, state: usize, codepoint: u32) -> f64 {
        *self.emit_prob[state].get(&codepoint).unwrap_or(&MIN_DOUBLE)
    }
}

fn parse_prob_row(line: &str) -> JiebaResult<[f64; STATUS_SUM]> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != STATUS_SUM {
        return Err(JiebaErrorKind::ValueError
            .with_error(anyhow::anyhow!("expected {} columns, got {}: {:?}", STATUS_SUM, fields.len(), line)));
    }
    let mut out = [0f64; STATUS_SUM];
    for (i, f) in fields.iter().enumerate() {
        out[i] = f.parse().map_err(|_| {
            JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("bad probability: {}", f))
        })?;
    }
    Ok(out)
}

fn parse_emit_prob(line: &str) -> JiebaResult<HashMap<u32, f64>> {
    let mut map = HashMap::new();
    for entry in line.split(',') {
        let mut parts = entry.splitn(2, ':');
        let cp_str = parts
            .next()
            .ok_or_else(|| JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("bad emitProb entry: {:?}", entry)))?;
        let p_str = parts
            .next()
            .ok_or_else(|| JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("bad emitProb entry: {:?}", entry)))?;
        let codepoint = cp_str
            .chars()
            .next()
            .map(|c| c as u32)
            .ok_or_else(|| JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("empty emitProb key")))?;
        let logp: f64 = p_str
            .parse()
            .map_err(|_| JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("bad emitProb value: {}", p_str)))?;
        map.insert(codepoint, logp);
    }
    Ok(map)
}

/// Runs Viterbi over `codepoints` and returns one B/E/M/S tag per input
/// position — the flat-array dynamic program from cppjieba's
/// `HMMSegment::Viterbi`, addressing cell `(x, y)` as `x + y * X`.
pub fn viterbi(model: &HmmModel, codepoints: &[u32]) -> Vec<usize> {
    let x_len = codepoints.len();
    if x_len == 0 {
        return Vec::new();
    }
    let xy = x_len * STATUS_SUM;
    let mut weight = vec![0f64; xy];
    let mut path = vec![-1isize; xy];

    for y in 0..STATUS_SUM {
        weight[y * x_len] = model.start_prob[y] + model.emit_prob(y, codepoints[0]);
    }

    for x in 1..x_len {
        for y in 0..STATUS_SUM {
            let now = x + y * x_len;
            let emit = model.emit_prob(y, codepoints[x]);
            let mut best_weight = MIN_DOUBLE;
            let mut best_prev = E as isize;
            for prev_y in 0..STATUS_SUM {
                let old = (x - 1) + prev_y * x_len;
                let candidate = weight[old] + model.trans_prob[prev_y][y] + emit;
                if candidate > best_weight {
                    best_weight = candidate;
                    best_prev = prev_y as isize;
                }
            }
            weight[now] = best_weight;
            path[now] = best_prev;
        }
    }

    let end_e = weight[(x_len - 1) + E * x_len];
    let end_s = weight[(x_len - 1) + S * x_len];
    let mut stat = if end_e >= end_s { E } else { S };

    let mut status = vec![0usize; x_len];
    for x in (0..x_len).rev() {
        status[x] = stat;
        let prev = path[x + stat * x_len];
        stat = if prev < 0 { S } else { prev as usize };
    }
    status
}

/// Splits `status` into half-open rune ranges at every E/S boundary —
/// `InternalCut`'s "odd state ends a word" rule (E=1, S=3 are both odd).
pub fn cuts_from_status(status: &[usize]) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut left = 0usize;
    for (i, &s) in status.iter().enumerate() {
        if s % 2 == 1 {
            ranges.push(left..i + 1);
            left = i + 1;
        }
    }
    if left < status.len() {
        ranges.push(left..status.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_model(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("hmm_model.utf8");
        let content = "\
# comment line, ignored\n\
-0.26 -1e100 -1e100 -1.47\n\
-0.51 -0.91 -1e100 -1e100\n\
-1e100 -1e100 -0.34 -1.26\n\
-1e100 -1e100 -0.35 -1.22\n\
-3.6 -3.6 -2.6 -1.9\n\
\n\
中:-2.6,国:-3.6,科:-2.1\n\
国:-2.0,中:-3.0\n\
国:-2.5,中:-2.5\n\
中:-1.0,国:-1.2\n";
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_and_parses_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir);
        let model = HmmModel::load(&path).unwrap();
        assert_eq!(model.start_prob[B], -0.26);
        assert_eq!(model.trans_prob[B][E], -0.91);
        assert!(model.emit_prob(B, '中' as u32) < 0.0);
    }

    #[test]
    fn viterbi_picks_single_char_to_s_for_one_rune() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir);
        let model = HmmModel::load(&path).unwrap();
        let status = viterbi(&model, &['中' as u32]);
        assert_eq!(status.len(), 1);
    }

    #[test]
    fn cuts_from_status_splits_on_odd_states() {
        let ranges = cuts_from_status(&[B, M, E, S, B, E]);
        assert_eq!(ranges, vec![0..3, 3..4, 4..6]);
    }

    #[test]
    fn rejects_malformed_prob_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.utf8");
        std::fs::write(&path, "0.1 0.2 0.3\n").unwrap();
        let err = HmmModel::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::JiebaErrorKind::ValueError);
    }
}
