//! Builds the per-call DAG of dictionary-reachable word boundaries over a
//! rune range and runs the maximum-probability dynamic program over it
//! (spec.md §4.5.1, §9's "per-call DP scratch").

use std::ops::Range;

use jieba_core::{Dat, DagCell, RuneString};

/// Scans every position in `range` for dictionary common-prefix hits,
/// local to the range: `dag[k]`'s transitions are expressed as local
/// indices `0..=dag.len()`, not absolute rune positions, so the DAG can be
/// walked and DP'd without the caller's `range.start` offset leaking into
/// every comparison.
pub fn build_dag(dat: &Dat, runes: &RuneString, range: Range<usize>, max_word_len: usize) -> Vec<DagCell> {
    let len = range.end - range.start;
    let mut dag = vec![DagCell::default(); len];
    for local in 0..len {
        let abs = range.start + local;
        let suffix = runes.encode_range(abs..range.end);
        dat.find_all_prefixes(suffix, local, max_word_len, &mut dag[local]);
    }
    dag
}

/// Right-to-left maximum-weight DP over an already-populated DAG: for each
/// cell, the best transition is the one maximizing `word_weight +
/// tail.max_weight`, ties broken in favor of the earliest transition
/// (strict `>`, per spec.md §4.5.1).
pub fn run_mp_dp(dat: &Dat, dag: &mut [DagCell]) {
    let len = dag.len();
    let min_weight = dat.min_weight();
    for i in (0..len).rev() {
        let nexts = dag[i].nexts.clone();
        let mut best_weight = f64::NEG_INFINITY;
        let mut best_next: isize = -1;
        for (next, elem) in nexts {
            let word_weight = elem.map(|e| e.weight).unwrap_or(min_weight);
            let tail_weight = if next < len { dag[next].max_weight } else { 0.0 };
            let score = word_weight + tail_weight;
            if score > best_weight {
                best_weight = score;
                best_next = next as isize;
            }
        }
        dag[i].max_weight = best_weight;
        dag[i].max_next = best_next;
    }
}

/// Walks `dag` left-to-right from 0 following `max_next`, yielding local
/// `[start, end)` word spans.
pub fn walk_mp_path(dag: &[DagCell]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut i = 0usize;
    while i < dag.len() {
        let next = dag[i].max_next;
        let next = if next < 0 { i + 1 } else { next as usize };
        spans.push(i..next);
        i = next;
    }
    spans
}
