//! Line diff between two notice revisions.

use tracing::info;

/// Above this many cells the middle section is reported as fully replaced.
const MAX_TABLE_CELLS: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Same(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

/// Computes a line diff, ignoring carriage returns.
#[must_use]
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Vec<Line<'a>> {
    let old: Vec<&str> = old.lines().map(|l| l.trim_end_matches('\r')).collect();
    let new: Vec<&str> = new.lines().map(|l| l.trim_end_matches('\r')).collect();

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut out: Vec<Line<'a>> = old[..prefix].iter().copied().map(Line::Same).collect();
    out.extend(diff_middle(old_mid, new_mid));
    out.extend(old[old.len() - suffix..].iter().copied().map(Line::Same));
    out
}

fn diff_middle<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Line<'a>> {
    let (n, m) = (old.len(), new.len());
    if n.saturating_mul(m) > MAX_TABLE_CELLS {
        return old.iter().copied().map(Line::Removed).chain(new.iter().copied().map(Line::Added)).collect();
    }

    // lcs[i][j]: length of the longest common subsequence of old[i..] and new[j..]
    let mut lcs = vec![vec![0_usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] =
                if old[i] == new[j] { lcs[i + 1][j + 1] + 1 } else { lcs[i + 1][j].max(lcs[i][j + 1]) };
        }
    }

    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(n + m);
    while i < n && j < m {
        if old[i] == new[j] {
            out.push(Line::Same(old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(Line::Removed(old[i]));
            i += 1;
        } else {
            out.push(Line::Added(new[j]));
            j += 1;
        }
    }
    out.extend(old[i..].iter().copied().map(Line::Removed));
    out.extend(new[j..].iter().copied().map(Line::Added));
    out
}

/// Logs changed lines and returns whether anything differs.
pub fn show_diff(old: &str, new: &str) -> bool {
    let mut changed = false;
    for line in diff_lines(old, new) {
        match line {
            Line::Same(_) => {},
            Line::Removed(text) => {
                changed = true;
                info!("- {text}");
            },
            Line::Added(text) => {
                changed = true;
                info!("+ {text}");
            },
        }
    }
    changed
}
