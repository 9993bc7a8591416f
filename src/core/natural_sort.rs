//! Natural ordering for file and folder names.
//!
//! Embedded digit runs compare by numeric value instead of
//! lexicographically, so "chapter2" sorts before "chapter10". All
//! scanning output goes through this ordering so chapter order never
//! depends on filesystem enumeration order.

use std::cmp::Ordering;
use std::path::PathBuf;

#[derive(Debug, PartialEq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn split_runs(s: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            None => in_digits = Some(is_digit),
            Some(d) if d != is_digit => {
                runs.push(if d {
                    Run::Digits(&s[start..i])
                } else {
                    Run::Text(&s[start..i])
                });
                start = i;
                in_digits = Some(is_digit);
            }
            _ => {}
        }
    }
    if let Some(d) = in_digits {
        runs.push(if d {
            Run::Digits(&s[start..])
        } else {
            Run::Text(&s[start..])
        });
    }
    runs
}

/// Compare two digit runs by numeric value without parsing, so
/// arbitrarily long runs cannot overflow.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().flat_map(char::to_lowercase);
    let mut bi = b.chars().flat_map(char::to_lowercase);
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp(&y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Natural comparison: case-insensitive with numeric digit runs.
///
/// Ties (e.g. "ch01" vs "ch1", "A" vs "a") fall back to an exact
/// comparison so the relation is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let runs_a = split_runs(a);
    let runs_b = split_runs(b);

    for pair in runs_a.iter().zip(runs_b.iter()) {
        let ord = match pair {
            (Run::Digits(x), Run::Digits(y)) => cmp_digits(x, y),
            (Run::Text(x), Run::Text(y)) => cmp_text(x, y),
            // Digits sort ahead of text at the same position
            (Run::Digits(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    runs_a
        .len()
        .cmp(&runs_b.len())
        .then_with(|| a.cmp(b))
}

/// Sort paths naturally by their final component.
pub fn sort_paths_naturally(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| {
        let an = a.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let bn = b.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        natural_cmp(&an, &bn).then_with(|| a.cmp(b))
    });
}
