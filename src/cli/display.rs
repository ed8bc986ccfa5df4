use crate::game::{MatchResult, PlayerRegistry};
use std::collections::BTreeMap;

/// Per-player tally across a set of results
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Standing {
    pub played: usize,
    pub wins: usize,
    pub wins_as_white: usize,
    pub wins_as_black: usize,
}

/// Tally wins for every player appearing in `results`
pub fn standings(results: &[MatchResult]) -> BTreeMap<String, Standing> {
    let mut table: BTreeMap<String, Standing> = BTreeMap::new();
    for result in results {
        table.entry(result.white.clone()).or_default().played += 1;
        table.entry(result.black.clone()).or_default().played += 1;

        if let Some(winner) = result.winner_name() {
            let entry = table.entry(winner.to_string()).or_default();
            entry.wins += 1;
            match result.winner {
                Some(crate::board::Side::White) => entry.wins_as_white += 1,
                Some(crate::board::Side::Black) => entry.wins_as_black += 1,
                None => {}
            }
        }
    }
    table
}

/// Display pool standings in a pretty ASCII table format
pub fn display_standings(results: &[MatchResult]) {
    if results.is_empty() {
        println!("No games played.");
        return;
    }

    let table = standings(results);
    let name_width = table.keys().map(String::len).max().unwrap_or(6).max(6);

    println!("┌{:─<w$}┬────────┬──────┬──────────┬──────────┐", "", w = name_width + 2);
    println!(
        "│ {:^w$} │ Played │ Wins │ As White │ As Black │",
        "Player",
        w = name_width
    );
    println!("├{:─<w$}┼────────┼──────┼──────────┼──────────┤", "", w = name_width + 2);

    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|a, b| b.1.wins.cmp(&a.1.wins).then_with(|| a.0.cmp(b.0)));
    for (name, standing) in rows {
        println!(
            "│ {:<w$} │ {:>6} │ {:>4} │ {:>8} │ {:>8} │",
            name,
            standing.played,
            standing.wins,
            standing.wins_as_white,
            standing.wins_as_black,
            w = name_width
        );
    }

    println!("└{:─<w$}┴────────┴──────┴──────────┴──────────┘", "", w = name_width + 2);
}

pub fn display_players(registry: &PlayerRegistry) {
    println!("Available players:");
    for name in registry.names() {
        println!("  {}", name);
    }
}
