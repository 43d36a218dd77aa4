//! Code for selecting years from those configured for a project.
use crate::input::is_sorted_and_unique;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;

fn parse_year(s: &str) -> Result<u32> {
    s.trim()
        .parse()
        .with_context(|| format!("Invalid year: {}", s.trim()))
}

/// Parse a selection of years.
///
/// The string can be "all" (case-insensitive), a single year, an inclusive range (e.g.
/// "2015-2017") or a semicolon-separated list of these (e.g. "2015-2017; 2020"). Every selected year
/// must be one of `valid_years` and the result must be in order without repeats.
///
/// # Arguments
///
/// - `s` - Input string to parse
/// - `valid_years` - The years configured for the project
pub fn parse_year_str(s: &str, valid_years: &[u32]) -> Result<Vec<u32>> {
    let s = s.trim();
    ensure!(!s.is_empty(), "No years provided");

    if s.eq_ignore_ascii_case("all") {
        return Ok(valid_years.to_vec());
    }

    let mut years = Vec::new();
    for part in s.split(';').map(str::trim) {
        if let Some((start, end)) = part.split_once('-') {
            let range = parse_year(start)?..=parse_year(end)?;
            ensure!(!range.is_empty(), "Invalid year range: {part}");
            let selected = valid_years
                .iter()
                .copied()
                .filter(|year| range.contains(year))
                .collect_vec();
            ensure!(!selected.is_empty(), "No configured years in range {part}");
            years.extend(selected);
        } else {
            let year = parse_year(part)?;
            ensure!(
                valid_years.contains(&year),
                "Year {year} is not one of the configured years"
            );
            years.push(year);
        }
    }

    ensure!(
        is_sorted_and_unique(&years),
        "Years must be in order and unique"
    );

    Ok(years)
}
