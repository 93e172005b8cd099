/// Trailing rolling mean with a minimum period of one: the first `window - 1`
/// entries average over however many values are available so far.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut result = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &values[start..=i];
        result.push(slice.iter().sum::<f64>() / slice.len() as f64);
    }
    result
}

/// Render a statistic the way it reads in an explanation: whole numbers keep
/// one decimal (`2.0`), everything else uses the shortest exact form (`3.5`).
pub fn format_stat(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Validate team name format
pub fn validate_team_name(name: &str) -> bool {
    !name.trim().is_empty() && name.len() <= 100
}

/// Closest candidate by normalized Levenshtein similarity, if any is close enough.
pub fn closest_match<'a, I>(needle: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = needle.to_lowercase();
    candidates
        .into_iter()
        .map(|c| (c, strsim::normalized_levenshtein(&needle, &c.to_lowercase())))
        .filter(|(_, score)| *score >= 0.6)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| c)
}
