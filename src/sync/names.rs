// Team-name normalization: the provider's long official names mapped to the
// short display names fixtures and predictions use.

/// Known long-to-short mappings for the Premier League.
const TEAM_NAMES: &[(&str, &str)] = &[
    ("Arsenal FC", "Arsenal"),
    ("Aston Villa FC", "Aston Villa"),
    ("AFC Bournemouth", "Bournemouth"),
    ("Brentford FC", "Brentford"),
    ("Brighton & Hove Albion FC", "Brighton"),
    ("Chelsea FC", "Chelsea"),
    ("Crystal Palace FC", "Crystal Palace"),
    ("Everton FC", "Everton"),
    ("Fulham FC", "Fulham"),
    ("Ipswich Town FC", "Ipswich"),
    ("Leicester City FC", "Leicester"),
    ("Liverpool FC", "Liverpool"),
    ("Manchester City FC", "Man City"),
    ("Manchester United FC", "Man Utd"),
    ("Newcastle United FC", "Newcastle"),
    ("Nottingham Forest FC", "Nott'm Forest"),
    ("Southampton FC", "Southampton"),
    ("Tottenham Hotspur FC", "Spurs"),
    ("West Ham United FC", "West Ham"),
    ("Wolverhampton Wanderers FC", "Wolves"),
];

/// Normalize a raw provider team name.
///
/// Falls back to stripping a trailing " FC" or " AFC" suffix for teams not in
/// the table, so promoted clubs still get a reasonable short name.
pub fn short_name(raw: &str) -> String {
    if let Some((_, short)) = TEAM_NAMES.iter().find(|(long, _)| *long == raw) {
        return (*short).to_string();
    }
    raw.strip_suffix(" FC")
        .or_else(|| raw.strip_suffix(" AFC"))
        .unwrap_or(raw)
        .to_string()
}
