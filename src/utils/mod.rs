use chrono::{DateTime, Utc};

/// Languages the generator is asked to produce transcripts in
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Japanese",
    "Mandarin Chinese",
    "Hindi",
    "Portuguese",
];

/// Lowercase a title and replace everything but ASCII letters and digits with underscores
pub fn safe_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Format how long ago a timestamp was, e.g. "5 minutes ago"
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    let (value, unit) = match seconds {
        s if s < 60 => return "just now".to_string(),
        s if s < 3600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3600, "hour"),
        s if s < 2_592_000 => (s / 86_400, "day"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };

    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}

/// Map a language name or code to the display name the generator expects
pub fn normalize_language(lang: &str) -> String {
    let normalized = match lang.trim().to_lowercase().as_str() {
        "en" | "english" => "English",
        "es" | "spanish" => "Spanish",
        "fr" | "french" => "French",
        "de" | "german" => "German",
        "ja" | "japanese" => "Japanese",
        "zh" | "chinese" | "mandarin" | "mandarin chinese" => "Mandarin Chinese",
        "hi" | "hindi" => "Hindi",
        "pt" | "portuguese" => "Portuguese",
        _ => lang.trim(), // Return as-is if no mapping found
    };

    normalized.to_string()
}
