//! Terminal rendering of a session.

use std::fmt::Write;

use crate::domain::{Match, Phase, Session, Settlement};

/// Render what the user should currently see
pub fn render_session(session: &Session) -> String {
    let mut out = String::new();

    if session.processing {
        out.push_str("Analyzing audio...\n");
    }

    if let Some(error) = &session.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    if session.has_results() {
        out.push_str(&render_matches(&session.matches));
    } else if session.phase() == Phase::Settled(Settlement::Success) {
        out.push_str("No matches found\n");
    }

    out
}

/// Numbered match list
pub fn render_matches(matches: &[Match]) -> String {
    let mut out = String::new();

    for (i, m) in matches.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}", i + 1, describe(m));
        if let Some(url) = m.url() {
            let _ = writeln!(out, "    {}", url);
        }
    }

    out
}

/// One-line description of a match
pub fn describe(m: &Match) -> String {
    let title = m.title().unwrap_or("(untitled)");
    let mut line = match m.artist() {
        Some(artist) => format!("{} - {}", artist, title),
        None => title.to_string(),
    };

    if let Some(confidence) = m.confidence() {
        let _ = write!(line, " ({:.0}%)", confidence * 100.0);
    }
    if let Some(id) = m.track_id() {
        let _ = write!(line, " [track {}]", id);
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Transition;
    use serde_json::json;

    #[test]
    fn test_render_processing() {
        let session = Session::default().apply(Transition::Submitted);
        assert_eq!(render_session(&session), "Analyzing audio...\n");
    }

    #[test]
    fn test_render_error() {
        let session = Session::default()
            .apply(Transition::Submitted)
            .apply(Transition::Failed("Matching failed".to_string()));
        assert_eq!(render_session(&session), "Error: Matching failed\n");
    }

    #[test]
    fn test_render_no_matches() {
        let session = Session::default()
            .apply(Transition::Submitted)
            .apply(Transition::Succeeded(Vec::new()));
        assert_eq!(render_session(&session), "No matches found\n");
    }

    #[test]
    fn test_render_idle_is_empty() {
        assert_eq!(render_session(&Session::default()), "");
    }

    #[test]
    fn test_describe_full_match() {
        let m = Match::new(json!({
            "track_id": 7,
            "title": "Night Drive",
            "artist": "Kavinsky",
            "confidence": 0.876,
            "url": "https://soundcloud.com/kavinsky/night-drive"
        }));

        assert_eq!(describe(&m), "Kavinsky - Night Drive (88%) [track 7]");

        let rendered = render_matches(&[m]);
        assert!(rendered.starts_with(" 1. Kavinsky - Night Drive"));
        assert!(rendered.contains("    https://soundcloud.com/kavinsky/night-drive\n"));
    }

    #[test]
    fn test_describe_sparse_match() {
        let m = Match::new(json!({"trackId": "t1"}));
        assert_eq!(describe(&m), "(untitled) [track t1]");
    }
}
