//! Markdown release notes from merged pull requests.

use crate::git::CommitMessage;
use crate::github::NoteFragment;
use crate::version::{CommitKind, parse_commit};

/// Group fragments by conventional type into a markdown body
pub fn format_release_notes(fragments: &[NoteFragment]) -> String {
    if fragments.is_empty() {
        return "No pull requests were merged for this release.".to_string();
    }

    let mut breaking = Vec::new();
    let mut features = Vec::new();
    let mut fixes = Vec::new();
    let mut other = Vec::new();

    for fragment in fragments {
        // PR titles follow the same convention as commit subjects
        let parsed = parse_commit(&CommitMessage {
            sha: String::new(),
            subject: fragment.title.clone(),
            body: String::new(),
        });
        let line = format_line(fragment, &parsed.description);
        if parsed.breaking {
            breaking.push(line);
        } else {
            match parsed.kind {
                CommitKind::Feature => features.push(line),
                CommitKind::Fix => fixes.push(line),
                _ => other.push(line),
            }
        }
    }

    let mut sections = Vec::new();
    for (title, lines) in [
        ("### ⚠ Breaking changes", breaking),
        ("### Features", features),
        ("### Bug fixes", fixes),
        ("### Other changes", other),
    ] {
        if !lines.is_empty() {
            sections.push(format!("{title}\n\n{}", lines.join("\n")));
        }
    }
    sections.join("\n\n")
}

fn format_line(fragment: &NoteFragment, description: &str) -> String {
    match &fragment.author {
        Some(author) => format!("- {} ([#{}]({})) @{}", description, fragment.number, fragment.url, author),
        None => format!("- {} ([#{}]({}))", description, fragment.number, fragment.url),
    }
}
