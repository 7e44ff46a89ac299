//! Invariants an entry must satisfy before it is committed.

use thiserror::Error;

use crate::models::Entry;

/// Reasons a candidate entry is rejected, in reporting precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The name is empty or whitespace.
    #[error("enter a game name")]
    EmptyName,
    /// None of the download, unityroom or GitHub URLs is set.
    #[error("enter at least one of the download URL, unityroom URL or GitHub URL")]
    NoReferenceUrl,
    /// A download URL was given without the executable it contains.
    #[error("a download URL also needs a build file name")]
    UnpairedDownloadUrl,
    /// A build file was given without a download URL to fetch it from.
    #[error("a build file name also needs a download URL")]
    UnpairedBuildFile,
}

/// Check `candidate`, reporting the first failing rule.
///
/// Rules run in a fixed order: name, then reference URLs, then the
/// download URL / build file pairing.
pub fn validate(candidate: &Entry) -> Result<(), ValidationError> {
    if is_blank(&candidate.name) {
        return Err(ValidationError::EmptyName);
    }

    let has_reference = [
        &candidate.url,
        &candidate.unityroomurl,
        &candidate.githuburl,
    ]
    .iter()
    .any(|value| !is_blank(value));
    if !has_reference {
        return Err(ValidationError::NoReferenceUrl);
    }

    match (is_blank(&candidate.url), is_blank(&candidate.build_file)) {
        (false, true) => Err(ValidationError::UnpairedDownloadUrl),
        (true, false) => Err(ValidationError::UnpairedBuildFile),
        _ => Ok(()),
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_github(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            githuburl: "https://github.com/example/game".to_string(),
            ..Entry::default()
        }
    }

    #[test]
    fn empty_name_wins_over_everything_else() {
        let entry = Entry {
            name: "   ".to_string(),
            url: "https://example.com/game.zip".to_string(),
            ..Entry::default()
        };
        assert_eq!(validate(&entry), Err(ValidationError::EmptyName));
        assert_eq!(validate(&Entry::default()), Err(ValidationError::EmptyName));
    }

    #[test]
    fn requires_a_reference_url() {
        let entry = Entry {
            name: "No links".to_string(),
            image: "https://example.com/cover.png".to_string(),
            markdown: "https://example.com/readme.md".to_string(),
            ..Entry::default()
        };
        assert_eq!(validate(&entry), Err(ValidationError::NoReferenceUrl));
    }

    #[test]
    fn build_file_alone_still_needs_a_reference_url() {
        let entry = Entry {
            name: "Only build".to_string(),
            build_file: "game.exe".to_string(),
            ..Entry::default()
        };
        assert_eq!(validate(&entry), Err(ValidationError::NoReferenceUrl));
    }

    #[test]
    fn download_url_and_build_file_are_paired() {
        let mut entry = Entry {
            name: "Paired".to_string(),
            url: "http://x".to_string(),
            ..Entry::default()
        };
        assert_eq!(validate(&entry), Err(ValidationError::UnpairedDownloadUrl));

        entry.build_file = "a.exe".to_string();
        assert_eq!(validate(&entry), Ok(()));

        let mut entry = with_github("Build only");
        entry.build_file = "a.exe".to_string();
        assert_eq!(validate(&entry), Err(ValidationError::UnpairedBuildFile));
    }

    #[test]
    fn any_single_reference_url_is_enough() {
        assert_eq!(validate(&with_github("GitHub")), Ok(()));
        let entry = Entry {
            name: "unityroom".to_string(),
            unityroomurl: "https://unityroom.com/games/example".to_string(),
            ..Entry::default()
        };
        assert_eq!(validate(&entry), Ok(()));
    }
}
