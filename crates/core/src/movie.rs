//! Movie catalog rules shared by every store backend.

use crate::error::CoreError;
use crate::text::ensure_storable;

/// Maximum length of a movie title, in characters.
pub const MAX_TITLE_LEN: usize = 500;

/// Separator used when flattening actor names into a single string.
pub const ACTOR_NAME_SEPARATOR: &str = ", ";

/// Validate a movie title.
///
/// Rules:
/// - Must contain at least one non-whitespace character.
/// - Must not exceed `MAX_TITLE_LEN` characters.
/// - Must not contain NUL.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    ensure_storable("Movie title", title)?;
    if title.trim().is_empty() {
        return Err(CoreError::Validation(
            "Movie title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Movie title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate one actor name. Blank names are allowed; the catalog import
/// drops them before this check.
pub fn validate_actor_name(name: &str) -> Result<(), CoreError> {
    ensure_storable("Actor name", name)
}

/// Mean of the given star values, or `0.0` when there are none.
pub fn average_rating(stars: &[i32]) -> f64 {
    if stars.is_empty() {
        return 0.0;
    }
    let sum: i64 = stars.iter().map(|&s| i64::from(s)).sum();
    sum as f64 / stars.len() as f64
}

/// Join actor names with [`ACTOR_NAME_SEPARATOR`], preserving order.
pub fn join_actor_names<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .collect::<Vec<_>>()
        .join(ACTOR_NAME_SEPARATOR)
}

/// Normalize an optional text filter: blank or whitespace-only values are
/// treated as "no filter".
pub fn normalize_text_filter(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Case-insensitive literal substring match.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn average_of_no_ratings_is_zero() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn average_of_three_and_five_is_four() {
        assert_eq!(average_rating(&[3, 5]), 4.0);
    }

    #[test]
    fn average_keeps_fraction() {
        assert!((average_rating(&[1, 2]) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn joins_names_with_comma_space() {
        assert_eq!(
            join_actor_names(["Leonardo DiCaprio", "Tom Hardy"]),
            "Leonardo DiCaprio, Tom Hardy"
        );
        assert_eq!(join_actor_names(Vec::<&str>::new()), "");
    }

    #[test]
    fn blank_filters_are_dropped() {
        assert_eq!(normalize_text_filter(None), None);
        assert_eq!(normalize_text_filter(Some("   ".into())), None);
        assert_eq!(
            normalize_text_filter(Some("dark".into())),
            Some("dark".to_string())
        );
    }

    #[test]
    fn substring_match_ignores_case() {
        assert!(contains_ignore_case("The Dark Knight", "dark"));
        assert!(contains_ignore_case("The Dark Knight", "KNIGHT"));
        assert!(!contains_ignore_case("Up", "down"));
    }

    #[test]
    fn substring_match_is_literal() {
        assert!(!contains_ignore_case("Up", "U%"));
        assert!(contains_ignore_case("100% Wolf", "0% w"));
    }

    #[test]
    fn title_validation() {
        assert!(validate_title("Inception").is_ok());
        assert_matches!(validate_title("  "), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_title(&"x".repeat(MAX_TITLE_LEN + 1)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(validate_title("Bad\0Title"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn actor_name_validation() {
        assert!(validate_actor_name("Ed Asner").is_ok());
        assert_matches!(
            validate_actor_name("Ed\0Asner"),
            Err(CoreError::Validation(_))
        );
    }
}
