//! Human-readable vehicle slugs: `"{slugified-nickname}-{first 6 id chars}"`.

use super::model::Vehicle;

/// Minimum length of the id segment of a slug
pub const PARTIAL_ID_LEN: usize = 6;

/// Lowercase, collapse every run of non-alphanumerics into one hyphen, trim hyphens
pub fn slugify_nickname(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

pub fn generate_slug(nickname: &str, id: &str) -> String {
    let nickname = slugify_nickname(nickname);
    let nickname = if nickname.is_empty() { "untitled" } else { nickname.as_str() };
    let partial_id: String = id.chars().take(PARTIAL_ID_LEN).collect();
    format!("{}-{}", nickname, partial_id)
}

/// Slug split into its nickname and partial-id segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugParts<'a> {
    pub nickname: String,
    pub partial_id: &'a str,
}

/// Split a slug; `None` when the id segment is missing or shorter than 6 characters
pub fn parse_slug(slug: &str) -> Option<SlugParts<'_>> {
    let segments: Vec<&str> = slug.split('-').collect();
    let (partial_id, nickname) = segments.split_last()?;

    if partial_id.chars().count() < PARTIAL_ID_LEN {
        return None;
    }

    Some(SlugParts {
        nickname: nickname.join("-"),
        partial_id: *partial_id,
    })
}

/// Resolve a slug against a set of vehicles.
///
/// Candidates are the vehicles whose id starts with the slug's id segment.
/// Among several candidates the one whose slugified nickname equals the
/// slug's nickname segment wins; otherwise the first candidate is returned.
pub fn resolve_slug<'v, I>(vehicles: I, slug: &str) -> Option<&'v Vehicle>
where
    I: IntoIterator<Item = &'v Vehicle>,
{
    let parts = parse_slug(slug)?;
    let candidates: Vec<&Vehicle> = vehicles
        .into_iter()
        .filter(|v| v.id.starts_with(parts.partial_id))
        .collect();

    candidates
        .iter()
        .find(|v| slugify_nickname(&v.nickname) == parts.nickname)
        .or_else(|| candidates.first())
        .copied()
}
