const MAX_SLUG_LEN: usize = 100;

/// Slug used when a name has no sluggable characters at all.
pub const FALLBACK_SLUG: &str = "tag";

/// Lowercase ASCII slug.
///
/// Accented letters are transliterated (`café` becomes `cafe`), ASCII
/// punctuation other than `-` and `_` is dropped, runs of whitespace or
/// hyphens collapse to one hyphen, and leading or trailing `-`/`_` are
/// stripped.
pub fn slugify(input: &str) -> String {
    let kept: String = input
        .chars()
        .filter(|c| {
            !c.is_ascii() || c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || matches!(c, '-' | '_')
        })
        .collect();

    let joined = kept
        .split('_')
        .map(::slug::slugify)
        .collect::<Vec<_>>()
        .join("_");

    let mut out = joined.trim_matches(|c: char| c == '-' || c == '_').to_string();
    if out.len() > MAX_SLUG_LEN {
        out.truncate(MAX_SLUG_LEN);
        out = out.trim_end_matches(|c: char| c == '-' || c == '_').to_string();
    }
    out
}

/// The base a unique slug grows from: `base` itself, or [`FALLBACK_SLUG`]
/// when `base` is empty.
pub fn slug_base(base: &str) -> &str {
    if base.is_empty() {
        FALLBACK_SLUG
    } else {
        base
    }
}

/// Pick the first free slug for `base`: `base`, then `base-1`, `base-2`, ...
///
/// An empty base (a name made only of punctuation) starts from
/// [`FALLBACK_SLUG`].
pub fn unique_slug<F>(base: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = slug_base(base);
    if !taken(base) {
        return base.to_string();
    }

    let mut n = 1usize;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
