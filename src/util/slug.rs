/// Derive a URL-safe slug from a title: lowercase ASCII letters and digits,
/// every other run of characters collapsed into a single `-`, no leading or
/// trailing dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut dash_pending = false;

    for ch in title.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
            if dash_pending && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(lower);
            dash_pending = false;
        } else {
            dash_pending = true;
        }
    }

    slug
}

/// A slug supplied by a client must already be in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}
