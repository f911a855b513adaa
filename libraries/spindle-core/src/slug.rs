//! URL slugs for albums and genres

/// Lowercase, ASCII alphanumerics joined by single dashes
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '&' {
            if !slug.is_empty() {
                slug.push('-');
            }
            slug.push_str("and");
            pending_dash = true;
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `base` if free, otherwise `base-N` where N starts one past the number of
/// slugs already taken in the `base(-digits)?` family and skips taken ones
pub fn disambiguate(base: &str, taken: &[String]) -> String {
    let family = taken
        .iter()
        .filter(|slug| {
            slug.as_str() == base
                || slug
                    .strip_prefix(base)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .count();

    if family == 0 {
        return base.to_string();
    }

    let mut n = family + 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
