use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const CANVAS_LABEL_MAX_CHARS: usize = 28;

/// Lowercase, ASCII-alphanumeric words joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn canvas_label(label: &str) -> String {
    if label.chars().count() <= CANVAS_LABEL_MAX_CHARS {
        return label.to_owned();
    }

    let mut short = label
        .chars()
        .take(CANVAS_LABEL_MAX_CHARS - 1)
        .collect::<String>();
    short.push('…');
    short
}

/// Deterministic pseudo-random pair in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
