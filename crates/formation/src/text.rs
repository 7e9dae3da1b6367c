//! Small text transformations shared by labels, ids and exports.

use std::sync::LazyLock;

use regex::Regex;

static ICON_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[ICON:([^\]]*)\]").expect("icon token regex is valid"));

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("camel case regex is valid"));

/// Markup for an icon, as used in labels and error messages.
pub fn icon_markup(icon: &str) -> String {
    let icon: String = icon.chars().filter(|c| !c.is_whitespace()).collect();
    format!(r#"<span class="glyphicon glyphicon-{icon}"></span>&nbsp; "#)
}

/// Replaces `[ICON:name]` tokens with icon markup.
pub fn replace_icon_tokens(text: &str) -> String {
    ICON_TOKEN
        .replace_all(text, |caps: &regex::Captures<'_>| icon_markup(&caps[1]))
        .into_owned()
}

/// Removes `[ICON:name]` tokens.
pub fn strip_icon_tokens(text: &str) -> String {
    ICON_TOKEN.replace_all(text, "").into_owned()
}

/// Upper-cases the first character of every whitespace-separated word.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

/// `data-toggle` → `dataToggle`.
pub fn dashed_to_camel(text: &str) -> String {
    separated_to_camel(text, '-')
}

/// `type_label` → `typeLabel`.
pub fn underscored_to_camel(text: &str) -> String {
    separated_to_camel(text, '_')
}

fn separated_to_camel(text: &str, separator: char) -> String {
    let joined: String = text
        .split(separator)
        .map(title_case)
        .collect();
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `userRoles` → `user_roles`.
pub fn camel_to_snake(text: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(text, "${1}_${2}")
        .to_lowercase()
}

/// Folds common accented Latin letters to their ASCII base letter.
pub fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        c => c,
    }
}

/// Lower-cases a value and turns spaces, underscores and dots into hyphens.
pub fn slug_segment(text: &str) -> String {
    text.to_lowercase().replace([' ', '_', '.'], "-")
}

/// Collapses runs of hyphens and strips a trailing one.
pub fn tidy_hyphens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}
