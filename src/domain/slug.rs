//! Normalisation des titres en slugs et noms de fichiers.

use rand::Rng;

const SLUG_SUFFIX_LEN: usize = 5;
const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Transforme un texte libre en identifiant URL-safe:
/// minuscules, runs non-alphanumériques remplacés par un tiret,
/// tirets de tête/queue supprimés.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }

    if out.ends_with('-') {
        out.pop();
    }

    out
}

/// Slug unique: base slugifiée + suffixe aléatoire de 5 caractères
pub fn unique_slug(title: &str) -> String {
    let base = slugify(title);
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SLUG_SUFFIX_LEN)
        .map(|_| SLUG_ALPHABET[rng.gen_range(0..SLUG_ALPHABET.len())] as char)
        .collect();

    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// Nettoie un titre pour l'utiliser comme segment de clé S3
pub fn sanitize_file_name(name: &str) -> String {
    slugify(name)
}

/// Mot déclencheur du sujet: deux premières lettres du prénom, en
/// majuscules, suffixées par `_FLUX`
pub fn trigger_word(full_name: &str) -> String {
    let first_name = full_name.split_whitespace().next().unwrap_or("");
    let name_part: String = first_name.chars().take(2).collect::<String>().to_uppercase();
    format!("{}_FLUX", name_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("My Headshots 2024"), "my-headshots-2024");
        assert_eq!(slugify("  --Hello!! World--  "), "hello-world");
        assert_eq!(slugify("déjà vu"), "d-j-vu");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("a   b///c"), "a-b-c");
    }

    #[test]
    fn test_unique_slug_has_suffix() {
        let slug = unique_slug("My Title");
        assert!(slug.starts_with("my-title-"));
        assert_eq!(slug.len(), "my-title-".len() + 5);

        // Deux appels ne produisent pas le même slug
        assert_ne!(unique_slug("My Title"), unique_slug("My Title"));
    }

    #[test]
    fn test_unique_slug_empty_title() {
        let slug = unique_slug("!!!");
        assert_eq!(slug.len(), 5);
    }

    #[test]
    fn test_trigger_word() {
        assert_eq!(trigger_word("Jane Doe"), "JA_FLUX");
        assert_eq!(trigger_word("bob"), "BO_FLUX");
        assert_eq!(trigger_word(""), "_FLUX");
    }
}
