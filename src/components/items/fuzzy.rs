//! Comparaison approximative de noms d'objets.
//!
//! Le score principal est un « weighted ratio » sur 100 : il choisit la
//! meilleure des comparaisons simple, par jetons triés, par ensembles de jetons
//! et partielle, pondérées selon l'écart de longueur des deux chaînes.

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;

/// Normalise une chaîne avant comparaison : minuscules, caractères non
/// alphanumériques remplacés par des espaces, espaces de bord retirés.
pub fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Weighted ratio entre deux chaînes déjà normalisées, de 0 à 100.
pub fn wratio(s1: &str, s2: &str) -> f64 {
    let c1 = s1.chars().collect::<Vec<_>>();
    let c2 = s2.chars().collect::<Vec<_>>();
    if c1.is_empty() || c2.is_empty() {
        return 0.0;
    }
    let (len1, len2) = (c1.len() as f64, c2.len() as f64);
    let len_ratio = if len1 > len2 { len1 / len2 } else { len2 / len1 };

    let end_ratio = ratio(&c1, &c2);
    if len_ratio < 1.5 {
        let token_ratio = token_sort_ratio(s1, s2).max(token_set_ratio(s1, s2));
        return end_ratio.max(token_ratio * UNBASE_SCALE);
    }
    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    let end_ratio = end_ratio.max(partial_ratio(&c1, &c2) * partial_scale);
    end_ratio.max(partial_token_ratio(s1, s2) * UNBASE_SCALE * partial_scale)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for ca in a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb { diagonal + 1 } else { above.max(row[j]) };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Similarité Indel normalisée : `2 * LCS / (len1 + len2)`.
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs_len(a, b)) as f64 / total as f64
}

fn norm_distance(dist: usize, lensum: usize) -> f64 {
    if lensum == 0 {
        return 100.0;
    }
    100.0 - 100.0 * dist as f64 / lensum as f64
}

/// Meilleur ratio de la chaîne la plus courte contre chaque fenêtre de la plus longue.
fn partial_ratio(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }
    let n = short.len();
    let mut best: f64 = 0.0;
    for start in 0..=(long.len() - n) {
        best = best.max(ratio(short, &long[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    for len in 1..n {
        best = best
            .max(ratio(short, &long[..len]))
            .max(ratio(short, &long[long.len() - len..]));
    }
    best
}

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

fn join<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> String {
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}

fn token_sort_ratio(s1: &str, s2: &str) -> f64 {
    let mut t1 = s1.split_whitespace().collect::<Vec<_>>();
    let mut t2 = s2.split_whitespace().collect::<Vec<_>>();
    t1.sort_unstable();
    t2.sort_unstable();
    let a = t1.join(" ").chars().collect::<Vec<_>>();
    let b = t2.join(" ").chars().collect::<Vec<_>>();
    ratio(&a, &b)
}

fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let (tokens_a, tokens_b) = (tokens(s1), tokens(s2));
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersect = join(tokens_a.intersection(&tokens_b).copied());
    let diff_ab = join(tokens_a.difference(&tokens_b).copied());
    let diff_ba = join(tokens_b.difference(&tokens_a).copied());
    if !intersect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }
    let ab = diff_ab.chars().collect::<Vec<_>>();
    let ba = diff_ba.chars().collect::<Vec<_>>();
    let sect_len = intersect.chars().count();
    let separator = usize::from(sect_len != 0);
    let sect_ab_len = sect_len + separator + ab.len();
    let sect_ba_len = sect_len + separator + ba.len();

    let dist = ab.len() + ba.len() - 2 * lcs_len(&ab, &ba);
    let result = norm_distance(dist, sect_ab_len + sect_ba_len);
    if sect_len == 0 {
        return result;
    }
    let sect_ab_ratio = norm_distance(separator + ab.len(), sect_len + sect_ab_len);
    let sect_ba_ratio = norm_distance(separator + ba.len(), sect_len + sect_ba_len);
    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

fn partial_token_ratio(s1: &str, s2: &str) -> f64 {
    let (tokens_a, tokens_b) = (tokens(s1), tokens(s2));
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    if tokens_a.intersection(&tokens_b).next().is_some() {
        return 100.0;
    }
    let a = join(tokens_a).chars().collect::<Vec<_>>();
    let b = join(tokens_b).chars().collect::<Vec<_>>();
    partial_ratio(&a, &b)
}
