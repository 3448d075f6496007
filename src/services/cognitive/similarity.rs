//! String similarity helpers shared by the classifier and the extractors.

/// Normalized edit-distance similarity in `[0, 1]`, case-insensitive.
///
/// `1 - levenshtein(a, b) / max(len(a), len(b))` counted in characters.
/// Two empty strings are identical; one empty string matches nothing.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Best similarity of `text` against any entry of `vocabulary`
pub fn best_similarity<S: AsRef<str>>(text: &str, vocabulary: &[S]) -> f64 {
    vocabulary
        .iter()
        .map(|entry| similarity(text, entry.as_ref()))
        .fold(0.0, f64::max)
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `text` contains, or is similar enough to, some vocabulary entry
pub fn matches_any<S: AsRef<str>>(text: &str, vocabulary: &[S], threshold: f64) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    vocabulary.iter().any(|entry| {
        let entry = entry.as_ref();
        contains_ignore_case(text, entry) || similarity(text, entry) >= threshold
    })
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Lowercase and strip Latin diacritics ("Nível" -> "nivel").
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect::<String>()
        .trim()
        .to_string()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ğ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' | 'ş' => 's',
        'ť' | 'ţ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// Fuzzy score on a 0-100 scale for matching a noisy reading against a
/// canonical name. Takes the best of the plain ratio, the token-sorted ratio
/// and (for clearly unequal lengths) the best substring alignment.
pub fn fuzzy_score(query: &str, choice: &str) -> u32 {
    let q: Vec<char> = query.chars().collect();
    let c: Vec<char> = choice.chars().collect();
    if q.is_empty() || c.is_empty() {
        return 0;
    }

    let base = ratio(&q, &c);
    let sorted = ratio(&token_sorted(query), &token_sorted(choice)) * 0.95;

    let (shorter, longer) = if q.len() <= c.len() { (&q, &c) } else { (&c, &q) };
    let length_ratio = longer.len() as f64 / shorter.len() as f64;

    let best = if length_ratio < 1.5 {
        base.max(sorted)
    } else {
        let scale = if length_ratio < 8.0 { 0.9 } else { 0.6 };
        base.max(sorted).max(partial_ratio(shorter, longer) * scale)
    };

    (best * 100.0).round() as u32
}

/// Indel similarity: `2 * LCS / (len(a) + len(b))`
fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

fn partial_ratio(shorter: &[char], longer: &[char]) -> f64 {
    longer
        .windows(shorter.len())
        .map(|window| ratio(shorter, window))
        .fold(0.0, f64::max)
}

fn token_sorted(text: &str) -> Vec<char> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ").chars().collect()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &["", "a", "Power", "power", "P0wer", "Kill Points", "凱撒", "Nível 10", "[ABC]Name"];

    #[test]
    fn test_similarity_identity() {
        for s in SAMPLES {
            assert_eq!(similarity(s, s), 1.0, "sim({:?}, itself) should be 1.0", s);
        }
    }

    #[test]
    fn test_similarity_symmetric_and_bounded() {
        for a in SAMPLES {
            for b in SAMPLES {
                let ab = similarity(a, b);
                let ba = similarity(b, a);
                assert_eq!(ab, ba, "sim({:?}, {:?}) should be symmetric", a, b);
                assert!((0.0..=1.0).contains(&ab), "sim({:?}, {:?}) = {} out of range", a, b, ab);
            }
        }
    }

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("Power", "POWER"), 1.0, "Case is folded");
        assert!((similarity("Power", "P0wer") - 0.8).abs() < 1e-9);
        assert_eq!(similarity("", "Power"), 0.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_matches_any() {
        let vocab = ["Power", "Poder"];
        assert!(matches_any("Total Power", &vocab, 0.85), "Substring counts");
        assert!(matches_any("P0der", &vocab, 0.8));
        assert!(!matches_any("Kills", &vocab, 0.85));
        assert!(!matches_any("   ", &vocab, 0.0), "Blank text never matches");
    }

    #[test]
    fn test_best_similarity() {
        assert_eq!(best_similarity("Rome", &["Roma", "Rome"]), 1.0);
        assert_eq!(best_similarity::<&str>("Rome", &[]), 0.0);
    }

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("  Nível "), "nivel");
        assert_eq!(normalize("Aethelflæd"), "aethelflæd");
        assert_eq!(normalize("Guan Yu"), "guan yu");
        assert_eq!(normalize("Çağrı"), "cagri");
    }

    #[test]
    fn test_fuzzy_score_exact_and_noisy() {
        assert_eq!(fuzzy_score("sun tzu", "sun tzu"), 100);
        assert!(fuzzy_score("sun tzv", "sun tzu") >= 83, "One wrong glyph still matches");
        assert!(fuzzy_score("boudica", "sun tzu") < 83);
        assert_eq!(fuzzy_score("", "sun tzu"), 0);
    }

    #[test]
    fn test_fuzzy_score_token_order() {
        assert!(fuzzy_score("tzu sun", "sun tzu") >= 90, "Token order is ignored");
    }

    #[test]
    fn test_fuzzy_score_partial_alignment() {
        // Reading picked up trailing noise
        assert!(fuzzy_score("richard i lionheart xx", "richard i") >= 83);
    }
}
