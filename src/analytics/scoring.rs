//! String similarity scoring for exercise and workout names

/// Minimum token score for a candidate to count as a match
pub const MATCH_THRESHOLD: u8 = 70;

/// Default edit distance accepted by the typo fallback
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 3;

/// Lowercase, trim and collapse inner whitespace
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `short` starts `long` and ends on a word boundary
fn is_word_prefix(long: &str, short: &str) -> bool {
    long.len() > short.len()
        && long.starts_with(short)
        && long[short.len()..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_alphanumeric())
}

/// `short` ends `long` and starts on a word boundary
fn is_word_suffix(long: &str, short: &str) -> bool {
    long.len() > short.len()
        && long.ends_with(short)
        && long[..long.len() - short.len()]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_alphanumeric())
}

/// Score how well `query` names `candidate`, 0-100.
///
/// | score | condition                                         |
/// |-------|---------------------------------------------------|
/// | 100   | equal after normalization                         |
/// | 90    | one is a word-aligned prefix of the other         |
/// | 80    | one is a word-aligned suffix of the other         |
/// | 70    | every word of one side is a word of the other     |
/// | 60    | at least one word in common                       |
/// | 50    | plain substring containment                       |
/// | 0     | no overlap, or either side empty                  |
pub fn token_score(candidate: &str, query: &str) -> u8 {
    let c = normalize(candidate);
    let q = normalize(query);

    if c.is_empty() || q.is_empty() {
        return 0;
    }
    if c == q {
        return 100;
    }
    if is_word_prefix(&c, &q) || is_word_prefix(&q, &c) {
        return 90;
    }
    if is_word_suffix(&c, &q) || is_word_suffix(&q, &c) {
        return 80;
    }

    let c_words: Vec<&str> = c.split(' ').collect();
    let q_words: Vec<&str> = q.split(' ').collect();

    let all_q_in_c = q_words.iter().all(|w| c_words.contains(w));
    let all_c_in_q = c_words.iter().all(|w| q_words.contains(w));
    if all_q_in_c || all_c_in_q {
        return 70;
    }

    if q_words.iter().any(|w| c_words.contains(w)) {
        return 60;
    }

    if c.contains(&q) || q.contains(&c) {
        return 50;
    }

    0
}

/// Levenshtein distance between the normalized forms of `a` and `b`
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit distance when `a` and `b` are within `max_distance` of each other.
/// Empty strings never match.
pub fn edit_similarity(a: &str, b: &str, max_distance: usize) -> Option<usize> {
    if normalize(a).is_empty() || normalize(b).is_empty() {
        return None;
    }
    let distance = levenshtein(a, b);
    (distance <= max_distance).then_some(distance)
}
