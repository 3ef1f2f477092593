use crate::domain::niche::DomainCandidate;
use crate::scoring::clamp_score;

const BASE_SCORE: f64 = 5.0;
const HYPHEN_PENALTY: f64 = 0.5;
const DIGIT_PENALTY: f64 = 0.5;
const REPEATED_LETTER_PENALTY: f64 = 0.3;

const NAME_PREFIXES: [&str; 3] = ["get", "my", "the"];
const NAME_SUFFIXES: [&str; 4] = ["hub", "guide", "pro", "hq"];

/// Scores a domain like `short.com`. A string without a dot is scored as a bare name with an
/// unknown TLD.
pub fn score_domain(domain: &str) -> DomainCandidate {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    let (name, tld) = match domain.split_once('.') {
        Some((name, tld)) => (name.to_string(), tld.to_string()),
        None => (domain.clone(), String::new()),
    };

    let mut score = BASE_SCORE;
    score += length_adjustment(name.chars().count());
    score += tld_adjustment(&tld);

    if name.contains('-') {
        score -= HYPHEN_PENALTY;
    }
    if name.chars().any(|c| c.is_ascii_digit()) {
        score -= DIGIT_PENALTY;
    }
    if has_repeated_letter(&name) {
        score -= REPEATED_LETTER_PENALTY;
    }
    score += letter_balance_adjustment(&name);

    DomainCandidate {
        name,
        tld,
        score: clamp_score(score, 0.0, 10.0),
    }
}

/// Name variants for `keyword` across `tlds`, scored and sorted best first.
pub fn generate_domain_candidates(keyword: &str, tlds: &[&str], limit: usize) -> Vec<DomainCandidate> {
    let words: Vec<String> = keyword
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    let joined = words.concat();
    let mut names = vec![joined.clone()];
    if words.len() > 1 {
        names.push(words.join("-"));
    }
    names.extend(NAME_PREFIXES.iter().map(|p| format!("{p}{joined}")));
    names.extend(NAME_SUFFIXES.iter().map(|s| format!("{joined}{s}")));

    let mut out: Vec<DomainCandidate> = Vec::with_capacity(names.len() * tlds.len());
    for name in &names {
        for tld in tlds {
            let tld = tld.trim().trim_start_matches('.');
            if tld.is_empty() {
                continue;
            }
            let candidate = score_domain(&format!("{name}.{tld}"));
            if !out.iter().any(|c| c.name == candidate.name && c.tld == candidate.tld) {
                out.push(candidate);
            }
        }
    }

    // Stable: equal scores keep generation order.
    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(limit);
    out
}

fn length_adjustment(len: usize) -> f64 {
    match len {
        0..=6 => 2.0,
        7..=10 => 1.0,
        11..=15 => 0.0,
        16..=20 => -1.0,
        _ => -2.0,
    }
}

fn tld_adjustment(tld: &str) -> f64 {
    match tld {
        "com" => 2.0,
        "org" | "net" => 1.0,
        "io" | "co" => 0.5,
        _ => 0.0,
    }
}

fn has_repeated_letter(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();
    chars
        .windows(2)
        .any(|w| w[0] == w[1] && w[0].is_ascii_alphabetic())
}

fn letter_balance_adjustment(name: &str) -> f64 {
    let mut vowels = 0usize;
    let mut consonants = 0usize;
    for c in name.chars().filter(|c| c.is_ascii_alphabetic()) {
        if matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') {
            vowels += 1;
        } else {
            consonants += 1;
        }
    }

    if consonants == 0 && vowels == 0 {
        return 0.0;
    }
    if vowels == 0 {
        return -0.5;
    }

    let ratio = consonants as f64 / vowels as f64;
    if (1.0..=2.5).contains(&ratio) {
        1.0
    } else if ratio > 2.5 {
        -0.5
    } else {
        0.0
    }
}
