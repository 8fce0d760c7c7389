//! Random text for document fields: hashes, ids, names and prose.
//!
//! Everything here is a pure function of the RNG it is handed, so a seeded
//! run reproduces the same strings.

use rand::seq::SliceRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "alice", "bence", "carlos", "dora", "emil", "fanni", "gabor", "hanna", "ivan", "julia",
    "karoly", "lena", "marton", "nora", "oliver", "petra", "rita", "samuel", "tamas", "vera",
    "zoltan", "agnes", "bruno", "csilla", "david", "eszter", "ferenc", "greta", "henrik", "ilona",
];

const LAST_NAMES: &[&str] = &[
    "kovacs", "nagy", "szabo", "toth", "horvath", "varga", "kiss", "molnar", "nemeth", "farkas",
    "balogh", "papp", "lakatos", "takacs", "juhasz", "meszaros", "olah", "simon", "racz", "fekete",
    "smith", "garcia", "muller", "rossi", "novak", "silva", "larsen", "dubois", "jansen", "walker",
];

const ADJECTIVES: &[&str] = &[
    "amber", "brisk", "calm", "dusty", "eager", "fuzzy", "gentle", "hollow", "icy", "jolly",
    "keen", "lively", "mellow", "nimble", "odd", "proud", "quiet", "rapid", "shiny", "tidy",
    "upbeat", "vivid", "witty", "young", "zesty", "bold", "crisp", "deep", "frozen", "golden",
];

const NOUNS: &[&str] = &[
    "anchor", "badger", "canyon", "delta", "ember", "falcon", "glacier", "harbor", "island",
    "jungle", "kernel", "lantern", "meadow", "nebula", "orchid", "pebble", "quartz", "river",
    "summit", "tundra", "umbra", "valley", "willow", "yonder", "zephyr", "beacon", "cobalt",
    "dune", "forge", "grove",
];

const BRANCH_PREFIXES: &[&str] = &["feature", "bugfix", "hotfix", "release", "chore", "refactor"];

const WORDS: &[&str] = &[
    "the", "build", "fails", "when", "running", "tests", "against", "latest", "release", "and",
    "crash", "report", "shows", "null", "pointer", "in", "parser", "module", "after", "upgrade",
    "user", "cannot", "login", "with", "expired", "token", "page", "renders", "blank", "on",
    "mobile", "devices", "cache", "is", "not", "invalidated", "config", "value", "ignored",
    "timeout", "while", "fetching", "remote", "branch", "data", "export", "missing", "header",
    "slow", "query", "index", "memory", "leak", "worker", "thread", "deadlock", "logging",
];

/// Hex digest-looking string, 40 characters long.
pub fn hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 20];
    rng.fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Numeric-looking identifier such as an issue or pull request number.
pub fn numeric_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(1..10_000_000u32).to_string()
}

pub fn username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = pick(FIRST_NAMES, rng);
    let last = pick(LAST_NAMES, rng);
    match rng.gen_range(0..3) {
        0 => format!("{}.{}", first, last),
        1 => format!("{}{}", &first[..1], last),
        _ => format!("{}{}{}", first, last, rng.gen_range(1..100)),
    }
}

/// Two-word `adjective-noun` name used for repositories.
pub fn repository_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}-{}", pick(ADJECTIVES, rng), pick(NOUNS, rng))
}

pub fn branch_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}/{}-{}",
        pick(BRANCH_PREFIXES, rng),
        pick(ADJECTIVES, rng),
        pick(NOUNS, rng)
    )
}

/// Prose of exactly `word_count` words, split into capitalised sentences.
pub fn description<R: Rng + ?Sized>(word_count: usize, rng: &mut R) -> String {
    let mut text = String::new();
    let mut sentence_len = 0;
    let mut sentence_target = rng.gen_range(5..=12);

    for i in 0..word_count {
        let word = pick(WORDS, rng);
        if sentence_len == 0 {
            if i > 0 {
                text.push(' ');
            }
            let mut chars = word.chars();
            if let Some(c) = chars.next() {
                text.extend(c.to_uppercase());
                text.push_str(chars.as_str());
            }
        } else {
            text.push(' ');
            text.push_str(word);
        }
        sentence_len += 1;

        if sentence_len == sentence_target || i + 1 == word_count {
            text.push('.');
            sentence_len = 0;
            sentence_target = rng.gen_range(5..=12);
        }
    }
    text
}

fn pick<R: Rng + ?Sized>(words: &[&'static str], rng: &mut R) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}
