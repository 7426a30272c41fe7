//! Valence lexicon and modifier word lists for the rule-based scorer.
//!
//! Valences sit on the usual -4..=4 human-rated scale; general-purpose entries
//! follow the VADER ratings, automotive entries were rated on the same scale.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

const VALENCES: &[(&str, f64)] = &[
    // general positive
    ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("superb", 3.1), ("outstanding", 3.0),
    ("amazing", 2.8), ("awesome", 3.1), ("fantastic", 2.6), ("wonderful", 2.7),
    ("brilliant", 2.8), ("perfect", 2.7), ("best", 3.2), ("better", 1.9), ("nice", 1.8),
    ("love", 3.2), ("loved", 2.9), ("loves", 2.7), ("like", 1.5), ("liked", 1.8),
    ("enjoy", 2.2), ("enjoyable", 1.9), ("enjoyed", 2.3), ("happy", 2.7), ("pleased", 1.9),
    ("pleasant", 2.3), ("impressive", 2.3), ("impressed", 2.1), ("incredible", 1.7),
    ("exceptional", 2.9), ("remarkable", 2.1), ("strong", 2.3), ("stronger", 1.6),
    ("win", 2.8), ("wins", 2.7), ("winner", 2.8), ("success", 2.7), ("successful", 2.8),
    ("improve", 1.9), ("improved", 2.1), ("improvement", 2.0), ("recommend", 1.5),
    ("recommended", 1.6), ("favourite", 2.0), ("favorite", 2.0), ("beautiful", 2.9),
    ("stylish", 1.7), ("elegant", 2.1), ("fun", 2.3), ("exciting", 2.2), ("thrilling", 2.1),
    ("smooth", 1.4), ("solid", 1.6), ("safe", 1.9), ("safer", 1.8), ("secure", 1.4),
    ("reliable", 2.0), ("comfortable", 1.7), ("comfy", 1.7), ("spacious", 1.4),
    ("practical", 1.2), ("efficient", 1.8), ("affordable", 1.6), ("value", 1.0),
    ("valuable", 2.1), ("bargain", 1.8), ("quality", 1.4), ("refined", 1.6),
    ("polished", 1.5), ("quiet", 0.9), ("responsive", 1.5), ("agile", 1.5), ("nimble", 1.4),
    ("punchy", 1.2), ("quick", 1.0), ("clever", 1.7), ("intuitive", 1.5), ("premium", 1.2),
    ("luxurious", 1.9), ("generous", 2.3), ("capable", 1.6), ("sturdy", 1.3),
    ("innovative", 1.9), ("advanced", 1.2), ("upgrade", 1.2), ("upgraded", 1.3),
    ("praise", 2.6), ("praised", 2.2), ("popular", 1.8), ("boost", 1.7), ("boosted", 1.5),
    ("gain", 2.0), ("gains", 1.8), ("growth", 1.6), ("record", 0.5), ("top", 0.8),
    ("easy", 1.9), ("easier", 1.8), ("worth", 0.9), ("worthy", 1.9), ("ideal", 2.2),
    ("sublime", 2.9), ("terrific", 2.1), ("delight", 2.9), ("delightful", 2.8),
    ("satisfying", 2.0), ("satisfied", 1.8), ("keen", 1.5), ("sharp", 0.7), ("precise", 1.3),
    ("benefit", 2.0), ("benefits", 1.6), ("advantage", 1.0), ("positive", 2.3),
    ("optimistic", 2.3), ("confident", 2.2), ("interesting", 1.7), ("clean", 1.7),
    ("cleaner", 1.5), ("well", 1.1), ("fine", 0.8), ("ok", 0.9), ("okay", 0.9),
    ("yes", 1.7), ("thanks", 1.9),
    // general negative
    ("bad", -2.5), ("worse", -2.1), ("worst", -3.1), ("poor", -2.1), ("poorly", -2.0),
    ("terrible", -2.1), ("awful", -2.0), ("horrible", -2.5), ("dreadful", -2.7),
    ("disappointing", -2.2), ("disappointed", -1.9), ("disappointment", -2.3),
    ("hate", -2.7), ("hated", -3.2), ("dislike", -1.6), ("annoying", -1.7), ("annoyed", -1.6),
    ("frustrating", -1.9), ("frustrated", -2.0), ("problem", -1.7), ("problems", -1.7),
    ("issue", -0.9), ("issues", -0.8), ("fault", -1.7), ("faults", -2.1), ("faulty", -1.8),
    ("fail", -2.5), ("fails", -1.8), ("failed", -2.3), ("failure", -2.3), ("broken", -2.1),
    ("break", -0.9), ("crash", -1.7), ("crashed", -2.1), ("recall", -1.2), ("recalls", -1.2),
    ("defect", -1.4), ("defects", -1.5), ("defective", -1.9), ("risk", -1.1),
    ("risky", -1.4), ("danger", -2.4), ("dangerous", -2.1), ("unsafe", -2.2),
    ("unreliable", -1.9), ("uncomfortable", -1.6), ("cramped", -1.2), ("noisy", -1.2),
    ("harsh", -1.8), ("sluggish", -1.3), ("slow", -0.9), ("heavy", -0.4), ("thirsty", -0.9),
    ("expensive", -0.9), ("overpriced", -1.8), ("pricey", -0.7), ("cheap", -0.6),
    ("cheaper", -0.3), ("flimsy", -1.4), ("clunky", -1.3), ("awkward", -1.3),
    ("confusing", -1.3), ("lacking", -1.2), ("lack", -1.3), ("lacks", -1.2),
    ("weak", -1.9), ("weaker", -1.9), ("mediocre", -1.0), ("bland", -1.0), ("dull", -1.7),
    ("boring", -1.3), ("ugly", -2.3), ("loss", -1.3), ("losses", -1.7), ("lose", -1.7),
    ("lost", -1.3), ("decline", -1.1), ("declined", -0.5), ("drop", -1.1), ("dropped", -1.0),
    ("fall", -1.2), ("fell", -1.2), ("cut", -1.1), ("cuts", -1.2), ("delay", -1.3),
    ("delayed", -1.0), ("concern", -1.0), ("concerns", -1.0), ("worried", -1.2),
    ("worry", -1.9), ("fear", -2.2), ("fears", -1.8), ("crisis", -3.1), ("shortage", -1.5),
    ("struggle", -1.7), ("struggles", -1.6), ("struggling", -1.8), ("warning", -1.4),
    ("damage", -2.2), ("damaged", -1.9), ("fraud", -2.8), ("scandal", -1.9),
    ("lawsuit", -0.9), ("penalty", -2.0), ("complaint", -1.7),
    ("complaints", -1.7), ("negative", -2.7), ("wrong", -2.1), ("mistake", -1.4),
    ("sadly", -1.5), ("unfortunately", -1.4), ("sorry", -0.3), ("no", -1.2), ("nope", -0.5),
    ("stuck", -1.0), ("rough", -0.7), ("hard", -0.4), ("difficult", -1.5),
];

pub static LEXICON: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| VALENCES.iter().copied().collect());

/// Intensity modifiers with their scalar contribution (positive amplifies).
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293), ("amazingly", 0.293), ("completely", 0.293),
    ("considerably", 0.293), ("deeply", 0.293), ("enormously", 0.293), ("entirely", 0.293),
    ("especially", 0.293), ("exceptionally", 0.293), ("extremely", 0.293),
    ("fully", 0.293), ("greatly", 0.293), ("highly", 0.293), ("hugely", 0.293),
    ("incredibly", 0.293), ("particularly", 0.293), ("really", 0.293),
    ("remarkably", 0.293), ("so", 0.293), ("substantially", 0.293), ("thoroughly", 0.293),
    ("totally", 0.293), ("tremendously", 0.293), ("truly", 0.293), ("unbelievably", 0.293),
    ("utterly", 0.293), ("very", 0.293), ("most", 0.293), ("more", 0.293),
    ("almost", -0.293), ("barely", -0.293), ("hardly", -0.293), ("marginally", -0.293),
    ("occasionally", -0.293), ("partly", -0.293), ("scarcely", -0.293),
    ("slightly", -0.293), ("somewhat", -0.293), ("less", -0.293), ("little", -0.293),
];

pub static BOOSTER_WORDS: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| BOOSTERS.iter().copied().collect());

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "nowhere",
    "without", "cannot", "can't", "cant", "don't", "dont", "doesn't", "doesnt", "didn't",
    "didnt", "isn't", "isnt", "wasn't", "wasnt", "aren't", "arent", "weren't", "werent",
    "won't", "wont", "wouldn't", "wouldnt", "shouldn't", "shouldnt", "couldn't", "couldnt",
    "hasn't", "hasnt", "haven't", "havent", "hadn't", "hadnt", "ain't", "aint", "rarely",
    "seldom", "despite",
];

pub static NEGATION_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| NEGATIONS.iter().copied().collect());

pub fn valence(word: &str) -> Option<f64> {
    LEXICON.get(word).copied()
}

pub fn booster(word: &str) -> Option<f64> {
    BOOSTER_WORDS.get(word).copied()
}

pub fn is_negation(word: &str) -> bool {
    NEGATION_WORDS.contains(word) || word.ends_with("n't")
}
