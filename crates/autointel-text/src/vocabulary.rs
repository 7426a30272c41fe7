use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::TextError;
use crate::stopwords::is_stop_word;
use crate::tokenize::normalize_phrase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Brand,
    Model,
    Location,
    /// Capitalized sequence with no vocabulary match.
    Unclassified,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Brand => "brand",
            EntityCategory::Model => "model",
            EntityCategory::Location => "location",
            EntityCategory::Unclassified => "unclassified",
        }
    }

    pub const CURATED: [EntityCategory; 3] = [
        EntityCategory::Brand,
        EntityCategory::Model,
        EntityCategory::Location,
    ];
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BRANDS: &[&str] = &[
    "Acura", "Alfa Romeo", "Aston Martin", "Audi", "Bentley", "BMW", "Buick", "BYD", "Cadillac",
    "Chevrolet", "Chrysler", "Citroen", "Cupra", "Dacia", "Dodge", "Ferrari", "Fiat", "Ford",
    "Genesis", "GMC", "Honda", "Hyundai", "Infiniti", "Jaguar", "Jeep", "Kia", "Lamborghini",
    "Land Rover", "Lexus", "Li Auto", "Lincoln", "Lotus", "Lucid", "Maserati", "Mazda",
    "McLaren", "Mercedes-Benz", "Mercedes", "MG", "Mini", "Mitsubishi", "NIO", "Nissan", "Opel",
    "Peugeot", "Polestar", "Porsche", "Ram", "Renault", "Rivian", "Rolls-Royce", "Skoda",
    "Subaru", "Suzuki", "Tesla", "Toyota", "Vauxhall", "Volkswagen", "VW", "Volvo", "XPeng",
];

const MODELS: &[&str] = &[
    "Model 3", "Model S", "Model X", "Model Y", "Cybertruck", "Mustang Mach-E", "Mustang",
    "F-150", "Bronco", "Puma", "Kuga", "Fiesta", "Civic", "Accord", "CR-V", "Jazz", "Corolla",
    "Camry", "RAV4", "Prius", "Yaris", "Golf", "Polo", "Passat", "Tiguan", "ID.3", "ID.4",
    "3 Series", "5 Series", "X5", "iX", "i4", "A3", "A4", "A6", "Q5", "e-tron", "Taycan", "911",
    "Cayenne", "Macan", "Ioniq 5", "Ioniq 6", "Kona", "Tucson", "EV6", "EV9", "Sportage",
    "Niro", "Leaf", "Qashqai", "Juke", "CX-5", "MX-5", "Outback", "Forester", "Wrangler",
    "Grand Cherokee", "R1T", "R1S", "Polestar 2", "XC40", "XC90", "EX30", "Range Rover",
    "Defender", "Discovery", "Corvette", "Silverado", "Bolt", "Equinox", "Atto 3", "Clio",
    "Zoe", "Octavia", "Enyaq",
];

const LOCATIONS: &[&str] = &[
    "United Kingdom", "UK", "Britain", "England", "Scotland", "Wales", "Ireland", "Europe",
    "Germany", "France", "Italy", "Spain", "Sweden", "Norway", "Netherlands", "Belgium",
    "China", "Japan", "South Korea", "Korea", "India", "United States", "USA", "America",
    "North America", "Canada", "Mexico", "Brazil", "Australia", "London", "Manchester",
    "Birmingham", "Paris", "Berlin", "Munich", "Stuttgart", "Detroit", "California", "Texas",
    "Tokyo", "Shanghai", "Beijing", "Geneva", "Frankfurt", "Goodwood", "Nurburgring",
    "Le Mans", "Los Angeles", "New York",
];

/// On-disk vocabulary override, one list per curated category.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VocabularyFile {
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VocabularyEntry {
    pub display: String,
    pub tokens: Vec<String>,
    pub category: EntityCategory,
}

/// Curated phrase vocabulary indexed by first token, longest phrase first.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
    by_first_token: HashMap<String, Vec<usize>>,
}

impl Vocabulary {
    pub fn builtin() -> Self {
        let file = VocabularyFile {
            brands: BRANDS.iter().map(|s| s.to_string()).collect(),
            models: MODELS.iter().map(|s| s.to_string()).collect(),
            locations: LOCATIONS.iter().map(|s| s.to_string()).collect(),
        };
        // The built-in lists contain no empty or stop-word-led phrases.
        Self::from_file(file).unwrap_or_default()
    }

    pub fn load(path: &Path) -> Result<Self, TextError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TextError::VocabularyIo {
            path: path.to_path_buf(),
            source,
        })?;
        let file: VocabularyFile =
            toml::from_str(&raw).map_err(|source| TextError::VocabularyFormat {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_file(file)
    }

    pub fn from_file(file: VocabularyFile) -> Result<Self, TextError> {
        let mut vocabulary = Vocabulary::default();
        for (category, phrases) in [
            (EntityCategory::Brand, file.brands),
            (EntityCategory::Model, file.models),
            (EntityCategory::Location, file.locations),
        ] {
            for phrase in phrases {
                vocabulary.insert(category, phrase)?;
            }
        }
        vocabulary.sort_index();
        Ok(vocabulary)
    }

    fn insert(&mut self, category: EntityCategory, phrase: String) -> Result<(), TextError> {
        let tokens = normalize_phrase(&phrase);
        let Some(first) = tokens.first().cloned() else {
            return Err(TextError::EmptyEntry {
                category: category.as_str(),
                entry: phrase,
            });
        };
        if is_stop_word(&first) {
            return Err(TextError::StopWordEntry {
                category: category.as_str(),
                entry: phrase,
            });
        }

        let duplicate = self.by_first_token.get(&first).is_some_and(|ids| {
            ids.iter().any(|&id| self.entries[id].tokens == tokens)
        });
        if duplicate {
            return Ok(());
        }

        let id = self.entries.len();
        self.entries.push(VocabularyEntry {
            display: phrase.trim().to_string(),
            tokens,
            category,
        });
        self.by_first_token.entry(first).or_default().push(id);
        Ok(())
    }

    fn sort_index(&mut self) {
        let entries = &self.entries;
        for ids in self.by_first_token.values_mut() {
            // Stable: equal lengths keep insertion (category) order.
            ids.sort_by(|a, b| entries[*b].tokens.len().cmp(&entries[*a].tokens.len()));
        }
    }

    /// Candidate entries starting with `first`, longest first.
    pub fn candidates(&self, first: &str) -> impl Iterator<Item = &VocabularyEntry> {
        self.by_first_token
            .get(first)
            .into_iter()
            .flat_map(|ids| ids.iter().map(|&id| &self.entries[id]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn category_len(&self, category: EntityCategory) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .count()
    }

    /// Curated categories that ended up with no entries.
    pub fn missing_categories(&self) -> Vec<EntityCategory> {
        EntityCategory::CURATED
            .into_iter()
            .filter(|category| self.category_len(*category) == 0)
            .collect()
    }
}
