// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dictionary-free noun lemmatization
//!
//! Reduces plural nouns to their singular base form using an irregular-form
//! table followed by suffix rules. Words that are not recognisably plural are
//! returned unchanged, so verbs and adjectives pass through as-is.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref IRREGULAR_NOUNS: HashMap<&'static str, &'static str> = [
        ("mice", "mouse"),
        ("lice", "louse"),
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("people", "person"),
        ("oxen", "ox"),
        ("data", "datum"),
        ("analyses", "analysis"),
        ("hypotheses", "hypothesis"),
        ("theses", "thesis"),
        ("crises", "crisis"),
        ("syntheses", "synthesis"),
        ("diagnoses", "diagnosis"),
        ("axes", "axis"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("vertices", "vertex"),
        ("appendices", "appendix"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("larvae", "larva"),
        ("nuclei", "nucleus"),
        ("fungi", "fungus"),
        ("stimuli", "stimulus"),
        ("loci", "locus"),
        ("bacteria", "bacterium"),
        ("genera", "genus"),
        ("media", "medium"),
        ("series", "series"),
        ("species", "species"),
        ("leaves", "leaf"),
        ("wolves", "wolf"),
        ("lives", "life"),
        ("knives", "knife"),
        ("wives", "wife"),
        ("halves", "half"),
        ("selves", "self"),
        ("shelves", "shelf"),
    ]
    .into_iter()
    .collect();
}

/// Reduces a token to its dictionary base form
pub trait Lemmatizer {
    fn lemmatize(&self, word: &str) -> String;

    fn lemmatize_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens.iter().map(|t| self.lemmatize(t.as_ref())).collect()
    }
}

/// Rule-based lemmatizer for English nouns
#[derive(Debug, Clone, Copy, Default)]
pub struct NounLemmatizer;

impl NounLemmatizer {
    pub fn new() -> Self {
        Self
    }
}

impl Lemmatizer for NounLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some(base) = IRREGULAR_NOUNS.get(word) {
            return base.to_string();
        }

        // Short words, numbers and identifiers are left alone
        if word.chars().count() <= 3 || word.chars().any(|c| c.is_ascii_digit()) {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            if stem.chars().count() >= 2 {
                return format!("{}y", stem);
            }
        }

        for suffix in ["sses", "xes", "zes", "ches", "shes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }

        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }

        match word.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => word.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = NounLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("cells"), "cell");
        assert_eq!(lemmatizer.lemmatize("studies"), "study");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("classes"), "class");
        assert_eq!(lemmatizer.lemmatize("diseases"), "disease");
    }

    #[test]
    fn test_irregular_plurals() {
        let lemmatizer = NounLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("mice"), "mouse");
        assert_eq!(lemmatizer.lemmatize("nuclei"), "nucleus");
        assert_eq!(lemmatizer.lemmatize("analyses"), "analysis");
        assert_eq!(lemmatizer.lemmatize("species"), "species");
    }

    #[test]
    fn test_non_plurals_unchanged() {
        let lemmatizer = NounLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("glass"), "glass");
        assert_eq!(lemmatizer.lemmatize("virus"), "virus");
        assert_eq!(lemmatizer.lemmatize("analysis"), "analysis");
        assert_eq!(lemmatizer.lemmatize("gene"), "gene");
        assert_eq!(lemmatizer.lemmatize("has"), "has");
        assert_eq!(lemmatizer.lemmatize("daf16s"), "daf16s");
    }

    #[test]
    fn test_lemmatize_tokens() {
        let lemmatizer = NounLemmatizer::new();
        let tokens = vec!["worms", "and", "genes"];
        assert_eq!(lemmatizer.lemmatize_tokens(&tokens), vec!["worm", "and", "gene"]);
    }
}
