//! Domain keyword extraction.
//!
//! Keywords are reported for analytics and conversation context only; they
//! never enter the feature vector.

/// Nutrition terms recognized by [`extract_entities`].
pub const NUTRITION_KEYWORDS: &[&str] = &[
    "protein",
    "carb",
    "carbohydrate",
    "fat",
    "calorie",
    "vitamin",
    "mineral",
    "fiber",
    "sugar",
    "sodium",
    "cholesterol",
    "bmi",
    "weight",
    "muscle",
    "diet",
    "meal",
    "snack",
    "supplement",
    "whey",
    "creatine",
    "keto",
    "vegan",
    "vegetarian",
    "gluten",
    "lactose",
    "allergy",
    "breakfast",
    "lunch",
    "dinner",
    "hydration",
    "water",
    "iron",
    "calcium",
    "omega",
];

/// Return every keyword contained in the lowercased text, in list order.
///
/// Matching is plain substring containment, so "proteins" and "calories"
/// match "protein" and "calorie".
pub fn extract_entities(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    NUTRITION_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}
