/// Terms that make a question location-sensitive, in English and Tamil.
/// Matching is a case-insensitive substring test, so no entry may be a
/// fragment of a common farming word ("rain" alone would match "grain").
pub const DEFAULT_LOCATION_KEYWORDS: &[&str] = &[
    "weather",
    "rainfall",
    "raining",
    "rainy",
    "will it rain",
    "temperature",
    "humidity",
    "forecast",
    "climate",
    "near me",
    "nearby",
    "வானிலை",
    "மழை",
    "வெப்பநிலை",
    "ஈரப்பதம்",
    "காலநிலை",
];

#[derive(Debug, Clone)]
pub struct LocationKeywords {
    keywords: Vec<String>,
}

impl Default for LocationKeywords {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION_KEYWORDS.iter().copied())
    }
}

impl LocationKeywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, question: &str) -> bool {
        let question = question.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| question.contains(keyword.as_str()))
    }
}
