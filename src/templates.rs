//! Canned destination descriptions
//!
//! Used whenever text generation is unavailable. Matching is a case-insensitive
//! substring test over an ordered keyword list and the first hit wins.

/// Returned when a prompt names none of the known destinations
pub const GENERIC_TEMPLATE: &str = "This destination offers unique cultural experiences, local cuisine, historic landmarks, and beautiful scenery. Explore local markets, try traditional dishes, visit museums, and immerse yourself in the local culture. Don't forget to capture memories and enjoy the journey!";

/// Keyword groups and their descriptions, in match order
const DESTINATION_TEMPLATES: &[(&[&str], &str)] = &[
    (
        &["paris"],
        "Paris, the City of Light, offers iconic landmarks like the Eiffel Tower, world-class museums including the Louvre, charming neighborhoods like Montmartre, and exquisite French cuisine. Don't miss the Seine River cruises and the beautiful Champs-Élysées.",
    ),
    (
        &["tokyo"],
        "Tokyo, Japan's vibrant capital, combines ultramodern and traditional elements. Visit the historic Senso-ji Temple, explore the bustling Shibuya crossing, experience the futuristic Akihabara district, and enjoy authentic sushi and ramen.",
    ),
    (
        &["new york", "nyc"],
        "New York City, the Big Apple, features iconic attractions like Times Square, Central Park, the Statue of Liberty, and world-famous museums. Experience diverse neighborhoods, Broadway shows, and incredible food from around the world.",
    ),
    (
        &["london"],
        "London, England's historic capital, offers the Tower of London, Buckingham Palace, Big Ben, and world-class museums. Explore diverse neighborhoods, enjoy traditional pubs, and experience the city's rich cultural heritage.",
    ),
    (
        &["rome"],
        "Rome, the Eternal City, showcases ancient wonders like the Colosseum and Roman Forum, the Vatican City with St. Peter's Basilica, the Trevi Fountain, and incredible Italian cuisine. Every corner tells a story of history.",
    ),
    (
        &["barcelona"],
        "Barcelona, Spain's vibrant coastal city, features Gaudi's architectural masterpieces like Sagrada Familia, the Gothic Quarter, beautiful beaches, and delicious tapas. Experience the unique Catalan culture and Mediterranean lifestyle.",
    ),
    (
        &["amsterdam"],
        "Amsterdam, the Netherlands' charming capital, offers beautiful canals, world-class museums like the Van Gogh Museum, historic architecture, and a relaxed atmosphere. Explore by bike and enjoy the city's artistic heritage.",
    ),
    (
        &["prague"],
        "Prague, the Golden City, features stunning Gothic architecture, the historic Charles Bridge, Prague Castle, and charming Old Town Square. Experience rich Czech culture, traditional beer, and medieval atmosphere.",
    ),
];

/// Description for `prompt` from the built-in catalogue
#[must_use]
pub fn template_for(prompt: &str) -> &'static str {
    let prompt = prompt.to_lowercase();
    DESTINATION_TEMPLATES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| prompt.contains(*keyword)))
        .map_or(GENERIC_TEMPLATE, |(_, text)| *text)
}

/// One keyword group of a [`TemplateCatalog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub keywords: Vec<String>,
    pub text: String,
}

impl TemplateEntry {
    pub fn new<K: Into<String>>(keywords: impl IntoIterator<Item = K>, text: impl Into<String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
            text: text.into(),
        }
    }
}

/// Ordered keyword catalogue. The default is the built-in destination list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
    generic: String,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        let entries = DESTINATION_TEMPLATES
            .iter()
            .map(|(keywords, text)| TemplateEntry::new(keywords.iter().copied(), *text))
            .collect();
        Self::new(entries, GENERIC_TEMPLATE)
    }
}

impl TemplateCatalog {
    pub fn new(entries: Vec<TemplateEntry>, generic: impl Into<String>) -> Self {
        Self {
            entries,
            generic: generic.into(),
        }
    }

    /// Text of the first entry with a keyword contained in `prompt`
    #[must_use]
    pub fn template_for(&self, prompt: &str) -> &str {
        let prompt = prompt.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.keywords.iter().any(|keyword| prompt.contains(keyword.as_str())))
            .map_or(self.generic.as_str(), |entry| entry.text.as_str())
    }
}
