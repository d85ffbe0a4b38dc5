//! Fragrance catalog record.

use serde::{Deserialize, Serialize};

use super::id::FragranceId;
use super::price::Price;

/// A fragrance as listed in the catalog or held in a wardrobe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragrance {
    pub id: FragranceId,
    pub brand: String,
    pub name: String,
    /// Notes in the order they are presented (top notes first).
    pub notes: Vec<String>,
    /// Olfactory family, e.g. "Floral" or "Woody Floral".
    pub family: String,
    pub price: Price,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Fragrance {
    /// The first `count` notes, as shown on catalog cards.
    #[must_use]
    pub fn headline_notes(&self, count: usize) -> &[String] {
        self.notes
            .get(..count.min(self.notes.len()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_notes_clamps() {
        let fragrance = Fragrance {
            id: FragranceId::new("mugler-alien"),
            brand: "Mugler".to_owned(),
            name: "Alien".to_owned(),
            notes: vec!["Jasmine".to_owned(), "Cashmeran".to_owned()],
            family: "Woody Floral".to_owned(),
            price: Price::eur(105),
            is_active: true,
            image_url: None,
        };
        assert_eq!(fragrance.headline_notes(1), ["Jasmine".to_owned()]);
        assert_eq!(fragrance.headline_notes(5).len(), 2);
    }
}
