//! Static fragrance catalog.

use pulse_core::{Fragrance, FragranceId, Price};
use tracing::debug;

use crate::vision::Detection;

/// Case-insensitive substring test. An empty needle matches everything.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Immutable, ordered list of catalog entries.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Fragrance>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::luxe()
    }
}

impl Catalog {
    /// A catalog over arbitrary entries, kept in the given order.
    #[must_use]
    pub const fn new(entries: Vec<Fragrance>) -> Self {
        Self { entries }
    }

    /// The seeded luxury portfolio.
    #[must_use]
    pub fn luxe() -> Self {
        let entry = |id: &str,
                     brand: &str,
                     name: &str,
                     notes: [&str; 3],
                     family: &str,
                     price: i64,
                     image: &str| Fragrance {
            id: FragranceId::new(id),
            brand: brand.to_owned(),
            name: name.to_owned(),
            notes: notes.iter().map(|&n| n.to_owned()).collect(),
            family: family.to_owned(),
            price: Price::eur(price),
            is_active: true,
            image_url: Some(format!(
                "https://images.unsplash.com/{image}?auto=format&fit=crop&q=80&w=800"
            )),
        };

        Self::new(vec![
            entry(
                "ysl-libre",
                "YSL Beauty",
                "Libre",
                ["Lavender", "Orange Blossom", "Musk"],
                "Floral",
                120,
                "photo-1541604193435-225878996233",
            ),
            entry(
                "armani-si",
                "Giorgio Armani",
                "Sì",
                ["Blackcurrant", "Rose", "Vanilla"],
                "Chypre Floral",
                115,
                "photo-1592945403244-b3fbafd7f539",
            ),
            entry(
                "lancome-lvb",
                "Lancôme",
                "La Vie Est Belle",
                ["Iris", "Patchouli", "Gourmand Accord"],
                "Floral Fruit",
                110,
                "photo-1583445095369-9c651e7e5d30",
            ),
            entry(
                "prada-para",
                "Prada",
                "Paradoxe",
                ["Neroli", "Amber", "Musk"],
                "Floral",
                130,
                "photo-1615037512866-4874c34094e1",
            ),
            entry(
                "mugler-alien",
                "Mugler",
                "Alien",
                ["Jasmine", "Cashmeran", "Amber"],
                "Woody Floral",
                105,
                "photo-1594035910387-fea47794261f",
            ),
        ])
    }

    /// Every entry in seed order.
    #[must_use]
    pub fn all(&self) -> &[Fragrance] {
        &self.entries
    }

    /// Entries whose name, brand or id contains `query`, ignoring case.
    ///
    /// Seed order is preserved; a blank query returns everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Fragrance> {
        let query = query.trim();
        let results: Vec<&Fragrance> = self
            .entries
            .iter()
            .filter(|f| {
                contains_ignore_case(&f.name, query)
                    || contains_ignore_case(&f.brand, query)
                    || contains_ignore_case(f.id.as_str(), query)
            })
            .collect();
        debug!(query, results = results.len(), "Catalog search");
        results
    }

    #[must_use]
    pub fn get(&self, id: &FragranceId) -> Option<&Fragrance> {
        self.entries.iter().find(|f| &f.id == id)
    }

    /// Map a bottle detection onto the catalog.
    ///
    /// An entry matches when either name contains the other, ignoring case,
    /// so "Libre Eau de Parfum" resolves to "Libre". Unmatched detections
    /// become an uncatalogued entry with generic notes and no price.
    #[must_use]
    pub fn resolve_detection(&self, detection: &Detection) -> Fragrance {
        let detected = detection.name.trim();
        let matched = (!detected.is_empty())
            .then(|| {
                self.entries.iter().find(|f| {
                    contains_ignore_case(&f.name, detected)
                        || contains_ignore_case(detected, &f.name)
                })
            })
            .flatten();

        matched.cloned().unwrap_or_else(|| Fragrance {
            id: FragranceId::new("custom"),
            brand: detection.brand.clone(),
            name: detection.name.clone(),
            notes: vec!["Vibrant".to_owned(), "Fresh".to_owned()],
            family: "Modern".to_owned(),
            price: Price::zero(),
            is_active: true,
            image_url: None,
        })
    }
}
