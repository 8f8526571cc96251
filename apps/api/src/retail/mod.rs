//! Retailer links — turns recommendation names into store search URLs.
//!
//! Stores are assigned round-robin by the recommendation's position so a
//! result list spreads across all of them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Retailer {
    AmazonTr,
    Trendyol,
    Hepsiburada,
}

const RETAILERS: [Retailer; 3] = [Retailer::AmazonTr, Retailer::Trendyol, Retailer::Hepsiburada];

impl Retailer {
    pub fn display_name(&self) -> &'static str {
        match self {
            Retailer::AmazonTr => "Amazon",
            Retailer::Trendyol => "Trendyol",
            Retailer::Hepsiburada => "Hepsiburada",
        }
    }

    fn search_base(&self) -> &'static str {
        match self {
            Retailer::AmazonTr => "https://www.amazon.com.tr/s?k=",
            Retailer::Trendyol => "https://www.trendyol.com/sr?q=",
            Retailer::Hepsiburada => "https://www.hepsiburada.com/ara?q=",
        }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.search_base(), urlencoding::encode(query.trim()))
    }
}

/// Retailer for the recommendation at `index`.
pub fn retailer_for(index: usize) -> Retailer {
    RETAILERS[index % RETAILERS.len()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetailLink {
    pub name: String,
    pub retailer: Retailer,
    pub retailer_name: &'static str,
    pub url: String,
}

/// Blank names are skipped but keep their slot in the rotation.
pub fn links_for(recommendations: &[String]) -> Vec<RetailLink> {
    recommendations
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(index, name)| {
            let retailer = retailer_for(index);
            RetailLink {
                name: name.trim().to_string(),
                retailer,
                retailer_name: retailer.display_name(),
                url: retailer.search_url(name),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_over_position() {
        assert_eq!(retailer_for(0), Retailer::AmazonTr);
        assert_eq!(retailer_for(1), Retailer::Trendyol);
        assert_eq!(retailer_for(2), Retailer::Hepsiburada);
        assert_eq!(retailer_for(3), Retailer::AmazonTr);
    }

    #[test]
    fn test_search_url_percent_encodes_query() {
        let url = Retailer::AmazonTr.search_url("Kablosuz Kulaklık");
        assert_eq!(url, "https://www.amazon.com.tr/s?k=Kablosuz%20Kulakl%C4%B1k");
    }

    #[test]
    fn test_links_keep_rotation_slot_for_blank_names() {
        let recommendations = vec![
            "Book".to_string(),
            "  ".to_string(),
            "Mug & Coaster".to_string(),
        ];
        let links = links_for(&recommendations);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].retailer, Retailer::AmazonTr);
        assert_eq!(links[1].retailer, Retailer::Hepsiburada);
        assert_eq!(links[1].url, "https://www.hepsiburada.com/ara?q=Mug%20%26%20Coaster");
    }
}
