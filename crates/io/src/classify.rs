//! Botanical name classification.
//!
//! Input looks like `Tilia cordata "Greenspire", Winter-Linde`: scientific
//! name before the first comma, common name after it. The scientific part is
//! split on spaces with `"` quoting, so quoted cultivar names stay whole.

use treesync_core::TreeClassification;

/// Split a free-text description into its botanical parts.
///
/// `None` or blank input yields an all-`None` classification. Never fails.
pub fn classify(raw: Option<&str>) -> TreeClassification {
    let Some(input) = raw.filter(|s| !s.trim().is_empty()) else {
        return TreeClassification::default();
    };

    let mut parts = input.split(',');
    let scientific = parts.next().unwrap_or("").trim().to_string();
    let common = parts
        .next()
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| scientific.clone());

    let tokens = tokenize(&scientific);
    let genus = tokens.first().cloned();

    let hybrid = tokens
        .get(1)
        .is_some_and(|t| t.eq_ignore_ascii_case("x"));
    let (species, rest) = if hybrid {
        let species = match tokens.get(2) {
            Some(epithet) => format!("x {epithet}"),
            None => "x".to_string(),
        };
        (Some(species), tokens.get(3..))
    } else {
        (tokens.get(1).cloned(), tokens.get(2..))
    };
    let variety = rest
        .map(|r| r.join(" "))
        .filter(|v| !v.is_empty());

    TreeClassification {
        fullname: Some(input.to_string()),
        genus,
        species,
        variety,
        scientific: non_empty(scientific),
        common: non_empty(common),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn tokenize(scientific: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .from_reader(scientific.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record
            .iter()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        // Unbalanced quotes: fall back to plain whitespace splitting.
        _ => scientific.split_whitespace().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_all_none() {
        let empty = TreeClassification::default();
        assert_eq!(classify(None), empty);
        assert_eq!(classify(Some("")), empty);
        assert_eq!(classify(Some("   ")), empty);
    }

    #[test]
    fn scientific_and_common() {
        let c = classify(Some("Sorbus aucuparia, Eberesche (Vogelbeere)"));
        assert_eq!(c.fullname.as_deref(), Some("Sorbus aucuparia, Eberesche (Vogelbeere)"));
        assert_eq!(c.genus.as_deref(), Some("Sorbus"));
        assert_eq!(c.species.as_deref(), Some("aucuparia"));
        assert_eq!(c.variety, None);
        assert_eq!(c.scientific.as_deref(), Some("Sorbus aucuparia"));
        assert_eq!(c.common.as_deref(), Some("Eberesche (Vogelbeere)"));
    }

    #[test]
    fn common_defaults_to_scientific() {
        let c = classify(Some("Acer platanoides"));
        assert_eq!(c.common.as_deref(), Some("Acer platanoides"));
        assert_eq!(c.scientific.as_deref(), Some("Acer platanoides"));
    }

    #[test]
    fn hybrid_marker() {
        let c = classify(Some("Tilia x europaea, Holländische Linde"));
        assert_eq!(c.genus.as_deref(), Some("Tilia"));
        assert_eq!(c.species.as_deref(), Some("x europaea"));
        assert_eq!(c.variety, None);

        let c = classify(Some("Tilia x"));
        assert_eq!(c.species.as_deref(), Some("x"));
        assert_eq!(c.variety, None);

        let c = classify(Some("Platanus X hispanica Tremonia"));
        assert_eq!(c.species.as_deref(), Some("x hispanica"));
        assert_eq!(c.variety.as_deref(), Some("Tremonia"));
    }

    #[test]
    fn quoted_variety_stays_whole() {
        let c = classify(Some("Tilia europaea \"Pallida\", Kaiser-Linde"));
        assert_eq!(c.species.as_deref(), Some("europaea"));
        assert_eq!(c.variety.as_deref(), Some("Pallida"));
        assert_eq!(c.common.as_deref(), Some("Kaiser-Linde"));

        let c = classify(Some("Acer platanoides \"Crimson King\""));
        assert_eq!(c.variety.as_deref(), Some("Crimson King"));
    }

    #[test]
    fn genus_only() {
        let c = classify(Some("Prunus"));
        assert_eq!(c.genus.as_deref(), Some("Prunus"));
        assert_eq!(c.species, None);
        assert_eq!(c.variety, None);
    }
}
