/// A product extracted from a detail page
///
/// `index` is the 1-based position of the source URL in the deduplicated
/// input list; artifacts are ordered by it. An empty price is stored as
/// `None` and marks the product as unpriced, which is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub index: usize,
    pub code: String,
    pub name: String,
    pub price: Option<String>,
    pub spec: String,
    pub image_url: Option<String>,
    pub series: String,
    pub source_url: String,
}

impl ProductRecord {
    /// Returns true if the product carries a price
    pub fn is_priced(&self) -> bool {
        self.price.as_deref().map_or(false, |p| !p.trim().is_empty())
    }
}

/// Records sharing one series key
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroup {
    pub name: String,
    pub records: Vec<ProductRecord>,
}

impl SeriesGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    pub fn priced_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_priced()).count()
    }

    pub fn unpriced_count(&self) -> usize {
        self.records.len() - self.priced_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: Option<&str>) -> ProductRecord {
        ProductRecord {
            index: 1,
            code: "E3Z-D61".to_string(),
            name: "Photoelectric sensor".to_string(),
            price: price.map(str::to_string),
            spec: String::new(),
            image_url: None,
            series: "E3Z".to_string(),
            source_url: "https://shop.example.com/product/e3z-d61".to_string(),
        }
    }

    #[test]
    fn test_is_priced() {
        assert!(record(Some("1.250.000 đ")).is_priced());
        assert!(!record(Some("   ")).is_priced());
        assert!(!record(None).is_priced());
    }

    #[test]
    fn test_group_price_split() {
        let mut group = SeriesGroup::new("E3Z");
        group.records.push(record(Some("100")));
        group.records.push(record(None));
        group.records.push(record(Some("200")));

        assert_eq!(group.priced_count(), 2);
        assert_eq!(group.unpriced_count(), 1);
    }
}
