use gzb_core::CategoryId;

/// Upstream tag → site category. Tags missing from this table pass through unchanged.
const CATEGORY_ALIASES: &[(&str, CategoryId)] = &[
    ("politics", CategoryId::Debate),
    ("literary", CategoryId::Literary),
    ("wisdom", CategoryId::Wisdom),
    ("trading", CategoryId::Trading),
    ("consulting", CategoryId::Consulting),
    ("tax", CategoryId::Tax),
    ("music", CategoryId::Music),
    ("math", CategoryId::Math),
    ("numerology", CategoryId::Math),
    ("shushu", CategoryId::Math),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMapping {
    Mapped(CategoryId),
    /// The raw tag, kept verbatim. The resulting article sits outside the taxonomy.
    Unmapped(String),
}

impl CategoryMapping {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mapped(id) => id.as_str(),
            Self::Unmapped(tag) => tag,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

pub fn map_category(raw_tag: &str) -> CategoryMapping {
    CATEGORY_ALIASES
        .iter()
        .find(|(tag, _)| *tag == raw_tag)
        .map(|(_, id)| CategoryMapping::Mapped(*id))
        .unwrap_or_else(|| CategoryMapping::Unmapped(raw_tag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_land_in_taxonomy() {
        assert_eq!(map_category("politics"), CategoryMapping::Mapped(CategoryId::Debate));
        assert_eq!(map_category("numerology"), CategoryMapping::Mapped(CategoryId::Math));
        assert_eq!(map_category("shushu").as_str(), "math");
    }

    #[test]
    fn every_taxonomy_slug_maps_to_itself_except_debate() {
        for id in CategoryId::ALL {
            let mapping = map_category(id.as_str());
            if id == CategoryId::Debate {
                assert!(!mapping.is_mapped());
            } else {
                assert_eq!(mapping, CategoryMapping::Mapped(id));
            }
        }
    }

    #[test]
    fn unknown_tag_passes_through_verbatim() {
        let mapping = map_category("zhengming");
        assert_eq!(mapping, CategoryMapping::Unmapped("zhengming".into()));
        assert_eq!(mapping.as_str(), "zhengming");
    }
}
