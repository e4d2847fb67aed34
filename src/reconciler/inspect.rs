use crate::domain::TradeItem;

/// Attribute extraction from item metadata (wear, stickers, uniqueness).
/// The scoring algorithms live outside this crate; settlement only consumes
/// their results.
pub trait ItemInspector: Send + Sync {
    fn wear_value(&self, item: &TradeItem) -> Option<f64>;
    fn stickers(&self, item: &TradeItem) -> Vec<String>;
    fn unique_points(&self, item: &TradeItem) -> Option<i64>;
}

/// Inspector over the metadata the platform already ships with each item:
/// the exterior tag maps to a representative wear value, sticker description
/// blocks become sticker names.
pub struct TagInspector;

impl ItemInspector for TagInspector {
    fn wear_value(&self, item: &TradeItem) -> Option<f64> {
        item.tags
            .iter()
            .rev()
            .find(|tag| tag.category.eq_ignore_ascii_case("exterior"))
            .and_then(|tag| match tag.name.as_str() {
                "Factory New" => Some(0.035),
                "Minimal Wear" => Some(0.11),
                "Field-Tested" => Some(0.26),
                "Well-Worn" => Some(0.42),
                "Battle-Scarred" => Some(0.65),
                _ => None,
            })
    }

    fn stickers(&self, item: &TradeItem) -> Vec<String> {
        item.descriptions
            .iter()
            .filter(|block| block.kind.eq_ignore_ascii_case("sticker"))
            .map(|block| block.value.clone())
            .collect()
    }

    fn unique_points(&self, _item: &TradeItem) -> Option<i64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemDescription, ItemTag};
    use crate::testkit::item;

    #[test]
    fn exterior_tag_maps_to_a_wear_bucket() {
        let mut subject = item("a1", "Rifle");
        subject.tags = vec![
            ItemTag {
                category: "Type".into(),
                name: "Rifle".into(),
            },
            ItemTag {
                category: "Exterior".into(),
                name: "Field-Tested".into(),
            },
        ];
        assert_eq!(TagInspector.wear_value(&subject), Some(0.26));
    }

    #[test]
    fn items_without_exterior_data_have_no_wear() {
        let subject = item("a1", "Case");
        assert_eq!(TagInspector.wear_value(&subject), None);
    }

    #[test]
    fn sticker_blocks_are_collected() {
        let mut subject = item("a1", "Rifle");
        subject.descriptions = vec![
            ItemDescription {
                kind: "html".into(),
                value: "A rifle.".into(),
            },
            ItemDescription {
                kind: "sticker".into(),
                value: "Team Holo".into(),
            },
        ];
        assert_eq!(TagInspector.stickers(&subject), vec!["Team Holo".to_string()]);
    }
}
