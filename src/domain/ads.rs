use std::collections::HashMap;

use rand::seq::SliceRandom;

use crate::models::Ad;

pub const MAX_RANDOM_ADS: usize = 2;

pub trait AdSelector: Send + Sync {
    fn select(&self, context_keys: &[String]) -> Vec<Ad>;
}

/// One ad per known category. Context keys without any matching category get
/// random ads instead.
pub struct CategoryAdSelector {
    by_category: HashMap<String, Ad>,
}

impl Default for CategoryAdSelector {
    fn default() -> Self {
        let ads = [
            ("hair", "/product/2ZYFJ3GM2N", "Hairdryer for sale. 50% off."),
            ("clothing", "/product/66VCHSJNUP", "Tank top for sale. 20% off."),
            (
                "accessories",
                "/product/1YMWWN1N4O",
                "Watch for sale. Buy one, get second kit for free",
            ),
            (
                "footwear",
                "/product/L9ECAV7KIM",
                "Loafers for sale. Buy one, get second one for free",
            ),
            ("decor", "/product/0PUK6V6EV0", "Candle holder for sale. 30% off."),
            ("kitchen", "/product/9SIQT8TOJO", "Bamboo glass jar for sale. 10% off."),
        ];

        Self {
            by_category: ads
                .into_iter()
                .map(|(category, url, text)| (category.to_string(), Ad::new(url, text)))
                .collect(),
        }
    }
}

impl CategoryAdSelector {
    /// Random ads, drawn with replacement.
    fn random_ads(&self) -> Vec<Ad> {
        let all: Vec<&Ad> = self.by_category.values().collect();
        let mut rng = rand::thread_rng();
        (0..MAX_RANDOM_ADS)
            .filter_map(|_| all.choose(&mut rng).map(|ad| (*ad).clone()))
            .collect()
    }
}

impl AdSelector for CategoryAdSelector {
    fn select(&self, context_keys: &[String]) -> Vec<Ad> {
        let matched: Vec<Ad> = context_keys
            .iter()
            .filter_map(|key| self.by_category.get(key).cloned())
            .collect();

        if matched.is_empty() {
            self.random_ads()
        } else {
            matched
        }
    }
}
