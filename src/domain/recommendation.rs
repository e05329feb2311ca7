use std::collections::HashSet;

use rand::seq::SliceRandom;

pub const MAX_RECOMMENDATIONS: usize = 5;

/// Picks product IDs to suggest next to the ones a user is looking at.
pub trait Recommender: Send + Sync {
    fn recommend(&self, catalog_ids: &[String], exclude: &[String]) -> Vec<String>;
}

/// Shuffles the catalog minus the excluded IDs and keeps up to five.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRecommender;

impl Recommender for RandomRecommender {
    fn recommend(&self, catalog_ids: &[String], exclude: &[String]) -> Vec<String> {
        let exclude: HashSet<&str> = exclude.iter().map(String::as_str).collect();

        let mut candidates: Vec<String> = catalog_ids
            .iter()
            .filter(|id| !exclude.contains(id.as_str()))
            .cloned()
            .collect();

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(MAX_RECOMMENDATIONS);
        candidates
    }
}
