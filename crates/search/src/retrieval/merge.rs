//! Global merge of per-paper result lists
//!
//! Each paper contributes its own best hits. The pooled list is ordered by
//! distance only, so a paper with many strong matches can take every slot.

use paperdigest_common::models::RetrievalResult;

/// Pool per-paper lists and keep the `k` closest overall.
///
/// Lists are concatenated in the order given and sorted stably, so equal
/// distances keep paper order first and per-paper rank second.
pub fn merge_ranked<I>(per_paper: I, k: usize) -> Vec<RetrievalResult>
where
    I: IntoIterator<Item = Vec<RetrievalResult>>,
{
    let mut pooled: Vec<RetrievalResult> = per_paper.into_iter().flatten().collect();
    pooled.sort_by(|a, b| a.score.total_cmp(&b.score));
    pooled.truncate(k);
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn hit(paper_id: &str, text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            paper_id: paper_id.to_string(),
            chunk_text: text.to_string(),
            score,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_merge_orders_globally() {
        let merged = merge_ranked(
            vec![
                vec![hit("a", "a1", 0.2), hit("a", "a2", 0.9)],
                vec![hit("b", "b1", 0.1), hit("b", "b2", 0.3)],
            ],
            3,
        );
        let texts: Vec<&str> = merged.iter().map(|r| r.chunk_text.as_str()).collect();
        assert_eq!(texts, vec!["b1", "a1", "b2"]);
    }

    #[test]
    fn test_one_paper_can_take_all_slots() {
        let merged = merge_ranked(
            vec![
                vec![hit("a", "a1", 0.1), hit("a", "a2", 0.2)],
                vec![hit("b", "b1", 0.8)],
            ],
            2,
        );
        assert!(merged.iter().all(|r| r.paper_id == "a"));
    }

    #[test]
    fn test_ties_keep_paper_order() {
        let merged = merge_ranked(
            vec![vec![hit("a", "a1", 0.5)], vec![hit("b", "b1", 0.5)]],
            2,
        );
        assert_eq!(merged[0].paper_id, "a");
        assert_eq!(merged[1].paper_id, "b");
    }

    #[test]
    fn test_empty_pools() {
        assert!(merge_ranked(Vec::<Vec<RetrievalResult>>::new(), 5).is_empty());
        assert!(merge_ranked(vec![vec![hit("a", "a1", 0.1)]], 0).is_empty());
    }
}
