use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::model::TreeNode;

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub node: &'a TreeNode,
    pub score: i64,
}

/// Fuzzy-match `needle` against every node path below `root`, best first.
/// Equal scores keep preorder.
pub fn search<'a>(root: &'a TreeNode, needle: &str) -> Vec<SearchHit<'a>> {
    let matcher = SkimMatcherV2::default();
    let mut hits: Vec<SearchHit<'a>> = root
        .walk()
        .skip(1)
        .filter_map(|node| {
            matcher
                .fuzzy_match(&node.path, needle)
                .map(|score| SearchHit { node, score })
        })
        .collect();
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}
