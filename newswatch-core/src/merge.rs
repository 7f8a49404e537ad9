use std::collections::HashSet;

use crate::feed::Article;

/// Prepends the items of `incoming` whose id is not in `existing`.
///
/// New items keep their given order, existing ones keep theirs, and an id
/// repeated inside `incoming` is taken once. Merging the same batch twice is
/// a no-op the second time.
pub fn merge(existing: Vec<Article>, incoming: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<i64> = existing.iter().map(|article| article.id).collect();
    let mut merged: Vec<Article> = incoming
        .into_iter()
        .filter(|article| seen.insert(article.id))
        .collect();
    if merged.is_empty() {
        return existing;
    }
    merged.extend(existing);
    merged
}
