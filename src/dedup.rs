//! Batch classification of redundant feed entries.
//!
//! Operates on the full pool of articles across all fetched subjects,
//! never on one feed in isolation: cross-post resolution needs the
//! whole batch before any per-subject decision is final. Three passes
//! run in fixed order, each over the survivors of the previous one:
//!
//! 1. UPDATED: superseded revisions of the same identifier.
//! 2. CROSS POSTED: entries whose primary requested subject is a
//!    different feed fetched this run are reassigned to that feed, so
//!    each article ends up in exactly one output feed.
//! 3. DUPLICATE: residual repeats of an identifier within one feed.
//!
//! Fetch order is preserved throughout; articles are only ever removed
//! or reassigned, never edited.

use std::collections::{HashMap, HashSet};

use crate::article::Article;
use crate::report::{Pass, RunReport};

/// Runs all three passes over the pooled batch and records removal
/// counts per subject into the report.
///
/// `ordering` is the caller's subject ordering, restricted to subjects
/// that actually produced a feed this run; it decides which feed a
/// cross-posted article belongs to.
pub fn deduplicate(
    pool: Vec<Article>,
    ordering: &[String],
    report: &mut RunReport,
) -> Vec<Article> {
    let survivors = remove_superseded(pool, report);
    let survivors = resolve_cross_posted(survivors, ordering, report);
    remove_residual_duplicates(survivors, report)
}

/// UPDATED pass: within each identifier group, keep only the highest
/// revision. A tie on the maximum revision keeps the first article in
/// fetch order.
fn remove_superseded(pool: Vec<Article>, report: &mut RunReport) -> Vec<Article> {
    // id -> (max revision, index of the first article holding it)
    let mut best: HashMap<String, (u32, usize)> = HashMap::new();
    for (idx, article) in pool.iter().enumerate() {
        match best.get(&article.id) {
            Some(&(revision, _)) if revision >= article.revision => {}
            _ => {
                best.insert(article.id.clone(), (article.revision, idx));
            }
        }
    }

    let mut removed: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(pool.len());
    for (idx, article) in pool.into_iter().enumerate() {
        let (revision, first) = best[&article.id];
        if article.revision == revision && idx == first {
            kept.push(article);
        } else {
            *removed.entry(article.subject).or_default() += 1;
        }
    }

    record_pass(report, Pass::Updated, &removed);
    kept
}

/// CROSS POSTED pass: an article whose primary subject (earliest in the
/// caller's ordering among its own listed subjects) differs from the
/// feed it currently sits in is removed from that feed and reassigned
/// to the primary one, so it appears in exactly one output feed.
/// Articles listing no fetched subject stay where they are.
fn resolve_cross_posted(
    pool: Vec<Article>,
    ordering: &[String],
    report: &mut RunReport,
) -> Vec<Article> {
    let mut removed: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(pool.len());
    for mut article in pool {
        if let Some(primary) = article.primary_subject(ordering) {
            if primary != article.subject {
                tracing::debug!(
                    id = %article.id,
                    from = %article.subject,
                    to = %primary,
                    "Reassigning cross-posted article to its primary feed"
                );
                *removed.entry(article.subject.clone()).or_default() += 1;
                report.add_incoming(primary, 1);
                article.subject = primary.to_string();
            }
        }
        kept.push(article);
    }

    record_pass(report, Pass::CrossPosted, &removed);
    kept
}

/// DUPLICATE pass: within each subject's survivors, collapse repeats of
/// an identifier, keeping the first occurrence in fetch order.
fn remove_residual_duplicates(pool: Vec<Article>, report: &mut RunReport) -> Vec<Article> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut removed: HashMap<String, usize> = HashMap::new();
    let kept = pool
        .into_iter()
        .filter(|article| {
            let key = (article.subject.clone(), article.id.clone());
            if seen.insert(key) {
                true
            } else {
                *removed.entry(article.subject.clone()).or_default() += 1;
                false
            }
        })
        .collect();

    record_pass(report, Pass::Duplicate, &removed);
    kept
}

/// Logs one removal line per registered subject (zeros included, as the
/// run log is the observable record of each pass) and accumulates the
/// counts into the report.
fn record_pass(report: &mut RunReport, pass: Pass, removed: &HashMap<String, usize>) {
    for subject in report.subjects() {
        let count = removed.get(&subject).copied().unwrap_or(0);
        tracing::info!(
            subject = %subject,
            removed = count,
            "Removing {} articles",
            pass.label()
        );
        report.add_removed(&subject, pass, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn article(subject: &str, id: &str, revision: u32, listed: &[&str]) -> Article {
        Article {
            subject: subject.to_string(),
            fetched_under: subject.to_string(),
            id: id.to_string(),
            revision,
            title: format!("{id} v{revision}"),
            subjects_listed: listed.iter().map(|s| s.to_string()).collect(),
            item_index: 0,
        }
    }

    fn ordering(subjects: &[&str]) -> Vec<String> {
        subjects.iter().map(|s| s.to_string()).collect()
    }

    fn report_for(pool: &[Article], subjects: &[&str]) -> RunReport {
        let mut report = RunReport::new();
        for subject in subjects {
            let pre = pool.iter().filter(|a| a.subject == *subject).count();
            report.add_subject(subject, pre);
        }
        report
    }

    fn ids(pool: &[Article]) -> Vec<&str> {
        pool.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn updated_pass_keeps_highest_revision_only() {
        let pool = vec![
            article("cs.CV", "2401.00001", 1, &["cs.CV"]),
            article("cs.CV", "2401.00002", 0, &["cs.CV"]),
            article("cs.CV", "2401.00001", 3, &["cs.CV"]),
            article("cs.CV", "2401.00001", 2, &["cs.CV"]),
        ];
        let subjects = ordering(&["cs.CV"]);
        let mut report = report_for(&pool, &["cs.CV"]);

        let survivors = deduplicate(pool, &subjects, &mut report);

        assert_eq!(ids(&survivors), vec!["2401.00002", "2401.00001"]);
        assert_eq!(survivors[1].revision, 3);
        assert_eq!(report.subject_stats("cs.CV").unwrap().updated, 2);
    }

    #[test]
    fn updated_pass_tie_break_keeps_first_in_fetch_order() {
        let mut first = article("cs.CV", "2401.00001", 2, &["cs.CV"]);
        first.title = "first".to_string();
        let mut second = article("cs.CL", "2401.00001", 2, &["cs.CV"]);
        second.title = "second".to_string();

        let subjects = ordering(&["cs.CV", "cs.CL"]);
        let mut report = report_for(&[first.clone(), second.clone()], &["cs.CV", "cs.CL"]);
        let survivors = deduplicate(vec![first, second], &subjects, &mut report);

        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].title, "first");
        assert_eq!(report.subject_stats("cs.CL").unwrap().updated, 1);
    }

    #[test]
    fn cross_posted_article_survives_in_exactly_one_feed() {
        // Same work fetched under both feeds; listed under both subjects.
        let pool = vec![
            article("cs.CV", "2401.00010", 0, &["cs.CV", "cs.CL"]),
            article("cs.CL", "2401.00010", 0, &["cs.CV", "cs.CL"]),
            article("cs.CL", "2401.00011", 0, &["cs.CL"]),
        ];
        let subjects = ordering(&["cs.CV", "cs.CL"]);
        let mut report = report_for(&pool, &["cs.CV", "cs.CL"]);

        let survivors = deduplicate(pool, &subjects, &mut report);

        // cs.CV is fetched first and earliest in the caller ordering:
        // its copy wins the revision tie-break and stays put, while the
        // cs.CL copy of the same posting is discarded.
        let cv: Vec<_> = survivors.iter().filter(|a| a.subject == "cs.CV").collect();
        let cl: Vec<_> = survivors.iter().filter(|a| a.subject == "cs.CL").collect();
        assert_eq!(cv.len(), 1);
        assert_eq!(cl.len(), 1);
        assert_eq!(cl[0].id, "2401.00011");
        assert_eq!(report.subject_stats("cs.CL").unwrap().updated, 1);
        assert_eq!(report.subject_stats("cs.CV").unwrap().cross_posted, 0);
        assert_eq!(report.subject_stats("cs.CL").unwrap().post(), 1);
    }

    #[test]
    fn cross_posted_article_moves_to_its_primary_feed() {
        // Fetched under cs.CV but its metadata lists only cs.CL, which
        // was also requested: the article belongs in the cs.CL output.
        let pool = vec![
            article("cs.CV", "2401.00040", 0, &["cs.CL"]),
            article("cs.CL", "2401.00041", 0, &["cs.CL"]),
        ];
        let subjects = ordering(&["cs.CV", "cs.CL"]);
        let mut report = report_for(&pool, &["cs.CV", "cs.CL"]);

        let survivors = deduplicate(pool, &subjects, &mut report);

        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].subject, "cs.CL");
        assert_eq!(survivors[0].fetched_under, "cs.CV");

        let cv = report.subject_stats("cs.CV").unwrap();
        let cl = report.subject_stats("cs.CL").unwrap();
        assert_eq!(cv.cross_posted, 1);
        assert_eq!(cv.post(), 0);
        assert_eq!(cl.incoming, 1);
        assert_eq!(cl.post(), 2);
    }

    #[test]
    fn cross_posted_pass_respects_caller_ordering_not_listing_order() {
        // Listed [cs.CV, cs.CL] but the caller asked for cs.CL first.
        let pool = vec![
            article("cs.CV", "2401.00010", 0, &["cs.CV", "cs.CL"]),
            article("cs.CL", "2401.00010", 0, &["cs.CV", "cs.CL"]),
        ];
        let subjects = ordering(&["cs.CL", "cs.CV"]);
        let mut report = report_for(&pool, &["cs.CL", "cs.CV"]);

        let survivors = deduplicate(pool, &subjects, &mut report);

        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].subject, "cs.CL");
    }

    #[test]
    fn article_listing_no_requested_subject_is_kept() {
        let pool = vec![article("cs.CV", "2401.00020", 0, &["stat.ML"])];
        let subjects = ordering(&["cs.CV"]);
        let mut report = report_for(&pool, &["cs.CV"]);

        let survivors = deduplicate(pool, &subjects, &mut report);
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn duplicate_pass_collapses_repeats_within_a_subject() {
        // Source feed listed the same article twice.
        let pool = vec![
            article("cs.CV", "2401.00030", 0, &["cs.CV"]),
            article("cs.CV", "2401.00030", 0, &["cs.CV"]),
            article("cs.CV", "2401.00031", 0, &["cs.CV"]),
        ];
        let subjects = ordering(&["cs.CV"]);
        let mut report = report_for(&pool, &["cs.CV"]);

        let survivors = deduplicate(pool, &subjects, &mut report);

        assert_eq!(ids(&survivors), vec!["2401.00030", "2401.00031"]);
        // One copy fell to the UPDATED tie-break, so the duplicate pass
        // itself sees nothing left to do here.
        let stats = report.subject_stats("cs.CV").unwrap();
        assert_eq!(stats.reduction(), 1);
        assert_eq!(stats.post(), 2);
    }

    #[test]
    fn identifiers_unique_per_subject_after_all_passes() {
        let pool = vec![
            article("cs.CV", "2401.00001", 0, &["cs.CV"]),
            article("cs.CV", "2401.00001", 1, &["cs.CV"]),
            article("cs.CV", "2401.00002", 0, &["cs.CV", "cs.CL"]),
            article("cs.CL", "2401.00002", 0, &["cs.CV", "cs.CL"]),
            article("cs.CL", "2401.00003", 0, &["cs.CL"]),
            article("cs.CL", "2401.00003", 0, &["cs.CL"]),
        ];
        let subjects = ordering(&["cs.CV", "cs.CL"]);
        let mut report = report_for(&pool, &["cs.CV", "cs.CL"]);

        let survivors = deduplicate(pool, &subjects, &mut report);

        for subject in ["cs.CV", "cs.CL"] {
            let mut seen = std::collections::HashSet::new();
            for a in survivors.iter().filter(|a| a.subject == subject) {
                assert!(seen.insert(&a.id), "{subject} repeats {}", a.id);
            }
        }
    }

    #[test]
    fn clean_pool_is_untouched() {
        let pool = vec![
            article("cs.CV", "2401.00001", 0, &["cs.CV"]),
            article("cs.CV", "2401.00002", 1, &["cs.CV"]),
            article("cs.CL", "2401.00003", 0, &["cs.CL"]),
        ];
        let subjects = ordering(&["cs.CV", "cs.CL"]);
        let mut report = report_for(&pool, &["cs.CV", "cs.CL"]);

        let survivors = deduplicate(pool.clone(), &subjects, &mut report);

        assert_eq!(survivors, pool);
        assert_eq!(report.total_pre(), report.total_post());
    }

    fn arb_article() -> impl Strategy<Value = Article> {
        let subjects = prop::sample::select(vec!["cs.CV", "cs.CL"]);
        let listed = prop::sample::subsequence(vec!["cs.CV", "cs.CL", "cs.LG"], 0..=3);
        (subjects, 0usize..8, 0u32..4, listed).prop_map(|(subject, id_n, revision, listed)| {
            Article {
                subject: subject.to_string(),
                fetched_under: subject.to_string(),
                id: format!("2401.{:05}", id_n),
                revision,
                title: String::new(),
                subjects_listed: listed.into_iter().map(|s| s.to_string()).collect(),
                item_index: 0,
            }
        })
    }

    proptest! {
        // Re-running the passes on an already-deduplicated pool must
        // change nothing and report zero removals.
        #[test]
        fn deduplication_is_idempotent(pool in prop::collection::vec(arb_article(), 0..40)) {
            let subjects = ordering(&["cs.CV", "cs.CL"]);
            let mut first_report = report_for(&pool, &["cs.CV", "cs.CL"]);
            let once = deduplicate(pool, &subjects, &mut first_report);

            let mut second_report = report_for(&once, &["cs.CV", "cs.CL"]);
            let twice = deduplicate(once.clone(), &subjects, &mut second_report);

            prop_assert_eq!(&twice, &once);
            for stats in second_report.stats() {
                prop_assert_eq!(stats.reduction(), 0);
            }
        }

        #[test]
        fn survivors_have_unique_ids_per_subject(pool in prop::collection::vec(arb_article(), 0..40)) {
            let subjects = ordering(&["cs.CV", "cs.CL"]);
            let mut report = report_for(&pool, &["cs.CV", "cs.CL"]);
            let survivors = deduplicate(pool, &subjects, &mut report);

            let mut seen = std::collections::HashSet::new();
            for a in &survivors {
                prop_assert!(seen.insert((a.subject.clone(), a.id.clone())));
            }
        }
    }
}
