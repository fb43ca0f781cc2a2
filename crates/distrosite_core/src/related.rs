use std::collections::HashSet;

use crate::enrich::EnrichedRecord;

pub const DEFAULT_RELATED_LIMIT: usize = 3;

const FAMILY_WEIGHT: f64 = 2.0;
const BACKFILL_SCORE: f64 = 0.1;
/// Backfill stops once this many candidates beyond `limit` are collected.
const BACKFILL_SLACK: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRecord<'a> {
    pub record: &'a EnrichedRecord,
    pub score: f64,
}

/// Up to `limit` records most similar to `subject`, best first.
pub fn related_to<'a>(
    subject: &EnrichedRecord,
    all: &'a [EnrichedRecord],
    limit: usize,
) -> Vec<&'a EnrichedRecord> {
    score_related(subject, all, limit)
        .into_iter()
        .map(|scored| scored.record)
        .collect()
}

pub fn score_related<'a>(
    subject: &EnrichedRecord,
    all: &'a [EnrichedRecord],
    limit: usize,
) -> Vec<ScoredRecord<'a>> {
    let subject_id = subject.id();
    let subject_family = subject.record.family.to_lowercase();
    let subject_badges = lowercase_set(&subject.record.badges);

    let mut scored = Vec::new();
    for other in all {
        if other.id() == subject_id {
            continue;
        }
        let mut score = 0.0;
        if !subject_family.is_empty() && other.record.family.to_lowercase() == subject_family {
            score += FAMILY_WEIGHT;
        }
        score += lowercase_set(&other.record.badges)
            .intersection(&subject_badges)
            .count() as f64;
        if score > 0.0 {
            scored.push(ScoredRecord {
                record: other,
                score,
            });
        }
    }

    if scored.len() < limit {
        let mut taken: HashSet<&str> = scored.iter().map(|entry| entry.record.id()).collect();
        taken.insert(subject_id);

        let mut pool: Vec<&EnrichedRecord> = all.iter().collect();
        pool.sort_by_key(|record| record.rank());
        for other in pool {
            if !taken.insert(other.id()) {
                continue;
            }
            scored.push(ScoredRecord {
                record: other,
                score: BACKFILL_SCORE,
            });
            if scored.len() >= limit.saturating_add(BACKFILL_SLACK) {
                break;
            }
        }
    }

    scored.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.record.rank().cmp(&right.record.rank()))
    });
    scored.truncate(limit);
    scored
}

fn lowercase_set(labels: &[String]) -> HashSet<String> {
    labels.iter().map(|label| label.to_lowercase()).collect()
}
