use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, rng};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use quiz_core::model::{CardState, Question, QuestionId};

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub due_selected: usize,
    pub new_selected: usize,
    pub old_selected: usize,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Due,
    New,
    Old,
}

/// Picks the questions for the next session: due first, then never answered,
/// then seen but not yet due.
#[derive(Debug, Clone, Copy)]
pub struct SessionBuilder {
    session_length: usize,
    shuffle: bool,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(session_length: usize) -> Self {
        Self {
            session_length,
            shuffle: true,
        }
    }

    /// Enable or disable shuffling of the selected questions.
    ///
    /// With shuffling off the plan keeps priority order (due, new, old).
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan using the thread-local RNG for presentation order.
    #[must_use]
    pub fn build(
        self,
        all_questions: &[Question],
        card_states: &[CardState],
        now: DateTime<Utc>,
    ) -> SessionPlan {
        self.build_with_rng(all_questions, card_states, now, &mut rng())
    }

    /// Build a plan, shuffling with the supplied RNG.
    ///
    /// Each bucket keeps the relative order of `all_questions`. Questions that
    /// appear more than once in the pool are selected at most once.
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        all_questions: &[Question],
        card_states: &[CardState],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SessionPlan {
        let states: HashMap<QuestionId, &CardState> = card_states
            .iter()
            .map(|c| (c.question_id(), c))
            .collect();

        let mut seen = HashSet::with_capacity(all_questions.len());
        let mut due = Vec::new();
        let mut new = Vec::new();
        let mut old = Vec::new();
        for question in all_questions {
            if !seen.insert(question.id()) {
                continue;
            }
            match bucket_for(states.get(&question.id()).copied(), now) {
                Bucket::Due => due.push(question),
                Bucket::New => new.push(question),
                Bucket::Old => old.push(question),
            }
        }

        let due_selected = due.len().min(self.session_length);
        let new_selected = new.len().min(self.session_length - due_selected);
        let old_selected = old
            .len()
            .min(self.session_length - due_selected - new_selected);

        let mut questions: Vec<Question> = due
            .into_iter()
            .take(due_selected)
            .chain(new.into_iter().take(new_selected))
            .chain(old.into_iter().take(old_selected))
            .cloned()
            .collect();

        if self.shuffle {
            questions.shuffle(rng);
        }

        debug!(
            requested = self.session_length,
            pool = all_questions.len(),
            due_selected,
            new_selected,
            old_selected,
            "built session plan"
        );

        SessionPlan {
            questions,
            due_selected,
            new_selected,
            old_selected,
        }
    }
}

fn bucket_for(state: Option<&CardState>, now: DateTime<Utc>) -> Bucket {
    match state {
        None => Bucket::New,
        Some(card) if card.is_due(now) => Bucket::Due,
        Some(_) => Bucket::Old,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::QuestionBank;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(n: usize) -> Vec<Question> {
        QuestionBank::bundled().unwrap().all()[..n].to_vec()
    }

    fn due_state(q: &Question) -> CardState {
        CardState::from_persisted(q.id(), 1, 2.5, fixed_now() - Duration::days(1)).unwrap()
    }

    fn old_state(q: &Question) -> CardState {
        CardState::from_persisted(q.id(), 3, 2.5, fixed_now() + Duration::days(3)).unwrap()
    }

    fn ids(questions: &[Question]) -> Vec<QuestionId> {
        questions.iter().map(Question::id).collect()
    }

    #[test]
    fn priority_is_due_then_new_then_old() {
        let qs = pool(6);
        // q0, q3 old; q1, q4 due; q2, q5 new.
        let states = vec![
            old_state(&qs[0]),
            due_state(&qs[1]),
            old_state(&qs[3]),
            due_state(&qs[4]),
        ];

        let plan = SessionBuilder::new(6)
            .with_shuffle(false)
            .build(&qs, &states, fixed_now());

        assert_eq!(
            ids(&plan.questions),
            vec![qs[1].id(), qs[4].id(), qs[2].id(), qs[5].id(), qs[0].id(), qs[3].id()]
        );
        assert_eq!((plan.due_selected, plan.new_selected, plan.old_selected), (2, 2, 2));
    }

    #[test]
    fn short_session_takes_only_due() {
        let qs = pool(6);
        let states: Vec<_> = qs[..3].iter().map(due_state).collect();

        let plan = SessionBuilder::new(2).build(&qs, &states, fixed_now());

        assert_eq!(plan.total(), 2);
        let due_ids: HashSet<_> = qs[..3].iter().map(Question::id).collect();
        assert!(plan.questions.iter().all(|q| due_ids.contains(&q.id())));
    }

    #[test]
    fn new_fills_before_old() {
        let qs = pool(5);
        let states = vec![due_state(&qs[0]), old_state(&qs[1]), old_state(&qs[2])];

        let plan = SessionBuilder::new(3).build(&qs, &states, fixed_now());

        let selected: HashSet<_> = ids(&plan.questions).into_iter().collect();
        let expected: HashSet<_> = [qs[0].id(), qs[3].id(), qs[4].id()].into_iter().collect();
        assert_eq!(selected, expected);
        assert_eq!(plan.old_selected, 0);
    }

    #[test]
    fn card_due_exactly_now_is_due() {
        let qs = pool(2);
        let states = vec![CardState::from_persisted(qs[1].id(), 1, 2.5, fixed_now()).unwrap()];

        let plan = SessionBuilder::new(1).build(&qs, &states, fixed_now());

        assert_eq!(ids(&plan.questions), vec![qs[1].id()]);
    }

    #[test]
    fn edge_cases_yield_small_or_empty_plans() {
        let qs = pool(4);
        assert!(SessionBuilder::new(0).build(&qs, &[], fixed_now()).is_empty());
        assert!(SessionBuilder::new(5).build(&[], &[], fixed_now()).is_empty());

        let plan = SessionBuilder::new(10).build(&qs, &[], fixed_now());
        assert_eq!(plan.total(), 4);
        assert_eq!(plan.new_selected, 4);
    }

    #[test]
    fn duplicates_in_pool_are_selected_once() {
        let qs = pool(3);
        let mut doubled = qs.clone();
        doubled.extend(qs.iter().cloned());

        let plan = SessionBuilder::new(10).build(&doubled, &[], fixed_now());

        assert_eq!(plan.total(), 3);
        let unique: HashSet<_> = ids(&plan.questions).into_iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn seeded_shuffle_is_reproducible_and_keeps_selection() {
        let qs = pool(20);
        let states: Vec<_> = qs[..5].iter().map(due_state).collect();
        let builder = SessionBuilder::new(10);

        let a = builder.build_with_rng(&qs, &states, fixed_now(), &mut StdRng::seed_from_u64(7));
        let b = builder.build_with_rng(&qs, &states, fixed_now(), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let unshuffled = builder.with_shuffle(false).build(&qs, &states, fixed_now());
        let mut shuffled_ids = ids(&a.questions);
        let mut plain_ids = ids(&unshuffled.questions);
        shuffled_ids.sort();
        plain_ids.sort();
        assert_eq!(shuffled_ids, plain_ids);
    }

    #[test]
    fn shuffle_changes_presentation_order() {
        let qs = pool(24);
        let builder = SessionBuilder::new(24);
        let plain = builder.with_shuffle(false).build(&qs, &[], fixed_now());
        assert_eq!(ids(&plain.questions), ids(&qs));

        let mut reordered = 0;
        for seed in 1..=5 {
            let plan =
                builder.build_with_rng(&qs, &[], fixed_now(), &mut StdRng::seed_from_u64(seed));
            assert_eq!(plan.new_selected, 24);
            if ids(&plan.questions) != ids(&plain.questions) {
                reordered += 1;
            }
            let mut sorted = ids(&plan.questions);
            sorted.sort();
            let mut expected = ids(&qs);
            expected.sort();
            assert_eq!(sorted, expected);
        }
        assert!(reordered > 0, "no seed changed the order of 24 questions");
    }
}
