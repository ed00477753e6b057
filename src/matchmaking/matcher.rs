//! Opponent selection for quick and ranked battles
//!
//! Quick battles get a synthetic practice opponent. Ranked battles pick
//! uniformly among active participants inside the requester's rating band;
//! an empty band is reported to the caller and never silently widened.

use crate::config::MatchmakingConfig;
use crate::error::{BattleError, Result};
use crate::matchmaking::practice::{JitteredPracticeProvider, PracticeOpponentProvider};
use crate::metrics::MetricsCollector;
use crate::rating::RatingCalculator;
use crate::types::{BattleMode, MatchAssignment, MatchStatus, Opponent, Participant};
use crate::utils::{generate_battle_id, rating_difference, ratings_within_tolerance};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

/// Produces opponent assignments from an explicit, optionally seeded generator
pub struct Matchmaker {
    config: MatchmakingConfig,
    rating_calculator: Arc<dyn RatingCalculator>,
    practice_provider: Box<dyn PracticeOpponentProvider>,
    rng: Mutex<StdRng>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Matchmaker {
    /// Create a matchmaker; the generator is seeded from `config.rng_seed`
    /// when present, from OS entropy otherwise
    pub fn new(config: MatchmakingConfig, rating_calculator: Arc<dyn RatingCalculator>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let practice_provider = Box::new(JitteredPracticeProvider::new(
            config.practice_rating_jitter,
        ));

        Self {
            config,
            rating_calculator,
            practice_provider,
            rng: Mutex::new(rng),
            metrics: None,
        }
    }

    /// Replace the generator with one seeded from `seed`
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_practice_provider(mut self, provider: Box<dyn PracticeOpponentProvider>) -> Self {
        self.practice_provider = provider;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    // A panic while holding the generator leaves it in a usable state
    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pair the requester with a practice opponent. Always succeeds.
    pub fn quick_match(&self, requester: &Participant) -> MatchAssignment {
        let started = Instant::now();
        let request = self.config.match_request(requester.id, BattleMode::Quick);

        let (battle_id, opponent) = {
            let mut rng = self.rng();
            let battle_id = generate_battle_id(BattleMode::Quick, &mut *rng);
            let opponent = self
                .practice_provider
                .practice_opponent(requester.rating, &mut *rng);
            (battle_id, opponent)
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_practice_opponent();
            metrics.record_match_request(BattleMode::Quick, true, started.elapsed());
        }

        debug!(
            "Quick match {} for participant {} against practice opponent rated {}",
            battle_id,
            requester.id,
            opponent.rating()
        );

        MatchAssignment {
            battle_id,
            mode: BattleMode::Quick,
            questions: request.question_count,
            time_limit: request.time_limit_seconds,
            opponent,
            rating_change_preview: None,
            status: MatchStatus::Starting,
        }
    }

    /// Pick a ranked opponent from `pool` and preview both outcomes
    pub fn ranked_match(
        &self,
        requester: &Participant,
        pool: &[Participant],
    ) -> Result<MatchAssignment> {
        let started = Instant::now();
        let request = self.config.match_request(requester.id, BattleMode::Ranked);
        let candidates = self.eligible_candidates(requester, pool);

        if let Some(metrics) = &self.metrics {
            metrics.record_candidate_pool(candidates.len());
        }

        let picked = {
            let mut rng = self.rng();
            candidates
                .choose(&mut *rng)
                .map(|chosen| (*chosen, generate_battle_id(BattleMode::Ranked, &mut *rng)))
        };

        let Some((chosen, battle_id)) = picked else {
            if let Some(metrics) = &self.metrics {
                metrics.record_match_request(BattleMode::Ranked, false, started.elapsed());
            }
            info!(
                "No ranked opponent for participant {} rated {} (band ±{})",
                requester.id, requester.rating, self.config.rating_band
            );
            return Err(BattleError::NoOpponentAvailable {
                rating: requester.rating,
                band: self.config.rating_band,
            }
            .into());
        };

        let opponent = Opponent::from_participant(chosen);
        let preview = self
            .rating_calculator
            .preview(requester.rating, opponent.rating());

        if let Some(metrics) = &self.metrics {
            metrics.record_match_request(BattleMode::Ranked, true, started.elapsed());
        }

        info!(
            "Ranked match {}: participant {} ({}) vs participant {} ({}), {} candidates",
            battle_id,
            requester.id,
            requester.rating,
            chosen.id,
            chosen.rating,
            candidates.len()
        );

        Ok(MatchAssignment {
            battle_id,
            mode: BattleMode::Ranked,
            questions: request.question_count,
            time_limit: request.time_limit_seconds,
            opponent,
            rating_change_preview: Some(preview),
            status: MatchStatus::WaitingForOpponent,
        })
    }

    /// Active participants other than the requester whose rating is within
    /// the band, closest first (ties by id); a non-zero `candidate_limit`
    /// keeps only that many of the closest
    pub fn eligible_candidates<'a>(
        &self,
        requester: &Participant,
        pool: &'a [Participant],
    ) -> Vec<&'a Participant> {
        let mut candidates: Vec<&Participant> = pool
            .iter()
            .filter(|p| p.id != requester.id && p.is_active)
            .filter(|p| ratings_within_tolerance(p.rating, requester.rating, self.config.rating_band))
            .collect();

        candidates.sort_by_key(|p| (rating_difference(p.rating, requester.rating), p.id));

        if self.config.candidate_limit > 0 {
            candidates.truncate(self.config.candidate_limit);
        }

        candidates
    }
}

impl std::fmt::Debug for Matchmaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matchmaker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::as_battle_error;
    use crate::rating::calculator::MockRatingCalculator;
    use crate::rating::EloRatingCalculator;
    use crate::types::{OpponentRef, OpponentView, RatingChangePreview};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn seeded(seed: u64) -> Matchmaker {
        let config = MatchmakingConfig {
            rng_seed: Some(seed),
            ..Default::default()
        };
        Matchmaker::new(config, Arc::new(EloRatingCalculator::default()))
    }

    fn pool(ratings: &[(u64, i32)]) -> Vec<Participant> {
        ratings
            .iter()
            .map(|(id, rating)| Participant::new(*id, format!("player{}", id)).with_rating(*rating))
            .collect()
    }

    #[test]
    fn test_quick_match_shape() {
        let matchmaker = seeded(1);
        let requester = Participant::new(1, "alice");

        let assignment = matchmaker.quick_match(&requester);

        assert!(assignment.battle_id.starts_with("battle_"));
        assert_eq!(assignment.mode, BattleMode::Quick);
        assert_eq!(assignment.questions, 5);
        assert_eq!(assignment.time_limit, 15);
        assert_eq!(assignment.status, MatchStatus::Starting);
        assert!(assignment.rating_change_preview.is_none());
        assert!(assignment.opponent.is_practice());
        assert!((1400..=1600).contains(&assignment.opponent.rating()));
    }

    #[test]
    fn test_ranked_match_shape_and_preview() {
        let matchmaker = seeded(1);
        let requester = Participant::new(1, "alice");
        let candidates = pool(&[(2, 1500)]);

        let assignment = matchmaker.ranked_match(&requester, &candidates).unwrap();

        assert!(assignment.battle_id.starts_with("ranked_"));
        assert_eq!(assignment.questions, 10);
        assert_eq!(assignment.time_limit, 20);
        assert_eq!(assignment.status, MatchStatus::WaitingForOpponent);
        assert_eq!(assignment.opponent.participant_id(), Some(2));
        assert_eq!(
            assignment.rating_change_preview,
            Some(RatingChangePreview { win: 16, loss: -16 })
        );

        let view = OpponentView::from(assignment.opponent);
        assert_eq!(view.id, OpponentRef::Participant(2));
    }

    #[test]
    fn test_no_opponent_in_band() {
        let matchmaker = seeded(1);
        let requester = Participant::new(1, "alice");
        let candidates = pool(&[(2, 1299), (3, 1701)]);

        let err = matchmaker.ranked_match(&requester, &candidates).unwrap_err();
        assert!(matches!(
            as_battle_error(&err),
            Some(BattleError::NoOpponentAvailable {
                rating: 1500,
                band: 200
            })
        ));
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let matchmaker = seeded(1);
        let requester = Participant::new(1, "alice");
        let candidates = pool(&[(2, 1300), (3, 1700)]);

        let eligible: Vec<_> = matchmaker
            .eligible_candidates(&requester, &candidates)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(eligible, vec![2, 3]);
    }

    #[test]
    fn test_self_and_inactive_excluded() {
        let matchmaker = seeded(1);
        let requester = Participant::new(1, "alice");
        let candidates = vec![
            requester.clone(),
            Participant::new(2, "idle").inactive(),
        ];

        assert!(matchmaker.eligible_candidates(&requester, &candidates).is_empty());
        assert!(matchmaker.ranked_match(&requester, &candidates).is_err());
    }

    #[test]
    fn test_candidate_cap_prefers_closest() {
        let config = MatchmakingConfig {
            candidate_limit: 5,
            rng_seed: Some(1),
            ..Default::default()
        };
        let matchmaker = Matchmaker::new(config, Arc::new(EloRatingCalculator::default()));
        let requester = Participant::new(1, "alice");
        let candidates = pool(&[
            (2, 1690),
            (3, 1510),
            (4, 1490),
            (5, 1600),
            (6, 1550),
            (7, 1450),
            (8, 1505),
        ]);

        let eligible: Vec<_> = matchmaker
            .eligible_candidates(&requester, &candidates)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(eligible, vec![8, 3, 4, 6, 7]);
    }

    #[test]
    fn test_default_pick_reaches_every_candidate() {
        let matchmaker = seeded(3);
        let requester = Participant::new(1, "alice");
        let ratings: Vec<_> = (2..=11u64).map(|id| (id, 1485 + 15 * id as i32)).collect();
        let candidates = pool(&ratings);
        assert_eq!(matchmaker.eligible_candidates(&requester, &candidates).len(), 10);

        let seen: HashSet<_> = (0..2000)
            .map(|_| {
                matchmaker
                    .ranked_match(&requester, &candidates)
                    .unwrap()
                    .opponent
                    .participant_id()
                    .unwrap()
            })
            .collect();
        assert_eq!(seen.len(), candidates.len());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let requester = Participant::new(1, "alice");
        let candidates = pool(&[(2, 1400), (3, 1450), (4, 1500), (5, 1550)]);

        let run = |seed| {
            let matchmaker = seeded(seed);
            (0..10)
                .map(|_| {
                    let ranked = matchmaker.ranked_match(&requester, &candidates).unwrap();
                    let quick = matchmaker.quick_match(&requester);
                    (ranked.battle_id, ranked.opponent, quick.opponent.rating())
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn test_preview_comes_from_calculator() {
        let mut calculator = MockRatingCalculator::new();
        calculator
            .expect_preview()
            .withf(|rating, opponent| *rating == 1500 && *opponent == 1600)
            .times(1)
            .returning(|_, _| RatingChangePreview { win: 7, loss: -9 });

        let config = MatchmakingConfig {
            rng_seed: Some(5),
            ..Default::default()
        };
        let matchmaker = Matchmaker::new(config, Arc::new(calculator));
        let requester = Participant::new(1, "alice");

        let assignment = matchmaker
            .ranked_match(&requester, &pool(&[(2, 1600)]))
            .unwrap();
        assert_eq!(
            assignment.rating_change_preview,
            Some(RatingChangePreview { win: 7, loss: -9 })
        );
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let matchmaker = seeded(1).with_metrics(metrics.clone());
        let requester = Participant::new(1, "alice");

        matchmaker.quick_match(&requester);
        let _ = matchmaker.ranked_match(&requester, &[]);

        let mm = metrics.matchmaking();
        assert_eq!(mm.practice_opponents_total.get(), 1);
        assert_eq!(
            mm.match_requests_total
                .with_label_values(&["ranked", "no_opponent"])
                .get(),
            1
        );
    }

    proptest! {
        #[test]
        fn prop_ranked_opponent_within_band(
            requester_rating in 800i32..2400,
            ratings in proptest::collection::vec(800i32..2400, 0..40),
            seed: u64,
        ) {
            let matchmaker = seeded(seed);
            let requester = Participant::new(0, "requester").with_rating(requester_rating);
            let candidates: Vec<_> = ratings
                .iter()
                .enumerate()
                .map(|(i, r)| Participant::new(i as u64 + 1, "c").with_rating(*r))
                .collect();

            let any_in_band = ratings.iter().any(|r| (r - requester_rating).abs() <= 200);

            match matchmaker.ranked_match(&requester, &candidates) {
                Ok(assignment) => {
                    prop_assert!(any_in_band);
                    prop_assert!((assignment.opponent.rating() - requester_rating).abs() <= 200);
                    prop_assert_ne!(assignment.opponent.participant_id(), Some(0));
                }
                Err(_) => prop_assert!(!any_in_band),
            }
        }
    }
}
