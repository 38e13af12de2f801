//! Random role assignment.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::Player;

/// Deals roles: shuffles the roster uniformly, then marks the first
/// `imposter_count` players of the shuffled order as imposters and
/// everyone else as innocent.
///
/// Join order and map iteration order have no influence on who is
/// picked. If `imposter_count` exceeds the roster size every player
/// becomes an imposter.
///
/// Returns the number of imposters actually assigned.
pub fn assign_roles<'a, R>(
    players: impl IntoIterator<Item = &'a mut Player>,
    imposter_count: usize,
    rng: &mut R,
) -> usize
where
    R: Rng + ?Sized,
{
    let mut roster: Vec<&'a mut Player> = players.into_iter().collect();
    roster.shuffle(rng);

    for (i, player) in roster.iter_mut().enumerate() {
        player.is_imposter = i < imposter_count;
    }

    imposter_count.min(roster.len())
}

#[cfg(test)]
mod tests {
    use imposter_protocol::ConnectionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn roster(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(format!("p{i}"), ConnectionId::new(i as u64)))
            .collect()
    }

    fn imposters(players: &[Player]) -> usize {
        players.iter().filter(|p| p.is_imposter).count()
    }

    #[test]
    fn test_assign_roles_exact_count_for_every_k() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 0..=6 {
            for k in 0..=n {
                let mut players = roster(n);
                let assigned = assign_roles(players.iter_mut(), k, &mut rng);
                assert_eq!(assigned, k);
                assert_eq!(imposters(&players), k, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn test_assign_roles_count_above_roster_makes_everyone_imposter() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = roster(3);
        let assigned = assign_roles(players.iter_mut(), 5, &mut rng);
        assert_eq!(assigned, 3);
        assert_eq!(imposters(&players), 3);
    }

    #[test]
    fn test_assign_roles_overwrites_previous_roles() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut players = roster(4);
        for p in &mut players {
            p.is_imposter = true;
        }
        assign_roles(players.iter_mut(), 1, &mut rng);
        assert_eq!(imposters(&players), 1);
    }

    #[test]
    fn test_assign_roles_empty_roster_assigns_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut players = roster(0);
        assert_eq!(assign_roles(players.iter_mut(), 1, &mut rng), 0);
    }

    #[test]
    fn test_assign_roles_has_no_positional_bias() {
        // Each seat should be picked with probability k/n. Chi-square over
        // the per-seat counts, 3 degrees of freedom; 16.27 is the p = 0.001
        // critical value.
        const N: usize = 4;
        const TRIALS: usize = 8_000;
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut hits = [0usize; N];

        for _ in 0..TRIALS {
            let mut players = roster(N);
            assign_roles(players.iter_mut(), 1, &mut rng);
            for (seat, p) in players.iter().enumerate() {
                if p.is_imposter {
                    hits[seat] += 1;
                }
            }
        }

        let expected = TRIALS as f64 / N as f64;
        let chi_square: f64 = hits
            .iter()
            .map(|&h| {
                let d = h as f64 - expected;
                d * d / expected
            })
            .sum();

        assert_eq!(hits.iter().sum::<usize>(), TRIALS);
        assert!(chi_square < 16.27, "seat counts {hits:?}, chi2 {chi_square}");
    }
}
