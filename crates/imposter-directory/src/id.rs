//! Shareable game codes.

use imposter_protocol::GameId;
use rand::Rng;

/// Number of letter groups in a game code.
const GROUPS: usize = 3;

/// Letters per group.
const GROUP_LEN: usize = 3;

/// Draws a random code of the form `abc-def-ghi`: three groups of three
/// lowercase ASCII letters, about 5.4 × 10¹² possibilities.
///
/// Uniqueness is the caller's job; see [`Directory::create`](crate::Directory::create).
pub fn generate_game_id<R: Rng + ?Sized>(rng: &mut R) -> GameId {
    let mut code = String::with_capacity(GROUPS * (GROUP_LEN + 1));
    for group in 0..GROUPS {
        if group > 0 {
            code.push('-');
        }
        for _ in 0..GROUP_LEN {
            code.push(char::from(rng.random_range(b'a'..=b'z')));
        }
    }
    GameId::new(code)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generate_game_id_has_three_letter_groups() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let id = generate_game_id(&mut rng);
            let groups: Vec<&str> = id.as_str().split('-').collect();
            assert_eq!(groups.len(), 3, "bad id {id}");
            for g in groups {
                assert_eq!(g.len(), 3, "bad id {id}");
                assert!(g.chars().all(|c| c.is_ascii_lowercase()), "bad id {id}");
            }
        }
    }

    #[test]
    fn test_generate_game_id_same_seed_same_code() {
        let a = generate_game_id(&mut StdRng::seed_from_u64(5));
        let b = generate_game_id(&mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
