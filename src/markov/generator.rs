use super::chain::Chain;
use super::MarkovError;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Random walk over `chain` starting from a uniformly chosen key.
///
/// Fails with [`MarkovError::EmptyChain`] when the chain has no keys.
pub fn generate<R: Rng + ?Sized>(
    chain: &Chain,
    n_words: usize,
    rng: &mut R,
) -> Result<String, MarkovError> {
    let start = chain.keys().choose(rng).ok_or(MarkovError::EmptyChain)?;
    Ok(walk_from(chain, start, n_words, rng))
}

/// Walks from `start` for exactly `n_words - 1` steps.
///
/// A step whose current token has no successors adds nothing, so dead ends
/// shorten the output instead of ending the loop.
pub fn walk_from<R: Rng + ?Sized>(chain: &Chain, start: &str, n_words: usize, rng: &mut R) -> String {
    let mut words: Vec<&str> = vec![start];

    for _ in 1..n_words.max(1) {
        let current = words[words.len() - 1];
        let Some(next) = chain.successors(current).and_then(|s| s.choose(rng)) else {
            continue;
        };
        words.push(next);
    }

    words.join(" ")
}
