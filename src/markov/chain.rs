use super::store::StoredMessage;
use std::collections::HashMap;

/// First-order successor table.
///
/// Each key maps to the distinct tokens seen right after it, in order of
/// first occurrence. Repeated transitions are stored once, so a walk picks
/// uniformly among successors rather than by frequency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    links: HashMap<String, Vec<String>>,
    keys: Vec<String>,
}

impl Chain {
    /// Pairs the token at `i` with the token at `i + state_size`. A
    /// `state_size` of zero is treated as one.
    pub fn build<S: AsRef<str>>(tokens: &[S], state_size: usize) -> Self {
        let state_size = state_size.max(1);
        let mut chain = Chain::default();

        for (current, next) in tokens.iter().zip(tokens.iter().skip(state_size)) {
            chain.link(current.as_ref(), next.as_ref());
        }

        chain
    }

    fn entry(&mut self, token: &str) -> &mut Vec<String> {
        let keys = &mut self.keys;
        self.links.entry(token.to_string()).or_insert_with(|| {
            keys.push(token.to_string());
            Vec::new()
        })
    }

    fn link(&mut self, current: &str, next: &str) {
        let successors = self.entry(current);
        if !successors.iter().any(|s| s == next) {
            successors.push(next.to_string());
        }
    }

    /// Keys in order of first occurrence.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn successors(&self, token: &str) -> Option<&[String]> {
        self.links.get(token).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K, V, I> FromIterator<(K, I)> for Chain
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = V>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut chain = Chain::default();
        for (key, successors) in iter {
            let key: String = key.into();
            chain.entry(&key);
            for successor in successors {
                let successor: String = successor.into();
                chain.link(&key, &successor);
            }
        }
        chain
    }
}

/// Removes ASCII punctuation.
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Token sequence for one generation: the seed with punctuation stripped,
/// followed by every stored message as-is.
///
/// Only the seed is stripped; stored rows keep their punctuation.
pub fn gather_tokens(seed: &str, corpus: &[StoredMessage]) -> Vec<String> {
    let seed = strip_punctuation(seed).to_lowercase();
    let mut tokens: Vec<String> = seed.split_whitespace().map(str::to_string).collect();

    for message in corpus {
        tokens.extend(message.text.split_whitespace().map(str::to_string));
    }

    tokens
}
