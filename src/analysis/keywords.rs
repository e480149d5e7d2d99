use super::embeddings::Embedder;
use super::semantic_search::cosine_similarity;
use super::{AnalysisError, AnalysisResult};
use crate::config::KeywordConfig;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").expect("valid token regex");
}

/// Keyphrase extraction by embedding similarity: every n-gram of the document is a
/// candidate and the candidates closest to the whole document win.
#[derive(Clone)]
pub struct KeywordExtractor {
    embedder: Arc<dyn Embedder>,
    config: KeywordConfig,
}

impl KeywordExtractor {
    pub fn new(embedder: Arc<dyn Embedder>, config: KeywordConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Return up to `top_n` `(phrase, score)` pairs, best first, scores rounded to 4 places.
    pub async fn extract_keywords(&self, text: &str) -> AnalysisResult<Vec<(String, f32)>> {
        let tokens = tokenize(text);
        let candidates =
            candidate_phrases(&tokens, self.config.ngram_range, self.config.candidate_limit);
        if candidates.is_empty() || self.config.top_n == 0 {
            return Ok(Vec::new());
        }

        let document = self.embedder.embed(text).await?;
        let embeddings = self.embedder.embed_batch(&candidates).await?;
        if embeddings.len() != candidates.len() {
            return Err(AnalysisError::Embedding(format!(
                "Expected {} candidate embeddings, got {}",
                candidates.len(),
                embeddings.len()
            )));
        }

        let similarities: Vec<f32> = embeddings
            .iter()
            .map(|candidate| cosine_similarity(candidate, &document))
            .collect();

        let selected = if self.config.use_mmr {
            select_mmr(&similarities, &embeddings, self.config.top_n, self.config.diversity)
        } else {
            select_top(&similarities, self.config.top_n)
        };

        Ok(selected
            .into_iter()
            .map(|idx| (candidates[idx].clone(), round4(similarities[idx])))
            .collect())
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Distinct n-grams within `ngram_range`, at most `limit` of them.
///
/// The limit is shared out evenly between the phrase lengths so that short words
/// cannot crowd out longer phrases; slots a length leaves unused go to the others.
/// Within a length, frequent phrases come first and equal counts keep
/// first-occurrence order. The result is grouped by length, shortest first.
pub fn candidate_phrases(
    tokens: &[String],
    ngram_range: (usize, usize),
    limit: usize,
) -> Vec<String> {
    let (min_n, max_n) = (ngram_range.0.max(1), ngram_range.1.min(tokens.len()));
    if min_n > max_n || limit == 0 {
        return Vec::new();
    }

    let by_length: Vec<Vec<String>> = (min_n..=max_n)
        .map(|n| ranked_ngrams(tokens, n))
        .collect();

    let quota = limit.div_ceil(by_length.len());
    let mut taken: Vec<usize> = by_length.iter().map(|phrases| phrases.len().min(quota)).collect();
    let mut spare = limit.saturating_sub(taken.iter().sum());
    for (phrases, count) in by_length.iter().zip(taken.iter_mut()) {
        let extra = (phrases.len() - *count).min(spare);
        *count += extra;
        spare -= extra;
    }

    let mut candidates: Vec<String> = by_length
        .into_iter()
        .zip(taken)
        .flat_map(|(phrases, count)| phrases.into_iter().take(count))
        .collect();
    candidates.truncate(limit);
    candidates
}

fn ranked_ngrams(tokens: &[String], n: usize) -> Vec<String> {
    let mut seen: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, window) in tokens.windows(n).enumerate() {
        seen.entry(window.join(" ")).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = seen.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().map(|(phrase, _)| phrase).collect()
}

/// Indices of the `top_n` highest similarities, descending.
pub fn select_top(similarities: &[f32], top_n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..similarities.len()).collect();
    indices.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]));
    indices.truncate(top_n);
    indices
}

/// Maximal Marginal Relevance: trade document similarity against similarity to the
/// phrases already picked, weighted by `diversity`.
pub fn select_mmr(
    similarities: &[f32],
    embeddings: &[Vec<f32>],
    top_n: usize,
    diversity: f32,
) -> Vec<usize> {
    let Some(first) = argmax(similarities.iter().copied().enumerate()) else {
        return Vec::new();
    };

    let mut selected = vec![first];
    let mut remaining: Vec<usize> = (0..similarities.len()).filter(|&i| i != first).collect();
    let rounds = top_n.saturating_sub(1).min(remaining.len());

    for _ in 0..rounds {
        let scores = remaining.iter().enumerate().map(|(pos, &candidate)| {
            let redundancy = selected
                .iter()
                .map(|&chosen| cosine_similarity(&embeddings[candidate], &embeddings[chosen]))
                .fold(f32::NEG_INFINITY, f32::max);
            let score = (1.0 - diversity) * similarities[candidate] - diversity * redundancy;
            (pos, score)
        });
        let Some(pos) = argmax(scores) else { break };
        selected.push(remaining.remove(pos));
    }

    selected
}

fn argmax(values: impl Iterator<Item = (usize, f32)>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, value) in values {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
