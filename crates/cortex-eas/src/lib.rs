//! Embedding Attribution Score kernel (§4.B).
//!
//! `aᵢ = cosim(mᵢ, r)·cosim(mᵢ, q) / Σⱼ(...)`, negatives clamped to zero.
//! Purely functional: no I/O, no allocation beyond the output vectors,
//! deterministic bit-for-bit for identical inputs.

/// Result of a single `compute_eas` call.
#[derive(Debug, Clone, PartialEq)]
pub struct EasResult {
    pub scores: Vec<f64>,
    pub raw_scores: Vec<f64>,
    pub compute_ms: f64,
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity between each row of `matrix` and `vector`. Rows and the
/// vector are re-normalized defensively even if already unit-length. A
/// zero-norm row or vector contributes a similarity of 0.0 for that row.
fn cosine_similarities(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    let vector_norm = l2_norm(vector);
    if vector_norm == 0.0 {
        return vec![0.0; matrix.len()];
    }
    let normalized_vector: Vec<f64> = vector.iter().map(|x| x / vector_norm).collect();

    matrix
        .iter()
        .map(|row| {
            let row_norm = l2_norm(row);
            let norm = if row_norm == 0.0 { 1.0 } else { row_norm };
            row.iter()
                .zip(normalized_vector.iter())
                .map(|(m, v)| (m / norm) * v)
                .sum::<f64>()
        })
        .collect()
}

/// `compute_eas(M, q, r) -> {scores, raw_scores, compute_ms}` (§4.B).
///
/// `M` is a `k x d` matrix of memory embeddings, `q` the query embedding,
/// `r` the response embedding. `k = 0` returns empty arrays.
pub fn compute_eas(memory_embeddings: &[Vec<f64>], query_embedding: &[f64], response_embedding: &[f64]) -> EasResult {
    let start = std::time::Instant::now();

    let k = memory_embeddings.len();
    if k == 0 {
        return EasResult {
            scores: Vec::new(),
            raw_scores: Vec::new(),
            compute_ms: 0.0,
        };
    }

    let sim_mr = cosine_similarities(memory_embeddings, response_embedding);
    let sim_mq = cosine_similarities(memory_embeddings, query_embedding);

    let raw: Vec<f64> = sim_mr
        .iter()
        .zip(sim_mq.iter())
        .map(|(mr, mq)| mr.max(0.0) * mq.max(0.0))
        .collect();

    let total: f64 = raw.iter().sum();
    let scores = if total > 0.0 {
        raw.iter().map(|x| x / total).collect()
    } else {
        // Uniform fallback (§4.B step 5; §9 Open Question #3 — not relied
        // upon beyond the scenario it was defined for).
        vec![1.0 / k as f64; k]
    };

    EasResult {
        scores,
        raw_scores: raw,
        compute_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn empty_input_returns_empty_arrays() {
        let result = compute_eas(&[], &[1.0, 0.0], &[1.0, 0.0]);
        assert!(result.scores.is_empty());
        assert!(result.raw_scores.is_empty());
        assert_eq!(result.compute_ms, 0.0);
    }

    #[test]
    fn s1_single_memory_identity() {
        let m = vec![vec![1.0, 0.0, 0.0]];
        let q = vec![1.0, 0.0, 0.0];
        let r = vec![1.0, 0.0, 0.0];
        let result = compute_eas(&m, &q, &r);
        assert_eq!(result.scores.len(), 1);
        assert!(approx_eq(result.scores[0], 1.0, 1e-9));
    }

    #[test]
    fn s2_hand_computed_two_memories() {
        let norm = |v: &[f64]| -> Vec<f64> {
            let n = l2_norm(v);
            v.iter().map(|x| x / n).collect()
        };
        let q = norm(&[1.0, 0.5, 0.0]);
        let r = norm(&[0.8, 0.6, 0.0]);
        let m1 = vec![1.0, 0.0, 0.0];
        let m2 = vec![0.0, 1.0, 0.0];
        let result = compute_eas(&[m1, m2], &q, &r);

        let raw1 = 0.8 * (2.0 / 5f64.sqrt());
        let raw2 = 0.6 * (1.0 / 5f64.sqrt());
        let total = raw1 + raw2;

        assert!(approx_eq(result.raw_scores[0], raw1, 1e-9));
        assert!(approx_eq(result.raw_scores[1], raw2, 1e-9));
        assert!(approx_eq(result.scores[0], raw1 / total, 1e-9));
        assert!(approx_eq(result.scores[1], raw2 / total, 1e-9));
    }

    #[test]
    fn zero_norm_query_yields_zero_raw_and_uniform_scores() {
        let m = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = compute_eas(&m, &[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(result.raw_scores, vec![0.0, 0.0]);
        assert_eq!(result.scores, vec![0.5, 0.5]);
    }

    #[test]
    fn scores_are_nonnegative_and_sum_to_one() {
        let m = vec![vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 1.0], vec![0.5, 0.5, 0.5]];
        let q = vec![0.1, 0.2, 0.3];
        let r = vec![0.3, 0.2, 0.1];
        let result = compute_eas(&m, &q, &r);
        let sum: f64 = result.scores.iter().sum();
        assert!(approx_eq(sum, 1.0, 1e-9));
        for (&s, &raw) in result.scores.iter().zip(result.raw_scores.iter()) {
            assert!(s >= 0.0);
            assert!(raw >= 0.0);
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let m = vec![vec![0.4, 0.3, 0.1], vec![0.1, 0.9, 0.2]];
        let q = vec![0.2, 0.2, 0.2];
        let r = vec![0.5, 0.1, 0.4];
        let a = compute_eas(&m, &q, &r);
        let b = compute_eas(&m, &q, &r);
        assert_eq!(a.scores, b.scores);
        assert_eq!(a.raw_scores, b.raw_scores);
    }

    #[test]
    fn zero_row_contributes_zero_similarity() {
        let m = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]];
        let q = vec![1.0, 0.0, 0.0];
        let r = vec![1.0, 0.0, 0.0];
        let result = compute_eas(&m, &q, &r);
        assert_eq!(result.raw_scores[0], 0.0);
        assert!(approx_eq(result.scores[1], 1.0, 1e-9));
    }
}
