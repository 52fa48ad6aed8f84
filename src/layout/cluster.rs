//! Deterministic one-dimensional k-means with silhouette scoring.
//!
//! Used by column detection: word x-origins are clustered with k chosen to
//! maximize the silhouette score over k in [1, 3]. Seeding is quantile-based
//! and iteration order is fixed, so identical input always produces the same
//! labels (no RNG involved).

const MAX_ITERATIONS: usize = 50;

/// Positions closer than this are treated as the same column origin.
pub(crate) const POSITION_TOLERANCE: f32 = 1.0;

/// Counts positions that differ from each other by more than the tolerance.
pub(crate) fn distinguishable_positions(values: &[f32], tolerance: f32) -> usize {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mut count = 1;
    let mut anchor = sorted[0];
    for &v in &sorted[1..] {
        if v - anchor > tolerance {
            count += 1;
            anchor = v;
        }
    }
    count
}

/// Lloyd's algorithm over scalar values with quantile-seeded centroids.
///
/// Returns one cluster label per input value. Ties in distance resolve to
/// the lower cluster index.
pub(crate) fn kmeans(values: &[f32], k: usize) -> Vec<usize> {
    let n = values.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    if k == 1 {
        return vec![0; n];
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mut centroids: Vec<f32> = (0..k)
        .map(|i| {
            let idx = ((i as f32 + 0.5) / k as f32 * n as f32) as usize;
            sorted[idx.min(n - 1)]
        })
        .collect();

    let mut labels = vec![0usize; n];
    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, &v) in values.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for (c, &centroid) in centroids.iter().enumerate() {
                let dist = (v - centroid).abs();
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            if labels[i] != best {
                labels[i] = best;
                changed = true;
            }
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<f32> = values
                .iter()
                .zip(&labels)
                .filter(|(_, &l)| l == c)
                .map(|(&v, _)| v)
                .collect();
            if !members.is_empty() {
                *centroid = members.iter().sum::<f32>() / members.len() as f32;
            }
        }

        if !changed {
            break;
        }
    }

    labels
}

/// Mean silhouette coefficient for a labeled clustering.
///
/// Singleton clusters contribute zero, matching the usual convention.
pub(crate) fn silhouette_score(values: &[f32], labels: &[usize], k: usize) -> f32 {
    let n = values.len();
    if n < 2 || k < 2 {
        return 0.0;
    }

    let mut total = 0.0f32;
    for i in 0..n {
        let own = labels[i];
        let mut intra_sum = 0.0f32;
        let mut intra_count = 0usize;
        let mut inter: Vec<(f32, usize)> = vec![(0.0, 0); k];

        for j in 0..n {
            if i == j {
                continue;
            }
            let dist = (values[i] - values[j]).abs();
            if labels[j] == own {
                intra_sum += dist;
                intra_count += 1;
            } else {
                inter[labels[j]].0 += dist;
                inter[labels[j]].1 += 1;
            }
        }

        if intra_count == 0 {
            continue; // singleton, s(i) = 0
        }
        let a = intra_sum / intra_count as f32;
        let b = inter
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| sum / *count as f32)
            .fold(f32::INFINITY, f32::min);
        if b.is_finite() {
            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }

    total / n as f32
}

/// Picks the cluster count in [1, max_k] that maximizes the silhouette
/// score, returning `(k, labels)`.
///
/// Falls back to a single cluster when fewer than two positions are
/// distinguishable. Ties prefer the smaller k, which together with the
/// deterministic seeding makes the chosen count stable across runs.
pub(crate) fn best_clustering(values: &[f32], max_k: usize) -> (usize, Vec<usize>) {
    let n = values.len();
    let distinct = distinguishable_positions(values, POSITION_TOLERANCE);
    if distinct < 2 || max_k < 2 {
        return (1, vec![0; n]);
    }

    let mut best_k = 1usize;
    let mut best_labels = vec![0usize; n];
    let mut best_score = -1.0f32;

    for k in 2..=max_k.min(distinct) {
        let labels = kmeans(values, k);
        let score = silhouette_score(values, &labels, k);
        if score > best_score {
            best_score = score;
            best_k = k;
            best_labels = labels;
        }
    }

    (best_k, best_labels)
}
