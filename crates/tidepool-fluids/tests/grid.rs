use std::collections::HashSet;

use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tidepool_fluids::grid::SpatialHashGrid;

fn random_points(rng: &mut StdRng, n: usize, half_size: Vec2) -> Vec<Vec2> {
    (0..n)
        .map(|_| {
            Vec2::new(
                rng.gen_range(-half_size.x..half_size.x),
                rng.gen_range(-half_size.y..half_size.y),
            )
        })
        .collect()
}

#[test]
fn stencil_candidates_cover_every_true_neighbor() {
    let mut rng = StdRng::seed_from_u64(42);
    let h = 0.35;
    let half_size = Vec2::new(8.55, 4.65);

    let points = random_points(&mut rng, 2000, half_size);
    let mut grid = SpatialHashGrid::new();
    grid.rebuild(&points, h, SpatialHashGrid::bucket_count(2.0 * half_size.x, 2.0 * half_size.y, h));

    // Queries also land outside the tank, where cell coordinates keep going.
    let queries = random_points(&mut rng, 300, half_size * 1.2);

    for q in queries.iter().chain(points.iter().take(100)) {
        let candidates: HashSet<usize> = grid.query(*q).collect();

        for (i, p) in points.iter().enumerate() {
            if p.distance(*q) <= h {
                assert!(candidates.contains(&i), "neighbor {i} of {q} missing");
            }
        }
    }
}

#[test]
fn candidates_are_unique_even_with_few_buckets() {
    let mut rng = StdRng::seed_from_u64(7);
    let points = random_points(&mut rng, 500, Vec2::splat(2.0));

    for buckets in [1, 2, 3, 5, 8] {
        let mut grid = SpatialHashGrid::new();
        grid.rebuild(&points, 0.5, buckets);

        for q in points.iter().take(50) {
            let candidates: Vec<usize> = grid.query(*q).collect();
            let unique: HashSet<usize> = candidates.iter().copied().collect();

            assert_eq!(candidates.len(), unique.len());
        }
    }
}

#[test]
fn single_bucket_returns_everything() {
    let mut rng = StdRng::seed_from_u64(3);
    let points = random_points(&mut rng, 64, Vec2::splat(10.0));

    let mut grid = SpatialHashGrid::new();
    grid.rebuild(&points, 1.0, 1);

    assert_eq!(grid.query(Vec2::ZERO).count(), points.len());
}
