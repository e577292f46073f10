use glam::{IVec2, Vec2};
use smallvec::SmallVec;

const NO_ENTRY: u32 = u32::MAX;

const STENCIL: [IVec2; 9] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Uniform grid of square cells whose coordinates are hashed into a fixed number of buckets.
///
/// Distinct cells may share a bucket, so anything returned by [`SpatialHashGrid::query`] is only
/// a candidate and must still be filtered by distance.
#[derive(Debug, Clone, Default)]
pub struct SpatialHashGrid {
    cell_size: f32,
    /// `(particle index, bucket)` pairs, sorted by bucket.
    entries: Vec<(u32, u32)>,
    /// First entry of each bucket, or `NO_ENTRY`.
    start: Vec<u32>,
}

impl SpatialHashGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets for a `width` x `height` domain: one per cell of size `h`.
    pub fn bucket_count(width: f32, height: f32, h: f32) -> usize {
        let rows = (height / h).ceil() as usize;
        let cols = (width / h).ceil() as usize;

        rows.saturating_mul(cols).max(1)
    }

    /// Whether `bucket_count` buckets can be addressed. Hashes are stored as `u32`, with
    /// `u32::MAX` reserved for empty buckets.
    #[inline]
    pub fn supports_bucket_count(bucket_count: usize) -> bool {
        (1..u32::MAX as usize).contains(&bucket_count)
    }

    #[inline]
    pub fn cell_coord(&self, p: Vec2) -> IVec2 {
        (p / self.cell_size).floor().as_ivec2()
    }

    #[inline]
    pub fn cell_hash(&self, cell: IVec2) -> u32 {
        let a = (cell.x as u32).wrapping_mul(15_823);
        let b = (cell.y as u32).wrapping_mul(9_737_333);

        (a.wrapping_add(b) as usize % self.start.len()) as u32
    }

    /// Rebuilds the grid from scratch. Buffers are reused across calls.
    pub fn rebuild(&mut self, points: &[Vec2], cell_size: f32, bucket_count: usize) {
        self.cell_size = cell_size;

        self.start.clear();
        self.start.resize(bucket_count.max(1), NO_ENTRY);

        self.entries.clear();
        for (i, &p) in points.iter().enumerate() {
            let hash = self.cell_hash(self.cell_coord(p));
            self.entries.push((i as u32, hash));
        }

        // Stable, so entries within a bucket stay in index order.
        self.entries.sort_by_key(|&(_, hash)| hash);

        for (sorted, &(_, hash)) in self.entries.iter().enumerate().rev() {
            self.start[hash as usize] = sorted as u32;
        }
    }

    fn bucket(&self, hash: u32) -> impl Iterator<Item = usize> + '_ {
        let first = self.start[hash as usize];
        let entries = if first == NO_ENTRY {
            &self.entries[..0]
        } else {
            &self.entries[first as usize..]
        };

        entries
            .iter()
            .take_while(move |&&(_, h)| h == hash)
            .map(|&(i, _)| i as usize)
    }

    /// Candidate neighbors of `point` from the 3x3 block of cells around it.
    ///
    /// Each bucket is visited once even when several stencil cells hash into it, so no index
    /// is yielded twice.
    pub fn query(&self, point: Vec2) -> impl Iterator<Item = usize> + '_ {
        let mut hashes: SmallVec<[u32; 9]> = SmallVec::new();

        if !self.entries.is_empty() {
            let cell = self.cell_coord(point);
            for offset in STENCIL {
                let hash = self.cell_hash(cell.wrapping_add(offset));
                if !hashes.contains(&hash) {
                    hashes.push(hash);
                }
            }
        }

        hashes.into_iter().flat_map(move |hash| self.bucket(hash))
    }
}
