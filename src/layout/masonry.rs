use serde::Serialize;

use crate::models::ConfirmedMedia;

/// Aspect ratio assumed for photos whose dimensions are unknown.
const FALLBACK_ASPECT: f32 = 4.0 / 3.0;

/// Responsive column counts, keyed by minimum viewport width.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoints {
    /// `(min_width, columns)`, widest first.
    steps: Vec<(f32, usize)>,
    fallback: usize,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::new([(1280.0, 4), (1024.0, 3), (640.0, 2)], 1)
    }
}

impl Breakpoints {
    pub fn new(steps: impl IntoIterator<Item = (f32, usize)>, fallback: usize) -> Self {
        let mut steps: Vec<(f32, usize)> = steps
            .into_iter()
            .map(|(w, c)| (w, c.max(1)))
            .collect();
        steps.sort_by(|a, b| b.0.total_cmp(&a.0));
        Self {
            steps,
            fallback: fallback.max(1),
        }
    }

    pub fn columns_for(&self, viewport_width: f32) -> usize {
        self.steps
            .iter()
            .find(|(min_width, _)| viewport_width >= *min_width)
            .map(|(_, columns)| *columns)
            .unwrap_or(self.fallback)
    }
}

/// A photo placed in the masonry grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasonryTile {
    /// Index into the photo sequence the plan was computed from.
    pub index: usize,
    pub url: String,
    pub column: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MasonryPlan {
    pub column_count: usize,
    pub column_width: f32,
    /// Tiles in photo order.
    pub tiles: Vec<MasonryTile>,
    pub column_heights: Vec<f32>,
}

impl MasonryPlan {
    /// Photo indices per column, top to bottom.
    pub fn columns(&self) -> Vec<Vec<usize>> {
        let mut columns = vec![Vec::new(); self.column_count];
        for tile in &self.tiles {
            columns[tile.column].push(tile.index);
        }
        columns
    }

    pub fn total_height(&self) -> f32 {
        self.column_heights.iter().copied().fold(0.0, f32::max)
    }
}

/// Greedy shortest-column-first masonry.
#[derive(Debug, Clone)]
pub struct MasonryLayout {
    /// Gap between columns and between stacked tiles, in pixels.
    pub gap: f32,
    pub fallback_aspect: f32,
}

impl Default for MasonryLayout {
    fn default() -> Self {
        Self {
            gap: 16.0,
            fallback_aspect: FALLBACK_ASPECT,
        }
    }
}

/// Index of the shortest column; the lowest index wins ties.
fn find_shortest_column(heights: &[f32]) -> usize {
    let mut best = 0;
    for (i, h) in heights.iter().enumerate().skip(1) {
        if *h < heights[best] {
            best = i;
        }
    }
    best
}

impl MasonryLayout {
    pub fn new(gap: f32) -> Self {
        Self {
            gap: gap.max(0.0),
            ..Self::default()
        }
    }

    /// Assigns each height to a column, in input order.
    pub fn assign(heights: &[f32], column_count: usize) -> Vec<usize> {
        let mut columns = vec![0.0f32; column_count.max(1)];
        heights
            .iter()
            .map(|h| {
                let column = find_shortest_column(&columns);
                columns[column] += h.max(0.0);
                column
            })
            .collect()
    }

    fn tile_height(&self, photo: &ConfirmedMedia, column_width: f32) -> f32 {
        let aspect = photo
            .aspect_ratio()
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(self.fallback_aspect);
        (column_width / aspect).max(1.0)
    }

    /// Lays `photos` out in the column count the breakpoints give for
    /// `viewport_width`.
    pub fn layout(
        &self,
        photos: &[ConfirmedMedia],
        breakpoints: &Breakpoints,
        viewport_width: f32,
    ) -> MasonryPlan {
        self.compute(photos, viewport_width, breakpoints.columns_for(viewport_width))
    }

    pub fn compute(
        &self,
        photos: &[ConfirmedMedia],
        viewport_width: f32,
        column_count: usize,
    ) -> MasonryPlan {
        let column_count = column_count.max(1);
        let usable = (viewport_width - self.gap * (column_count - 1) as f32).max(column_count as f32);
        let column_width = usable / column_count as f32;

        let mut heights = vec![0.0f32; column_count];
        let mut tiles = Vec::with_capacity(photos.len());
        for (index, photo) in photos.iter().enumerate() {
            let column = find_shortest_column(&heights);
            let height = self.tile_height(photo, column_width);
            let y = if heights[column] > 0.0 {
                heights[column] + self.gap
            } else {
                0.0
            };
            tiles.push(MasonryTile {
                index,
                url: photo.url.clone(),
                column,
                x: column as f32 * (column_width + self.gap),
                y,
                width: column_width,
                height,
            });
            heights[column] = y + height;
        }

        MasonryPlan {
            column_count,
            column_width,
            tiles,
            column_heights: heights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn photo(i: usize, w: u32, h: u32) -> ConfirmedMedia {
        ConfirmedMedia {
            url: format!("{i}.jpg"),
            media_kind: MediaKind::Image,
            position_hint: i,
            dimensions: Some((w, h)),
        }
    }

    #[test]
    fn test_breakpoints() {
        let bp = Breakpoints::default();
        assert_eq!(bp.columns_for(1920.0), 4);
        assert_eq!(bp.columns_for(1280.0), 4);
        assert_eq!(bp.columns_for(1100.0), 3);
        assert_eq!(bp.columns_for(700.0), 2);
        assert_eq!(bp.columns_for(320.0), 1);
    }

    #[test]
    fn test_assign_shortest_first_with_ties_to_lowest() {
        assert_eq!(MasonryLayout::assign(&[100.0, 100.0, 100.0], 3), vec![0, 1, 2]);
        assert_eq!(
            MasonryLayout::assign(&[300.0, 100.0, 100.0, 50.0], 2),
            vec![0, 1, 1, 1]
        );
    }

    #[test]
    fn test_single_column_keeps_order() {
        let photos: Vec<_> = (0..4).map(|i| photo(i, 400, 300)).collect();
        let plan = MasonryLayout::new(0.0).compute(&photos, 400.0, 1);
        assert_eq!(plan.columns(), vec![vec![0, 1, 2, 3]]);
        assert!((plan.total_height() - 1200.0).abs() < 0.01);
    }

    #[test]
    fn test_tall_photo_pushes_next_items_elsewhere() {
        let photos = vec![photo(0, 100, 400), photo(1, 400, 100), photo(2, 400, 100)];
        let plan = MasonryLayout::new(0.0).compute(&photos, 800.0, 2);
        assert_eq!(plan.columns(), vec![vec![0], vec![1, 2]]);
        assert!((plan.tiles[2].y - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_gap_and_positions() {
        let photos: Vec<_> = (0..3).map(|i| photo(i, 100, 100)).collect();
        let plan = MasonryLayout::new(10.0).compute(&photos, 210.0, 2);
        assert!((plan.column_width - 100.0).abs() < 0.01);
        assert!((plan.tiles[1].x - 110.0).abs() < 0.01);
        assert!((plan.tiles[2].y - 110.0).abs() < 0.01);
    }

    #[test]
    fn test_unknown_dimensions_use_estimate() {
        let mut p = photo(0, 1, 1);
        p.dimensions = None;
        let plan = MasonryLayout::new(0.0).compute(&[p], 400.0, 1);
        assert!((plan.tiles[0].height - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_deterministic() {
        let photos: Vec<_> = (0..20).map(|i| photo(i, 300 + (i as u32 * 37) % 200, 300)).collect();
        let layout = MasonryLayout::default();
        let bp = Breakpoints::default();
        assert_eq!(layout.layout(&photos, &bp, 1400.0), layout.layout(&photos, &bp, 1400.0));
    }

    #[test]
    fn test_empty_photos() {
        let plan = MasonryLayout::default().compute(&[], 1200.0, 3);
        assert!(plan.tiles.is_empty());
        assert_eq!(plan.columns(), vec![Vec::<usize>::new(); 3]);
    }
}
