//! Tables from ruling lines
//!
//! Straight horizontal and vertical segments of painted paths become
//! edges. Edges close to each other are snapped onto a common position
//! and collinear pieces are joined. Crossings of horizontal and
//! vertical edges are intersections, the smallest rectangles whose
//! corners are connected intersections are cells, and cells sharing
//! corners form a table.

use super::{Detector, TableObject};
use crate::content::PathObject;
use crate::document::{Page, PdfSource};
use crate::error::Result;
use crate::geometry::{get_bound_rects, Point, Rect};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A horizontal or vertical ruling, `x0 <= x1` and `top <= bottom`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub orientation: Orientation,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Edge {
    fn new(a: Point, b: Point, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => {
                let y = (a.y + b.y) / 2.0;
                Self {
                    orientation,
                    x0: a.x.min(b.x),
                    top: y,
                    x1: a.x.max(b.x),
                    bottom: y,
                }
            }
            Orientation::Vertical => {
                let x = (a.x + b.x) / 2.0;
                Self {
                    orientation,
                    x0: x,
                    top: a.y.min(b.y),
                    x1: x,
                    bottom: a.y.max(b.y),
                }
            }
        }
    }

    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }

    /// Position across the edge
    fn position(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.top,
            Orientation::Vertical => self.x0,
        }
    }

    fn set_position(&mut self, value: f64) {
        match self.orientation {
            Orientation::Horizontal => {
                self.top = value;
                self.bottom = value;
            }
            Orientation::Vertical => {
                self.x0 = value;
                self.x1 = value;
            }
        }
    }

    /// Extent along the edge
    fn span(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Horizontal => (self.x0, self.x1),
            Orientation::Vertical => (self.top, self.bottom),
        }
    }

    fn set_span(&mut self, (start, end): (f64, f64)) {
        match self.orientation {
            Orientation::Horizontal => {
                self.x0 = start;
                self.x1 = end;
            }
            Orientation::Vertical => {
                self.top = start;
                self.bottom = end;
            }
        }
    }
}

/// Tolerances, in the units of the document's coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeSettings {
    /// Parallel edges closer than this are moved onto the same line
    pub snap_tolerance: f64,
    /// Collinear edges with gaps up to this are merged
    pub join_tolerance: f64,
    /// Shorter edges are dropped after joining
    pub edge_min_length: f64,
    /// How far apart edges may be and still intersect
    pub intersection_tolerance: f64,
    /// Segments deviating less than this from an axis count as ruling
    pub axis_tolerance: f64,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
            axis_tolerance: 0.5,
        }
    }
}

/// A table found by [`find_tables`]
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeTable {
    pub bbox: Rect,
    /// Cells in reading order (top to bottom, left to right)
    pub cells: Vec<Rect>,
}

fn classify(a: Point, b: Point, tolerance: f64) -> Option<Edge> {
    if a == b {
        return None;
    }
    if (a.y - b.y).abs() <= tolerance {
        Some(Edge::new(a, b, Orientation::Horizontal))
    } else if (a.x - b.x).abs() <= tolerance {
        Some(Edge::new(a, b, Orientation::Vertical))
    } else {
        None
    }
}

/// Straight axis-aligned segments of a path, including closing segments
pub fn path_edges(path: &PathObject, tolerance: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut start: Option<Point> = None;
    let mut current: Option<Point> = None;
    for segment in &path.segments {
        let end = segment.points.last().copied();
        match segment.op {
            'm' => {
                start = end;
                current = end;
            }
            'l' => {
                if let (Some(a), Some(b)) = (current, end) {
                    edges.extend(classify(a, b, tolerance));
                }
                current = end;
            }
            'h' => {
                if let (Some(a), Some(b)) = (current, start) {
                    edges.extend(classify(a, b, tolerance));
                }
                current = start;
            }
            _ => current = end,
        }
    }
    edges
}

/// Group values (sorted by `key`) into runs whose neighbours are within
/// `tolerance`.
fn cluster_by<T>(mut items: Vec<T>, tolerance: f64, key: impl Fn(&T) -> f64) -> Vec<Vec<T>> {
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
    let mut clusters: Vec<Vec<T>> = Vec::new();
    let mut last: Option<f64> = None;
    for item in items {
        let value = key(&item);
        match (clusters.last_mut(), last) {
            (Some(cluster), Some(prev)) if value - prev <= tolerance => cluster.push(item),
            _ => clusters.push(vec![item]),
        }
        last = Some(value);
    }
    clusters
}

/// Move nearly collinear edges onto their mean position.
pub fn snap_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let (horizontal, vertical): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);
    let mut snapped = Vec::new();
    for group in [horizontal, vertical] {
        for mut cluster in cluster_by(group, tolerance, Edge::position) {
            let mean = cluster.iter().map(Edge::position).sum::<f64>() / cluster.len() as f64;
            for edge in &mut cluster {
                edge.set_position(mean);
            }
            snapped.extend(cluster);
        }
    }
    snapped
}

/// Merge collinear edges (same orientation and position) that overlap
/// or are separated by at most `tolerance`.
pub fn join_edge_group(mut edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    edges.sort_by(|a, b| a.span().0.total_cmp(&b.span().0));
    let mut joined: Vec<Edge> = Vec::new();
    for edge in edges {
        match joined.last_mut() {
            Some(last) if edge.span().0 <= last.span().1 + tolerance => {
                let (start, end) = last.span();
                last.set_span((start, end.max(edge.span().1)));
            }
            _ => joined.push(edge),
        }
    }
    joined
}

/// Snap, join and filter the raw edges.
pub fn merge_edges(edges: Vec<Edge>, settings: &LatticeSettings) -> Vec<Edge> {
    let snapped = snap_edges(edges, settings.snap_tolerance);
    let mut lines: BTreeMap<(bool, u64), Vec<Edge>> = BTreeMap::new();
    for edge in snapped {
        let key = (
            edge.orientation == Orientation::Vertical,
            edge.position().to_bits(),
        );
        lines.entry(key).or_default().push(edge);
    }
    lines
        .into_values()
        .flat_map(|group| join_edge_group(group, settings.join_tolerance))
        .filter(|edge| edge.length() >= settings.edge_min_length)
        .collect()
}

/// Totally ordered point, for use as a map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Key(u64, u64);

fn ordered_bits(v: f64) -> u64 {
    // flip so that the unsigned order matches the float order
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

impl Key {
    /// Ordered by `y` then `x`
    fn new(p: Point) -> Self {
        Key(ordered_bits(p.y), ordered_bits(p.x))
    }
}

/// A crossing point and the edges that meet there
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub point: Point,
    horizontal: BTreeSet<usize>,
    vertical: BTreeSet<usize>,
}

/// Crossings of horizontal and vertical edges, ordered top to bottom
/// then left to right.
pub fn edges_to_intersections(edges: &[Edge], tolerance: f64) -> Vec<Intersection> {
    let mut found: BTreeMap<Key, Intersection> = BTreeMap::new();
    for (vi, v) in edges.iter().enumerate() {
        if v.orientation != Orientation::Vertical {
            continue;
        }
        for (hi, h) in edges.iter().enumerate() {
            if h.orientation != Orientation::Horizontal {
                continue;
            }
            let crosses = v.top - tolerance <= h.top
                && h.top <= v.bottom + tolerance
                && h.x0 - tolerance <= v.x0
                && v.x0 <= h.x1 + tolerance;
            if !crosses {
                continue;
            }
            let point = Point::new(v.x0, h.top);
            let entry = found.entry(Key::new(point)).or_insert_with(|| Intersection {
                point,
                horizontal: BTreeSet::new(),
                vertical: BTreeSet::new(),
            });
            entry.horizontal.insert(hi);
            entry.vertical.insert(vi);
        }
    }
    found.into_values().collect()
}

/// Smallest rectangles whose four corners are intersections connected
/// by edges along all four sides.
pub fn intersections_to_cells(intersections: &[Intersection]) -> Vec<Rect> {
    let by_point: BTreeMap<Key, &Intersection> = intersections
        .iter()
        .map(|i| (Key::new(i.point), i))
        .collect();
    let shares = |a: &BTreeSet<usize>, b: &BTreeSet<usize>| !a.is_disjoint(b);

    let mut cells = Vec::new();
    for (n, corner) in intersections.iter().enumerate() {
        let rest = &intersections[n + 1..];
        let below = rest
            .iter()
            .filter(|i| i.point.x == corner.point.x && shares(&i.vertical, &corner.vertical));
        let right: Vec<&Intersection> = rest
            .iter()
            .filter(|i| i.point.y == corner.point.y && shares(&i.horizontal, &corner.horizontal))
            .collect();
        'search: for bottom_left in below {
            for top_right in &right {
                let opposite = Point::new(top_right.point.x, bottom_left.point.y);
                let Some(bottom_right) = by_point.get(&Key::new(opposite)) else {
                    continue;
                };
                if shares(&bottom_right.horizontal, &bottom_left.horizontal)
                    && shares(&bottom_right.vertical, &top_right.vertical)
                {
                    cells.push(Rect::from_corners(corner.point, bottom_right.point));
                    break 'search;
                }
            }
        }
    }
    cells
}

/// Group cells that share corners into tables; lone cells are dropped.
pub fn cells_to_tables(cells: Vec<Rect>) -> Vec<LatticeTable> {
    let corners = |r: &Rect| {
        [
            Key::new(Point::new(r.x0, r.y0)),
            Key::new(Point::new(r.x1, r.y0)),
            Key::new(Point::new(r.x0, r.y1)),
            Key::new(Point::new(r.x1, r.y1)),
        ]
    };
    let mut remaining = cells;
    let mut tables: Vec<Vec<Rect>> = Vec::new();
    while let Some(seed) = remaining.pop() {
        let mut table = vec![seed];
        let mut points: HashSet<Key> = corners(&seed).into_iter().collect();
        loop {
            let (joining, rest): (Vec<Rect>, Vec<Rect>) = remaining
                .into_iter()
                .partition(|cell| corners(cell).iter().any(|c| points.contains(c)));
            remaining = rest;
            if joining.is_empty() {
                break;
            }
            for cell in joining {
                points.extend(corners(&cell));
                table.push(cell);
            }
        }
        tables.push(table);
    }
    let mut tables: Vec<LatticeTable> = tables
        .into_iter()
        .filter(|cells| cells.len() > 1)
        .map(|mut cells| {
            cells.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));
            LatticeTable {
                bbox: get_bound_rects(cells.iter().copied()),
                cells,
            }
        })
        .collect();
    tables.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    tables
}

/// Find tables in the ruling lines of `paths`.
pub fn find_tables(paths: &[PathObject], settings: &LatticeSettings) -> Vec<LatticeTable> {
    let edges: Vec<Edge> = paths
        .iter()
        .flat_map(|path| path_edges(path, settings.axis_tolerance))
        .collect();
    let edges = merge_edges(edges, settings);
    let intersections = edges_to_intersections(&edges, settings.intersection_tolerance);
    let cells = intersections_to_cells(&intersections);
    debug!(
        "{} edges, {} intersections, {} cells",
        edges.len(),
        intersections.len(),
        cells.len()
    );
    cells_to_tables(cells)
}

/// Tables on one page
pub fn page_tables(page: &Page<'_>, settings: &LatticeSettings) -> Result<Vec<TableObject>> {
    Ok(find_tables(&page.paths()?, settings)
        .into_iter()
        .map(|table| TableObject::from_bbox(page.index(), table.bbox))
        .collect())
}

/// Detector using ruling lines; applies to every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lattice {
    pub settings: LatticeSettings,
}

impl Detector for Lattice {
    fn name(&self) -> &'static str {
        "lattice"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn detect(&self, source: &PdfSource<'_>) -> Result<Option<Vec<TableObject>>> {
        let pages = source.with_pages(|page| page_tables(&page, &self.settings))?;
        Ok(Some(pages.into_iter().flatten().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{GraphicState, ObjectState, PathSegment};
    use crate::geometry::Matrix;

    fn path(segments: Vec<(char, Vec<(f64, f64)>)>) -> PathObject {
        PathObject {
            state: ObjectState {
                page_index: 0,
                gstate: GraphicState::default(),
                ctm: Matrix::IDENTITY,
                mcstack: Vec::new(),
            },
            segments: segments
                .into_iter()
                .map(|(op, pts)| PathSegment::new(op, pts.into_iter().map(Point::from).collect()))
                .collect(),
            stroke: true,
            fill: false,
            evenodd: false,
        }
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> PathObject {
        path(vec![('m', vec![(x0, y0)]), ('l', vec![(x1, y1)])])
    }

    /// A grid of ruling lines at the given positions
    fn grid(xs: &[f64], ys: &[f64]) -> Vec<PathObject> {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        let mut paths: Vec<PathObject> = ys.iter().map(|&y| line(left, y, right, y)).collect();
        paths.extend(xs.iter().map(|&x| line(x, top, x, bottom)));
        paths
    }

    #[test]
    fn test_rectangle_edges() {
        let rect = path(vec![
            ('m', vec![(10.0, 10.0)]),
            ('l', vec![(50.0, 10.0)]),
            ('l', vec![(50.0, 30.0)]),
            ('l', vec![(10.0, 30.0)]),
            ('h', vec![]),
        ]);
        let edges = path_edges(&rect, 0.5);
        assert_eq!(edges.len(), 4);
        let vertical = edges
            .iter()
            .filter(|e| e.orientation == Orientation::Vertical)
            .count();
        assert_eq!(vertical, 2);
    }

    #[test]
    fn test_diagonals_and_curves_are_not_edges() {
        let p = path(vec![
            ('m', vec![(0.0, 0.0)]),
            ('l', vec![(10.0, 10.0)]),
            ('c', vec![(12.0, 10.0), (14.0, 10.0), (20.0, 10.0)]),
        ]);
        assert!(path_edges(&p, 0.5).is_empty());
    }

    #[test]
    fn test_snap_and_join() {
        let edges = vec![
            Edge::new(Point::new(0.0, 10.0), Point::new(20.0, 10.0), Orientation::Horizontal),
            Edge::new(Point::new(21.0, 12.0), Point::new(40.0, 12.0), Orientation::Horizontal),
            Edge::new(Point::new(80.0, 11.0), Point::new(90.0, 11.0), Orientation::Horizontal),
        ];
        let merged = merge_edges(edges, &LatticeSettings::default());
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|e| e.top == 11.0));
        assert_eq!((merged[0].x0, merged[0].x1), (0.0, 40.0));
        assert_eq!((merged[1].x0, merged[1].x1), (80.0, 90.0));
    }

    #[test]
    fn test_short_edges_are_dropped() {
        let edges = vec![Edge::new(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Orientation::Horizontal,
        )];
        assert!(merge_edges(edges, &LatticeSettings::default()).is_empty());
    }

    #[test]
    fn test_grid_makes_one_table() {
        let paths = grid(&[10.0, 60.0, 110.0], &[20.0, 40.0, 60.0, 80.0]);
        let tables = find_tables(&paths, &LatticeSettings::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].bbox, Rect::new(10.0, 20.0, 110.0, 80.0));
        assert_eq!(tables[0].cells.len(), 6);
        assert_eq!(tables[0].cells[0], Rect::new(10.0, 20.0, 60.0, 40.0));
        assert_eq!(tables[0].cells[1], Rect::new(60.0, 20.0, 110.0, 40.0));
    }

    #[test]
    fn test_slightly_misaligned_grid() {
        let mut paths = grid(&[10.0, 60.0], &[20.0, 40.0, 60.0]);
        // a vertical rule drawn a little off and short of the bottom
        paths.push(line(111.0, 20.0, 111.0, 58.5));
        paths[0] = line(10.0, 20.0, 110.0, 20.0);
        paths[1] = line(10.0, 40.0, 110.0, 40.0);
        paths[2] = line(10.0, 60.0, 110.0, 60.0);
        let tables = find_tables(&paths, &LatticeSettings::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cells.len(), 4);
    }

    #[test]
    fn test_separate_grids_make_separate_tables() {
        let mut paths = grid(&[10.0, 50.0, 90.0], &[10.0, 30.0]);
        paths.extend(grid(&[10.0, 50.0, 90.0], &[200.0, 220.0, 240.0]));
        let tables = find_tables(&paths, &LatticeSettings::default());
        assert_eq!(tables.len(), 2);
        assert!(tables[0].bbox.y0 < tables[1].bbox.y0);
        assert_eq!(tables[1].cells.len(), 4);
    }

    #[test]
    fn test_single_box_is_not_a_table() {
        let paths = grid(&[10.0, 50.0], &[10.0, 30.0]);
        assert!(find_tables(&paths, &LatticeSettings::default()).is_empty());
    }

    #[test]
    fn test_ordered_bits_preserve_order() {
        let values = [-10.5, -0.0, 0.0, 0.25, 3.0, 1e9];
        for pair in values.windows(2) {
            assert!(ordered_bits(pair[0]) <= ordered_bits(pair[1]));
        }
    }
}
