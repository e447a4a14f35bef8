//! Layout analysis: characters to lines, lines to boxes, boxes to groups

use super::layout::{
    GroupFlow, LTChar, LTItem, LTTextBox, LTTextGroup, LTTextLine, TextGroupElement,
};
use super::params::LAParams;
use super::plane::Plane;
use crate::geometry::Rect;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::trace;

fn is_hoverlap(a: &Rect, b: &Rect) -> bool {
    b.x0 <= a.x1 && a.x0 <= b.x1
}

fn hdistance(a: &Rect, b: &Rect) -> f64 {
    if is_hoverlap(a, b) {
        0.0
    } else {
        (a.x0 - b.x1).abs().min((a.x1 - b.x0).abs())
    }
}

fn hoverlap(a: &Rect, b: &Rect) -> f64 {
    if is_hoverlap(a, b) {
        (a.x0 - b.x1).abs().min((a.x1 - b.x0).abs())
    } else {
        0.0
    }
}

fn is_voverlap(a: &Rect, b: &Rect) -> bool {
    b.y0 <= a.y1 && a.y0 <= b.y1
}

fn vdistance(a: &Rect, b: &Rect) -> f64 {
    if is_voverlap(a, b) {
        0.0
    } else {
        (a.y0 - b.y1).abs().min((a.y1 - b.y0).abs())
    }
}

fn voverlap(a: &Rect, b: &Rect) -> f64 {
    if is_voverlap(a, b) {
        (a.y0 - b.y1).abs().min((a.y1 - b.y0).abs())
    } else {
        0.0
    }
}

/// Group characters into text lines, in content order.
pub(crate) fn group_objects(laparams: &LAParams, chars: Vec<LTChar>) -> Vec<LTTextLine> {
    let bboxes: Vec<Rect> = chars.iter().map(|c| c.bbox).collect();
    let mut chars: Vec<Option<LTChar>> = chars.into_iter().map(Some).collect();
    let mut take = |i: usize, line: &mut LTTextLine| {
        if let Some(c) = chars[i].take() {
            line.add(c);
        }
    };
    let mut lines = Vec::new();
    let mut line: Option<LTTextLine> = None;
    for i1 in 1..bboxes.len() {
        let i0 = i1 - 1;
        let (obj0, obj1) = (&bboxes[i0], &bboxes[i1]);
        // side by side, overlapping vertically
        let halign = is_voverlap(obj0, obj1)
            && obj0.height().min(obj1.height()) * laparams.line_overlap < voverlap(obj0, obj1)
            && hdistance(obj0, obj1) < obj0.width().max(obj1.width()) * laparams.char_margin;
        // stacked, overlapping horizontally
        let valign = laparams.detect_vertical
            && is_hoverlap(obj0, obj1)
            && obj0.width().min(obj1.width()) * laparams.line_overlap < hoverlap(obj0, obj1)
            && vdistance(obj0, obj1) < obj0.height().max(obj1.height()) * laparams.char_margin;

        let continues = line
            .as_ref()
            .map(|current| (halign && !current.vertical) || (valign && current.vertical));
        match continues {
            Some(true) => {
                if let Some(current) = line.as_mut() {
                    take(i1, current);
                }
            }
            Some(false) => lines.extend(line.take()),
            None if valign && !halign => {
                let mut current = LTTextLine::new(true, laparams.word_margin);
                take(i0, &mut current);
                take(i1, &mut current);
                line = Some(current);
            }
            None if halign && !valign => {
                let mut current = LTTextLine::new(false, laparams.word_margin);
                take(i0, &mut current);
                take(i1, &mut current);
                line = Some(current);
            }
            None => {
                let mut current = LTTextLine::new(false, laparams.word_margin);
                take(i0, &mut current);
                lines.push(current);
            }
        }
    }
    match line {
        Some(current) => lines.push(current),
        None if !bboxes.is_empty() => {
            let mut current = LTTextLine::new(false, laparams.word_margin);
            take(bboxes.len() - 1, &mut current);
            lines.push(current);
        }
        None => {}
    }
    lines
}

/// Same size across the line and aligned on one edge or the centre
fn find_neighbors(
    lines: &[LTTextLine],
    index: usize,
    plane: &Plane<usize>,
    ratio: f64,
) -> Vec<usize> {
    let line = &lines[index];
    let b = &line.bbox;
    if line.vertical {
        let d = ratio * b.width();
        plane
            .find(&Rect::new(b.x0 - d, b.y0, b.x1 + d, b.y1))
            .into_iter()
            .filter(|&j| {
                let o = &lines[j].bbox;
                lines[j].vertical
                    && (o.width() - b.width()).abs() <= d
                    && ((o.y0 - b.y0).abs() <= d
                        || (o.y1 - b.y1).abs() <= d
                        || ((o.y0 + o.y1) / 2.0 - (b.y0 + b.y1) / 2.0).abs() <= d)
            })
            .collect()
    } else {
        let d = ratio * b.height();
        plane
            .find(&Rect::new(b.x0, b.y0 - d, b.x1, b.y1 + d))
            .into_iter()
            .filter(|&j| {
                let o = &lines[j].bbox;
                !lines[j].vertical
                    && (o.height() - b.height()).abs() <= d
                    && ((o.x0 - b.x0).abs() <= d
                        || (o.x1 - b.x1).abs() <= d
                        || ((o.x0 + o.x1) / 2.0 - (b.x0 + b.x1) / 2.0).abs() <= d)
            })
            .collect()
    }
}

/// Group neighbouring lines into text boxes.
pub(crate) fn group_textlines(
    laparams: &LAParams,
    bbox: Rect,
    lines: Vec<LTTextLine>,
) -> Vec<LTTextBox> {
    let mut plane = Plane::new(bbox);
    for (i, line) in lines.iter().enumerate() {
        plane.add(i, line.bbox);
    }
    let mut line_box: HashMap<usize, usize> = HashMap::new();
    let mut box_members: Vec<Vec<usize>> = Vec::new();
    for i in 0..lines.len() {
        let mut members = vec![i];
        for j in find_neighbors(&lines, i, &plane, laparams.line_margin) {
            members.push(j);
            if let Some(&b) = line_box.get(&j) {
                members.extend(box_members[b].iter().copied());
            }
        }
        let mut seen = HashSet::new();
        members.retain(|m| seen.insert(*m));
        let box_id = box_members.len();
        for &m in &members {
            line_box.insert(m, box_id);
        }
        box_members.push(members);
    }

    let mut lines: Vec<Option<LTTextLine>> = lines.into_iter().map(Some).collect();
    let mut done = HashSet::new();
    let mut boxes = Vec::new();
    for i in 0..lines.len() {
        let Some(&box_id) = line_box.get(&i) else {
            continue;
        };
        if !done.insert(box_id) {
            continue;
        }
        let vertical = lines[box_members[box_id][0]]
            .as_ref()
            .is_some_and(|line| line.vertical);
        let mut textbox = LTTextBox::new(vertical);
        for &m in &box_members[box_id] {
            if let Some(line) = lines[m].take() {
                textbox.add(line);
            }
        }
        if !textbox.is_empty() {
            boxes.push(textbox);
        }
    }
    boxes
}

#[derive(Debug, Clone)]
enum Node {
    TextBox(usize),
    Group(GroupFlow, [usize; 2]),
}

/// Pending merge of two nodes, ordered so that the heap pops the
/// closest pair first
#[derive(Debug)]
struct Candidate {
    skip_isany: bool,
    dist: f64,
    id1: usize,
    id2: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .skip_isany
            .cmp(&self.skip_isany)
            .then_with(|| other.dist.total_cmp(&self.dist))
            .then_with(|| other.id1.cmp(&self.id1))
            .then_with(|| other.id2.cmp(&self.id2))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Area of the joint bounding box less the areas of both boxes
fn dist(a: &Rect, b: &Rect) -> f64 {
    a.union(b).area() - a.area() - b.area()
}

struct Grouper {
    nodes: Vec<(Node, Rect)>,
}

impl Grouper {
    fn is_vertical(&self, id: usize, boxes: &[LTTextBox]) -> bool {
        match &self.nodes[id].0 {
            Node::TextBox(index) => boxes[*index].vertical,
            Node::Group(flow, _) => *flow == GroupFlow::Tbrl,
        }
    }

    /// Agglomerative grouping; returns the root node ids.
    fn group(&mut self, bbox: Rect, boxes: &[LTTextBox]) -> Vec<usize> {
        let mut plane = Plane::new(bbox);
        let mut heap = BinaryHeap::new();
        for i in 0..boxes.len() {
            for j in i + 1..boxes.len() {
                heap.push(Candidate {
                    skip_isany: false,
                    dist: dist(&boxes[i].bbox, &boxes[j].bbox),
                    id1: i,
                    id2: j,
                });
            }
        }
        for (i, textbox) in boxes.iter().enumerate() {
            self.nodes.push((Node::TextBox(i), textbox.bbox));
            plane.add(i, textbox.bbox);
        }
        let mut done = HashSet::new();
        while let Some(candidate) = heap.pop() {
            let Candidate {
                skip_isany,
                dist: d,
                id1,
                id2,
            } = candidate;
            if done.contains(&id1) || done.contains(&id2) {
                continue;
            }
            let merged = self.nodes[id1].1.union(&self.nodes[id2].1);
            // defer pairs with something in between
            if !skip_isany && plane.find(&merged).iter().any(|&k| k != id1 && k != id2) {
                heap.push(Candidate {
                    skip_isany: true,
                    dist: d,
                    id1,
                    id2,
                });
                continue;
            }
            let flow = if self.is_vertical(id1, boxes) || self.is_vertical(id2, boxes) {
                GroupFlow::Tbrl
            } else {
                GroupFlow::Lrtb
            };
            let group_id = self.nodes.len();
            self.nodes.push((Node::Group(flow, [id1, id2]), merged));
            plane.remove(&id1);
            plane.remove(&id2);
            done.insert(id1);
            done.insert(id2);
            for other in plane.iter() {
                heap.push(Candidate {
                    skip_isany: false,
                    dist: dist(&merged, &self.nodes[other].1),
                    id1: group_id,
                    id2: other,
                });
            }
            plane.add(group_id, merged);
        }
        plane.iter().collect()
    }

    /// Order the tree, analyze its boxes and number them depth first.
    fn finish(
        &self,
        id: usize,
        boxes_flow: f64,
        boxes: &mut [LTTextBox],
        next_index: &mut i64,
    ) -> TextGroupElement {
        let (node, bbox) = &self.nodes[id];
        match node {
            Node::TextBox(index) => {
                let textbox = &mut boxes[*index];
                textbox.analyze();
                textbox.index = *next_index;
                *next_index += 1;
                TextGroupElement::TextBox(textbox.index as usize)
            }
            Node::Group(flow, children) => {
                let key = |child: &usize| {
                    let r = &self.nodes[*child].1;
                    match flow {
                        GroupFlow::Lrtb => {
                            (1.0 - boxes_flow) * r.x0 - (1.0 + boxes_flow) * (r.y0 + r.y1)
                        }
                        GroupFlow::Tbrl => {
                            -(1.0 + boxes_flow) * (r.x0 + r.x1) - (1.0 - boxes_flow) * r.y1
                        }
                    }
                };
                let mut ordered = *children;
                ordered.sort_by(|a, b| key(a).total_cmp(&key(b)));
                let elements = ordered
                    .iter()
                    .map(|&child| self.finish(child, boxes_flow, boxes, next_index))
                    .collect();
                TextGroupElement::Group(LTTextGroup {
                    flow: *flow,
                    bbox: *bbox,
                    elements,
                })
            }
        }
    }
}

/// Group text boxes hierarchically, analyze them and assign their
/// reading order indices.
pub(crate) fn group_textboxes(
    boxes_flow: f64,
    bbox: Rect,
    boxes: &mut [LTTextBox],
) -> Vec<TextGroupElement> {
    let mut grouper = Grouper { nodes: Vec::new() };
    let roots = grouper.group(bbox, boxes);
    let mut next_index = 0;
    roots
        .into_iter()
        .map(|root| grouper.finish(root, boxes_flow, boxes, &mut next_index))
        .collect()
}

fn analyze_figure(item: LTItem, laparams: &LAParams) -> LTItem {
    match item {
        LTItem::Figure(mut fig) if laparams.all_texts => {
            let items = std::mem::take(&mut fig.items);
            let (items, groups) = analyze_items(items, fig.bbox, laparams);
            fig.items = items;
            fig.groups = groups;
            LTItem::Figure(fig)
        }
        other => other,
    }
}

/// Analyze the items of a page or figure.
///
/// Returns the new items (text boxes, then other objects, then empty
/// lines) and the text groups when boxes are ordered by flow.
pub(crate) fn analyze_items(
    items: Vec<LTItem>,
    bbox: Rect,
    laparams: &LAParams,
) -> (Vec<LTItem>, Option<Vec<TextGroupElement>>) {
    let mut chars = Vec::new();
    let mut others = Vec::new();
    for item in items {
        match item {
            LTItem::Char(c) => chars.push(c),
            other => others.push(analyze_figure(other, laparams)),
        }
    }
    if chars.is_empty() {
        return (others, None);
    }
    let (mut empties, lines): (Vec<LTTextLine>, Vec<LTTextLine>) = group_objects(laparams, chars)
        .into_iter()
        .partition(LTTextLine::is_empty);
    for line in &mut empties {
        line.analyze();
    }
    let mut boxes = group_textlines(laparams, bbox, lines);
    trace!("{} text boxes, {} empty lines", boxes.len(), empties.len());
    let groups = match laparams.boxes_flow {
        None => {
            for textbox in &mut boxes {
                textbox.analyze();
            }
            boxes.sort_by(|a, b| {
                let key = |tb: &LTTextBox| {
                    if tb.vertical {
                        (0, -tb.bbox.x1, -tb.bbox.y0)
                    } else {
                        (1, -tb.bbox.y0, tb.bbox.x0)
                    }
                };
                let (ka, kb) = (key(a), key(b));
                ka.0.cmp(&kb.0)
                    .then_with(|| ka.1.total_cmp(&kb.1))
                    .then_with(|| ka.2.total_cmp(&kb.2))
            });
            None
        }
        Some(boxes_flow) => {
            let groups = group_textboxes(boxes_flow, bbox, &mut boxes);
            boxes.sort_by_key(|tb| tb.index);
            Some(groups)
        }
    };
    let mut result: Vec<LTItem> = boxes.into_iter().map(LTItem::TextBox).collect();
    result.extend(others);
    result.extend(empties.into_iter().map(LTItem::TextLine));
    (result, groups)
}
