//! Bidirectional source/result position map (C6), built once from a rendered
//! tree and queried in both directions.
//!
//! A [`RootPosMap`] owns a flat, `src_start`-sorted list of leaf
//! [`ContiguousPosMap`] entries for its own file plus any nested
//! [`RootPosMap`]s contributed by transcluded `\input`s. Queries binary
//! search the sorted list rather than walking the AST again.

use std::collections::BTreeMap as SerdeMap;

use serde::Serialize;

use super::ast::{Node, NodeKind};
use crate::error::{Error, Result};
use crate::position::{Position, ORIGIN};

/// Where a probe position falls relative to one contiguous map's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rel {
    /// Strictly before the range.
    Before,
    /// Inside the range (inclusive both ends).
    In,
    /// Strictly after the range.
    After,
}

/// A single `(src_start, src_end) <-> (dest_start, dest_end)` linear mapping,
/// produced by one `PlainText`/`NewParagraph`/`Blank` leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousPosMap {
    /// Start of this entry's span in the source.
    pub src_start: Position,
    /// End of this entry's span in the source.
    pub src_end: Position,
    /// Start of this entry's span in the rendered output.
    pub dest_start: Position,
    /// End of this entry's span in the rendered output.
    pub dest_end: Position,
}

impl ContiguousPosMap {
    /// Build an entry directly.
    pub fn new(src_start: Position, src_end: Position, dest_start: Position, dest_end: Position) -> Self {
        Self {
            src_start,
            src_end,
            dest_start,
            dest_end,
        }
    }

    /// Whether `pos` falls within `[src_start, src_end]`.
    pub fn src_contains(&self, pos: Position) -> bool {
        self.src_start <= pos && pos <= self.src_end
    }

    /// Whether `pos` falls within `[dest_start, dest_end]`.
    pub fn dest_contains(&self, pos: Position) -> bool {
        self.dest_start <= pos && pos <= self.dest_end
    }

    /// Classify `pos` against this entry's source range.
    pub fn src_rel(&self, pos: Position) -> Rel {
        if self.src_contains(pos) {
            Rel::In
        } else if pos < self.src_start {
            Rel::Before
        } else {
            Rel::After
        }
    }

    /// Classify `pos` against this entry's destination range.
    pub fn dest_rel(&self, pos: Position) -> Rel {
        if self.dest_contains(pos) {
            Rel::In
        } else if pos < self.dest_start {
            Rel::Before
        } else {
            Rel::After
        }
    }

    /// Distance from `pos` to this entry's source range (0 if inside).
    pub fn src_dist(&self, pos: Position) -> Result<usize> {
        Ok(match self.src_rel(pos) {
            Rel::In => 0,
            Rel::Before => self.src_start.checked_sub(pos)?.offset,
            Rel::After => pos.checked_sub(self.src_end)?.offset,
        })
    }

    /// Distance from `pos` to this entry's destination range (0 if inside).
    pub fn dest_dist(&self, pos: Position) -> Result<usize> {
        Ok(match self.dest_rel(pos) {
            Rel::In => 0,
            Rel::Before => self.dest_start.checked_sub(pos)?.offset,
            Rel::After => pos.checked_sub(self.dest_end)?.offset,
        })
    }
}

/// One entry in a [`RootPosMap`]: either a leaf mapping from this file, or a
/// nested root contributed by a transcluded `\input`.
#[derive(Debug, Clone)]
enum PosMapEntry {
    Leaf(ContiguousPosMap),
    Nested(RootPosMap),
}

/// The position map for one parsed file, plus any files it transcluded.
#[derive(Debug, Clone)]
pub struct RootPosMap {
    filename: String,
    entries: Vec<PosMapEntry>,
}

/// One entry as serialized for `as_dict`/`--json --map`.
#[derive(Debug, Serialize)]
pub struct MapEntryJson {
    src: (Position, Position),
    dest: (Position, Position),
}

impl RootPosMap {
    /// Walk `root` (must be a `Node::root(..)`) once, collecting every
    /// `PlainText`/`NewParagraph`/`Blank` leaf's rendered span into a flat,
    /// `src_start`-sorted map, recursing into nested transcluded roots.
    pub fn build(root: &Node) -> Self {
        let NodeKind::Root { filename, elems } = &root.kind else {
            panic!("RootPosMap::build called on a non-Root node");
        };
        let mut entries = Vec::new();
        collect(elems, &mut entries);
        entries.sort_by_key(|e| match e {
            PosMapEntry::Leaf(m) => m.src_start,
            PosMapEntry::Nested(r) => r.src_start(),
        });
        Self {
            filename: filename.clone(),
            entries,
        }
    }

    fn src_start(&self) -> Position {
        self.entries
            .iter()
            .filter_map(|e| match e {
                PosMapEntry::Leaf(m) => Some(m.src_start),
                PosMapEntry::Nested(r) => Some(r.src_start()),
            })
            .min()
            .unwrap_or(ORIGIN)
    }

    /// This map's file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn find_file_root(&self, filename: &str) -> Option<&RootPosMap> {
        if self.filename == filename {
            return Some(self);
        }
        self.entries.iter().find_map(|e| match e {
            PosMapEntry::Nested(r) => r.find_file_root(filename),
            PosMapEntry::Leaf(_) => None,
        })
    }

    fn leaves(&self) -> Vec<&ContiguousPosMap> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                PosMapEntry::Leaf(m) => Some(m),
                PosMapEntry::Nested(_) => None,
            })
            .collect()
    }

    fn flatten_for_dest<'a>(&'a self, out: &mut Vec<(&'a str, &'a ContiguousPosMap)>) {
        for e in &self.entries {
            match e {
                PosMapEntry::Leaf(m) => out.push((&self.filename, m)),
                PosMapEntry::Nested(r) => r.flatten_for_dest(out),
            }
        }
    }

    /// Translate a source position to its destination position. `filename`
    /// scopes the lookup to a specific transcluded file; `None` means this
    /// map's own file.
    pub fn src_to_dest(&self, pos: Position, filename: Option<&str>) -> Result<Position> {
        Ok(self.src_to_dest_pair(pos, filename)?.0)
    }

    /// As [`RootPosMap::src_to_dest`], but also returns the destination
    /// position of the entry immediately after `pos` when `pos` falls in a
    /// gap (`None` when `pos` matched an entry exactly, or lies past every
    /// entry).
    pub fn src_to_dest_pair(
        &self,
        pos: Position,
        filename: Option<&str>,
    ) -> Result<(Position, Option<Position>)> {
        let root = match filename {
            Some(f) => self
                .find_file_root(f)
                .ok_or_else(|| Error::FileNotFound(f.to_string()))?,
            None => self,
        };
        let leaves = root.leaves();
        Ok(locate_by_src(&leaves, pos))
    }

    /// Translate a destination position back to `(filename, src_position)`.
    pub fn dest_to_src(&self, pos: Position) -> Result<(String, Position)> {
        let (filename, before, _) = self.dest_to_src_pair(pos)?;
        Ok((filename, before))
    }

    /// As [`RootPosMap::dest_to_src`], but also returns the source position
    /// of the entry immediately after `pos` when it falls in a gap.
    pub fn dest_to_src_pair(&self, pos: Position) -> Result<(String, Position, Option<Position>)> {
        let mut flat = Vec::new();
        self.flatten_for_dest(&mut flat);
        flat.sort_by_key(|(_, m)| m.dest_start);
        let idx = flat.partition_point(|(_, m)| m.dest_end < pos);
        if idx < flat.len() {
            let (fname, m) = flat[idx];
            if m.dest_contains(pos) {
                let p = m.src_start + (pos - m.dest_start);
                return Ok((fname.to_string(), p, Some(p)));
            }
            let (before_file, before) = if idx == 0 {
                (self.filename.clone(), ORIGIN)
            } else {
                let (f, m) = flat[idx - 1];
                (f.to_string(), m.src_end)
            };
            return Ok((before_file, before, Some(m.src_start)));
        }
        let (before_file, before) = flat
            .last()
            .map(|(f, m)| (f.to_string(), m.src_end))
            .unwrap_or_else(|| (self.filename.clone(), ORIGIN));
        Ok((before_file, before, None))
    }

    /// Translate a source interval `[a, b]` into a destination interval,
    /// widening to the surrounding gap's boundaries when an endpoint doesn't
    /// land exactly on an entry.
    pub fn src_to_dest_interval(
        &self,
        a: Position,
        b: Position,
        filename: Option<&str>,
    ) -> Result<(Position, Position)> {
        let start = self.src_to_dest(a, filename)?;
        let (before_end, after_end) = self.src_to_dest_pair(b, filename)?;
        let end = after_end.unwrap_or(before_end);
        Ok(order(start, end))
    }

    /// Translate a destination interval `[a, b]` back into a source
    /// interval. Fails if the two endpoints resolve to different files.
    pub fn dest_to_src_interval(&self, a: Position, b: Position) -> Result<(String, Position, Position)> {
        let (file_a, start, _) = self.dest_to_src_pair(a)?;
        let (file_b, before_end, after_end) = self.dest_to_src_pair(b)?;
        if file_a != file_b {
            return Err(Error::IntervalOnTwoFiles);
        }
        let end = after_end.unwrap_or(before_end);
        let (start, end) = order(start, end);
        Ok((file_a, start, end))
    }

    /// Render as the stable `[filename]` / `L{l}C{c}-...=L{l}C{c}-...` text
    /// format, depth-first across nested roots.
    pub fn as_text(&self) -> String {
        let mut lines = Vec::new();
        self.write_text(&mut lines);
        lines.join("\n")
    }

    fn write_text(&self, lines: &mut Vec<String>) {
        lines.push(format!("[{}]", self.filename));
        for e in &self.entries {
            match e {
                PosMapEntry::Leaf(m) => lines.push(format!(
                    "L{}C{}-L{}C{}=L{}C{}-L{}C{}",
                    m.src_start.line,
                    m.src_start.col,
                    m.src_end.line,
                    m.src_end.col,
                    m.dest_start.line,
                    m.dest_start.col,
                    m.dest_end.line,
                    m.dest_end.col,
                )),
                PosMapEntry::Nested(r) => r.write_text(lines),
            }
        }
    }

    /// Render as the stable `{filename: [{src,dest}, ...]}` JSON shape.
    pub fn as_dict(&self) -> SerdeMap<String, Vec<MapEntryJson>> {
        let mut out = SerdeMap::new();
        self.write_dict(&mut out);
        out
    }

    fn write_dict(&self, out: &mut SerdeMap<String, Vec<MapEntryJson>>) {
        let mut own = Vec::new();
        for e in &self.entries {
            match e {
                PosMapEntry::Leaf(m) => own.push(MapEntryJson {
                    src: (m.src_start, m.src_end),
                    dest: (m.dest_start, m.dest_end),
                }),
                PosMapEntry::Nested(r) => r.write_dict(out),
            }
        }
        out.insert(self.filename.clone(), own);
    }
}

fn order(a: Position, b: Position) -> (Position, Position) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

fn locate_by_src(leaves: &[&ContiguousPosMap], pos: Position) -> (Position, Option<Position>) {
    let idx = leaves.partition_point(|m| m.src_end < pos);
    if idx < leaves.len() {
        let m = leaves[idx];
        if m.src_contains(pos) {
            let p = m.dest_start + (pos - m.src_start);
            return (p, Some(p));
        }
        let before = if idx == 0 {
            ORIGIN
        } else {
            leaves[idx - 1].dest_end
        };
        return (before, Some(m.dest_start));
    }
    let before = leaves.last().map(|m| m.dest_end).unwrap_or(ORIGIN);
    (before, None)
}

fn collect(elems: &[Node], out: &mut Vec<PosMapEntry>) {
    for n in elems {
        let res = n.res.expect("posmap construction requires a rendered tree");
        match &n.kind {
            NodeKind::PlainText(_) | NodeKind::NewParagraph | NodeKind::Blank => {
                out.push(PosMapEntry::Leaf(ContiguousPosMap::new(
                    n.src_start,
                    n.src_end,
                    res.start,
                    res.end,
                )));
            }
            NodeKind::Group(children) => collect(children, out),
            NodeKind::Command { args, .. } => collect(args, out),
            NodeKind::Root { .. } => out.push(PosMapEntry::Nested(RootPosMap::build(n))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::render::render;
    use crate::position::ORIGIN;

    fn rendered_root(elems: Vec<Node>) -> Node {
        let mut root = Node::root("<test>", elems, ORIGIN, ORIGIN);
        render(&mut root, ORIGIN).unwrap();
        root
    }

    #[test]
    fn point_lookup_inside_an_entry() {
        let root = rendered_root(vec![Node::plain_text("Hop", ORIGIN, ORIGIN + 3)]);
        let map = RootPosMap::build(&root);
        let dest = map.src_to_dest(ORIGIN + 1, None).unwrap();
        assert_eq!(dest, ORIGIN + 1);
    }

    #[test]
    fn dest_to_src_inverts_src_to_dest() {
        let root = rendered_root(vec![
            Node::plain_text("Hop", ORIGIN, ORIGIN + 3),
            Node::blank(ORIGIN + 3, ORIGIN + 10), // a stripped command, no output
            Node::plain_text("there", ORIGIN + 10, ORIGIN + 15),
        ]);
        let map = RootPosMap::build(&root);
        let dest = map.src_to_dest(ORIGIN + 12, None).unwrap(); // inside "there"
        let (filename, src) = map.dest_to_src(dest).unwrap();
        assert_eq!(filename, "<test>");
        assert_eq!(src, ORIGIN + 12);
    }

    #[test]
    fn as_text_has_filename_header_and_one_line_per_entry() {
        let root = rendered_root(vec![Node::plain_text("Hop", ORIGIN, ORIGIN + 3)]);
        let map = RootPosMap::build(&root);
        let text = map.as_text();
        assert!(text.starts_with("[<test>]"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn as_dict_has_one_key_per_file() {
        let root = rendered_root(vec![Node::plain_text("Hop", ORIGIN, ORIGIN + 3)]);
        let map = RootPosMap::build(&root);
        let dict = map.as_dict();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict["<test>"].len(), 1);
    }
}
