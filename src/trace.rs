//! Parse traces and their diagnostic rendering.
//!
//! Every parser invocation appends one node to a per-parse trace, recording
//! the parser's label, the input range it covered, and whether it succeeded.
//! When a parse fails, the trace is collapsed (see splicing below) and
//! rendered as a block of span markers pinned under the offending input line.

use std::fmt;

/// Index of a node within its [`Trace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parser invocation in a [`Trace`].
#[derive(Debug, Clone)]
pub struct TraceNode {
    pub(crate) label: String,
    pub(crate) start: usize,
    pub(crate) end: Option<usize>,
    pub(crate) ok: bool,
    pub(crate) children: Vec<NodeId>,
    pub(crate) splice_start: bool,
    pub(crate) splice_end: bool,
}

impl TraceNode {
    /// The invoked parser's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Character offset where the invocation started.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Character offset where the invocation ended, unset if the invocation
    /// never completed.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Whether the invocation produced a value.
    pub fn succeeded(&self) -> bool {
        self.ok
    }

    /// Ids of the child invocations, in invocation order.
    pub fn child_ids(&self) -> &[NodeId] {
        &self.children
    }
}

/// Trace storage while a parse is running.
#[derive(Debug, Default)]
pub(crate) struct TraceArena {
    nodes: Vec<TraceNode>,
}

impl TraceArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a parentless node; the caller keeps its id as the trace root.
    pub(crate) fn root_node(&mut self, label: &str, start: usize) -> NodeId {
        self.push(label, false, false, start)
    }

    /// Appends a node under `parent` and returns its id.
    pub(crate) fn open(
        &mut self,
        parent: NodeId,
        label: &str,
        splice_start: bool,
        splice_end: bool,
        start: usize,
    ) -> NodeId {
        let id = self.push(label, splice_start, splice_end, start);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Records the outcome of the invocation that opened `id`.
    pub(crate) fn close(&mut self, id: NodeId, end: usize, ok: bool) {
        let node = &mut self.nodes[id.index()];
        node.end = Some(end);
        node.ok = ok;
    }

    fn push(&mut self, label: &str, splice_start: bool, splice_end: bool, start: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TraceNode {
            label: label.to_owned(),
            start,
            end: None,
            ok: false,
            children: vec![],
            splice_start,
            splice_end,
        });
        id
    }
}

/// A finished parse trace, attached to an
/// [`ExpectationFailed`][crate::ExpectationFailed].
///
/// Splice scopes are already collapsed: below every node invoked with a
/// splice-start marker, the splice-end descendants are reparented directly
/// under it and the structural noise between them is discarded. The `Display`
/// rendering is deterministic for a given trace, but its exact layout is not
/// otherwise part of the library's contract.
#[derive(Debug, Clone)]
pub struct Trace {
    nodes: Vec<TraceNode>,
    root: NodeId,
    input: String,
    position: usize,
    window: usize,
}

impl Trace {
    pub(crate) fn new(
        arena: TraceArena,
        root: NodeId,
        input: String,
        position: usize,
        window: usize,
    ) -> Self {
        let mut nodes = Vec::with_capacity(arena.nodes.len());
        let root = copy_collapsed(&arena.nodes, root, &mut nodes);
        Trace {
            nodes,
            root,
            input,
            position,
            window,
        }
    }

    /// The synthetic node covering the whole parse.
    pub fn root(&self) -> &TraceNode {
        self.get(self.root)
    }

    /// Looks a node up by id.
    pub fn get(&self, id: NodeId) -> &TraceNode {
        &self.nodes[id.index()]
    }

    /// The children of `node`, in invocation order.
    pub fn children<'t>(&'t self, node: &'t TraceNode) -> impl Iterator<Item = &'t TraceNode> + 't {
        node.children.iter().map(move |&id| self.get(id))
    }

    /// Character offset of the failure this trace was captured for.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The input prefix observed during the parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    fn collect_rows(&self, id: NodeId, rows: &mut Vec<Row>) {
        let node = self.get(id);
        for &child in &node.children {
            self.collect_rows(child, rows);
        }
        rows.push(Row {
            start: node.start,
            end: node.end.unwrap_or(node.start),
            ok: node.ok,
            label: node.label.clone(),
        });
    }
}

struct Row {
    start: usize,
    end: usize,
    ok: bool,
    label: String,
}

/// Deep-copies the subtree at `id`, applying splice collapse.
fn copy_collapsed(arena: &[TraceNode], id: NodeId, out: &mut Vec<TraceNode>) -> NodeId {
    let src = &arena[id.index()];
    let new_id = NodeId(out.len() as u32);
    let mut copy = src.clone();
    copy.children = vec![];
    out.push(copy);

    let children = if src.splice_start {
        let mut ends = vec![];
        for &child in &src.children {
            find_splice_ends(arena, child, &mut ends);
        }
        // A splice scope with no end markers below it keeps its real children.
        if ends.is_empty() {
            src.children.clone()
        } else {
            ends
        }
    } else {
        src.children.clone()
    };

    let children: Vec<NodeId> = children
        .into_iter()
        .map(|child| copy_collapsed(arena, child, out))
        .collect();
    out[new_id.index()].children = children;
    new_id
}

fn find_splice_ends(arena: &[TraceNode], id: NodeId, out: &mut Vec<NodeId>) {
    let node = &arena[id.index()];
    if node.splice_end {
        out.push(id);
    } else {
        for &child in &node.children {
            find_splice_ends(arena, child, out);
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: Vec<char> = self.input.chars().collect();

        // Locate the line holding the failure position.
        let mut line_start = 0;
        let mut line_no = 1usize;
        for (i, &c) in chars.iter().enumerate().take(self.position.min(chars.len())) {
            if c == '\n' {
                line_start = i + 1;
                line_no += 1;
            }
        }
        let line_end = chars[line_start..]
            .iter()
            .position(|&c| c == '\n')
            .map(|offset| line_start + offset)
            .unwrap_or(chars.len());

        // Clip long lines to a window around the failure position.
        let width = self.window.max(16);
        let (win_start, win_end) = if line_end - line_start <= width {
            (line_start, line_end)
        } else {
            let pos = self.position.clamp(line_start, line_end);
            let end = (pos + width / 2).min(line_end);
            let start = end.saturating_sub(width).max(line_start);
            (start, (start + width).min(line_end))
        };
        let truncated_start = win_start > line_start;
        let truncated_end = win_end < line_end;
        let offset = if truncated_start { 3 } else { 0 };

        let line_text: String = chars[win_start..win_end].iter().collect();
        let mut lines = vec![format!(
            "{:>4} | {}{}{}",
            line_no,
            if truncated_start { "..." } else { "" },
            line_text,
            if truncated_end { "..." } else { "" },
        )];

        // One row per node, children before parents, so the innermost spans
        // sit closest to the quoted input.
        let mut rows = vec![];
        for &child in &self.get(self.root).children {
            self.collect_rows(child, &mut rows);
        }

        let mut marked = vec![];
        let mut label_col = 0;
        for row in &rows {
            let (col, marker) = if row.ok {
                if row.end < win_start || row.start > win_end {
                    continue;
                }
                let start = row.start.clamp(win_start, win_end);
                let end = row.end.clamp(win_start, win_end);
                let marker = match end - start {
                    0 => "|".to_owned(),
                    1 => "-".to_owned(),
                    w => format!("\\{}/", "-".repeat(w - 2)),
                };
                (start - win_start + offset, marker)
            } else {
                let point = row.end.clamp(win_start, win_end);
                if row.end < win_start || row.end > win_end {
                    continue;
                }
                (point - win_start + offset, "V".to_owned())
            };
            label_col = label_col.max(col + marker.len());
            marked.push((col, marker, row.ok, row.label.clone()));
        }

        for (col, marker, ok, label) in marked {
            lines.push(format!(
                "     | {}{}{} {} {}",
                " ".repeat(col),
                marker,
                " ".repeat(label_col - col - marker.len() + 1),
                if ok { "success" } else { "failure" },
                label,
            ));
        }

        write!(f, "{}", lines.join("\n"))
    }
}
