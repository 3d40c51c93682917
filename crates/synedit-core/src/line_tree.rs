//! Red-black tree of document lines.
//!
//! Each node is one line, weighted by its total length (content plus delimiter). Every node
//! caches the sum of lengths, node count and line heights of its subtree so offset, row and
//! y-position lookups are O(log n).
//!
//! Nodes live in an arena and are addressed by [`LineId`], which carries a generation so a
//! handle to a removed line never aliases a later line that reuses the slot. Removal never
//! moves line data between nodes: when a node with two children is removed its in-order
//! successor is relinked into its place, so the ids of all surviving lines stay valid.

/// Stable identity of a line.
///
/// Survives insertions and removals of other lines. Invalidated when the line itself is
/// removed or when the tree is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId {
    index: u32,
    generation: u32,
}

/// Per-line data stored in the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineData {
    /// Length including the delimiter, in UTF-16 code units.
    pub total_length: usize,
    /// Length of the delimiter (0, 1 or 2).
    pub delimiter_length: usize,
    /// Layout height of the line.
    pub height: f64,
}

impl LineData {
    pub(crate) fn new(total_length: usize, delimiter_length: usize, height: f64) -> Self {
        Self {
            total_length,
            delimiter_length,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node {
    generation: u32,
    live: bool,
    parent: Option<u32>,
    left: Option<u32>,
    right: Option<u32>,
    color: Color,
    data: LineData,
    subtree_length: usize,
    subtree_count: usize,
    subtree_height: f64,
}

/// Arena-backed red-black tree of lines. Always holds at least one line.
#[derive(Debug, Clone)]
pub(crate) struct LineTree {
    nodes: Vec<Node>,
    free: Vec<u32>,
    root: Option<u32>,
}

impl LineTree {
    pub(crate) fn new(root_data: LineData) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        };
        tree.reset(root_data);
        tree
    }

    /// Drop every line and start over with a single line. All previous ids become stale.
    pub(crate) fn reset(&mut self, root_data: LineData) -> LineId {
        self.clear();
        let root = self.alloc(root_data);
        self.nodes[root as usize].color = Color::Black;
        self.root = Some(root);
        self.id_of(root)
    }

    /// Replace all lines with `lines` in order, building a balanced tree. All previous ids
    /// become stale.
    pub(crate) fn rebuild(&mut self, lines: &[LineData]) -> Vec<LineId> {
        if lines.is_empty() {
            return vec![self.reset(LineData::new(0, 0, 0.0))];
        }
        self.clear();
        let indices: Vec<u32> = lines.iter().map(|data| self.alloc(*data)).collect();
        let height = tree_height(indices.len());
        let root = self.build(&indices, height);
        if let Some(root) = root {
            self.nodes[root as usize].parent = None;
            self.nodes[root as usize].color = Color::Black;
        }
        self.root = root;
        indices.into_iter().map(|i| self.id_of(i)).collect()
    }

    fn clear(&mut self) {
        self.free.clear();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.live {
                node.live = false;
                node.generation = node.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        // Reuse low slots first.
        self.free.reverse();
        self.root = None;
    }

    fn build(&mut self, indices: &[u32], subtree_height: usize) -> Option<u32> {
        if indices.is_empty() {
            return None;
        }
        let middle = indices.len() / 2;
        let node = indices[middle];
        let left = self.build(&indices[..middle], subtree_height.saturating_sub(1));
        let right = self.build(&indices[middle + 1..], subtree_height.saturating_sub(1));
        {
            let n = &mut self.nodes[node as usize];
            n.left = left;
            n.right = right;
            n.color = if subtree_height == 1 {
                Color::Red
            } else {
                Color::Black
            };
        }
        if let Some(left) = left {
            self.nodes[left as usize].parent = Some(node);
        }
        if let Some(right) = right {
            self.nodes[right as usize].parent = Some(node);
        }
        self.recompute(node);
        Some(node)
    }

    fn alloc(&mut self, data: LineData) -> u32 {
        let node = Node {
            generation: 0,
            live: true,
            parent: None,
            left: None,
            right: None,
            color: Color::Red,
            data,
            subtree_length: data.total_length,
            subtree_count: 1,
            subtree_height: data.height,
        };
        match self.free.pop() {
            Some(index) => {
                let generation = self.nodes[index as usize].generation;
                self.nodes[index as usize] = Node { generation, ..node };
                index
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn release(&mut self, index: u32) {
        let node = &mut self.nodes[index as usize];
        node.live = false;
        node.generation = node.generation.wrapping_add(1);
        node.parent = None;
        node.left = None;
        node.right = None;
        self.free.push(index);
    }

    fn id_of(&self, index: u32) -> LineId {
        LineId {
            index,
            generation: self.nodes[index as usize].generation,
        }
    }

    fn resolve(&self, id: LineId) -> Option<u32> {
        let node = self.nodes.get(id.index as usize)?;
        (node.live && node.generation == id.generation).then_some(id.index)
    }

    /// Whether `id` refers to a line that still exists.
    #[cfg(test)]
    pub(crate) fn contains(&self, id: LineId) -> bool {
        self.resolve(id).is_some()
    }

    pub(crate) fn data(&self, id: LineId) -> Option<LineData> {
        self.resolve(id).map(|i| self.nodes[i as usize].data)
    }

    /// Update a line's data and refresh the cached aggregates of its ancestors.
    pub(crate) fn update(&mut self, id: LineId, f: impl FnOnce(&mut LineData)) -> bool {
        let Some(index) = self.resolve(id) else {
            return false;
        };
        f(&mut self.nodes[index as usize].data);
        self.update_to_root(index);
        true
    }

    pub(crate) fn node_count(&self) -> usize {
        self.root
            .map_or(0, |root| self.nodes[root as usize].subtree_count)
    }

    pub(crate) fn total_length(&self) -> usize {
        self.root
            .map_or(0, |root| self.nodes[root as usize].subtree_length)
    }

    pub(crate) fn total_height(&self) -> f64 {
        self.root
            .map_or(0.0, |root| self.nodes[root as usize].subtree_height)
    }

    pub(crate) fn first(&self) -> Option<LineId> {
        self.root.map(|root| self.id_of(self.leftmost(root)))
    }

    pub(crate) fn last(&self) -> Option<LineId> {
        self.root.map(|root| self.id_of(self.rightmost(root)))
    }

    pub(crate) fn next(&self, id: LineId) -> Option<LineId> {
        let index = self.resolve(id)?;
        self.successor(index).map(|i| self.id_of(i))
    }

    pub(crate) fn previous(&self, id: LineId) -> Option<LineId> {
        let index = self.resolve(id)?;
        self.predecessor(index).map(|i| self.id_of(i))
    }

    /// The line containing `location`. `location == total_length` yields the last line.
    pub(crate) fn node_containing_location(&self, location: usize) -> Option<LineId> {
        let root = self.root?;
        let total = self.nodes[root as usize].subtree_length;
        if location > total {
            return None;
        }
        if location == total {
            return Some(self.id_of(self.rightmost(root)));
        }
        let mut remaining = location;
        let mut index = root;
        loop {
            let node = &self.nodes[index as usize];
            let left_length = self.subtree_length(node.left);
            if let Some(left) = node.left
                && remaining < left_length
            {
                index = left;
                continue;
            }
            remaining -= left_length;
            if remaining < node.data.total_length {
                return Some(self.id_of(index));
            }
            remaining -= node.data.total_length;
            index = node.right?;
        }
    }

    /// The line at in-order position `row`.
    pub(crate) fn node_at_index(&self, row: usize) -> Option<LineId> {
        let mut remaining = row;
        let mut index = self.root?;
        loop {
            let node = &self.nodes[index as usize];
            let left_count = node
                .left
                .map_or(0, |l| self.nodes[l as usize].subtree_count);
            if remaining < left_count {
                index = node.left?;
            } else if remaining == left_count {
                return Some(self.id_of(index));
            } else {
                remaining -= left_count + 1;
                index = node.right?;
            }
        }
    }

    /// The line whose vertical extent contains `y`. Offsets past the end yield the last line.
    pub(crate) fn node_containing_y(&self, y: f64) -> Option<LineId> {
        let root = self.root?;
        if y < 0.0 {
            return None;
        }
        if y >= self.nodes[root as usize].subtree_height {
            return Some(self.id_of(self.rightmost(root)));
        }
        let mut remaining = y;
        let mut index = root;
        loop {
            let node = &self.nodes[index as usize];
            let left_height = node
                .left
                .map_or(0.0, |l| self.nodes[l as usize].subtree_height);
            if let Some(left) = node.left
                && remaining < left_height
            {
                index = left;
                continue;
            }
            remaining -= left_height;
            if remaining < node.data.height {
                return Some(self.id_of(index));
            }
            remaining -= node.data.height;
            match node.right {
                Some(right) => index = right,
                None => return Some(self.id_of(index)),
            }
        }
    }

    /// Character offset of the first code unit of the line.
    pub(crate) fn location_of(&self, id: LineId) -> Option<usize> {
        let index = self.resolve(id)?;
        let mut location = self.subtree_length(self.nodes[index as usize].left);
        self.walk_up(index, |tree, parent| {
            location += tree.subtree_length(tree.nodes[parent as usize].left)
                + tree.nodes[parent as usize].data.total_length;
        });
        Some(location)
    }

    /// Row of the line.
    pub(crate) fn index_of(&self, id: LineId) -> Option<usize> {
        let index = self.resolve(id)?;
        let count = |tree: &Self, child: Option<u32>| {
            child.map_or(0, |c| tree.nodes[c as usize].subtree_count)
        };
        let mut row = count(self, self.nodes[index as usize].left);
        self.walk_up(index, |tree, parent| {
            row += count(tree, tree.nodes[parent as usize].left) + 1;
        });
        Some(row)
    }

    /// Sum of the heights of all preceding lines.
    pub(crate) fn y_position_of(&self, id: LineId) -> Option<f64> {
        let index = self.resolve(id)?;
        let height = |tree: &Self, child: Option<u32>| {
            child.map_or(0.0, |c| tree.nodes[c as usize].subtree_height)
        };
        let mut y = height(self, self.nodes[index as usize].left);
        self.walk_up(index, |tree, parent| {
            y += height(tree, tree.nodes[parent as usize].left)
                + tree.nodes[parent as usize].data.height;
        });
        Some(y)
    }

    /// Calls `f` with every ancestor of `index` whose right subtree contains `index`.
    fn walk_up(&self, index: u32, mut f: impl FnMut(&Self, u32)) {
        let mut current = index;
        while let Some(parent) = self.nodes[current as usize].parent {
            if self.nodes[parent as usize].right == Some(current) {
                f(self, parent);
            }
            current = parent;
        }
    }

    /// Insert a new line directly after `after`.
    pub(crate) fn insert_after(&mut self, after: LineId, data: LineData) -> Option<LineId> {
        let after = self.resolve(after)?;
        let new = self.alloc(data);
        match self.nodes[after as usize].right {
            None => self.insert_as_right(after, new),
            Some(right) => {
                let parent = self.leftmost(right);
                self.insert_as_left(parent, new);
            }
        }
        Some(self.id_of(new))
    }

    /// Remove a line. Returns `false` if the id was stale or it is the only line.
    pub(crate) fn remove(&mut self, id: LineId) -> bool {
        let Some(index) = self.resolve(id) else {
            return false;
        };
        if self.node_count() <= 1 {
            return false;
        }
        self.unlink(index);
        self.release(index);
        true
    }

    pub(crate) fn iter(&self) -> LineTreeIter<'_> {
        LineTreeIter {
            tree: self,
            next: self.root.map(|root| self.leftmost(root)),
        }
    }

    fn subtree_length(&self, node: Option<u32>) -> usize {
        node.map_or(0, |n| self.nodes[n as usize].subtree_length)
    }

    fn leftmost(&self, mut index: u32) -> u32 {
        while let Some(left) = self.nodes[index as usize].left {
            index = left;
        }
        index
    }

    fn rightmost(&self, mut index: u32) -> u32 {
        while let Some(right) = self.nodes[index as usize].right {
            index = right;
        }
        index
    }

    fn successor(&self, index: u32) -> Option<u32> {
        if let Some(right) = self.nodes[index as usize].right {
            return Some(self.leftmost(right));
        }
        let mut current = index;
        while let Some(parent) = self.nodes[current as usize].parent {
            if self.nodes[parent as usize].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    fn predecessor(&self, index: u32) -> Option<u32> {
        if let Some(left) = self.nodes[index as usize].left {
            return Some(self.rightmost(left));
        }
        let mut current = index;
        while let Some(parent) = self.nodes[current as usize].parent {
            if self.nodes[parent as usize].right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    fn recompute(&mut self, index: u32) {
        let (left, right) = {
            let node = &self.nodes[index as usize];
            (node.left, node.right)
        };
        let mut length = 0;
        let mut count = 1;
        let mut height = 0.0;
        for child in [left, right].into_iter().flatten() {
            let child = &self.nodes[child as usize];
            length += child.subtree_length;
            count += child.subtree_count;
            height += child.subtree_height;
        }
        let node = &mut self.nodes[index as usize];
        node.subtree_length = length + node.data.total_length;
        node.subtree_count = count;
        node.subtree_height = height + node.data.height;
    }

    fn update_to_root(&mut self, index: u32) {
        let mut current = Some(index);
        while let Some(node) = current {
            self.recompute(node);
            current = self.nodes[node as usize].parent;
        }
    }

    fn color(&self, node: Option<u32>) -> Color {
        node.map_or(Color::Black, |n| self.nodes[n as usize].color)
    }

    fn set_color(&mut self, node: Option<u32>, color: Color) {
        if let Some(n) = node {
            self.nodes[n as usize].color = color;
        }
    }

    fn left(&self, node: u32) -> Option<u32> {
        self.nodes[node as usize].left
    }

    fn right(&self, node: u32) -> Option<u32> {
        self.nodes[node as usize].right
    }

    fn parent(&self, node: u32) -> Option<u32> {
        self.nodes[node as usize].parent
    }

    fn replace_node(&mut self, replaced: u32, new: Option<u32>) {
        let parent = self.parent(replaced);
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.left(p) == Some(replaced) {
                    self.nodes[p as usize].left = new;
                } else {
                    self.nodes[p as usize].right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n as usize].parent = parent;
        }
        self.nodes[replaced as usize].parent = None;
    }

    fn rotate_left(&mut self, p: u32) {
        let Some(q) = self.right(p) else {
            debug_assert!(false, "rotate_left without right child");
            return;
        };
        self.replace_node(p, Some(q));
        let inner = self.left(q);
        self.nodes[p as usize].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner as usize].parent = Some(p);
        }
        self.nodes[q as usize].left = Some(p);
        self.nodes[p as usize].parent = Some(q);
        self.recompute(p);
        self.recompute(q);
    }

    fn rotate_right(&mut self, p: u32) {
        let Some(q) = self.left(p) else {
            debug_assert!(false, "rotate_right without left child");
            return;
        };
        self.replace_node(p, Some(q));
        let inner = self.right(q);
        self.nodes[p as usize].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner as usize].parent = Some(p);
        }
        self.nodes[q as usize].right = Some(p);
        self.nodes[p as usize].parent = Some(q);
        self.recompute(p);
        self.recompute(q);
    }

    fn insert_as_left(&mut self, parent: u32, new: u32) {
        self.nodes[parent as usize].left = Some(new);
        self.nodes[new as usize].parent = Some(parent);
        self.nodes[new as usize].color = Color::Red;
        self.update_to_root(parent);
        self.fix_after_insert(new);
    }

    fn insert_as_right(&mut self, parent: u32, new: u32) {
        self.nodes[parent as usize].right = Some(new);
        self.nodes[new as usize].parent = Some(parent);
        self.nodes[new as usize].color = Color::Red;
        self.update_to_root(parent);
        self.fix_after_insert(new);
    }

    fn fix_after_insert(&mut self, mut node: u32) {
        loop {
            let Some(mut parent) = self.parent(node) else {
                self.nodes[node as usize].color = Color::Black;
                return;
            };
            if self.nodes[parent as usize].color == Color::Black {
                return;
            }
            let Some(grandparent) = self.parent(parent) else {
                self.nodes[parent as usize].color = Color::Black;
                return;
            };
            let uncle = if self.left(grandparent) == Some(parent) {
                self.right(grandparent)
            } else {
                self.left(grandparent)
            };
            if self.color(uncle) == Color::Red {
                self.set_color(Some(parent), Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(Some(grandparent), Color::Red);
                node = grandparent;
                continue;
            }
            if self.right(parent) == Some(node) && self.left(grandparent) == Some(parent) {
                self.rotate_left(parent);
                node = parent;
            } else if self.left(parent) == Some(node) && self.right(grandparent) == Some(parent) {
                self.rotate_right(parent);
                node = parent;
            }
            let Some(new_parent) = self.parent(node) else {
                return;
            };
            parent = new_parent;
            let Some(grandparent) = self.parent(parent) else {
                return;
            };
            self.set_color(Some(parent), Color::Black);
            self.set_color(Some(grandparent), Color::Red);
            if self.left(parent) == Some(node) && self.left(grandparent) == Some(parent) {
                self.rotate_right(grandparent);
            } else {
                self.rotate_left(grandparent);
            }
            return;
        }
    }

    fn unlink(&mut self, node: u32) {
        if let (Some(_), Some(right)) = (self.left(node), self.right(node)) {
            // Relink the successor into this position rather than moving data, so the
            // successor's id stays valid.
            let successor = self.leftmost(right);
            self.unlink(successor);
            self.replace_node(node, Some(successor));
            let (left, right) = (self.left(node), self.right(node));
            self.nodes[successor as usize].left = left;
            if let Some(left) = left {
                self.nodes[left as usize].parent = Some(successor);
            }
            self.nodes[successor as usize].right = right;
            if let Some(right) = right {
                self.nodes[right as usize].parent = Some(successor);
            }
            self.nodes[successor as usize].color = self.nodes[node as usize].color;
            self.update_to_root(successor);
            return;
        }
        let parent = self.parent(node);
        let child = self.left(node).or(self.right(node));
        self.replace_node(node, child);
        if let Some(parent) = parent {
            self.update_to_root(parent);
        }
        if self.nodes[node as usize].color == Color::Black {
            if self.color(child) == Color::Red {
                self.set_color(child, Color::Black);
            } else {
                self.fix_after_remove(child, parent);
            }
        }
    }

    fn sibling(&self, node: Option<u32>, parent: u32) -> Option<u32> {
        if self.left(parent) == node {
            self.right(parent)
        } else {
            self.left(parent)
        }
    }

    fn fix_after_remove(&mut self, mut node: Option<u32>, mut parent: Option<u32>) {
        loop {
            let Some(p) = parent else {
                return;
            };
            let Some(mut sibling) = self.sibling(node, p) else {
                return;
            };
            if self.nodes[sibling as usize].color == Color::Red {
                self.set_color(Some(p), Color::Red);
                self.set_color(Some(sibling), Color::Black);
                if self.left(p) == node {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                let Some(s) = self.sibling(node, p) else {
                    return;
                };
                sibling = s;
            }
            let sibling_children_black = self.color(self.left(sibling)) == Color::Black
                && self.color(self.right(sibling)) == Color::Black;
            if self.nodes[p as usize].color == Color::Black
                && self.nodes[sibling as usize].color == Color::Black
                && sibling_children_black
            {
                self.set_color(Some(sibling), Color::Red);
                node = Some(p);
                parent = self.parent(p);
                continue;
            }
            if self.nodes[p as usize].color == Color::Red
                && self.nodes[sibling as usize].color == Color::Black
                && sibling_children_black
            {
                self.set_color(Some(sibling), Color::Red);
                self.set_color(Some(p), Color::Black);
                return;
            }
            if self.left(p) == node
                && self.nodes[sibling as usize].color == Color::Black
                && self.color(self.left(sibling)) == Color::Red
                && self.color(self.right(sibling)) == Color::Black
            {
                self.set_color(Some(sibling), Color::Red);
                self.set_color(self.left(sibling), Color::Black);
                self.rotate_right(sibling);
            } else if self.right(p) == node
                && self.nodes[sibling as usize].color == Color::Black
                && self.color(self.right(sibling)) == Color::Red
                && self.color(self.left(sibling)) == Color::Black
            {
                self.set_color(Some(sibling), Color::Red);
                self.set_color(self.right(sibling), Color::Black);
                self.rotate_left(sibling);
            }
            let Some(sibling) = self.sibling(node, p) else {
                return;
            };
            let parent_color = self.nodes[p as usize].color;
            self.set_color(Some(sibling), parent_color);
            self.set_color(Some(p), Color::Black);
            if self.left(p) == node {
                self.set_color(self.right(sibling), Color::Black);
                self.rotate_left(p);
            } else {
                self.set_color(self.left(sibling), Color::Black);
                self.rotate_right(p);
            }
            return;
        }
    }

    /// Check the red-black and aggregate invariants. Returns the black height.
    #[cfg(test)]
    pub(crate) fn assert_valid(&self) -> usize {
        fn check(tree: &LineTree, node: Option<u32>, parent: Option<u32>) -> usize {
            let Some(n) = node else {
                return 1;
            };
            let entry = &tree.nodes[n as usize];
            assert!(entry.live);
            assert_eq!(entry.parent, parent);
            if entry.color == Color::Red {
                assert_eq!(tree.color(entry.left), Color::Black);
                assert_eq!(tree.color(entry.right), Color::Black);
            }
            let left = check(tree, entry.left, node);
            let right = check(tree, entry.right, node);
            assert_eq!(left, right, "black height mismatch");
            let expected_length = tree.subtree_length(entry.left)
                + tree.subtree_length(entry.right)
                + entry.data.total_length;
            assert_eq!(entry.subtree_length, expected_length);
            left + usize::from(entry.color == Color::Black)
        }
        assert_eq!(self.color(self.root), Color::Black);
        check(self, self.root, None)
    }
}

fn tree_height(size: usize) -> usize {
    if size == 0 {
        0
    } else {
        tree_height(size / 2) + 1
    }
}

/// In-order iterator over line ids.
pub(crate) struct LineTreeIter<'a> {
    tree: &'a LineTree,
    next: Option<u32>,
}

impl Iterator for LineTreeIter<'_> {
    type Item = LineId;

    fn next(&mut self) -> Option<LineId> {
        let current = self.next?;
        self.next = self.tree.successor(current);
        Some(self.tree.id_of(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(length: usize) -> LineData {
        LineData::new(length, 0, 1.0)
    }

    #[test]
    fn test_rebuild_is_balanced() {
        let mut tree = LineTree::new(data(0));
        let lines: Vec<LineData> = (1..=100).map(data).collect();
        let ids = tree.rebuild(&lines);
        tree.assert_valid();
        assert_eq!(tree.node_count(), 100);
        assert_eq!(tree.total_length(), (1..=100).sum::<usize>());
        assert_eq!(tree.index_of(ids[42]), Some(42));
        assert_eq!(tree.node_at_index(42), Some(ids[42]));
    }

    #[test]
    fn test_insert_and_remove_keep_ids_stable() {
        let mut tree = LineTree::new(data(1));
        let first = tree.first().unwrap();
        let mut ids = vec![first];
        for i in 0..64 {
            let after = ids[ids.len() / 2];
            let id = tree.insert_after(after, data(i + 2)).unwrap();
            let position = ids.iter().position(|x| *x == after).unwrap();
            ids.insert(position + 1, id);
            tree.assert_valid();
        }
        let in_order: Vec<LineId> = tree.iter().collect();
        assert_eq!(in_order, ids);

        // Remove nodes that have two children as well as leaves.
        for _ in 0..40 {
            let victim = ids.remove(ids.len() / 3);
            assert!(tree.remove(victim));
            assert!(!tree.contains(victim));
            tree.assert_valid();
            let in_order: Vec<LineId> = tree.iter().collect();
            assert_eq!(in_order, ids);
        }
        for (row, id) in ids.iter().enumerate() {
            assert_eq!(tree.index_of(*id), Some(row));
        }
    }

    #[test]
    fn test_stale_id_after_slot_reuse() {
        let mut tree = LineTree::new(data(1));
        let first = tree.first().unwrap();
        let second = tree.insert_after(first, data(2)).unwrap();
        assert!(tree.remove(second));
        let third = tree.insert_after(first, data(3)).unwrap();
        assert!(!tree.contains(second));
        assert!(tree.contains(third));
        assert_eq!(tree.data(second), None);
    }

    #[test]
    fn test_node_containing_location() {
        let mut tree = LineTree::new(data(0));
        let ids = tree.rebuild(&[data(3), data(3), data(0)]);
        assert_eq!(tree.node_containing_location(0), Some(ids[0]));
        assert_eq!(tree.node_containing_location(2), Some(ids[0]));
        assert_eq!(tree.node_containing_location(3), Some(ids[1]));
        assert_eq!(tree.node_containing_location(6), Some(ids[2]));
        assert_eq!(tree.node_containing_location(7), None);
        assert_eq!(tree.location_of(ids[1]), Some(3));
        assert_eq!(tree.y_position_of(ids[2]), Some(2.0));
    }
}
