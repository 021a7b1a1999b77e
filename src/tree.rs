//! Hierarchy helpers over the flat project list.
//!
//! `ProjectTree` indexes parent -> children once so every traversal after
//! that is a map lookup instead of a scan. Ids that are not in the tree are
//! treated as leaves without ancestors.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::db::Database;
use crate::project::Project;
use crate::staff::{Department, Employee};

/// One node of a materialised (possibly filtered) tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub project: &'a Project,
    pub children: Vec<Node<'a>>,
}

/// Adjacency index over a project forest.
pub struct ProjectTree<'a> {
    by_id: HashMap<u64, &'a Project>,
    children: BTreeMap<Option<u64>, Vec<u64>>,
}

impl<'a> ProjectTree<'a> {
    pub fn new(projects: &'a [Project]) -> Self {
        let by_id: HashMap<u64, &Project> = projects.iter().map(|p| (p.id, p)).collect();
        let mut children: BTreeMap<Option<u64>, Vec<u64>> = BTreeMap::new();
        for p in projects {
            // A dangling parent pointer makes the project a root.
            let parent = p.parent_id.filter(|pid| by_id.contains_key(pid));
            children.entry(parent).or_default().push(p.id);
        }
        for ids in children.values_mut() {
            ids.sort_by_key(|id| (by_id[id].order, *id));
        }
        ProjectTree { by_id, children }
    }

    pub fn get(&self, id: u64) -> Option<&'a Project> {
        self.by_id.get(&id).copied()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn roots(&self) -> &[u64] {
        self.children.get(&None).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: u64) -> &[u64] {
        self.children.get(&Some(id)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: u64) -> bool {
        !self.children(id).is_empty()
    }

    fn parent(&self, id: u64) -> Option<u64> {
        self.get(id)
            .and_then(|p| p.parent_id)
            .filter(|pid| self.contains(*pid))
    }

    /// All descendants in pre-order.
    pub fn descendants(&self, id: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_descendants(id, &mut out, &mut seen);
        out
    }

    fn collect_descendants(&self, id: u64, out: &mut Vec<u64>, seen: &mut HashSet<u64>) {
        for &c in self.children(id) {
            if seen.insert(c) {
                out.push(c);
                self.collect_descendants(c, out, seen);
            }
        }
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: u64) -> Vec<u64> {
        let mut chain = Vec::new();
        let mut cur = self.parent(id);
        while let Some(pid) = cur {
            if chain.contains(&pid) || pid == id {
                break; // cycle guard
            }
            chain.push(pid);
            cur = self.parent(pid);
        }
        chain
    }

    /// Breadcrumb from the root down to the node itself.
    pub fn path(&self, id: u64) -> Vec<&'a Project> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut path: Vec<&Project> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .filter_map(|a| self.get(a))
            .collect();
        path.push(node);
        path
    }

    pub fn depth(&self, id: u64) -> usize {
        self.ancestors(id).len()
    }

    pub fn is_descendant_of(&self, child: u64, ancestor: u64) -> bool {
        self.ancestors(child).contains(&ancestor)
    }

    /// Every project in pre-order with its depth.
    pub fn flatten(&self) -> Vec<(u64, usize)> {
        let mut out = Vec::with_capacity(self.len());
        for &r in self.roots() {
            self.walk(r, 0, &mut out, &|_| true);
        }
        out
    }

    /// Pre-order rows, descending only into expanded nodes.
    pub fn flatten_visible(&self, expanded: &HashSet<u64>) -> Vec<(u64, usize)> {
        let mut out = Vec::new();
        for &r in self.roots() {
            self.walk(r, 0, &mut out, &|id| expanded.contains(&id));
        }
        out
    }

    fn walk(&self, id: u64, depth: usize, out: &mut Vec<(u64, usize)>, descend: &dyn Fn(u64) -> bool) {
        if depth > self.len() {
            return;
        }
        out.push((id, depth));
        if descend(id) {
            for &c in self.children(id) {
                self.walk(c, depth + 1, out, descend);
            }
        }
    }

    /// Keep a node when it matches or when any of its descendants does.
    pub fn filter(&self, predicate: impl Fn(&Project) -> bool) -> Vec<Node<'a>> {
        self.roots()
            .iter()
            .filter_map(|&r| self.filter_node(r, &predicate, 0))
            .collect()
    }

    fn filter_node(&self, id: u64, predicate: &dyn Fn(&Project) -> bool, depth: usize) -> Option<Node<'a>> {
        let project = self.get(id)?;
        if depth > self.len() {
            return None;
        }
        let children: Vec<Node<'a>> = self
            .children(id)
            .iter()
            .filter_map(|&c| self.filter_node(c, predicate, depth + 1))
            .collect();
        if predicate(project) || !children.is_empty() {
            Some(Node { project, children })
        } else {
            None
        }
    }

    /// Ids of projects whose name or description contains the query, plus
    /// every ancestor of a match. An empty query matches everything.
    pub fn search(&self, query: &str) -> HashSet<u64> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.by_id.keys().copied().collect();
        }
        let mut ids = HashSet::new();
        for p in self.by_id.values() {
            if p.name.to_lowercase().contains(&q) || p.description.to_lowercase().contains(&q) {
                ids.insert(p.id);
                ids.extend(self.ancestors(p.id));
            }
        }
        ids
    }
}

/// Flatten a materialised tree back into pre-order.
pub fn flatten_nodes<'a>(nodes: &[Node<'a>]) -> Vec<&'a Project> {
    let mut out = Vec::new();
    fn go<'a>(nodes: &[Node<'a>], out: &mut Vec<&'a Project>) {
        for n in nodes {
            out.push(n.project);
            go(&n.children, out);
        }
    }
    go(nodes, &mut out);
    out
}

/// Find a node anywhere in a materialised tree.
pub fn find_node<'n, 'a>(nodes: &'n [Node<'a>], id: u64) -> Option<&'n Node<'a>> {
    for n in nodes {
        if n.project.id == id {
            return Some(n);
        }
        if let Some(found) = find_node(&n.children, id) {
            return Some(found);
        }
    }
    None
}

/// Departments in display order, each with its employees sorted by last name.
pub fn group_by_department<'a>(
    employees: &[&'a Employee],
    departments: &'a [Department],
) -> Vec<(&'a Department, Vec<&'a Employee>)> {
    let mut depts: Vec<&Department> = departments.iter().collect();
    depts.sort_by_key(|d| (d.order, d.id));
    depts
        .into_iter()
        .map(|d| {
            let mut members: Vec<&Employee> = employees
                .iter()
                .copied()
                .filter(|e| e.department_id == d.id)
                .collect();
            members.sort_by(|a, b| {
                a.last_name
                    .to_lowercase()
                    .cmp(&b.last_name.to_lowercase())
                    .then(a.first_name.cmp(&b.first_name))
            });
            (d, members)
        })
        .collect()
}

/// Employees whose first name, last name, email or position contains the query.
pub fn search_employees<'a>(employees: &'a [Employee], query: &str) -> Vec<&'a Employee> {
    let q = query.trim().to_lowercase();
    employees
        .iter()
        .filter(|e| {
            q.is_empty()
                || e.first_name.to_lowercase().contains(&q)
                || e.last_name.to_lowercase().contains(&q)
                || e.email.to_lowercase().contains(&q)
                || e.position.to_lowercase().contains(&q)
        })
        .collect()
}

pub fn project_names(db: &Database, ids: &[u64]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            db.project(*id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Unknown project".to_string())
        })
        .collect()
}

pub fn employee_names(db: &Database, ids: &[u64]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            db.employee(*id)
                .map(|e| e.full_name())
                .unwrap_or_else(|| "Unknown employee".to_string())
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn p(id: u64, parent: Option<u64>, name: &str, order: i32) -> Project {
        Project {
            id,
            parent_id: parent,
            name: name.to_string(),
            color: "#3B82F6".into(),
            description: String::new(),
            order,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    /// 1 ─┬─ 4 ─┬─ 7
    ///    │     └─ 8
    ///    ├─ 5
    ///    └─ 6
    /// 2 ─── 9
    /// 3
    pub(crate) fn forest() -> Vec<Project> {
        vec![
            p(1, None, "Acme", 1),
            p(2, None, "Sidorov", 2),
            p(3, None, "Internal", 3),
            p(4, Some(1), "Website", 1),
            p(5, Some(1), "Mobile app", 2),
            p(6, Some(1), "CRM", 3),
            p(7, Some(4), "Landing redesign", 1),
            p(8, Some(4), "SEO", 2),
            p(9, Some(2), "Web shop", 1),
        ]
    }

    #[test]
    fn test_children_sorted_by_order() {
        let mut projects = forest();
        projects[3].order = 9; // Website after CRM
        let tree = ProjectTree::new(&projects);
        assert_eq!(tree.roots(), &[1, 2, 3]);
        assert_eq!(tree.children(1), &[5, 6, 4]);
    }

    #[test]
    fn test_descendants_and_ancestors() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        assert_eq!(tree.descendants(1), vec![4, 7, 8, 5, 6]);
        assert!(tree.descendants(7).is_empty());
        assert_eq!(tree.ancestors(8), vec![4, 1]);
        assert!(tree.ancestors(3).is_empty());
        assert!(tree.ancestors(42).is_empty());
        assert_eq!(tree.depth(7), 2);
        assert!(tree.is_descendant_of(7, 1));
        assert!(!tree.is_descendant_of(9, 1));
    }

    #[test]
    fn test_path_is_root_first() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let names: Vec<&str> = tree.path(8).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Website", "SEO"]);
        assert!(tree.path(99).is_empty());
    }

    #[test]
    fn test_cycle_does_not_hang() {
        let projects = vec![p(1, Some(2), "A", 0), p(2, Some(1), "B", 0), p(3, None, "C", 0)];
        let tree = ProjectTree::new(&projects);
        assert_eq!(tree.ancestors(1), vec![2]);
        assert_eq!(tree.roots(), &[3]);
    }

    #[test]
    fn test_flatten_visible_respects_expansion() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let expanded: HashSet<u64> = [1].into_iter().collect();
        let rows: Vec<u64> = tree.flatten_visible(&expanded).into_iter().map(|(id, _)| id).collect();
        assert_eq!(rows, vec![1, 4, 5, 6, 2, 3]);
        assert_eq!(tree.flatten().len(), projects.len());
    }

    #[test]
    fn test_search_keeps_ancestors() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let hits = tree.search("seo");
        let expected: HashSet<u64> = [8, 4, 1].into_iter().collect();
        assert_eq!(hits, expected);
        assert_eq!(tree.search("  ").len(), projects.len());
    }

    #[test]
    fn test_filter_keeps_structure() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let nodes = tree.filter(|p| p.name == "SEO");
        assert_eq!(nodes.len(), 1);
        let flat: Vec<u64> = flatten_nodes(&nodes).iter().map(|p| p.id).collect();
        assert_eq!(flat, vec![1, 4, 8]);
        assert!(find_node(&nodes, 8).is_some());
        assert!(find_node(&nodes, 5).is_none());
        assert_eq!(flatten_nodes(&tree.filter(|_| true)).len(), projects.len());
    }
}
