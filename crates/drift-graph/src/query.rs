use std::collections::{HashSet, VecDeque};

use crate::build::DependencyGraph;

impl DependencyGraph {
    pub fn dependencies(&self, address: &str) -> Vec<String> {
        self.nodes.get(address).map(|n| n.dependencies.clone()).unwrap_or_default()
    }

    pub fn dependents(&self, address: &str) -> Vec<String> {
        self.nodes.get(address).map(|n| n.dependents.clone()).unwrap_or_default()
    }

    pub fn transitive_dependencies(&self, address: &str) -> Vec<String> {
        self.walk(address, |n| &n.dependencies)
    }

    pub fn transitive_dependents(&self, address: &str) -> Vec<String> {
        self.walk(address, |n| &n.dependents)
    }

    /// `BlastRadius(addr) = TransitiveDependents(addr)`.
    pub fn blast_radius(&self, address: &str) -> Vec<String> {
        self.transitive_dependents(address)
    }

    /// Longest dependency chain in the graph, by node count.
    pub fn critical_path(&self) -> Vec<String> {
        let mut memo: std::collections::HashMap<String, Vec<String>> = std::collections::HashMap::new();
        let mut best: Vec<String> = Vec::new();
        for addr in self.nodes.keys() {
            let path = self.longest_path_from(addr, &mut memo);
            if path.len() > best.len() {
                best = path;
            }
        }
        best
    }

    fn longest_path_from(&self, addr: &str, memo: &mut std::collections::HashMap<String, Vec<String>>) -> Vec<String> {
        if let Some(path) = memo.get(addr) {
            return path.clone();
        }
        let deps = self.dependencies(addr);
        let mut best_suffix: Vec<String> = Vec::new();
        for dep in &deps {
            let candidate = self.longest_path_from(dep, memo);
            if candidate.len() > best_suffix.len() {
                best_suffix = candidate;
            }
        }
        let mut path = vec![addr.to_string()];
        path.extend(best_suffix);
        memo.insert(addr.to_string(), path.clone());
        path
    }

    /// Nodes with neither dependency nor dependent edges.
    pub fn orphaned_resources(&self) -> Vec<String> {
        self.nodes
            .values()
            .filter(|n| n.dependencies.is_empty() && n.dependents.is_empty())
            .map(|n| n.address.clone())
            .collect()
    }

    fn walk<'a, F>(&'a self, address: &str, edges_of: F) -> Vec<String>
    where
        F: Fn(&'a crate::node::ResourceNode) -> &'a Vec<String>,
    {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(address.to_string());
        visited.insert(address.to_string());

        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            let Some(node) = self.nodes.get(&current) else { continue };
            for next in edges_of(node) {
                if visited.insert(next.clone()) {
                    result.push(next.clone());
                    queue.push_back(next.clone());
                }
            }
        }
        result
    }
}
