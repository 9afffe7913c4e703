//! Character trie over actor ids for interactive prefix lookup.

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
}

impl TrieNode {
    fn collect(&self, prefix: &mut String, out: &mut Vec<String>) {
        if self.terminal {
            out.push(prefix.clone());
        }
        for (ch, child) in &self.children {
            prefix.push(*ch);
            child.collect(prefix, out);
            prefix.pop();
        }
    }

    /// Returns whether `word` was present. Empty branches are pruned on the
    /// way back up.
    fn remove(&mut self, mut chars: std::str::Chars<'_>) -> bool {
        match chars.next() {
            None => std::mem::replace(&mut self.terminal, false),
            Some(ch) => {
                let Some(child) = self.children.get_mut(&ch) else {
                    return false;
                };
                let removed = child.remove(chars);
                if removed && !child.terminal && child.children.is_empty() {
                    self.children.remove(&ch);
                }
                removed
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Trie {
    root: TrieNode,
    len: usize,
}

impl Trie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the word was not already present.
    pub fn insert(&mut self, word: &str) -> bool {
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.terminal {
            return false;
        }
        node.terminal = true;
        self.len += 1;
        true
    }

    pub fn remove(&mut self, word: &str) -> bool {
        let removed = self.root.remove(word.chars());
        if removed {
            self.len -= 1;
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.node(word).is_some_and(|n| n.terminal)
    }

    /// Every stored word starting with `prefix`, in lexicographic order.
    /// An empty prefix matches nothing.
    #[must_use]
    pub fn search(&self, prefix: &str) -> Vec<String> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        if let Some(node) = self.node(prefix) {
            let mut buf = prefix.to_string();
            node.collect(&mut buf, &mut out);
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn node(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in prefix.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }
}
