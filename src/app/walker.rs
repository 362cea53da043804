use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use ignore::{Walk, WalkBuilder};

use crate::app::error::TransferError;
use crate::app::models::{EntryKind, TreeEntry};

/// Deepest entry (relative to the walk root) a walk will accept.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOrder {
    PreOrder,
    PostOrder,
}

/// Sorted walk over a tree with every `ignore` filter off; symlinks are never followed.
pub struct TreeWalker {
    root: PathBuf,
    order: WalkOrder,
    max_depth: usize,
}

impl TreeWalker {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            order: WalkOrder::PreOrder,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn order(mut self, order: WalkOrder) -> Self {
        self.order = order;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn walk(&self) -> TreeWalk {
        // One level past the limit so an over-deep entry is seen and rejected
        // rather than silently dropped.
        let inner = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(Some(self.max_depth.saturating_add(1)))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        TreeWalk {
            inner,
            order: self.order,
            max_depth: self.max_depth,
            open_dirs: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }
}

/// Iterator returned by [`TreeWalker::walk`]. Stops after the first error.
pub struct TreeWalk {
    inner: Walk,
    order: WalkOrder,
    max_depth: usize,
    // Post-order only: ancestors still waiting for their last descendant.
    open_dirs: Vec<TreeEntry>,
    ready: VecDeque<TreeEntry>,
    finished: bool,
}

impl TreeWalk {
    fn fail(&mut self, message: String) -> Option<Result<TreeEntry, TransferError>> {
        self.finished = true;
        self.open_dirs.clear();
        Some(Err(TransferError::TraversalFailed(message)))
    }

    fn close_dirs_at_or_below(&mut self, depth: usize) {
        while self.open_dirs.last().is_some_and(|dir| dir.depth >= depth) {
            if let Some(dir) = self.open_dirs.pop() {
                self.ready.push_back(dir);
            }
        }
    }
}

impl Iterator for TreeWalk {
    type Item = Result<TreeEntry, TransferError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(Ok(entry));
            }
            if self.finished {
                return None;
            }

            let dent = match self.inner.next() {
                Some(Ok(dent)) => dent,
                Some(Err(err)) => return self.fail(err.to_string()),
                None => {
                    self.finished = true;
                    self.close_dirs_at_or_below(0);
                    continue;
                }
            };

            if dent.depth() > self.max_depth {
                let message = format!(
                    "depth limit of {} exceeded at {}",
                    self.max_depth,
                    dent.path().display()
                );
                return self.fail(message);
            }

            let entry = TreeEntry {
                path: dent.path().to_path_buf(),
                kind: dent.file_type().map_or(EntryKind::Other, EntryKind::from),
                depth: dent.depth(),
            };

            match self.order {
                WalkOrder::PreOrder => return Some(Ok(entry)),
                WalkOrder::PostOrder => {
                    self.close_dirs_at_or_below(entry.depth);
                    if entry.kind == EntryKind::Directory {
                        self.open_dirs.push(entry);
                    } else {
                        self.ready.push_back(entry);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("src");
        fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join(".hidden"), "h").unwrap();
        fs::write(root.join("sub").join("c.txt"), "c").unwrap();
        fs::write(root.join("sub").join("deeper").join("d.txt"), "d").unwrap();
        (tmp, root)
    }

    fn relative_paths(root: &Path, order: WalkOrder) -> Vec<String> {
        TreeWalker::new(root)
            .order(order)
            .walk()
            .map(|res| res.expect("entry"))
            .map(|entry| {
                entry
                    .path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    fn position(paths: &[String], needle: &str) -> usize {
        paths
            .iter()
            .position(|p| p == needle)
            .unwrap_or_else(|| panic!("{needle} missing from {paths:?}"))
    }

    #[test]
    fn pre_order_visits_parents_first_and_includes_hidden() {
        let (_tmp, root) = sample_tree();
        let paths = relative_paths(&root, WalkOrder::PreOrder);

        assert_eq!(paths[0], "");
        assert_eq!(paths.len(), 8);
        assert!(paths.contains(&".hidden".to_string()));
        assert!(position(&paths, "sub") < position(&paths, "sub/c.txt"));
        assert!(position(&paths, "sub/deeper") < position(&paths, "sub/deeper/d.txt"));
    }

    #[test]
    fn post_order_visits_children_first_and_root_last() {
        let (_tmp, root) = sample_tree();
        let paths = relative_paths(&root, WalkOrder::PostOrder);

        assert_eq!(paths.len(), 8);
        assert_eq!(paths.last().map(String::as_str), Some(""));
        assert!(position(&paths, "sub/c.txt") < position(&paths, "sub"));
        assert!(position(&paths, "sub/deeper/d.txt") < position(&paths, "sub/deeper"));
        assert!(position(&paths, "sub/deeper") < position(&paths, "sub"));
        assert!(position(&paths, "empty") < position(&paths, ""));
    }

    #[test]
    fn entries_carry_kind_and_depth() {
        let (_tmp, root) = sample_tree();
        let entries: Vec<TreeEntry> = TreeWalker::new(&root)
            .walk()
            .collect::<Result<_, _>>()
            .unwrap();

        let root_entry = &entries[0];
        assert_eq!(root_entry.kind, EntryKind::Directory);
        assert_eq!(root_entry.depth, 0);

        let deep = entries
            .iter()
            .find(|e| e.path.ends_with("d.txt"))
            .expect("d.txt");
        assert_eq!(deep.kind, EntryKind::File);
        assert_eq!(deep.depth, 3);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reported_not_followed() {
        let (_tmp, root) = sample_tree();
        std::os::unix::fs::symlink(root.join("sub"), root.join("link")).unwrap();

        let entries: Vec<TreeEntry> = TreeWalker::new(&root)
            .walk()
            .collect::<Result<_, _>>()
            .unwrap();

        let link = entries.iter().find(|e| e.path.ends_with("link")).unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert!(!entries
            .iter()
            .any(|e| e.path.starts_with(root.join("link")) && e.depth > 1));
    }

    #[test]
    fn exceeding_depth_limit_fails_the_walk() {
        let (_tmp, root) = sample_tree();
        let results: Vec<_> = TreeWalker::new(&root).max_depth(1).walk().collect();

        let last = results.last().expect("at least one item");
        assert!(matches!(last, Err(TransferError::TraversalFailed(_))));
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn missing_root_fails_the_walk() {
        let tmp = TempDir::new().unwrap();
        let mut walk = TreeWalker::new(&tmp.path().join("nope")).walk();
        assert!(matches!(walk.next(), Some(Err(TransferError::TraversalFailed(_)))));
        assert!(walk.next().is_none());
    }
}
