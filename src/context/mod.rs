//! Repository context: root discovery and anchor path arithmetic.

mod resolver;

pub use resolver::{PathResolver, ROOT_ANCHOR, depth, find_repo_root, normalize_lexically, relate};
