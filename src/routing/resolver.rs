//! File resolution
//!
//! Finds the file to serve for an already validated path: tries the exact path
//! and then the index file inside it, applying the symbolic link policy.

use crate::config::ServerConfig;
use crate::error::ServeError;
use crate::events::{EventListener, ServerEvent};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Upper bound on links followed for one candidate
pub const MAX_SYMLINK_DEPTH: usize = 40;

/// File status captured at resolution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub len: u64,
    pub modified: Option<SystemTime>,
    /// Inode number where the platform has one, 0 otherwise
    pub ino: u64,
}

impl From<&Metadata> for FileStat {
    fn from(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            ino: inode(meta),
        }
    }
}

#[cfg(unix)]
fn inode(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
const fn inode(_meta: &Metadata) -> u64 {
    0
}

/// Result of resolving one request
#[derive(Debug)]
pub enum ResolvedTarget {
    File { path: PathBuf, stat: FileStat },
    /// Directory without an index file
    Directory { path: PathBuf },
    NotFound { cause: ServeError },
}

/// What a single candidate turned out to be
enum Entry {
    File(PathBuf, FileStat),
    Directory(PathBuf),
}

/// Resolves validated paths against the filesystem
pub struct PathResolver<'a> {
    index: &'a str,
    follow_symlinks: bool,
    events: &'a dyn EventListener,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a ServerConfig, events: &'a dyn EventListener) -> Self {
        Self {
            index: &config.index,
            follow_symlinks: config.follow_symlinks,
            events,
        }
    }

    /// Candidate files for a path, in the order they are tried
    pub fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![path.to_path_buf()];
        if !self.index.is_empty() {
            candidates.push(path.join(self.index));
        }
        candidates
    }

    /// Resolve a path that already passed root containment.
    ///
    /// The first regular file wins. A directory is only reported when no
    /// candidate is a file; a denied or looping link ends resolution at once.
    pub async fn resolve(&self, path: &Path) -> ResolvedTarget {
        let mut directory = None;

        for candidate in self.candidates(path) {
            match self.stat_candidate(&candidate).await {
                Ok(Entry::File(path, stat)) => return ResolvedTarget::File { path, stat },
                Ok(Entry::Directory(dir)) => {
                    directory.get_or_insert(dir);
                }
                Err(ServeError::NotFound(_)) => {}
                Err(cause) => return ResolvedTarget::NotFound { cause },
            }
        }

        match directory {
            Some(path) => ResolvedTarget::Directory { path },
            None => ResolvedTarget::NotFound {
                cause: ServeError::NotFound(path.display().to_string()),
            },
        }
    }

    /// Link-aware status of one candidate, following links when allowed
    async fn stat_candidate(&self, candidate: &Path) -> Result<Entry, ServeError> {
        let mut current = candidate.to_path_buf();

        for _ in 0..=MAX_SYMLINK_DEPTH {
            let meta = fs::symlink_metadata(&current)
                .await
                .map_err(|_| ServeError::NotFound(current.display().to_string()))?;
            let file_type = meta.file_type();

            if file_type.is_symlink() {
                if !self.follow_symlinks {
                    return Err(ServeError::SymlinkDenied(current));
                }
                let link = fs::read_link(&current)
                    .await
                    .map_err(|_| ServeError::NotFound(current.display().to_string()))?;
                // relative targets are relative to the directory holding the link
                let target = match current.parent() {
                    Some(parent) => parent.join(&link),
                    None => link,
                };
                self.events.on_event(&ServerEvent::SymbolicLink {
                    link: current,
                    target: target.clone(),
                });
                current = target;
            } else if file_type.is_dir() {
                self.reject_linked_ancestors(&current).await?;
                return Ok(Entry::Directory(current));
            } else if file_type.is_file() {
                self.reject_linked_ancestors(&current).await?;
                let stat = FileStat::from(&meta);
                return Ok(Entry::File(current, stat));
            } else {
                return Err(ServeError::NotFound(current.display().to_string()));
            }
        }

        Err(ServeError::SymlinkLoop(candidate.to_path_buf()))
    }

    /// With links disabled, a linked parent directory is denied like a linked file.
    /// The root is canonical, so any link on the way shows up as a differing path.
    async fn reject_linked_ancestors(&self, path: &Path) -> Result<(), ServeError> {
        if self.follow_symlinks {
            return Ok(());
        }
        match fs::canonicalize(path).await {
            Ok(real) if real == path => Ok(()),
            Ok(_) => Err(ServeError::SymlinkDenied(path.to_path_buf())),
            Err(_) => Err(ServeError::NotFound(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopListener;
    use std::sync::Mutex;

    fn fixture() -> (tempfile::TempDir, ServerConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("test.html"), "<h1>test</h1>").unwrap();
        std::fs::create_dir(root.join("docs")).unwrap();
        std::fs::write(root.join("docs").join("index.html"), "docs").unwrap();
        std::fs::create_dir(root.join("empty")).unwrap();
        let config = ServerConfig::new(root).unwrap();
        (dir, config)
    }

    #[tokio::test]
    async fn test_regular_file() {
        let (_dir, config) = fixture();
        let resolver = PathResolver::new(&config, &NoopListener);

        match resolver.resolve(&config.root.join("test.html")).await {
            ResolvedTarget::File { path, stat } => {
                assert_eq!(path, config.root.join("test.html"));
                assert_eq!(stat.len, 13);
                assert!(stat.modified.is_some());
            }
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_directory_index() {
        let (_dir, config) = fixture();
        let resolver = PathResolver::new(&config, &NoopListener);

        match resolver.resolve(&config.root.join("docs")).await {
            ResolvedTarget::File { path, .. } => {
                assert_eq!(path, config.root.join("docs").join("index.html"));
            }
            other => panic!("expected index file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_directory_without_index() {
        let (_dir, config) = fixture();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root.join("empty")).await,
            ResolvedTarget::Directory { path } if path == config.root.join("empty")
        ));
        // root has no index.html either
        assert!(matches!(
            resolver.resolve(&config.root).await,
            ResolvedTarget::Directory { .. }
        ));
    }

    #[tokio::test]
    async fn test_custom_index() {
        let (_dir, config) = fixture();
        let config = config.with_index("test.html").unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root).await,
            ResolvedTarget::File { path, .. } if path == config.root.join("test.html")
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, config) = fixture();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root.join("missing.html")).await,
            ResolvedTarget::NotFound {
                cause: ServeError::NotFound(_)
            }
        ));
    }

    #[test]
    fn test_candidate_order() {
        let (_dir, config) = fixture();
        let resolver = PathResolver::new(&config, &NoopListener);
        let base = config.root.join("docs");
        assert_eq!(
            resolver.candidates(&base),
            vec![base.clone(), base.join("index.html")]
        );

        let config = config.with_index("").unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);
        assert_eq!(resolver.candidates(&base), vec![base]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_denied() {
        let (_dir, config) = fixture();
        std::os::unix::fs::symlink("test.html", config.root.join("link.html")).unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root.join("link.html")).await,
            ResolvedTarget::NotFound {
                cause: ServeError::SymlinkDenied(_)
            }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_followed() {
        let (_dir, config) = fixture();
        let config = config.with_follow_symlinks(true);
        std::os::unix::fs::symlink("test.html", config.root.join("link.html")).unwrap();

        let seen = Mutex::new(Vec::new());
        let listener = |event: &ServerEvent| {
            if let ServerEvent::SymbolicLink { link, target } = event {
                seen.lock().unwrap().push((link.clone(), target.clone()));
            }
        };
        let resolver = PathResolver::new(&config, &listener);

        match resolver.resolve(&config.root.join("link.html")).await {
            ResolvedTarget::File { path, stat } => {
                assert_eq!(path, config.root.join("test.html"));
                assert_eq!(stat.len, 13);
            }
            other => panic!("expected file, got {other:?}"),
        }
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(config.root.join("link.html"), config.root.join("test.html"))]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_to_directory_uses_index() {
        let (_dir, config) = fixture();
        let config = config.with_follow_symlinks(true);
        std::os::unix::fs::symlink("docs", config.root.join("manual")).unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);

        match resolver.resolve(&config.root.join("manual")).await {
            ResolvedTarget::File { path, .. } => {
                assert!(path.ends_with("index.html"));
            }
            other => panic!("expected index file, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_linked_parent_denied() {
        let (_dir, config) = fixture();
        std::os::unix::fs::symlink("docs", config.root.join("manual")).unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root.join("manual").join("index.html")).await,
            ResolvedTarget::NotFound {
                cause: ServeError::SymlinkDenied(_)
            }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_is_bounded() {
        let (_dir, config) = fixture();
        let config = config.with_follow_symlinks(true);
        std::os::unix::fs::symlink("b", config.root.join("a")).unwrap();
        std::os::unix::fs::symlink("a", config.root.join("b")).unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root.join("a")).await,
            ResolvedTarget::NotFound {
                cause: ServeError::SymlinkLoop(_)
            }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink() {
        let (_dir, config) = fixture();
        let config = config.with_follow_symlinks(true);
        std::os::unix::fs::symlink("nowhere.html", config.root.join("dangling")).unwrap();
        let resolver = PathResolver::new(&config, &NoopListener);

        assert!(matches!(
            resolver.resolve(&config.root.join("dangling")).await,
            ResolvedTarget::NotFound {
                cause: ServeError::NotFound(_)
            }
        ));
    }
}
