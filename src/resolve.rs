//! # 路径解析模块
//!
//! 将请求目标映射到文档根目录下的物理文件，并保证不会越出文档根目录。
//!
//! 包含性检查在规范化（解析符号链接、折叠 `.` 与 `..`）之后按路径组件比较，
//! 因此 `/srv/www-secret` 不会被误认为位于 `/srv/www` 之内。

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::fs;

/// 请求目标的规范化。
///
/// * 以 `/` 结尾时追加默认文件名。
/// * 以 `?` 结尾时去掉末尾的一个 `?`。
///
/// 除此之外不处理查询字符串或片段。
pub fn normalize_target(target: &str, default_file_name: &str) -> String {
    if target.ends_with('/') {
        [target, default_file_name].concat()
    } else if let Some(stripped) = target.strip_suffix('?') {
        stripped.to_string()
    } else {
        target.to_string()
    }
}

/// 一次请求的解析结果，每次请求重新计算，不跨请求缓存。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// 规范化后的绝对路径；规范化失败时为拼接得到的原始路径
    absolute_path: PathBuf,
    is_within_root: bool,
    is_readable: bool,
}

impl ResolvedTarget {
    /// 将规范化后的请求目标解析到 `document_root` 之下。
    pub async fn resolve(document_root: &Path, target: &str, id: u128) -> Self {
        let relative = target.strip_prefix('/').unwrap_or(target);
        let candidate = document_root.join(relative);
        debug!("[ID{}]映射物理路径：{}", id, candidate.display());

        let canonical_root = match fs::canonicalize(document_root).await {
            Ok(p) => p,
            Err(e) => {
                warn!("[ID{}]无法规范化文档根目录{}：{}", id, document_root.display(), e);
                return Self::unresolved(candidate);
            }
        };
        let absolute_path = match fs::canonicalize(&candidate).await {
            Ok(p) => p,
            Err(e) => {
                debug!("[ID{}]无法规范化{}：{}", id, candidate.display(), e);
                return Self::unresolved(candidate);
            }
        };

        let is_within_root = absolute_path.starts_with(&canonical_root);
        if !is_within_root {
            warn!(
                "[ID{}]请求路径{}越出文档根目录：{}",
                id,
                target,
                absolute_path.display()
            );
        }
        let is_readable = is_within_root && is_readable_file(&absolute_path).await;

        Self {
            absolute_path,
            is_within_root,
            is_readable,
        }
    }

    fn unresolved(candidate: PathBuf) -> Self {
        Self {
            absolute_path: candidate,
            is_within_root: false,
            is_readable: false,
        }
    }

    /// 只有位于文档根目录之内且可读的文件才能被返回
    pub fn is_servable(&self) -> bool {
        self.is_within_root && self.is_readable
    }
}

impl ResolvedTarget {
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    pub fn is_within_root(&self) -> bool {
        self.is_within_root
    }

    pub fn is_readable(&self) -> bool {
        self.is_readable
    }
}

/// 目录不算可读文件，否则读取时会在发出响应之后才失败
async fn is_readable_file(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => fs::File::open(path).await.is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    /// 构造 `<tmp>/www/index.html`、`<tmp>/www/sub/page.html` 与根目录外的 `<tmp>/secret.txt`
    fn fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("www");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("index.html"), "<h1>index</h1>").unwrap();
        std::fs::write(root.join("sub").join("page.html"), "page").unwrap();
        std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();
        (dir, root)
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(normalize_target("/", "index.html"), "/index.html");
        assert_eq!(normalize_target("/docs/", "home.htm"), "/docs/home.htm");
    }

    #[test]
    fn test_normalize_trailing_question_mark() {
        assert_eq!(normalize_target("/a.html?", "index.html"), "/a.html");
        assert_eq!(normalize_target("/a.html??", "index.html"), "/a.html?");
    }

    #[test]
    fn test_normalize_leaves_other_targets() {
        assert_eq!(normalize_target("/a.html", "index.html"), "/a.html");
        assert_eq!(normalize_target("/a.html?x=1", "index.html"), "/a.html?x=1");
    }

    #[tokio::test]
    async fn test_resolve_existing_file() {
        let (_dir, root) = fixture();
        let resolved = ResolvedTarget::resolve(&root, "/index.html", 0).await;

        assert!(resolved.is_servable());
        assert_eq!(
            resolved.absolute_path(),
            root.join("index.html").canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_resolve_nested_with_dots() {
        let (_dir, root) = fixture();
        let resolved = ResolvedTarget::resolve(&root, "/sub/./../sub/page.html", 0).await;

        assert!(resolved.is_servable());
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let (_dir, root) = fixture();
        let resolved = ResolvedTarget::resolve(&root, "/missing.png", 0).await;

        assert!(!resolved.is_servable());
        assert!(!resolved.is_readable());
    }

    #[tokio::test]
    async fn test_resolve_directory_is_not_readable() {
        let (_dir, root) = fixture();
        let resolved = ResolvedTarget::resolve(&root, "/sub", 0).await;

        assert!(resolved.is_within_root());
        assert!(!resolved.is_readable());
        assert!(!resolved.is_servable());
    }

    #[tokio::test]
    async fn test_resolve_dotdot_traversal() {
        let (_dir, root) = fixture();
        let resolved = ResolvedTarget::resolve(&root, "/../secret.txt", 0).await;

        assert!(!resolved.is_within_root());
        assert!(!resolved.is_servable());
    }

    #[tokio::test]
    async fn test_resolve_absolute_path_injection() {
        let (dir, root) = fixture();
        let secret = dir.path().join("secret.txt");
        let target = format!("/{}", secret.display());

        let resolved = ResolvedTarget::resolve(&root, &target, 0).await;
        assert!(!resolved.is_servable());
    }

    #[tokio::test]
    async fn test_resolve_null_byte() {
        let (_dir, root) = fixture();
        let resolved = ResolvedTarget::resolve(&root, "/index.html\0.png", 0).await;

        assert!(!resolved.is_servable());
    }

    /// 根目录 `www` 与兄弟目录 `www-secret` 共享字符串前缀，
    /// 通过根目录内的符号链接指向兄弟目录时必须被拒绝。
    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_sibling_prefix_via_symlink() {
        let (dir, root) = fixture();
        let sibling = dir.path().join("www-secret");
        std::fs::create_dir(&sibling).unwrap();
        std::fs::write(sibling.join("key.txt"), "key").unwrap();
        std::os::unix::fs::symlink(&sibling, root.join("link")).unwrap();

        let resolved = ResolvedTarget::resolve(&root, "/link/key.txt", 0).await;
        assert!(
            resolved
                .absolute_path()
                .to_string_lossy()
                .starts_with(&*root.canonicalize().unwrap().to_string_lossy())
        );
        assert!(!resolved.is_within_root());
        assert!(!resolved.is_servable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_symlink_inside_root() {
        let (_dir, root) = fixture();
        std::os::unix::fs::symlink(root.join("index.html"), root.join("alias.html")).unwrap();

        let resolved = ResolvedTarget::resolve(&root, "/alias.html", 0).await;
        assert!(resolved.is_servable());
        assert_eq!(
            resolved.absolute_path(),
            root.join("index.html").canonicalize().unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_normalize_question_mark_idempotent(target in "/[a-z/.?]{0,16}\\?") {
            let once = normalize_target(&target, "index.html");
            if !once.ends_with('?') && !once.ends_with('/') {
                prop_assert_eq!(normalize_target(&once, "index.html"), once.clone());
            }
        }

        #[test]
        fn prop_trailing_slash_appends_default(target in "/[a-z/]{0,16}/") {
            prop_assert_eq!(normalize_target(&target, "index.html"), format!("{}index.html", target));
        }

        #[test]
        fn prop_traversal_never_escapes(
            segments in prop::collection::vec(
                prop::sample::select(vec!["..", ".", "sub", "index.html", "secret.txt", "www", ""]),
                0..8,
            )
        ) {
            let (_dir, root) = fixture();
            let target = format!("/{}", segments.join("/"));
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let resolved = runtime.block_on(ResolvedTarget::resolve(&root, &target, 0));

            if resolved.is_servable() {
                prop_assert!(resolved.absolute_path().starts_with(root.canonicalize().unwrap()));
                prop_assert!(resolved.absolute_path().is_file());
            }
        }
    }
}
