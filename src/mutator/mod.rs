//! 文件扫描与字面量替换

use crate::infrastructure::{BatchError, BatchResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// 递归收集扩展名在 `extensions` 中的文件
///
/// 扩展名不带点、区分大小写，可以包含多段；不进入 `.git` 目录。结果按路径排序。
pub fn scan(root: &Path, extensions: &BTreeSet<String>) -> BatchResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_git_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            BatchError::file_system(&path, e)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if has_extension(entry.file_name().to_str(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// 文件名以 `.{ext}` 结尾即匹配，`d.ts`、`tar.gz` 这类多段扩展名同样适用
fn has_extension(file_name: Option<&str>, extensions: &BTreeSet<String>) -> bool {
    let Some(name) = file_name else {
        return false;
    };
    extensions.iter().any(|ext| {
        name.len() > ext.len() + 1
            && name.ends_with(ext.as_str())
            && name[..name.len() - ext.len()].ends_with('.')
    })
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == ".git"
}

/// 保留内容中包含 `needle` 的文件，每个文件最多出现一次
///
/// 读取或 UTF-8 解码失败直接返回错误。
pub fn filter_containing(paths: &[PathBuf], needle: &str) -> BatchResult<Vec<PathBuf>> {
    let mut matched = Vec::new();
    for path in paths {
        let content = read_text(path)?;
        if content.contains(needle) {
            matched.push(path.clone());
        }
    }
    Ok(matched)
}

/// 把每个文件中的 `needle` 全部替换为 `replacement` 并写回，返回替换次数
pub fn rewrite(paths: &[PathBuf], needle: &str, replacement: &str) -> BatchResult<usize> {
    if needle.is_empty() {
        return Ok(0);
    }

    let mut total = 0;
    for path in paths {
        let content = read_text(path)?;
        let occurrences = content.matches(needle).count();
        if occurrences == 0 {
            continue;
        }
        let updated = content.replace(needle, replacement);
        std::fs::write(path, updated).map_err(|e| BatchError::file_system(path, e))?;
        tracing::debug!(path = %path.display(), occurrences, "rewrote file");
        total += occurrences;
    }
    Ok(total)
}

fn read_text(path: &Path) -> BatchResult<String> {
    std::fs::read_to_string(path).map_err(|e| BatchError::file_system(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_single_file_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("text.exts"), "some strings here").unwrap();
        fs::write(dir.path().join("other.txt"), "strings").unwrap();

        let files = scan(dir.path(), &exts(&["exts"])).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("text.exts"));
    }

    #[test]
    fn test_scan_is_recursive_and_skips_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/deep/er")).unwrap();
        fs::create_dir_all(dir.path().join(".git/refs")).unwrap();
        fs::write(dir.path().join("a.yml"), "").unwrap();
        fs::write(dir.path().join("src/deep/er/b.yml"), "").unwrap();
        fs::write(dir.path().join("src/c.java"), "").unwrap();
        fs::write(dir.path().join(".git/refs/d.yml"), "").unwrap();
        fs::write(dir.path().join("src/yml"), "").unwrap();

        let files = scan(dir.path(), &exts(&["yml", "java"])).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.yml"),
                PathBuf::from("src/c.java"),
                PathBuf::from("src/deep/er/b.yml"),
            ]
        );
    }

    #[test]
    fn test_scan_multi_dot_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("types.d.ts"), "").unwrap();
        fs::write(dir.path().join("main.ts"), "").unwrap();
        fs::write(dir.path().join("bundle.tar.gz"), "").unwrap();
        fs::write(dir.path().join("notes.gz"), "").unwrap();
        fs::write(dir.path().join("d.ts"), "").unwrap();

        let files = scan(dir.path(), &exts(&["d.ts", "tar.gz"])).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["bundle.tar.gz", "types.d.ts"]);

        // 单段扩展名也匹配多段文件名的最后一段
        let files = scan(dir.path(), &exts(&["ts"])).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_filter_containing_once_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let with = dir.path().join("with.txt");
        let many = dir.path().join("many.txt");
        let without = dir.path().join("without.txt");
        fs::write(&with, "some strings").unwrap();
        fs::write(&many, "strings strings strings").unwrap();
        fs::write(&without, "nothing to see").unwrap();

        let matched = filter_containing(&[with.clone(), without, many.clone()], "strings").unwrap();
        assert_eq!(matched, vec![with, many]);
    }

    #[test]
    fn test_filter_containing_is_literal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "version=1.0").unwrap();

        assert!(filter_containing(&[file.clone()], "1.0").unwrap().len() == 1);
        assert!(filter_containing(&[file], "1.").unwrap().len() == 1);
    }

    #[test]
    fn test_filter_containing_unreadable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("bin.dat");
        fs::write(&binary, [0xffu8, 0xfe, 0x00, 0xc3]).unwrap();
        let missing = dir.path().join("missing.txt");

        assert!(matches!(
            filter_containing(&[binary], "x"),
            Err(BatchError::FileSystem { .. })
        ));
        assert!(matches!(
            filter_containing(&[missing], "x"),
            Err(BatchError::FileSystem { .. })
        ));
    }

    #[test]
    fn test_rewrite_replaces_every_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cfg.properties");
        fs::write(&file, "host=old\nbackup=old\nolder=true\n").unwrap();

        let count = rewrite(&[file.clone()], "old", "new").unwrap();
        assert_eq!(count, 3);
        // 不区分单词边界
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "host=new\nbackup=new\nnewer=true\n"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "foo bar foo").unwrap();

        rewrite(&[file.clone()], "foo", "baz").unwrap();
        let once = fs::read_to_string(&file).unwrap();
        let count = rewrite(&[file.clone()], "foo", "baz").unwrap();
        let twice = fs::read_to_string(&file).unwrap();

        assert_eq!(count, 0);
        assert_eq!(once, twice);
        assert_eq!(twice, "baz bar baz");
    }

    #[test]
    fn test_rewrite_is_not_regex() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a.b axb a.b").unwrap();

        rewrite(&[file.clone()], "a.b", "c").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "c axb c");
    }
}
