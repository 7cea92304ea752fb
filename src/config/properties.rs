use crate::infrastructure::ConfigError;
use ini::{Ini, ParseOption};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 分节的键值属性文件（INI 语法）
///
/// 值按原样读取，不处理引号和转义；键名统一转为小写。
#[derive(Debug, Clone)]
pub struct PropertySet {
    path: PathBuf,
    sections: HashMap<String, HashMap<String, String>>,
}

impl PropertySet {
    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// 解析文本内容；`path` 只用于错误信息
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, options).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (name, properties) in ini.iter() {
            // 节之前的裸键值不属于任何节，忽略
            let Some(name) = name else {
                continue;
            };
            sections.entry(name.to_string()).or_default().extend(
                properties
                    .iter()
                    .map(|(key, value)| (key.to_lowercase(), value.to_string())),
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            sections,
        })
    }

    /// 获取指定节，不存在时返回 None
    pub fn section(&self, name: &str) -> Option<Section<'_>> {
        self.sections.get(name).map(|values| Section {
            path: &self.path,
            name: name.to_string(),
            values,
        })
    }

    /// 获取必需的节
    pub fn require_section(&self, name: &str) -> Result<Section<'_>, ConfigError> {
        self.section(name).ok_or_else(|| ConfigError::MissingSection {
            path: self.path.clone(),
            section: name.to_string(),
        })
    }
}

/// 属性文件中的一个节
#[derive(Debug, Clone)]
pub struct Section<'a> {
    path: &'a Path,
    name: String,
    values: &'a HashMap<String, String>,
}

impl<'a> Section<'a> {
    /// 读取非空值，空白字符串视为缺失
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::missing_key(self.path, &self.name, key))
    }

    /// 仅当值为 "yes" 时开启
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("yes")
    }

    /// 空格分隔的列表
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn seconds(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<u64>()
                .map(Some)
                .map_err(|e| ConfigError::invalid(key, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> PropertySet {
        PropertySet::parse(Path::new("test.properties"), content).unwrap()
    }

    #[test]
    fn test_sections_and_values() {
        let props = parse(
            "
[PROPERTIES]
commit_message = bump version
extensions = java xml
stash_before_work = yes
pull_before_work = no
",
        );
        let section = props.section("PROPERTIES").unwrap();
        assert_eq!(section.get("commit_message"), Some("bump version"));
        assert_eq!(section.list("extensions"), vec!["java", "xml"]);
        assert!(section.flag("stash_before_work"));
        assert!(!section.flag("pull_before_work"));
        assert!(!section.flag("checkout_to_master_before_work"));
        assert!(props.section("BITBUCKET").is_none());
    }

    #[test]
    fn test_keys_are_lowercased_and_comments_skipped() {
        let props = parse("# header\n[S]\n; note\nCommit_Message=hello world\nreviewers = {a} {b}\n");
        let section = props.section("S").unwrap();
        assert_eq!(section.get("commit_message"), Some("hello world"));
        assert_eq!(section.list("reviewers"), vec!["{a}", "{b}"]);
    }

    #[test]
    fn test_values_are_taken_verbatim() {
        let props = parse("[S]\nmessage = fix \"quoted\" path C:\\temp\n");
        let section = props.section("S").unwrap();
        assert_eq!(section.get("message"), Some("fix \"quoted\" path C:\\temp"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let props = parse("[S]\nkey =   \n");
        let section = props.section("S").unwrap();
        assert!(section.get("key").is_none());
        assert!(matches!(
            section.require("key"),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_missing_section_and_bad_syntax() {
        let props = parse("[A]\nx = 1\n");
        assert!(matches!(
            props.require_section("B"),
            Err(ConfigError::MissingSection { .. })
        ));

        let err = PropertySet::parse(Path::new("bad"), "[A\nx = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_seconds() {
        let props = parse("[S]\ntimeout = 15\nlater = soon\n");
        let section = props.section("S").unwrap();
        assert_eq!(section.seconds("timeout").unwrap(), Some(15));
        assert_eq!(section.seconds("absent").unwrap(), None);
        assert!(matches!(
            section.seconds("later"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
