//! Script file name derivation
//!
//! A slot's declared name (its `name` field, or `script_<ordinal>`) is reduced
//! to `[A-Za-z0-9 _-]`, trimmed, and given the script extension. When two
//! slots reduce to the same name the later ones get `_1`, `_2`, ... in the
//! order they are met.

use std::collections::HashSet;

use crate::config::ExportConfig;

/// Keep only characters that are safe in a file name
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Name without extension and without a trailing `_<digits>` collision suffix
pub fn base_name<'a>(name: &'a str, extension: &str) -> &'a str {
    let stem = name.strip_suffix(extension).unwrap_or(name);
    match stem.rfind('_') {
        Some(pos)
            if pos + 1 < stem.len() && stem[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &stem[..pos]
        }
        _ => stem,
    }
}

/// Hands out unique script names for one traversal
#[derive(Debug, Clone)]
pub struct NameAllocator {
    extension: String,
    fallback_prefix: String,
    used: HashSet<String>,
    ordinal: usize,
}

impl NameAllocator {
    /// Create an allocator using the extension and fallback prefix of `config`
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            extension: config.script_extension.clone(),
            fallback_prefix: config.fallback_prefix.clone(),
            used: HashSet::new(),
            ordinal: 0,
        }
    }

    /// Number of names handed out so far
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Sanitized name with extension, before collision handling
    pub fn safe_name(&self, declared: Option<&str>) -> String {
        let stem = declared.map(sanitize).unwrap_or_default();
        let stem = if stem.is_empty() {
            format!("{}{}", self.fallback_prefix, self.ordinal)
        } else {
            stem
        };
        format!("{}{}", stem, self.extension)
    }

    /// Allocate the next unique name
    pub fn allocate(&mut self, declared: Option<&str>) -> String {
        let safe = self.safe_name(declared);
        let mut name = safe.clone();
        if self.used.contains(&name) {
            let stem = &safe[..safe.len() - self.extension.len()];
            let mut suffix = 1;
            loop {
                name = format!("{}_{}{}", stem, suffix, self.extension);
                if !self.used.contains(&name) {
                    break;
                }
                suffix += 1;
            }
        }
        self.used.insert(name.clone());
        self.ordinal += 1;
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> NameAllocator {
        NameAllocator::new(&ExportConfig::default())
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("  Hello, World! "), "Hello World");
        assert_eq!(sanitize("Äction/../x"), "ctionx");
        assert_eq!(sanitize("keep_me-ok 1"), "keep_me-ok 1");
        assert_eq!(sanitize("😀"), "");
    }

    #[test]
    fn test_collisions_in_order() {
        let mut names = allocator();
        assert_eq!(names.allocate(Some("Test")), "Test.cs");
        assert_eq!(names.allocate(Some("Test")), "Test_1.cs");
        assert_eq!(names.allocate(Some("Test!")), "Test_2.cs");
        assert_eq!(names.allocate(Some("Other")), "Other.cs");
    }

    #[test]
    fn test_collision_skips_taken_suffix() {
        let mut names = allocator();
        assert_eq!(names.allocate(Some("A_1")), "A_1.cs");
        assert_eq!(names.allocate(Some("A")), "A.cs");
        assert_eq!(names.allocate(Some("A")), "A_2.cs");
    }

    #[test]
    fn test_ordinal_fallback() {
        let mut names = allocator();
        assert_eq!(names.allocate(None), "script_0.cs");
        assert_eq!(names.allocate(Some("Named")), "Named.cs");
        assert_eq!(names.allocate(Some("???")), "script_2.cs");
        assert_eq!(names.ordinal(), 3);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("Test.cs", ".cs"), "Test");
        assert_eq!(base_name("Test_1.cs", ".cs"), "Test");
        assert_eq!(base_name("Test_12.cs", ".cs"), "Test");
        assert_eq!(base_name("my_script.cs", ".cs"), "my_script");
        assert_eq!(base_name("Test_.cs", ".cs"), "Test_");
        assert_eq!(base_name("script_0.cs", ".cs"), "script");
    }
}
