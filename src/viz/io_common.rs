use std::collections::HashSet;
use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The input type, from the extension of the file.
pub fn provider_from_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Turns a program name into something that can be used in a file name.
pub fn sanitize_name(name: &str) -> String {
    let s: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        "program".to_string()
    } else {
        s
    }
}

/// Hands out distinct file stems, even when two program names sanitize to the same string.
#[derive(Debug, Default)]
pub struct FileNames {
    used: HashSet<String>,
}

impl FileNames {
    pub fn stem_for(&mut self, program: &str) -> String {
        let base = sanitize_name(program);
        let mut candidate = base.clone();
        let mut idx = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}-{}", base, idx);
            idx += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
