//! 字面量匹配器
//!
//! 逐行搜索，memchr::memmem 查找；大小写不敏感时按 ASCII 折叠，保证字节偏移不变

use crate::kernel::services::ports::{Match, MatchFinder};
use memchr::memmem::Finder;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralMatchFinder {
    case_sensitive: bool,
}

impl LiteralMatchFinder {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl MatchFinder for LiteralMatchFinder {
    fn find_matches(&self, text: &str, query: &str) -> Result<Vec<Match>, String> {
        if query.is_empty() || text.is_empty() {
            return Ok(Vec::new());
        }

        let needle = if self.case_sensitive {
            query.as_bytes().to_vec()
        } else {
            query.as_bytes().to_ascii_lowercase()
        };
        let finder = Finder::new(&needle);

        let mut matches = Vec::new();
        let mut folded = Vec::new();
        for (line_idx, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            if line.len() < needle.len() {
                continue;
            }

            let haystack: &[u8] = if self.case_sensitive {
                line.as_bytes()
            } else {
                folded.clear();
                folded.extend(line.bytes().map(|b| b.to_ascii_lowercase()));
                &folded
            };

            let mut pos = 0usize;
            while let Some(found) = finder.find(&haystack[pos..]) {
                let start = pos + found;
                let end = start + needle.len();
                // UTF-8 自同步，命中位置总在字符边界上
                if let (Some(prefix), Some(matched)) = (line.get(..start), line.get(start..end)) {
                    matches.push(Match::new(
                        line_idx + 1,
                        prefix.chars().count(),
                        matched,
                        line,
                    ));
                }
                pos = end;
                if pos >= haystack.len() {
                    break;
                }
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/finder.rs"]
mod tests;
