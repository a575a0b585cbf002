//! 搜索适配器
//!
//! - LiteralMatchFinder: 默认的单 source 匹配器

mod finder;

pub use finder::LiteralMatchFinder;
