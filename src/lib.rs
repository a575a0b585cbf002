//! zdbg - 调试器客户端的项目级文本搜索库
//!
//! 模块结构：
//! - kernel: 搜索状态、候选源选择、分批调度与会话入口
//! - kernel::services::ports: 源目录、匹配器、空闲调度器等契约
//! - kernel::services::adapters: 内存源目录、文件系统抓取、tokio 空闲调度、设置文件

pub mod kernel;
