pub mod extract;
pub mod history;
mod record;
mod site;
pub mod writer;

pub use record::{ServerCard, ServerDetails, ServerRecord};
pub use site::{McpSo, MCP_SO_URL};

pub use anyhow;
