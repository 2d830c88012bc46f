use std::fmt;

use crate::error::RewriteError;
use crate::model::{DocumentFiles, DocumentSet, RenderConfig, Rewritten};
use crate::structural::rewrite_structural;
use crate::variable_block::rewrite_variable_block;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentRole {
    Chat,
    ChatNoScript,
}

impl DocumentRole {
    pub const ALL: [DocumentRole; 2] = [DocumentRole::Chat, DocumentRole::ChatNoScript];

    pub fn files<'a>(&self, documents: &'a DocumentSet) -> &'a DocumentFiles {
        match self {
            DocumentRole::Chat => &documents.chat,
            DocumentRole::ChatNoScript => &documents.chat_no_script,
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRole::Chat => f.write_str("chat"),
            DocumentRole::ChatNoScript => f.write_str("chat-no-script"),
        }
    }
}

pub fn render_document(
    role: DocumentRole,
    template: &str,
    config: &RenderConfig,
) -> Result<Rewritten, RewriteError> {
    match role {
        DocumentRole::Chat => rewrite_variable_block(template, config),
        DocumentRole::ChatNoScript => rewrite_structural(template, config),
    }
}
