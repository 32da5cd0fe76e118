//! 会话/文件状态
//!
//! 维护文档集合和当前选中的文档。这里只做纯状态变换，
//! 所有变换都应在后端确认成功之后才调用。
//!
//! 同一文件名可以出现在多个会话中，文档由 [`DocumentKey`]（文件名 + 会话）区分。

use crate::document::{Document, DocumentKey};
use crate::types::FileRecord;

/// 文档集合与当前选中项
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    /// 文档列表（保持插入顺序）
    documents: Vec<Document>,
    /// 当前选中的文档
    selected: Option<DocumentKey>,
}

impl DocumentStore {
    /// 创建空的状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有文档
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 按标识查找
    pub fn get(&self, key: &DocumentKey) -> Option<&Document> {
        self.documents.iter().find(|d| key.matches(d))
    }

    /// 所有同名文档（可能分属多个会话）
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents.iter().filter(move |d| d.name == name)
    }

    /// 当前选中的文档
    pub fn selected(&self) -> Option<&Document> {
        self.selected.as_ref().and_then(|key| self.get(key))
    }

    /// 当前选中文档的标识
    pub fn selected_key(&self) -> Option<&DocumentKey> {
        self.selected.as_ref().filter(|key| self.get(key).is_some())
    }

    /// 用后端列表整体替换文档集合
    ///
    /// 保留列表中的每一条记录，只合并文件名和会话都相同的重复记录
    /// （后出现的覆盖先出现的，位置不变）。选中项仍在列表中时保留，否则清除。
    pub fn replace_all(&mut self, records: Vec<FileRecord>) {
        let mut documents: Vec<Document> = Vec::with_capacity(records.len());
        for record in records {
            let doc = Document::from_record(record);
            let key = doc.key();
            if let Some(existing) = documents.iter_mut().find(|d| key.matches(d)) {
                tracing::warn!("文件列表中存在重复记录: {}", key);
                *existing = doc;
            } else {
                documents.push(doc);
            }
        }
        self.documents = documents;

        if let Some(key) = &self.selected {
            if self.get(key).is_none() {
                tracing::debug!("选中的文档已不在列表中: {}", key);
                self.selected = None;
            }
        }
    }

    /// 追加文档并选中
    ///
    /// 其他会话中的同名文档保持不变；只有文件名和会话都相同的旧记录会被替换。
    pub fn insert_and_select(&mut self, document: Document) -> &Document {
        let key = document.key();
        if let Some(pos) = self.documents.iter().position(|d| key.matches(d)) {
            tracing::warn!("覆盖重复文档: {}", key);
            self.documents.remove(pos);
        }
        self.selected = Some(key);
        self.documents.push(document);
        let last = self.documents.len() - 1;
        &self.documents[last]
    }

    /// 选中文档；不存在时返回 false
    pub fn select(&mut self, key: &DocumentKey) -> bool {
        if self.get(key).is_some() {
            self.selected = Some(key.clone());
            true
        } else {
            false
        }
    }

    /// 清除选中
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// 移除单个文档，若它是选中项则清除选中
    pub fn remove(&mut self, key: &DocumentKey) -> Option<Document> {
        let pos = self.documents.iter().position(|d| key.matches(d))?;
        let removed = self.documents.remove(pos);
        if self.selected.as_ref() == Some(key) {
            self.selected = None;
        }
        Some(removed)
    }

    /// 移除会话下的所有文档，若选中项属于该会话则清除选中
    ///
    /// 返回移除的数量。
    pub fn remove_session(&mut self, session_id: &str) -> usize {
        let selected_in_session = self
            .selected()
            .map(|d| d.session_id == session_id)
            .unwrap_or(false);

        let before = self.documents.len();
        self.documents.retain(|d| d.session_id != session_id);

        if selected_in_session {
            self.selected = None;
        }
        before - self.documents.len()
    }

    /// 按会话分组：会话按首次出现的顺序，组内保持列表顺序
    pub fn sessions(&self) -> Vec<(&str, Vec<&Document>)> {
        let mut groups: Vec<(&str, Vec<&Document>)> = Vec::new();
        for doc in &self.documents {
            match groups.iter_mut().find(|(sid, _)| *sid == doc.session_id) {
                Some((_, docs)) => docs.push(doc),
                None => groups.push((doc.session_id.as_str(), vec![doc])),
            }
        }
        groups
    }
}
