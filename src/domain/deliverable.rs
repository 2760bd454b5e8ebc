// ==========================================
// IT 项目治理核心 - 交付物领域模型
// ==========================================
// 生命周期: 上传创建 -> 逻辑删除, 从不物理删除
// ==========================================

use crate::domain::project::SoftDeletable;
use crate::domain::types::DeliverableKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub deliverable_id: String,    // 交付物ID
    pub project_id: String,        // 所属项目
    pub kind: DeliverableKind,     // 类别
    pub file_name: String,         // 原始文件名
    pub version: i32,              // 版本号（门禁不关心）
    pub uploaded_at: NaiveDateTime, // 上传时间
    pub deleted: bool,             // 逻辑删除标记
}

impl SoftDeletable for Deliverable {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
