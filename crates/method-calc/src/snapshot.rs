//! 方法樹快照複製
//!
//! 建立工單或報價時，把基礎方法樹（或另一個工單/報價的方法樹）複製到目標
//! 情境。新ID由呼叫端的發號服務提供，引擎本身不產生ID。

use method_core::{
    MakeMethod, MaterialLine, MemoryNodeStore, MethodContext, MethodError, NodeKind,
    OperationLine, OperationStatus, Result,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::rollup::CostBreakdown;
use crate::tree::MethodTree;

/// 外部ID發號介面
pub trait IdIssuer {
    fn issue(&mut self, kind: NodeKind) -> String;
}

/// 以 UUID v4 發號（沒有自有發號服務的呼叫端使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIssuer;

impl IdIssuer for UuidIssuer {
    fn issue(&mut self, _kind: NodeKind) -> String {
        Uuid::new_v4().to_string()
    }
}

/// 複製結果（可直接持久化的資料列）
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSnapshot {
    pub context: MethodContext,
    pub owner_id: String,
    pub root_make_method_id: String,
    pub make_methods: Vec<MakeMethod>,
    pub materials: Vec<MaterialLine>,
    pub operations: Vec<OperationLine>,
}

impl MethodSnapshot {
    /// 載入記憶體資料來源
    pub fn load_into(self, store: &mut MemoryNodeStore) {
        store.extend(self.make_methods, self.materials, self.operations);
    }
}

/// 快照複製器
pub struct SnapshotCopier<'a> {
    tree: &'a MethodTree,
    costs: Option<&'a CostBreakdown>,
}

impl<'a> SnapshotCopier<'a> {
    /// 創建新的複製器
    pub fn new(tree: &'a MethodTree) -> Self {
        Self { tree, costs: None }
    }

    /// 建構器模式：以累計成本更新物料行的快取單位成本
    pub fn with_costs(mut self, costs: &'a CostBreakdown) -> Self {
        self.costs = Some(costs);
        self
    }

    /// 複製到目標情境
    pub fn copy(
        &self,
        context: MethodContext,
        owner_id: &str,
        issuer: &mut dyn IdIssuer,
    ) -> Result<MethodSnapshot> {
        if context == MethodContext::Base {
            return Err(MethodError::InvalidConfig(
                "快照目標必須為工單或報價情境".to_string(),
            ));
        }

        // arena 索引與新製造方法一一對應
        let mut make_methods = Vec::with_capacity(self.tree.method_count());
        for (_, node) in self.tree.methods() {
            let mut make_method = node.make_method.clone();
            make_method.id = issuer.issue(NodeKind::MakeMethod);
            make_method.context = context;
            make_method.owner_id = owner_id.to_string();
            make_method.created_at = None;
            make_method.created_by = None;
            make_method.updated_at = None;
            make_method.updated_by = None;
            make_methods.push(make_method);
        }

        // 工序弱引用只在同一製造方法內有效，以 (新製造方法, 舊工序) 對應
        let mut operation_ids = HashMap::new();
        let mut operations = Vec::with_capacity(self.tree.operation_count());
        for (_, node) in self.tree.operations() {
            let method_id = &make_methods[node.owner.index()].id;
            let new_id = issuer.issue(NodeKind::Operation);
            operation_ids.insert((method_id.clone(), node.line.id.as_str()), new_id.clone());

            let mut operation = node.line.clone();
            operation.id = new_id;
            operation.make_method_id = method_id.clone();
            operation.status = match context {
                MethodContext::Job => Some(OperationStatus::Todo),
                MethodContext::Quote | MethodContext::Base => None,
            };
            operations.push(operation);
        }

        let mut materials = Vec::with_capacity(self.tree.material_count());
        for (material_idx, node) in self.tree.materials() {
            let method_id = make_methods[node.owner.index()].id.clone();

            let mut material = node.line.clone();
            material.id = issuer.issue(NodeKind::Material);
            material.material_make_method_id = node
                .child
                .map(|child| make_methods[child.index()].id.clone());
            material.method_operation_id = node
                .line
                .method_operation_id
                .as_deref()
                .and_then(|op| operation_ids.get(&(method_id.clone(), op)).cloned());
            if let Some(costs) = self.costs {
                material.unit_cost = costs.material_unit_cost(material_idx);
            }
            material.make_method_id = method_id;
            materials.push(material);
        }

        let root_make_method_id = make_methods[self.tree.root().index()].id.clone();
        tracing::info!(
            "複製方法樹 {} → {} ({:?} {})：製造方法 {} 個，物料行 {} 個，工序行 {} 個",
            self.tree.root_method().id,
            root_make_method_id,
            context,
            owner_id,
            make_methods.len(),
            materials.len(),
            operations.len()
        );

        Ok(MethodSnapshot {
            context,
            owner_id: owner_id.to_string(),
            root_make_method_id,
            make_methods,
            materials,
            operations,
        })
    }
}
