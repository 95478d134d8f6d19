//! 方法樹建構

use method_core::{
    CancellationToken, EngineConfig, MakeMethod, MaterialSource, MethodError, NodeStore,
    OperationOrder, Result,
};
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::tree::{MaterialNode, MethodIdx, MethodNode, MethodTree, OperationNode};
use crate::ResolveWarning;

/// 方法樹建構器
///
/// 由根製造方法開始深度優先展開，Make 物料行的子製造方法掛在該物料行下。
/// 以根到目前節點路徑上的製造方法ID偵測循環。
pub struct TreeBuilder<'a, S: NodeStore> {
    store: &'a S,
    config: &'a EngineConfig,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, S: NodeStore> TreeBuilder<'a, S> {
    /// 創建新的建構器
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self {
            store,
            config,
            cancel: None,
        }
    }

    /// 建構器模式：設置取消訊號
    pub fn with_cancellation(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 從根製造方法建構方法樹
    pub fn build(&self, root_id: &str) -> Result<MethodTree> {
        self.config.validate()?;

        // 根不存在時在走訪前直接回傳
        let root = self.store.get_make_method(root_id)?;
        tracing::debug!("建構方法樹: {} (物料 {})", root.id, root.item_id);

        let mut tree = MethodTree::new();
        let mut path_ids = Vec::new();
        self.expand(&mut tree, root, None, Vec::new(), &mut path_ids)?;

        tracing::debug!(
            "方法樹建構完成: 製造方法 {} 個，物料行 {} 個，工序行 {} 個，最大層級 {}",
            tree.method_count(),
            tree.material_count(),
            tree.operation_count(),
            tree.max_depth()
        );

        Ok(tree)
    }

    /// 展開單一製造方法（遞迴）
    fn expand(
        &self,
        tree: &mut MethodTree,
        make_method: MakeMethod,
        parent_material: Option<crate::tree::MaterialIdx>,
        path: Vec<i32>,
        path_ids: &mut Vec<String>,
    ) -> Result<MethodIdx> {
        let make_method_id = make_method.id.clone();

        if self.cancel.is_some_and(|token| token.is_cancelled()) {
            tracing::warn!("方法樹建構已取消: {}", make_method_id);
            return Err(MethodError::Cancelled { make_method_id });
        }

        if path_ids.contains(&make_method_id) {
            let mut chain = path_ids.clone();
            chain.push(make_method_id);
            tracing::warn!("偵測到循環引用: {}", chain.join(" -> "));
            return Err(MethodError::CycleDetected { chain });
        }

        let depth = path_ids.len();
        if depth > self.config.max_depth {
            return Err(MethodError::MaxDepthExceeded {
                make_method_id,
                depth,
                max_depth: self.config.max_depth,
            });
        }

        if make_method.production_quantity <= Decimal::ZERO {
            return Err(MethodError::InvalidQuantity {
                node_id: make_method_id,
                field: "production_quantity",
                value: make_method.production_quantity,
            });
        }

        let context = make_method.context;
        let method_idx = tree.push_method(MethodNode {
            make_method,
            parent_material,
            materials: Vec::new(),
            operations: Vec::new(),
            depth,
            path: path.clone(),
        });
        path_ids.push(make_method_id.clone());

        // 工序先載入，物料行的工序弱引用才能檢查
        let operations = self.store.list_operation_lines(&make_method_id)?;
        let mut operation_ids = HashSet::new();
        let mut operation_orders = HashSet::new();
        for (position, operation) in operations.into_iter().enumerate() {
            operation.validate()?;

            if !operation_orders.insert(operation.order) {
                tree.add_warning(ResolveWarning::warning(
                    operation.id.clone(),
                    format!("工序排序 {} 在製造方法 {} 中重複", operation.order, make_method_id),
                ));
            }
            if position == 0 && operation.operation_order == OperationOrder::WithPrevious {
                tree.add_warning(ResolveWarning::info(
                    operation.id.clone(),
                    "第一道工序設為 With Previous，視為新步驟".to_string(),
                ));
            }

            operation_ids.insert(operation.id.clone());
            let mut operation_path = path.clone();
            operation_path.push(operation.order);
            tree.push_operation(OperationNode {
                line: operation,
                owner: method_idx,
                path: operation_path,
            });
        }

        let materials = self.store.list_material_lines(&make_method_id)?;
        let mut material_orders = HashSet::new();
        for material in materials {
            material.validate_quantities()?;

            let child_id = match material.source()? {
                MaterialSource::Make { make_method_id } => Some(make_method_id.to_string()),
                MaterialSource::Buy | MaterialSource::Pick => None,
            };

            if !material_orders.insert(material.order) {
                tree.add_warning(ResolveWarning::warning(
                    material.id.clone(),
                    format!("物料排序 {} 在製造方法 {} 中重複", material.order, make_method_id),
                ));
            }
            if let Some(operation_id) = &material.method_operation_id {
                if !operation_ids.contains(operation_id) {
                    tree.add_warning(ResolveWarning::warning(
                        material.id.clone(),
                        format!("引用的工序 {} 不屬於製造方法 {}", operation_id, make_method_id),
                    ));
                }
            }

            let item = self.store.get_item(&material.item_id)?;
            let mut material_path = path.clone();
            material_path.push(material.order);

            let child = match child_id {
                Some(child_id) => {
                    let child = self.store.get_make_method(&child_id)?;
                    if child.item_id != material.item_id {
                        return Err(MethodError::InvalidMaterialLine {
                            material_id: material.id.clone(),
                            reason: format!(
                                "子製造方法 {} 產出 {}，與物料 {} 不符",
                                child.id, child.item_id, material.item_id
                            ),
                        });
                    }
                    if child.context != context {
                        return Err(MethodError::InvalidMaterialLine {
                            material_id: material.id.clone(),
                            reason: format!("子製造方法 {} 屬於不同情境", child.id),
                        });
                    }
                    Some(child)
                }
                None => None,
            };

            let material_idx = tree.push_material(MaterialNode {
                line: material,
                item,
                owner: method_idx,
                child: None,
                path: material_path.clone(),
            });

            if let Some(child) = child {
                let child_idx =
                    self.expand(tree, child, Some(material_idx), material_path, path_ids)?;
                tree.attach_child(material_idx, child_idx);

                // 空的子製造方法單位成本為 0
                let child_node = tree.method(child_idx);
                if child_node.materials.is_empty() && child_node.operations.is_empty() {
                    let message =
                        format!("子製造方法 {} 沒有物料行或工序行", child_node.make_method.id);
                    let material_id = tree.material(material_idx).line.id.clone();
                    tree.add_warning(ResolveWarning::error(material_id, message));
                }
            }
        }

        path_ids.pop();
        Ok(method_idx)
    }
}
