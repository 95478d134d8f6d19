//! 製程路線步驟排序

use method_core::OperationOrder;

use crate::tree::{MethodIdx, MethodTree, OperationIdx};

/// 路線步驟
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingStep {
    pub operation: OperationIdx,
    pub operation_id: String,
    pub order: i32,
    /// 步驟序號（從 1 開始；With Previous 與前一工序共用）
    pub step: u32,
}

/// 為製造方法的工序編排步驟序號
///
/// 只表達先後關係，不模擬時間。
pub fn routing_steps(tree: &MethodTree, method: MethodIdx) -> Vec<RoutingStep> {
    let mut steps = Vec::new();
    let mut step = 0;

    for &operation_idx in &tree.method(method).operations {
        let operation = &tree.operation(operation_idx).line;
        if step == 0 || operation.operation_order == OperationOrder::AfterPrevious {
            step += 1;
        }
        steps.push(RoutingStep {
            operation: operation_idx,
            operation_id: operation.id.clone(),
            order: operation.order,
            step,
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeBuilder;
    use method_core::{EngineConfig, MakeMethod, MemoryNodeStore, OperationLine};

    #[test]
    fn test_with_previous_shares_step() {
        let mut store = MemoryNodeStore::new();
        store.insert_make_method(MakeMethod::new("MM-1", "BIKE"));
        let operations = [
            ("OP-1", 1, OperationOrder::WithPrevious),
            ("OP-2", 2, OperationOrder::AfterPrevious),
            ("OP-3", 3, OperationOrder::WithPrevious),
            ("OP-4", 4, OperationOrder::WithPrevious),
            ("OP-5", 5, OperationOrder::AfterPrevious),
        ];
        for (id, order, operation_order) in operations {
            store.insert_operation(
                OperationLine::new(id, "MM-1", "PROC")
                    .with_order(order)
                    .with_operation_order(operation_order),
            );
        }

        let tree = TreeBuilder::new(&store, &EngineConfig::default())
            .build("MM-1")
            .unwrap();
        let steps: Vec<(String, u32)> = routing_steps(&tree, tree.root())
            .into_iter()
            .map(|s| (s.operation_id, s.step))
            .collect();

        assert_eq!(
            steps,
            vec![
                ("OP-1".to_string(), 1),
                ("OP-2".to_string(), 2),
                ("OP-3".to_string(), 2),
                ("OP-4".to_string(), 2),
                ("OP-5".to_string(), 3),
            ]
        );
        // 第一道工序為 With Previous 時有提示
        assert_eq!(tree.warnings().len(), 1);
    }
}
