//! 方法樹（arena 儲存）
//!
//! 所有製造方法、物料行與工序行存放在扁平的 Vec 中，樹結構以索引表示。
//! 建構時以深度優先前序寫入，因此父節點的索引永遠小於其子節點。

use method_core::{Item, MakeMethod, MaterialLine, OperationLine};

use crate::ResolveWarning;

/// 製造方法節點索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodIdx(pub(crate) usize);

/// 物料節點索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialIdx(pub(crate) usize);

/// 工序節點索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationIdx(pub(crate) usize);

impl MethodIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

impl MaterialIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

impl OperationIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 製造方法節點
#[derive(Debug, Clone)]
pub struct MethodNode {
    pub make_method: MakeMethod,

    /// 引用此製造方法的物料行（根節點為 None）
    pub parent_material: Option<MaterialIdx>,

    /// 直屬物料行（依 order 排序）
    pub materials: Vec<MaterialIdx>,

    /// 直屬工序行（依 order 排序）
    pub operations: Vec<OperationIdx>,

    /// 層級（根為 0）
    pub depth: usize,

    /// 從根開始的同層 order 序列
    pub path: Vec<i32>,
}

/// 物料節點
#[derive(Debug, Clone)]
pub struct MaterialNode {
    pub line: MaterialLine,

    /// 物料主檔摘要
    pub item: Item,

    /// 所屬製造方法
    pub owner: MethodIdx,

    /// 子製造方法（僅 Make）
    pub child: Option<MethodIdx>,

    pub path: Vec<i32>,
}

/// 工序節點
#[derive(Debug, Clone)]
pub struct OperationNode {
    pub line: OperationLine,
    pub owner: MethodIdx,
    pub path: Vec<i32>,
}

/// 記憶體中的方法樹
#[derive(Debug, Clone)]
pub struct MethodTree {
    methods: Vec<MethodNode>,
    materials: Vec<MaterialNode>,
    operations: Vec<OperationNode>,
    warnings: Vec<ResolveWarning>,
}

impl MethodTree {
    pub(crate) fn new() -> Self {
        Self {
            methods: Vec::new(),
            materials: Vec::new(),
            operations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn push_method(&mut self, node: MethodNode) -> MethodIdx {
        self.methods.push(node);
        MethodIdx(self.methods.len() - 1)
    }

    pub(crate) fn push_material(&mut self, node: MaterialNode) -> MaterialIdx {
        let owner = node.owner;
        self.materials.push(node);
        let idx = MaterialIdx(self.materials.len() - 1);
        self.methods[owner.0].materials.push(idx);
        idx
    }

    pub(crate) fn push_operation(&mut self, node: OperationNode) -> OperationIdx {
        let owner = node.owner;
        self.operations.push(node);
        let idx = OperationIdx(self.operations.len() - 1);
        self.methods[owner.0].operations.push(idx);
        idx
    }

    pub(crate) fn attach_child(&mut self, material: MaterialIdx, child: MethodIdx) {
        self.materials[material.0].child = Some(child);
    }

    pub(crate) fn add_warning(&mut self, warning: ResolveWarning) {
        self.warnings.push(warning);
    }

    /// 根節點
    pub fn root(&self) -> MethodIdx {
        MethodIdx(0)
    }

    /// 根製造方法
    pub fn root_method(&self) -> &MakeMethod {
        &self.methods[0].make_method
    }

    pub fn method(&self, idx: MethodIdx) -> &MethodNode {
        &self.methods[idx.0]
    }

    pub fn material(&self, idx: MaterialIdx) -> &MaterialNode {
        &self.materials[idx.0]
    }

    pub fn operation(&self, idx: OperationIdx) -> &OperationNode {
        &self.operations[idx.0]
    }

    /// 依前序走訪所有製造方法
    pub fn methods(&self) -> impl DoubleEndedIterator<Item = (MethodIdx, &MethodNode)> + '_ {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, node)| (MethodIdx(i), node))
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialIdx, &MaterialNode)> + '_ {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, node)| (MaterialIdx(i), node))
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationIdx, &OperationNode)> + '_ {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, node)| (OperationIdx(i), node))
    }

    /// 依製造方法ID查找節點（共用子件時回傳第一個出現的位置）
    pub fn find_method(&self, make_method_id: &str) -> Option<MethodIdx> {
        self.methods
            .iter()
            .position(|node| node.make_method.id == make_method_id)
            .map(MethodIdx)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// 節點總數（製造方法 + 物料行 + 工序行）
    pub fn node_count(&self) -> usize {
        self.methods.len() + self.materials.len() + self.operations.len()
    }

    /// 最大層級
    pub fn max_depth(&self) -> usize {
        self.methods.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// 建構期間產生的警告
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }
}
