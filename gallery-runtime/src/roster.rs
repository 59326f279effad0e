//! # Roster 模块
//!
//! 角色名册：会话期间所有角色的唯一所有者。
//!
//! 选择槽、对话会话只持有 [`UnitId`]，从不持有角色本身。

use std::collections::HashMap;

use tracing::warn;

use crate::config::UnitDescriptor;
use crate::unit::Unit;

/// 角色在名册中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

/// 角色名册
#[derive(Debug, Clone, Default)]
pub struct Roster {
    units: Vec<Unit>,
    by_name: HashMap<String, UnitId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从名册描述批量创建
    ///
    /// 重名角色只保留第一个。
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = UnitDescriptor>) -> Self {
        let mut roster = Self::new();
        for descriptor in descriptors {
            roster.push(Unit::from_descriptor(descriptor));
        }
        roster
    }

    /// 加入角色，重名时忽略并返回 `None`
    pub fn push(&mut self, unit: Unit) -> Option<UnitId> {
        if self.by_name.contains_key(unit.name()) {
            warn!(unit = %unit.name(), "角色重名，忽略后出现的记录");
            return None;
        }
        let id = UnitId(self.units.len());
        self.by_name.insert(unit.name().to_string(), id);
        self.units.push(unit);
        Some(id)
    }

    /// 资源就绪后初始化所有角色
    pub fn initialize_all(&mut self) {
        for unit in &mut self.units {
            unit.initialize();
        }
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.0)
    }

    /// 按名字查找
    pub fn find(&self, name: &str) -> Option<UnitId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.units.iter().enumerate().map(|(i, u)| (UnitId(i), u))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (UnitId, &mut Unit)> {
        self.units
            .iter_mut()
            .enumerate()
            .map(|(i, u)| (UnitId(i), u))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_roster(names: &[(&str, f32)], frames: usize) -> Roster {
    let mut roster = Roster::new();
    for (name, health) in names {
        roster.push(crate::unit::test_unit(name, *health, frames));
    }
    roster
}
