//! Department hierarchy.
//!
//! Departments form a forest through their `parent_id`. Every mutation here
//! keeps it that way: a department can never be moved under itself or under
//! one of its own descendants, and deleting a department never leaves its
//! children pointing at a missing parent.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::db::Database;
use crate::error::{Entity, Error, Result};
use crate::models::Department;

/// What happens to the children of a deleted department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Children move up to the deleted department's parent.
    #[default]
    Reparent,
    /// Deletion fails while the department has children.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: Department,
    /// Direct children that now hang off `removed.parent_id`.
    pub reparented: Vec<i64>,
}

pub struct DepartmentTree<'a> {
    db: &'a Database,
    policy: DeletePolicy,
}

impl<'a> DepartmentTree<'a> {
    pub fn new(db: &'a Database, policy: DeletePolicy) -> Self {
        DepartmentTree { db, policy }
    }

    pub fn get(&self, id: i64) -> Result<Department> {
        self.db
            .get_department(id)?
            .ok_or_else(|| Error::not_found(Entity::Department, id))
    }

    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        parent: Option<i64>,
    ) -> Result<Department> {
        let name = checked_name(name)?;
        if self.db.find_department_by_name(name)?.is_some() {
            return Err(Error::DuplicateName {
                entity: Entity::Department,
                name: name.to_string(),
            });
        }
        if let Some(parent_id) = parent {
            self.get(parent_id)?;
        }

        let id = self.db.create_department(name, description, parent)?;
        Ok(Department {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            parent_id: parent,
        })
    }

    pub fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        parent: Option<i64>,
    ) -> Result<Department> {
        self.get(id)?;
        let name = checked_name(name)?;

        if let Some(parent_id) = parent {
            if parent_id == id {
                return Err(Error::Cycle {
                    id,
                    parent: parent_id,
                });
            }
            self.get(parent_id)?;
            if self.list_ordered()?.is_descendant(parent_id, id) {
                return Err(Error::Cycle {
                    id,
                    parent: parent_id,
                });
            }
        }

        if let Some(existing) = self.db.find_department_by_name(name)? {
            if existing.id != id {
                return Err(Error::DuplicateName {
                    entity: Entity::Department,
                    name: name.to_string(),
                });
            }
        }

        if !self.db.update_department(id, name, description, parent)? {
            return Err(Error::not_found(Entity::Department, id));
        }
        Ok(Department {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            parent_id: parent,
        })
    }

    pub fn delete(&self, id: i64) -> Result<DeleteOutcome> {
        let department = self.get(id)?;

        let employees = self.db.department_employee_count(id)?;
        if employees > 0 {
            return Err(Error::HasEmployees { id, employees });
        }

        let children = self.db.department_child_count(id)?;
        if children == 0 {
            if !self.db.delete_department(id)? {
                return Err(Error::not_found(Entity::Department, id));
            }
            return Ok(DeleteOutcome {
                removed: department,
                reparented: Vec::new(),
            });
        }

        match self.policy {
            DeletePolicy::Reject => Err(Error::HasChildren { id, children }),
            DeletePolicy::Reparent => {
                let reparented = self
                    .db
                    .delete_department_reparenting(id, department.parent_id)?;
                Ok(DeleteOutcome {
                    removed: department,
                    reparented,
                })
            }
        }
    }

    /// Snapshot of the stored tree. Iterate it with [`DepartmentForest::iter`].
    pub fn list_ordered(&self) -> Result<DepartmentForest> {
        Ok(DepartmentForest::from_departments(
            self.db.list_departments()?,
        ))
    }

    /// Departments that may become the parent of `excluding`: everything
    /// except that department and its subtree, in listing order.
    pub fn candidates_for_parent(&self, excluding: Option<i64>) -> Result<Vec<Department>> {
        let forest = self.list_ordered()?;
        let excluded: HashSet<i64> = match excluding {
            Some(id) => forest.subtree(id).map(|e| e.department.id).collect(),
            None => HashSet::new(),
        };

        Ok(forest
            .iter()
            .filter(|e| !excluded.contains(&e.department.id))
            .map(|e| e.department.clone())
            .collect())
    }
}

fn checked_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName {
            entity: Entity::Department,
        });
    }
    Ok(name)
}

/// In-memory view of the department forest. Siblings are kept sorted by name.
#[derive(Debug, Clone, Default)]
pub struct DepartmentForest {
    departments: HashMap<i64, Department>,
    roots: Vec<i64>,
    children: HashMap<i64, Vec<i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry<'a> {
    pub department: &'a Department,
    pub depth: usize,
}

impl DepartmentForest {
    pub fn from_departments(mut departments: Vec<Department>) -> Self {
        departments.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let known: HashSet<i64> = departments.iter().map(|d| d.id).collect();
        let mut roots = Vec::new();
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();

        for department in &departments {
            match department.parent_id {
                // A dangling or self-referencing parent is listed as a root
                Some(parent) if parent != department.id && known.contains(&parent) => {
                    children.entry(parent).or_default().push(department.id);
                }
                _ => roots.push(department.id),
            }
        }

        DepartmentForest {
            departments: departments.into_iter().map(|d| (d.id, d)).collect(),
            roots,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Department> {
        self.departments.get(&id)
    }

    pub fn children(&self, id: i64) -> impl Iterator<Item = &Department> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |child| self.departments.get(child))
    }

    /// Depth-first pre-order walk over the whole forest. Each call starts over.
    pub fn iter(&self) -> PreOrder<'_> {
        let stack = self.roots.iter().rev().map(|&id| (id, 0)).collect();
        PreOrder {
            forest: self,
            stack,
        }
    }

    /// Pre-order walk of `id` and everything below it; `id` itself has depth 0.
    pub fn subtree(&self, id: i64) -> PreOrder<'_> {
        let stack = if self.departments.contains_key(&id) {
            vec![(id, 0)]
        } else {
            Vec::new()
        };
        PreOrder {
            forest: self,
            stack,
        }
    }

    pub fn descendants(&self, id: i64) -> Vec<&Department> {
        self.subtree(id).skip(1).map(|e| e.department).collect()
    }

    /// Parent chain of `id`, nearest first. Stops at a dangling parent.
    pub fn ancestors(&self, id: i64) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            next: self.get(id).and_then(|d| d.parent_id),
            remaining: self.len(),
        }
    }

    /// True when `id` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, id: i64, ancestor: i64) -> bool {
        self.ancestors(id).any(|d| d.id == ancestor)
    }
}

impl<'a> IntoIterator for &'a DepartmentForest {
    type Item = TreeEntry<'a>;
    type IntoIter = PreOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct PreOrder<'a> {
    forest: &'a DepartmentForest,
    stack: Vec<(i64, usize)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = TreeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        if let Some(kids) = self.forest.children.get(&id) {
            self.stack
                .extend(kids.iter().rev().map(|&child| (child, depth + 1)));
        }
        let department = self.forest.departments.get(&id)?;
        Some(TreeEntry { department, depth })
    }
}

pub struct Ancestors<'a> {
    forest: &'a DepartmentForest,
    next: Option<i64>,
    // Bounds the walk on corrupted data
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Department;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let department = self.forest.get(self.next?)?;
        self.next = department.parent_id;
        Some(department)
    }
}
