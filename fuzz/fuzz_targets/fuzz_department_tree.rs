#![no_main]

//! Fuzz target for department tree edits.
//!
//! Applies arbitrary create/move/delete sequences and checks that the
//! stored parent links never form a cycle and that every department stays
//! reachable from a root.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use timesheet::db::Database;
use timesheet::tree::{DeletePolicy, DepartmentForest, DepartmentTree};

#[derive(Arbitrary, Debug)]
enum Op {
    Create { name: String, parent: Option<u8> },
    Move { target: u8, parent: Option<u8> },
    Rename { target: u8, name: String },
    Delete { target: u8 },
}

#[derive(Arbitrary, Debug)]
struct TreeInput {
    reject_on_delete: bool,
    ops: Vec<Op>,
}

fn pick(ids: &[i64], index: u8) -> Option<i64> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index as usize % ids.len()])
    }
}

fuzz_target!(|input: TreeInput| {
    let db = match Database::open_in_memory() {
        Ok(d) => d,
        Err(_) => return,
    };
    let policy = if input.reject_on_delete {
        DeletePolicy::Reject
    } else {
        DeletePolicy::Reparent
    };
    let tree = DepartmentTree::new(&db, policy);

    // Limit to keep each run fast
    for op in input.ops.into_iter().take(64) {
        let ids: Vec<i64> = match db.list_departments() {
            Ok(all) => all.into_iter().map(|d| d.id).collect(),
            Err(_) => return,
        };
        // Errors are expected; only invariants matter
        match op {
            Op::Create { name, parent } => {
                let parent = parent.and_then(|p| pick(&ids, p));
                let _ = tree.create(&name, None, parent);
            }
            Op::Move { target, parent } => {
                if let Some(id) = pick(&ids, target) {
                    if let Ok(current) = tree.get(id) {
                        let parent = parent.and_then(|p| pick(&ids, p));
                        let _ = tree.update(id, &current.name, None, parent);
                    }
                }
            }
            Op::Rename { target, name } => {
                if let Some(id) = pick(&ids, target) {
                    if let Ok(current) = tree.get(id) {
                        let _ = tree.update(id, &name, None, current.parent_id);
                    }
                }
            }
            Op::Delete { target } => {
                if let Some(id) = pick(&ids, target) {
                    let _ = tree.delete(id);
                }
            }
        }
    }

    let departments = match db.list_departments() {
        Ok(d) => d,
        Err(_) => return,
    };
    let total = departments.len();
    let forest = DepartmentForest::from_departments(departments);

    for entry in &forest {
        let id = entry.department.id;
        assert!(
            forest.ancestors(id).all(|a| a.id != id),
            "department #{} is its own ancestor",
            id
        );
        if let Some(parent) = entry.department.parent_id {
            assert!(forest.get(parent).is_some(), "dangling parent #{}", parent);
        }
    }
    assert_eq!(forest.iter().count(), total, "unreachable departments");
});
