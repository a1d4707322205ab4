//! Filter, sort, and pagination semantics for todo queries.
//!
//! These helpers are pure and shared by every storage backend, so the query
//! contract (conjunctive filters, stable sort with id tiebreak, page math)
//! cannot drift between engines.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Priority, Todo, TodoStatus};

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Conjunctive filter over todos. Every provided field must match.
#[derive(Clone, Debug, Default)]
pub struct TodoFilter {
    pub status: Option<TodoStatus>,
    pub priority: Option<Priority>,
    /// Matches todos whose tag set intersects this set (match-any within the
    /// tag filter, AND'ed with the other fields).
    pub tags: Option<BTreeSet<String>>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(status) = self.status {
            if todo.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if todo.priority != Some(priority) {
                return false;
            }
        }
        if let Some(ref tags) = self.tags {
            if !todo.tags.iter().any(|t| tags.contains(t)) {
                return false;
            }
        }
        // Date bounds are inclusive; a one-sided range is allowed. A todo
        // without a due date never falls inside a due-date range.
        if self.due_from.is_some() || self.due_to.is_some() {
            let Some(due) = todo.due_date else {
                return false;
            };
            if let Some(from) = self.due_from {
                if due < from {
                    return false;
                }
            }
            if let Some(to) = self.due_to {
                if due > to {
                    return false;
                }
            }
        }
        true
    }
}

/// Sort key for todo queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A full query: filter + sort + page selection.
#[derive(Clone, Debug)]
pub struct TodoQuery {
    pub filter: TodoFilter,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for TodoQuery {
    fn default() -> Self {
        Self {
            filter: TodoFilter::default(),
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// One page of query results with pre-pagination totals.
#[derive(Clone, Debug)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    /// Count of all todos matching the filter, before pagination.
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

fn compare_by_field(a: &Todo, b: &Todo, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        // Absent optional keys sort before present ones in ascending order.
        SortField::DueDate => a.due_date.cmp(&b.due_date),
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::Status => a.status.cmp(&b.status),
    }
}

/// Sort todos by the requested key. Ties are always broken by id ascending,
/// regardless of sort order, so repeated queries over unchanged data paginate
/// deterministically.
pub fn sort_todos(todos: &mut [Todo], field: SortField, order: SortOrder) {
    todos.sort_by(|a, b| {
        let by_key = match order {
            SortOrder::Asc => compare_by_field(a, b, field),
            SortOrder::Desc => compare_by_field(b, a, field),
        };
        by_key.then_with(|| a.id.cmp(&b.id))
    });
}

/// Cut one page out of an already filtered and sorted result set.
///
/// Callers must have validated `page >= 1` and `limit >= 1`. A page past the
/// end yields empty items with the totals still populated.
pub fn paginate(todos: Vec<Todo>, page: u32, limit: u32) -> TodoPage {
    let total = todos.len() as u64;
    let total_pages = (total.div_ceil(limit as u64)) as u32;
    let start = (page as usize - 1).saturating_mul(limit as usize);
    let items = todos
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();
    TodoPage {
        items,
        total,
        page,
        total_pages,
    }
}

/// Apply a full query to an unscoped candidate set: filter, sort, paginate.
pub fn run_query(todos: Vec<Todo>, query: &TodoQuery) -> TodoPage {
    let mut matching: Vec<Todo> = todos
        .into_iter()
        .filter(|t| query.filter.matches(t))
        .collect();
    sort_todos(&mut matching, query.sort_field, query.sort_order);
    paginate(matching, query.page, query.limit)
}
