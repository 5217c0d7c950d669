use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

const SELECT_TODOS: &str = "SELECT id, title, completed, priority, due_date, category FROM todo";

/// Raw query-string parameters accepted by the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    Undone,
}

impl StatusFilter {
    /// Anything other than `done` or `undone` means no filter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("done") => StatusFilter::Done,
            Some("undone") => StatusFilter::Undone,
            _ => StatusFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    PriorityAsc,
    PriorityDesc,
}

impl SortOrder {
    /// Unrecognized values fall back to [`SortOrder::Newest`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("priority_asc") => SortOrder::PriorityAsc,
            Some("priority_desc") => SortOrder::PriorityDesc,
            _ => SortOrder::Newest,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            SortOrder::Newest => " ORDER BY id DESC",
            SortOrder::PriorityAsc => " ORDER BY priority ASC, id DESC",
            SortOrder::PriorityDesc => " ORDER BY priority DESC, id DESC",
        }
    }
}

/// Typed filter and sort options for listing todos. All filters are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub category: Option<String>,
    pub sort: SortOrder,
}

impl From<ListParams> for TodoQuery {
    fn from(params: ListParams) -> Self {
        Self {
            search: non_empty(params.search),
            status: StatusFilter::parse(params.status.as_deref()),
            category: non_empty(params.category),
            sort: SortOrder::parse(params.sort_by.as_deref()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TodoQuery {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Case-insensitive substring match of `search` against the title. Folding
    /// is done here rather than in SQL because SQLite's `lower()` only knows
    /// ASCII.
    pub fn matches_search(&self, title: &str) -> bool {
        match &self.search {
            None => true,
            Some(term) => title.to_lowercase().contains(&term.to_lowercase()),
        }
    }

    /// Builds the SELECT for the status and category filters and the sort
    /// order. `search` is not part of the SQL; see [`TodoQuery::matches_search`].
    pub fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(SELECT_TODOS);
        let mut has_where = false;
        let mut next_clause = |builder: &mut QueryBuilder<'static, Sqlite>| {
            builder.push(if has_where { " AND " } else { " WHERE " });
            has_where = true;
        };

        match self.status {
            StatusFilter::All => {}
            StatusFilter::Done => {
                next_clause(&mut builder);
                builder.push("completed = 1");
            }
            StatusFilter::Undone => {
                next_clause(&mut builder);
                builder.push("completed = 0");
            }
        }

        if let Some(category) = &self.category {
            next_clause(&mut builder);
            builder.push("category = ").push_bind(category.clone());
        }

        builder.push(self.sort.order_by());
        builder
    }
}
