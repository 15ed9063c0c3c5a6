//! Translate filters, facets and query axes into parameterized SQL.
//!
//! Statements are assembled from parts rather than strings so the count
//! query, the page query and the facet query of one axis share exactly the
//! same predicates.

use crate::dialect::Dialect;
use crate::schema::{
    ANCESTORS_TABLE, CONCORDANCES_TABLE, SEARCH_TABLE, SPR_COLUMNS, SPR_TABLE,
};
use spelunker_query::{
    Concordance, ConcordanceMatch, ExistentialFlag, Facet, Filter, PaginationOptions, Result,
    SpelunkerError,
};

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        SqlArg::Int(v)
    }
}

impl From<f64> for SqlArg {
    fn from(v: f64) -> Self {
        SqlArg::Float(v)
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Text(v.to_string())
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Text(v)
    }
}

/// Which slice of the result set to fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    /// Numbered page
    Offset { limit: i64, offset: i64 },
    /// Keyset page: ids greater than `after`, one extra row to detect the end
    After { limit: i64, after: Option<i64> },
}

/// Prefix of the keyset cursor tokens handed out by this backend
pub const CURSOR_PREFIX: &str = "after-";

impl Window {
    pub fn from_options(opts: &PaginationOptions) -> Result<Self> {
        match opts {
            PaginationOptions::Countable { .. } => {
                let (limit, offset) = opts.limit_offset();
                Ok(Window::Offset { limit, offset })
            }
            PaginationOptions::Cursor { .. } => {
                let after = match opts.pointer() {
                    Some(pointer) => Some(spelunker_query::pagination::parse_cursor_offset(
                        pointer,
                        CURSOR_PREFIX,
                    )?),
                    None => None,
                };

                Ok(Window::After {
                    limit: opts.per_page(),
                    after,
                })
            }
        }
    }
}

/// A FROM clause, the id expression rows are keyed on, and ANDed predicates
#[derive(Debug, Clone)]
pub struct Statement {
    from: String,
    id_column: String,
    distinct: bool,
    clauses: Vec<String>,
    args: Vec<SqlArg>,
}

impl Statement {
    pub fn new(from: impl Into<String>, id_column: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            id_column: id_column.into(),
            distinct: false,
            clauses: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Rows of the main table that are not alternate geometries
    pub fn spr() -> Self {
        Statement::new(SPR_TABLE, "spr.id").and("spr.is_alt = 0", [])
    }

    /// Descendants of `id` through the ancestors table
    pub fn descendants(id: i64) -> Self {
        Statement::new(
            format!(
                "{} JOIN {} ON spr.id = ancestors.id",
                SPR_TABLE, ANCESTORS_TABLE
            ),
            "spr.id",
        )
        .and("ancestors.ancestor_id = ?", [SqlArg::Int(id)])
        .and("spr.id != ?", [SqlArg::Int(id)])
        .and("spr.is_alt = 0", [])
    }

    /// Free-text matches. The main table is only joined when filters need it.
    pub fn search(dialect: &Dialect, query: &str, join_spr: bool) -> Self {
        let id_column = "CAST(search.id AS BIGINT)";

        let stmt = if join_spr {
            Statement::new(
                format!(
                    "{} JOIN {} ON {} = spr.id",
                    SEARCH_TABLE, SPR_TABLE, id_column
                ),
                id_column,
            )
            .and("spr.is_alt = 0", [])
        } else {
            Statement::new(SEARCH_TABLE, id_column)
        };

        stmt.and(
            dialect.full_text_predicate(),
            [SqlArg::Text(dialect.full_text_query(query))],
        )
    }

    /// Records with a matching concordance
    pub fn concordance(concordance: &Concordance, join_spr: bool) -> Result<Self> {
        let stmt = if join_spr {
            Statement::new(
                format!(
                    "{} JOIN {} ON spr.id = concordances.id",
                    CONCORDANCES_TABLE, SPR_TABLE
                ),
                "concordances.id",
            )
            .and("spr.is_alt = 0", [])
        } else {
            Statement::new(CONCORDANCES_TABLE, "concordances.id")
        };

        let stmt = Statement {
            distinct: true,
            ..stmt
        };

        let ns = like_escape(&concordance.namespace);
        let pred = like_escape(&concordance.predicate);

        let stmt = match concordance.classify()? {
            ConcordanceMatch::NamespacePredicateValue | ConcordanceMatch::NamespacePredicate => {
                stmt.and("concordances.other_source = ?", [SqlArg::Text(concordance.source())])
            }
            ConcordanceMatch::NamespaceValue | ConcordanceMatch::Namespace => stmt.and(
                "concordances.other_source LIKE ? ESCAPE '\\'",
                [SqlArg::Text(format!("{}:%", ns))],
            ),
            ConcordanceMatch::PredicateValue | ConcordanceMatch::Predicate => stmt.and(
                "concordances.other_source LIKE ? ESCAPE '\\'",
                [SqlArg::Text(format!("%:{}", pred))],
            ),
            ConcordanceMatch::Value => stmt,
        };

        if concordance.value.is_empty() {
            Ok(stmt)
        } else {
            Ok(stmt.and(
                "concordances.other_id = ?",
                [SqlArg::Text(concordance.value.clone())],
            ))
        }
    }

    pub fn and(mut self, clause: &str, args: impl IntoIterator<Item = SqlArg>) -> Self {
        self.clauses.push(clause.to_string());
        self.args.extend(args);
        self
    }

    /// AND one predicate per filter onto the main table
    pub fn with_filters(mut self, filters: &[Filter]) -> Result<Self> {
        for filter in filters {
            let (clause, arg) = filter_predicate(filter)?;
            self = self.and(clause, arg);
        }
        Ok(self)
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    fn where_clause(&self, extra: Option<&str>) -> String {
        let mut clauses: Vec<&str> = self.clauses.iter().map(String::as_str).collect();

        if let Some(extra) = extra {
            clauses.push(extra);
        }

        if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        }
    }

    /// `SELECT COUNT(..)` over the same predicates, without ordering or limits
    pub fn count(&self) -> (String, Vec<SqlArg>) {
        let counted = if self.distinct {
            format!("DISTINCT {}", self.id_column)
        } else {
            self.id_column.clone()
        };

        (
            format!(
                "SELECT COUNT({}) FROM {}{}",
                counted,
                self.from,
                self.where_clause(None)
            ),
            self.args.clone(),
        )
    }

    /// One window of `columns`, ordered by id
    pub fn page(&self, columns: &str, window: &Window) -> (String, Vec<SqlArg>) {
        let select = if self.distinct {
            format!("SELECT DISTINCT {}", columns)
        } else {
            format!("SELECT {}", columns)
        };

        let mut args = self.args.clone();

        match window {
            Window::Offset { limit, offset } => {
                let sql = format!(
                    "{} FROM {}{} ORDER BY {} ASC LIMIT ? OFFSET ?",
                    select,
                    self.from,
                    self.where_clause(None),
                    self.id_column
                );
                args.push(SqlArg::Int(*limit));
                args.push(SqlArg::Int(*offset));
                (sql, args)
            }
            Window::After { limit, after } => {
                let keyset = format!("{} > ?", self.id_column);
                let extra = after.map(|_| keyset.as_str());

                let sql = format!(
                    "{} FROM {}{} ORDER BY {} ASC LIMIT ?",
                    select,
                    self.from,
                    self.where_clause(extra),
                    self.id_column
                );

                if let Some(after) = after {
                    args.push(SqlArg::Int(*after));
                }
                args.push(SqlArg::Int(limit + 1));
                (sql, args)
            }
        }
    }

    /// `(value, count)` pairs for one column, most frequent first
    pub fn facet(&self, column: &str) -> (String, Vec<SqlArg>) {
        let counted = if self.distinct {
            format!("DISTINCT {}", self.id_column)
        } else {
            self.id_column.clone()
        };

        (
            format!(
                "SELECT CAST({col} AS TEXT) AS facet, COUNT({counted}) AS count FROM {from}{where_clause} GROUP BY {col} ORDER BY count DESC",
                col = column,
                counted = counted,
                from = self.from,
                where_clause = self.where_clause(None),
            ),
            self.args.clone(),
        )
    }
}

/// SPR rows for a known set of ids
pub fn spr_for_ids(ids: &[i64]) -> (String, Vec<SqlArg>) {
    let placeholders = vec!["?"; ids.len()].join(", ");

    (
        format!(
            "SELECT {} FROM {} WHERE spr.id IN ({}) AND spr.is_alt = 0",
            SPR_COLUMNS, SPR_TABLE, placeholders
        ),
        ids.iter().map(|id| SqlArg::Int(*id)).collect(),
    )
}

/// Predicate for one filter. Only columns of the main table are involved.
///
/// A NULL flag column reads back as unknown, so the flag predicates fold it
/// into -1 before comparing.
pub fn filter_predicate(filter: &Filter) -> Result<(&'static str, Vec<SqlArg>)> {
    match filter {
        Filter::Placetype(pt) => Ok(("spr.placetype = ?", vec![pt.name().into()])),
        Filter::Country(code) => Ok(("spr.country = ?", vec![code.as_str().into()])),
        Filter::IsCurrent(flag) => Ok((
            "COALESCE(spr.is_current, -1) = ?",
            vec![flag.as_i64().into()],
        )),
        Filter::IsDeprecated(flag) => match flag {
            ExistentialFlag::False => Ok(("COALESCE(spr.is_deprecated, -1) != 1", vec![])),
            ExistentialFlag::True => Ok(("spr.is_deprecated = 1", vec![])),
            ExistentialFlag::Unknown => Ok(("COALESCE(spr.is_deprecated, -1) = -1", vec![])),
        },
        Filter::Tag(_) => Err(SpelunkerError::not_implemented(
            "Tag filters are not supported by the SQL backend",
        )),
    }
}

/// Column for a facet. Only whitelisted columns are accepted.
pub fn facet_column(facet: &Facet) -> Result<&'static str> {
    match facet.property.as_str() {
        "placetype" => Ok("spr.placetype"),
        "country" => Ok("spr.country"),
        "repo" => Ok("spr.repo"),
        "parent_id" => Ok("spr.parent_id"),
        "iscurrent" | "is_current" => Ok("spr.is_current"),
        "isdeprecated" | "is_deprecated" => Ok("spr.is_deprecated"),
        "isceased" | "is_ceased" => Ok("spr.is_ceased"),
        "issuperseded" | "is_superseded" => Ok("spr.is_superseded"),
        "issuperseding" | "is_superseding" => Ok("spr.is_superseding"),
        other => Err(SpelunkerError::invalid_input(format!(
            "Unsupported facet '{}'",
            other
        ))),
    }
}

fn like_escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
