//! Run translated statements against the pool.
//!
//! Paginated queries fetch the total count and the requested window at the
//! same time on two pool connections. The first failure drops the other
//! query and is returned; no partial page is ever produced.
//!
//! A zero count only saves work on the id-then-fetch path, where the
//! follow-up SPR lookup is skipped. Single-statement pages are already in
//! flight by the time the count arrives.

use crate::query::{spr_for_ids, SqlArg, Statement, Window, CURSOR_PREFIX};
use crate::row::SprRow;
use crate::schema::SPR_COLUMNS;
use crate::SqlSpelunker;
use spelunker_query::{
    Facet, FacetCount, Faceting, PaginationOptions, PaginationResults, Places, Result,
    SpelunkerError, StandardPlacesResult,
};
use sqlx::any::AnyArguments;
use sqlx::Arguments;
use std::collections::HashMap;
use tracing::{debug, error};

fn arguments<'q>(args: &[SqlArg]) -> Result<AnyArguments<'q>> {
    let mut out = AnyArguments::default();

    for arg in args {
        let res = match arg {
            SqlArg::Int(v) => out.add(*v),
            SqlArg::Float(v) => out.add(*v),
            SqlArg::Text(v) => out.add(v.clone()),
        };

        res.map_err(|e| SpelunkerError::backend("Failed to bind query argument", e))?;
    }

    Ok(out)
}

fn query_error(sql: &str, e: sqlx::Error) -> SpelunkerError {
    error!("Query failed: {} ({})", sql, e);

    match e {
        sqlx::Error::RowNotFound => SpelunkerError::not_found("No matching row"),
        other => SpelunkerError::backend("Query failed", other),
    }
}

/// Trim the extra keyset row and derive pagination for a fetched window
pub(crate) fn paginate<T>(
    opts: &PaginationOptions,
    window: &Window,
    total: i64,
    mut items: Vec<T>,
    id_of: impl Fn(&T) -> i64,
) -> (Vec<T>, PaginationResults) {
    match window {
        Window::Offset { .. } => (items, PaginationResults::countable(total, opts)),
        Window::After { limit, .. } => {
            let limit = usize::try_from(*limit).unwrap_or(usize::MAX);

            let next = if items.len() > limit {
                items.truncate(limit);
                items
                    .last()
                    .map(|item| format!("{}{}", CURSOR_PREFIX, id_of(item)))
                    .unwrap_or_default()
            } else {
                String::new()
            };

            (
                items,
                PaginationResults::cursor(Some(total), opts.per_page(), next),
            )
        }
    }
}

impl SqlSpelunker {
    pub(crate) async fn count(&self, stmt: &Statement) -> Result<i64> {
        let (sql, args) = stmt.count();
        let sql = self.dialect.render(&sql);
        debug!("Executing count: {}", sql);

        sqlx::query_scalar_with::<_, i64, _>(&sql, arguments(&args)?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))
    }

    pub(crate) async fn fetch_spr(&self, sql: &str, args: &[SqlArg]) -> Result<Vec<SprRow>> {
        let sql = self.dialect.render(sql);
        debug!("Executing query: {}", sql);

        sqlx::query_as_with::<_, SprRow, _>(&sql, arguments(args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))
    }

    pub(crate) async fn fetch_ids(&self, sql: &str, args: &[SqlArg]) -> Result<Vec<i64>> {
        let sql = self.dialect.render(sql);
        debug!("Executing query: {}", sql);

        sqlx::query_scalar_with::<_, i64, _>(&sql, arguments(args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))
    }

    pub(crate) async fn fetch_optional_text(
        &self,
        sql: &str,
        args: &[SqlArg],
    ) -> Result<Option<String>> {
        let sql = self.dialect.render(sql);
        debug!("Executing query: {}", sql);

        sqlx::query_scalar_with::<_, String, _>(&sql, arguments(args)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))
    }

    pub(crate) async fn fetch_facet_counts(
        &self,
        sql: &str,
        args: &[SqlArg],
    ) -> Result<Vec<FacetCount>> {
        let sql = self.dialect.render(sql);
        debug!("Executing facet query: {}", sql);

        let rows = sqlx::query_as_with::<_, (Option<String>, i64), _>(&sql, arguments(args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| FacetCount {
                key: key.unwrap_or_default(),
                count,
            })
            .collect())
    }

    /// Count and page of SPR rows for a statement over the main table
    pub(crate) async fn query_places(
        &self,
        opts: &PaginationOptions,
        stmt: &Statement,
    ) -> Result<Places> {
        let window = Window::from_options(opts)?;
        let (sql, args) = stmt.page(SPR_COLUMNS, &window);

        let (total, rows) = tokio::try_join!(self.count(stmt), self.fetch_spr(&sql, &args))?;

        let (rows, pagination) = paginate(opts, &window, total, rows, |r| r.id);
        let results = rows.into_iter().map(StandardPlacesResult::from).collect();

        Ok(Places::new(results, pagination))
    }

    /// Collect a page of matching ids, then fetch their SPR rows in one query
    pub(crate) async fn query_ids_then_places(
        &self,
        opts: &PaginationOptions,
        stmt: &Statement,
    ) -> Result<Places> {
        let window = Window::from_options(opts)?;
        let columns = format!("{} AS id", stmt.id_column());
        let (sql, args) = stmt.page(&columns, &window);

        let (total, ids) = tokio::try_join!(self.count(stmt), self.fetch_ids(&sql, &args))?;

        let (ids, pagination) = paginate(opts, &window, total, ids, |id| *id);

        if total == 0 || ids.is_empty() {
            return Ok(Places::new(Vec::new(), pagination));
        }

        let (sql, args) = spr_for_ids(&ids);
        let rows = self.fetch_spr(&sql, &args).await?;

        let mut by_id: HashMap<i64, SprRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let results = ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(StandardPlacesResult::from)
            .collect();

        Ok(Places::new(results, pagination))
    }

    /// One faceting per facet, in the order requested
    pub(crate) async fn query_facets(
        &self,
        stmt: &Statement,
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        spelunker_query::ensure_facets(facets)?;

        let mut results = Vec::with_capacity(facets.len());

        for facet in facets {
            let column = crate::query::facet_column(facet)?;
            let (sql, args) = stmt.facet(column);
            let counts = self.fetch_facet_counts(&sql, &args).await?;
            results.push(Faceting::new(facet.clone(), counts));
        }

        Ok(results)
    }
}
