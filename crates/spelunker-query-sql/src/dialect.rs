use spelunker_query::{Result, SpelunkerError};

/// SQL engines the relational backend can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn from_engine(engine: &str) -> Result<Self> {
        match engine {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(SpelunkerError::invalid_configuration(format!(
                "Unsupported SQL engine '{}'",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// Rewrite `?` placeholders into the engine's positional syntax.
    ///
    /// Statements never carry literal `?` characters: every value is bound.
    pub fn render(&self, sql: &str) -> String {
        match self {
            Dialect::Sqlite => sql.to_string(),
            Dialect::Postgres => {
                let mut out = String::with_capacity(sql.len() + 8);
                let mut n = 0;

                for c in sql.chars() {
                    if c == '?' {
                        n += 1;
                        out.push('$');
                        out.push_str(&n.to_string());
                    } else {
                        out.push(c);
                    }
                }

                out
            }
        }
    }

    /// Full-text predicate against the search table, bound to one argument
    pub fn full_text_predicate(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "search.names_all MATCH ?",
            Dialect::Postgres => {
                "to_tsvector('simple', search.names_all) @@ plainto_tsquery('simple', ?)"
            }
        }
    }

    /// Prepare free text for binding into [`Dialect::full_text_predicate`]
    pub fn full_text_query(&self, query: &str) -> String {
        match self {
            // Each term is quoted so FTS5 operators in user input are matched literally
            Dialect::Sqlite => query
                .split_whitespace()
                .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
                .collect::<Vec<_>>()
                .join(" "),
            Dialect::Postgres => query.to_string(),
        }
    }
}
