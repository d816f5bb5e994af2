use dashmap::DashMap;

/// A registered prepared statement, keyed by `stmt_id` in `StatementRegistry`.
///
/// `col_types` holds the per-parameter type tags last bound by an EXECUTE
/// that set the "new parameters bound" flag. A later EXECUTE against the
/// same statement that leaves the flag unset reuses these rather than
/// rebinding, per the wire protocol's type-tag caching rule.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub query_text: String,
    pub num_params: usize,
    pub col_types: Vec<u8>,
}

/// Process-global `stmt_id -> PreparedStatement` map. Unlike `SessionTable`,
/// prepared statements outlive any single session and may be looked up by
/// executes arriving on a different connection than the one that prepared
/// them, so this is a concurrent map rather than a decoder-thread-confined
/// one.
#[derive(Debug, Clone, Default)]
pub struct StatementRegistry {
    statements: DashMap<u32, PreparedStatement>,
}

impl StatementRegistry {
    pub fn new() -> Self {
        StatementRegistry {
            statements: DashMap::new(),
        }
    }

    pub fn register(&self, stmt_id: u32, query_text: String, num_params: usize) {
        self.statements.insert(
            stmt_id,
            PreparedStatement {
                query_text,
                num_params,
                col_types: Vec::new(),
            },
        );
    }

    pub fn lookup(&self, stmt_id: u32) -> Option<PreparedStatement> {
        self.statements.get(&stmt_id).map(|e| e.value().clone())
    }

    pub fn remove(&self, stmt_id: u32) -> Option<PreparedStatement> {
        self.statements.remove(&stmt_id).map(|(_, v)| v)
    }

    pub fn set_param_types(&self, stmt_id: u32, types: Vec<u8>) {
        if let Some(mut entry) = self.statements.get_mut(&stmt_id) {
            entry.col_types = types;
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
