//! In-memory [`Driver`] with canned responses.
//!
//! Answers the connection hardening statement and `regtype` lookups on its
//! own, so tests only script the commands they care about.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::connection::HARDEN_SEARCH_PATH;
use crate::driver::{ColumnDesc, Driver, DriverError, ExecOutcome, TupleSet};
use crate::escape::{quote_identifier, quote_literal};

/// Built-in type names, as `regtype` renders them.
const BUILTIN_TYPES: &[(u32, &str)] = &[
    (16, "boolean"),
    (19, "name"),
    (20, "bigint"),
    (21, "smallint"),
    (23, "integer"),
    (25, "text"),
    (26, "oid"),
    (114, "json"),
    (700, "real"),
    (701, "double precision"),
    (1043, "character varying"),
    (1700, "numeric"),
    (2950, "uuid"),
    (3802, "jsonb"),
];

/// Observations shared between a [`ScriptedDriver`] and the test holding it.
#[derive(Debug, Clone, Default)]
pub struct ScriptLog {
    commands: Rc<RefCell<Vec<String>>>,
    closes: Rc<Cell<usize>>,
}

impl ScriptLog {
    /// Every command passed to `execute`, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    #[must_use]
    pub fn regtype_lookups(&self) -> usize {
        self.commands
            .borrow()
            .iter()
            .filter(|sql| parse_regtype_lookup(sql).is_some())
            .count()
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closes.get()
    }
}

#[derive(Debug, Default)]
pub struct ScriptedDriver {
    responses: HashMap<String, ExecOutcome>,
    log: ScriptLog,
    closed: bool,
}

impl ScriptedDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with `outcome` every time it is executed.
    #[must_use]
    pub fn respond(mut self, sql: &str, outcome: ExecOutcome) -> Self {
        self.responses.insert(sql.to_string(), outcome);
        self
    }

    /// Handle for inspecting what the driver saw, usable after it is boxed.
    #[must_use]
    pub fn log(&self) -> ScriptLog {
        self.log.clone()
    }

    fn builtin_response(sql: &str) -> ExecOutcome {
        if sql == HARDEN_SEARCH_PATH {
            return ExecOutcome::Tuples(TupleSet::new(
                vec![ColumnDesc::new("set_config", 25)],
                vec![vec![Some(String::new())]],
            ));
        }
        if let Some(oid) = parse_regtype_lookup(sql) {
            return match BUILTIN_TYPES.iter().find(|(known, _)| *known == oid) {
                Some((_, name)) => ExecOutcome::Tuples(TupleSet::new(
                    vec![ColumnDesc::new("regtype", 2206)],
                    vec![vec![Some((*name).to_string())]],
                )),
                None => ExecOutcome::Fatal(format!(
                    "ERROR:  type with OID {oid} does not exist"
                )),
            };
        }
        ExecOutcome::Fatal(format!("ERROR:  no scripted response for: {sql}"))
    }
}

fn parse_regtype_lookup(sql: &str) -> Option<u32> {
    sql.strip_prefix("SELECT ")?
        .strip_suffix("::oid::regtype")?
        .parse()
        .ok()
}

impl Driver for ScriptedDriver {
    fn execute(&mut self, sql: &str) -> ExecOutcome {
        self.log.commands.borrow_mut().push(sql.to_string());
        if self.closed {
            return ExecOutcome::Fatal("connection is closed".to_string());
        }
        match self.responses.get(sql) {
            Some(outcome) => outcome.clone(),
            None => Self::builtin_response(sql),
        }
    }

    fn escape_literal(&self, text: &str) -> Result<String, DriverError> {
        if self.closed {
            return Err(DriverError::new("connection is closed"));
        }
        quote_literal(text)
    }

    fn escape_identifier(&self, text: &str) -> Result<String, DriverError> {
        if self.closed {
            return Err(DriverError::new("connection is closed"));
        }
        quote_identifier(text)
    }

    fn close(&mut self) {
        self.closed = true;
        self.log.closes.set(self.log.closes.get() + 1);
    }
}
