//! Line-oriented command shell over a [`ProductIndex`]
//!
//! Thin caller layer: parses one command per line, validates raw input at
//! the boundary, runs the matching index operation and hands back a
//! [`Response`] carrying the result and the event the index reported.
//!
//! ```text
//! put K-106 "Gaming Keyboard" 80
//! find K-106
//! range A M
//! sort label
//! ```

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::index::{IndexStats, ProductIndex, Record, SortKey, Upsert};
use crate::input::{validate_key, ProductDraft};
use crate::observe::{IndexEvent, IndexObserver, RecordingObserver};
use serde::Serialize;
use std::fmt;

pub const HELP: &str = "\
Commands:
  put KEY \"LABEL\" COUNT     insert, or update if KEY exists
  add KEY \"LABEL\" COUNT     insert only, fails if KEY exists
  update KEY \"LABEL\" COUNT  update only, fails if KEY is missing
  find KEY                  exact lookup by key
  delete KEY                remove by key
  search TEXT               case-insensitive label search
  range START END           keys in [START, END], sorted by label
  sort label|key            sort all records (order persists)
  list                      records in current order
  stats                     slot table occupancy
  verify                    check index invariants
  help                      show this text";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, label: String, count: String },
    Add { key: String, label: String, count: String },
    Update { key: String, label: String, count: String },
    Find(String),
    Delete(String),
    Search(String),
    Range(String, String),
    Sort(SortKey),
    List,
    Stats,
    Verify,
    Help,
    Blank,
}

/// Split a line on whitespace, keeping double-quoted runs together
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(Error::InvalidArgument("unterminated quote".to_string()));
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}

fn arity(name: &str, args: &[String], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::InvalidArgument(format!(
            "'{}' takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let tokens = tokenize(line)?;
        let Some((name, args)) = tokens.split_first() else {
            return Ok(Command::Blank);
        };
        if name.starts_with('#') {
            return Ok(Command::Blank);
        }

        let name = name.to_ascii_lowercase();
        let product = |args: &[String]| -> Result<(String, String, String)> {
            arity(&name, args, 3)?;
            Ok((args[0].clone(), args[1].clone(), args[2].clone()))
        };

        match name.as_str() {
            "put" => {
                let (key, label, count) = product(args)?;
                Ok(Command::Put { key, label, count })
            }
            "add" => {
                let (key, label, count) = product(args)?;
                Ok(Command::Add { key, label, count })
            }
            "update" => {
                let (key, label, count) = product(args)?;
                Ok(Command::Update { key, label, count })
            }
            "find" => {
                arity(&name, args, 1)?;
                Ok(Command::Find(args[0].clone()))
            }
            "delete" => {
                arity(&name, args, 1)?;
                Ok(Command::Delete(args[0].clone()))
            }
            "search" => {
                if args.is_empty() {
                    return Err(Error::InvalidArgument("'search' needs text".to_string()));
                }
                Ok(Command::Search(args.join(" ")))
            }
            "range" => {
                arity(&name, args, 2)?;
                Ok(Command::Range(args[0].clone(), args[1].clone()))
            }
            "sort" => {
                arity(&name, args, 1)?;
                Ok(Command::Sort(args[0].parse()?))
            }
            "list" => Ok(Command::List),
            "stats" => Ok(Command::Stats),
            "verify" => Ok(Command::Verify),
            "help" | "?" => Ok(Command::Help),
            other => Err(Error::InvalidArgument(format!(
                "unknown command '{}', try 'help'",
                other
            ))),
        }
    }
}

/// Result of a shell command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reply", content = "data")]
pub enum Reply {
    Stored(Upsert),
    Added,
    Updated,
    Found(Option<Record>),
    Deleted(bool),
    Records(Vec<Record>),
    Stats(IndexStats),
    Verified,
    Help,
    Blank,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Stored(Upsert::Inserted) | Reply::Added => write!(f, "Inserted."),
            Reply::Stored(Upsert::Updated) | Reply::Updated => write!(f, "Updated."),
            Reply::Found(Some(record)) => write!(f, "FOUND: {}", record),
            Reply::Found(None) => write!(f, "Not found."),
            Reply::Deleted(true) => write!(f, "Deleted."),
            Reply::Deleted(false) => write!(f, "Not found. Nothing deleted."),
            Reply::Records(records) if records.is_empty() => write!(f, "No items."),
            Reply::Records(records) => {
                write!(f, "{} item(s):", records.len())?;
                for record in records {
                    write!(f, "\n  {}", record)?;
                }
                Ok(())
            }
            Reply::Stats(stats) => write!(
                f,
                "{}/{} slots used (load {:.2}), {} displaced, longest cluster {}",
                stats.len, stats.capacity, stats.load_factor, stats.displaced, stats.longest_cluster
            ),
            Reply::Verified => write!(f, "Invariants hold."),
            Reply::Help => write!(f, "{}", HELP),
            Reply::Blank => Ok(()),
        }
    }
}

/// Reply plus the event the index reported for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub reply: Reply,
    pub event: Option<IndexEvent>,
}

/// Command shell owning one index
pub struct Shell {
    index: ProductIndex,
    log: RecordingObserver,
    strict_keys: bool,
}

impl Shell {
    /// Build the index from `config`, reporting events to `observer` too
    pub fn new<O>(config: &IndexConfig, observer: O) -> Result<Self>
    where
        O: IndexObserver + 'static,
    {
        let log = RecordingObserver::new();
        let index = ProductIndex::from_config(config, (observer, log.clone()))?;
        log.clear();

        Ok(Self {
            index,
            log,
            strict_keys: config.strict_keys,
        })
    }

    pub fn index(&self) -> &ProductIndex {
        &self.index
    }

    /// Parse and run one line
    pub fn execute(&mut self, line: &str) -> Result<Response> {
        let command = Command::parse(line)?;
        self.log.clear();
        let reply = self.run(command)?;

        Ok(Response {
            reply,
            event: self.log.last(),
        })
    }

    fn draft(&self, key: &str, label: &str, count: &str) -> Result<ProductDraft> {
        ProductDraft::parse(key, label, count, self.strict_keys)
    }

    pub fn run(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::Put { key, label, count } => {
                let draft = self.draft(&key, &label, &count)?;
                let outcome = self
                    .index
                    .insert_or_update(&draft.key, &draft.label, draft.count)?;
                Ok(Reply::Stored(outcome))
            }
            Command::Add { key, label, count } => {
                let draft = self.draft(&key, &label, &count)?;
                self.index.insert_new(&draft.key, &draft.label, draft.count)?;
                Ok(Reply::Added)
            }
            Command::Update { key, label, count } => {
                let draft = self.draft(&key, &label, &count)?;
                self.index
                    .update_existing(&draft.key, &draft.label, draft.count)?;
                Ok(Reply::Updated)
            }
            Command::Find(key) => {
                let key = validate_key(&key, false)?;
                Ok(Reply::Found(self.index.find_exact(key)))
            }
            Command::Delete(key) => {
                let key = validate_key(&key, false)?;
                Ok(Reply::Deleted(self.index.delete(key)))
            }
            Command::Search(text) => Ok(Reply::Records(
                self.index.linear_search_by_label(text.trim()),
            )),
            Command::Range(start, end) => {
                let start = validate_key(&start, false)?;
                let end = validate_key(&end, false)?;
                Ok(Reply::Records(self.index.range_scan(start, end)?))
            }
            Command::Sort(by) => Ok(Reply::Records(self.index.sorted_view(by))),
            Command::List => Ok(Reply::Records(self.index.records())),
            Command::Stats => Ok(Reply::Stats(self.index.stats())),
            Command::Verify => {
                self.index.check_invariants()?;
                Ok(Reply::Verified)
            }
            Command::Help => Ok(Reply::Help),
            Command::Blank => Ok(Reply::Blank),
        }
    }
}
