//! Configuration of an exploration run.
//!
//! A [`Config`] is built from Java-style properties text (`key = value`
//! lines, `#` and `!` comments) and may then be overridden key by key, which
//! is how `-D key=value` command-line definitions are applied.
//!
//! | key                  | meaning                                           |
//! |----------------------|---------------------------------------------------|
//! | `dse.executor`       | command running the target                        |
//! | `dse.executor.args`  | whitespace-separated arguments before the input   |
//! | `dse.explore`        | `bfs`, `dfs` or `inorder`                         |
//! | `dse.terminate.on`   | `\|`-separated termination flags                  |
//! | `dse.dp.incremental` | reuse one solver context across queries           |
//! | `dse.dp.nodes`       | solver node budget                                |
//! | `static.info`        | file of JSON constraints, one per line            |
//! | `random.seed`        | seed for model completion                         |
//! | `dse.max.iterations` | stop after this many executions                   |
//! | `dse.dot`            | write the final decision tree to this DOT file    |

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::error::{DseError, Result};
use crate::expr::Expr;
use crate::path::Termination;
use crate::solver::BddBackend;
use crate::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub strategy: Strategy,
    pub incremental: bool,
    pub termination: Termination,
    pub seed: Option<u64>,
    pub executor: Option<String>,
    pub executor_args: Vec<String>,
    pub static_info: Option<PathBuf>,
    pub node_budget: usize,
    pub max_iterations: Option<usize>,
    pub dot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            incremental: false,
            termination: Termination::completion(),
            seed: None,
            executor: None,
            executor_args: Vec::new(),
            static_info: None,
            node_budget: BddBackend::DEFAULT_NODE_BUDGET,
            max_iterations: None,
            dot: None,
        }
    }
}

/// Parse properties text into key/value pairs. Later keys override earlier ones.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = match line.find(['=', ':']) {
            Some(i) => (&line[..i], &line[i + 1..]),
            None => (line, ""),
        };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    map
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(DseError::Config(format!("invalid boolean for {}: {}", key, value))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DseError::Config(format!("invalid number for {}: {}", key, value)))
}

impl Config {
    pub fn from_properties(text: &str) -> Result<Self> {
        Self::from_map(&parse_properties(text))
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = Config::default();
        for (key, value) in map {
            config.apply(key, value)?;
        }
        Ok(config)
    }

    /// Set one property.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "dse.executor" => self.executor = Some(value.to_string()),
            "dse.executor.args" => self.executor_args = value.split_whitespace().map(String::from).collect(),
            "dse.explore" => self.strategy = value.parse()?,
            "dse.terminate.on" => self.termination = value.parse()?,
            "dse.dp.incremental" => self.incremental = parse_bool(key, value)?,
            "dse.dp.nodes" => {
                let budget: usize = parse_number(key, value)?;
                if budget == 0 {
                    return Err(DseError::Config("dse.dp.nodes must be positive".to_string()));
                }
                self.node_budget = budget;
            }
            "static.info" => self.static_info = Some(PathBuf::from(value)),
            "random.seed" => {
                // Negative seeds are accepted and reinterpreted bitwise.
                let seed = match value.parse::<u64>() {
                    Ok(seed) => seed,
                    Err(_) => parse_number::<i64>(key, value)? as u64,
                };
                self.seed = Some(seed);
            }
            "dse.max.iterations" => self.max_iterations = Some(parse_number(key, value)?),
            "dse.dot" => self.dot = Some(PathBuf::from(value)),
            _ => debug!("config: ignoring unknown key {}", key),
        }
        Ok(())
    }

    /// Read the static constraints file, if one is configured.
    ///
    /// Each non-blank line holds one JSON-encoded [`Expr`]; lines starting
    /// with `#` are skipped.
    pub fn load_statics(&self) -> Result<Vec<Expr>> {
        let Some(path) = &self.static_info else {
            return Ok(Vec::new());
        };
        let text = fs::read_to_string(path)?;
        let mut statics = Vec::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            statics.push(serde_json::from_str(line)?);
        }
        debug!("config: loaded {} static constraints from {}", statics.len(), path.display());
        Ok(statics)
    }
}
